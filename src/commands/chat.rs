//! Interactive chat command
//!
//! Reads one line at a time from stdin. Plain lines are questions; lines
//! starting with `/` are commands. Session events are applied while waiting
//! for input, so uploads and answers show up as soon as they land.

use super::{AnswerFormat, NoticePrinter};
use crate::backend::Backend;
use crate::config::Config;
use crate::error::Result;
use crate::ingest::FileBlob;
use crate::models::{Document, HealthIndicator, MessageGroup};
use crate::progress::{print_line, print_stdout, UploadBars};
use crate::session::{SessionController, SessionEvent, SubmitOutcome};
use crate::source::ContextSource;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Chat options
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub files: Vec<PathBuf>,
    pub source: Option<ContextSource>,
    pub format: AnswerFormat,
}

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Ask(String),
    Add(Vec<PathBuf>),
    Remove(String),
    Source(ContextSource),
    Docs,
    History,
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_chat_line(line: &str) -> ChatCommand {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return ChatCommand::Ask(line.to_string());
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "add" if rest.is_empty() => ChatCommand::Invalid("Usage: /add <file.pdf>...".to_string()),
        "add" => ChatCommand::Add(rest.split_whitespace().map(PathBuf::from).collect()),
        "remove" | "rm" if rest.is_empty() => {
            ChatCommand::Invalid("Usage: /remove <number|id|name>".to_string())
        }
        "remove" | "rm" => ChatCommand::Remove(rest.to_string()),
        "source" => match ContextSource::from_str(rest) {
            Ok(source) => ChatCommand::Source(source),
            Err(e) => ChatCommand::Invalid(e.to_string()),
        },
        "docs" => ChatCommand::Docs,
        "history" => ChatCommand::History,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        other => ChatCommand::Invalid(format!("Unknown command: /{}", other)),
    }
}

/// Map a `/remove` target to a document id: a 1-based number from `/docs`,
/// an id, or an exact file name. Unmatched targets pass through unchanged.
pub fn resolve_document(documents: &[Document], target: &str) -> String {
    if let Ok(index) = target.parse::<usize>() {
        if let Some(doc) = index.checked_sub(1).and_then(|i| documents.get(i)) {
            return doc.id.clone();
        }
    }
    documents
        .iter()
        .find(|doc| doc.id == target)
        .or_else(|| documents.iter().find(|doc| doc.name == target))
        .map(|doc| doc.id.clone())
        .unwrap_or_else(|| target.to_string())
}

/// Prints whatever changed in the session since the last refresh
struct Transcript {
    format: AnswerFormat,
    notices: NoticePrinter,
    bars: UploadBars,
    shown_answers: HashMap<u64, usize>,
    health: HealthIndicator,
}

impl Transcript {
    fn new(format: AnswerFormat) -> Self {
        Self {
            format,
            notices: NoticePrinter::default(),
            bars: UploadBars::new(),
            shown_answers: HashMap::new(),
            health: HealthIndicator::Checking,
        }
    }

    fn refresh(&mut self, session: &SessionController) {
        self.bars.sync(session.uploads());
        self.notices.poll(session);

        if session.health() != &self.health {
            self.health = session.health().clone();
            print_line(format!("Backend: {}", self.health));
        }

        for group in session.messages() {
            let shown = self.shown_answers.entry(group.id).or_insert(0);
            for answer in &group.answers[*shown..] {
                print_stdout(format!("\n{}\n", self.format.render(answer)));
            }
            *shown = group.answers.len();
        }
    }

    fn finish(&mut self) {
        self.bars.clear();
    }
}

enum Wake {
    Line(std::io::Result<Option<String>>),
    Event(SessionEvent),
}

/// Run the interactive chat loop until `/quit` or end of input
pub async fn cmd_chat(
    config: &Config,
    backend: Arc<dyn Backend>,
    options: ChatOptions,
) -> Result<()> {
    info!("Starting chat against {}", backend.base_url());

    let mut session = SessionController::new(config, backend);
    session.start();
    if let Some(source) = options.source {
        session.select_source(source);
    }
    if !options.files.is_empty() {
        session.ingest(options.files.iter().map(FileBlob::from_path).collect());
    }

    print_stdout(format!(
        "paperdesk chat · source: {} · type /help for commands",
        session.active_source()
    ));

    let result = run_chat_loop(
        &mut session,
        BufReader::new(tokio::io::stdin()),
        options.format,
    )
    .await;

    session.shutdown();
    debug!("Chat ended");
    result
}

/// Feed lines from `input` to the session while applying its events
async fn run_chat_loop<R>(
    session: &mut SessionController,
    input: R,
    format: AnswerFormat,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut transcript = Transcript::new(format);
    let mut lines = input.lines();

    loop {
        transcript.refresh(session);

        let wake = tokio::select! {
            line = lines.next_line() => Wake::Line(line),
            Some(event) = session.next_event() => Wake::Event(event),
        };

        match wake {
            Wake::Event(event) => session.apply(event),
            Wake::Line(Ok(None)) => break,
            Wake::Line(Ok(Some(line))) => match parse_chat_line(&line) {
                ChatCommand::Quit => break,
                command => run_command(session, command, format),
            },
            // The bad line is consumed; later lines still read
            Wake::Line(Err(e)) if e.kind() == ErrorKind::InvalidData => {
                warn!("Skipping unreadable input line: {}", e);
                print_line("⚠ Input line is not valid UTF-8, ignored");
            }
            Wake::Line(Err(e)) => {
                transcript.finish();
                return Err(e.into());
            }
        }
    }

    transcript.finish();
    Ok(())
}

fn run_command(session: &mut SessionController, command: ChatCommand, format: AnswerFormat) {
    match command {
        ChatCommand::Ask(question) => match session.ask(question) {
            SubmitOutcome::Dispatched { .. } => print_line("… thinking"),
            SubmitOutcome::Ignored => print_line("⏳ Still waiting for the previous answer"),
            SubmitOutcome::Empty | SubmitOutcome::Rejected => {}
        },
        ChatCommand::Add(paths) => {
            session.ingest(paths.iter().map(FileBlob::from_path).collect());
        }
        ChatCommand::Remove(target) => {
            let id = resolve_document(session.documents(), &target);
            if let Err(e) = session.remove_document(&id) {
                debug!("Remove failed: {}", e);
            }
        }
        ChatCommand::Source(source) => {
            session.select_source(source);
            let tags: Vec<String> = session
                .active_tags()
                .iter()
                .map(ToString::to_string)
                .collect();
            print_stdout(format!("Source: {}  {}", source, tags.join("  ")));
        }
        ChatCommand::Docs => print_documents(session.documents()),
        ChatCommand::History => print_history(session.messages(), format),
        ChatCommand::Help => print_help(),
        ChatCommand::Invalid(message) => print_line(format!("⚠ {}", message)),
        ChatCommand::Quit => {}
    }
}

fn print_documents(documents: &[Document]) {
    if documents.is_empty() {
        print_stdout("No documents. Use /add <file.pdf> to upload one.");
        return;
    }
    for (i, doc) in documents.iter().enumerate() {
        print_stdout(format!(
            "{:>3}. {} ({}) [{}]",
            i + 1,
            doc.name,
            doc.display_size(),
            doc.id
        ));
    }
}

fn print_history(groups: &[MessageGroup], format: AnswerFormat) {
    if groups.is_empty() {
        print_stdout("No questions yet.");
        return;
    }
    for group in groups {
        print_stdout(format!("\n❓ {}", group.question));
        if group.answers.is_empty() {
            print_stdout("   (waiting for answer)");
        }
        for answer in &group.answers {
            print_stdout(format.render(answer));
        }
    }
}

fn print_help() {
    print_stdout(
        "Type a question and press enter.\n\
         /add <file.pdf>...    upload PDF files\n\
         /remove <n|id|name>   remove an uploaded document\n\
         /source <uploads|external|both>\n\
         /docs                 list uploaded documents\n\
         /history              show the conversation\n\
         /quit                 leave",
    );
}
