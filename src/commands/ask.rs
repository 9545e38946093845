//! Ask command implementation

use super::NoticePrinter;
use crate::backend::Backend;
use crate::chat::{render_answer_html, render_answer_text};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::ingest::FileBlob;
use crate::models::{Document, HealthIndicator};
use crate::progress::UploadBars;
use crate::session::{SessionController, SubmitOutcome, ERROR_MARKER};
use crate::source::ContextSource;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// How answers are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnswerFormat {
    #[default]
    Text,
    Html,
}

impl AnswerFormat {
    pub fn render(self, answer: &str) -> String {
        match self {
            AnswerFormat::Text => render_answer_text(answer),
            AnswerFormat::Html => render_answer_html(answer),
        }
    }
}

/// Ask options
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    /// PDF files to attach before asking
    pub files: Vec<PathBuf>,
    /// Context source override
    pub source: Option<ContextSource>,
}

/// Ask result for CLI display
#[derive(Debug, Clone, Serialize)]
pub struct AskResult {
    pub question: String,
    pub answer: String,
    /// The answer is an error line rather than a reply
    pub failed: bool,
    pub source: ContextSource,
    pub health: HealthIndicator,
    pub documents: Vec<Document>,
}

/// Ingest `options.files`, then ask one question and wait for its answer
pub async fn cmd_ask(
    config: &Config,
    backend: Arc<dyn Backend>,
    question: &str,
    options: AskOptions,
) -> Result<AskResult> {
    info!("Asking: {}", question);

    let mut session = SessionController::new(config, backend);
    session.start();
    if let Some(source) = options.source {
        session.select_source(source);
    }

    let mut notices = NoticePrinter::default();
    let mut bars = UploadBars::new();

    if !options.files.is_empty() {
        let batch = options.files.iter().map(FileBlob::from_path).collect();
        session.ingest(batch);
        notices.poll(&session);
    }

    // Dispatch does not wait for the health probe, only for uploads
    while session.reads_pending() {
        session.step().await;
        bars.sync(session.uploads());
        notices.poll(&session);
    }
    bars.clear();

    let group_id = match session.ask(question) {
        SubmitOutcome::Dispatched { group_id } => group_id,
        SubmitOutcome::Empty => {
            return Err(Error::Validation("Question is empty".to_string()));
        }
        SubmitOutcome::Rejected => {
            let message = session
                .notification()
                .map(|n| n.message.clone())
                .unwrap_or_else(|| "Question rejected".to_string());
            return Err(Error::Validation(message));
        }
        SubmitOutcome::Ignored => {
            return Err(Error::Other("A question is already in flight".to_string()));
        }
    };

    while session.in_flight() {
        session.step().await;
    }
    session.pump();
    session.shutdown();

    let answer = session
        .message(group_id)
        .and_then(|group| group.answers.last().cloned())
        .ok_or_else(|| Error::Other("No answer received".to_string()))?;

    Ok(AskResult {
        question: question.trim().to_string(),
        failed: answer.starts_with(ERROR_MARKER),
        answer,
        source: session.active_source(),
        health: session.health().clone(),
        documents: session.documents().to_vec(),
    })
}

/// Print an answer to console
pub fn print_answer(result: &AskResult, format: AnswerFormat) {
    if format == AnswerFormat::Html {
        println!("{}", format.render(&result.answer));
        return;
    }

    println!("\n❓ {}\n", result.question);
    println!("{}", format.render(&result.answer));

    let attached = if result.source.includes_uploads() {
        result.documents.len()
    } else {
        0
    };
    println!(
        "\nsource: {} · {} attached document(s) · backend {}",
        result.source, attached, result.health
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{Reply, ScriptedBackend};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_pdf(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.4 fake").unwrap();
        path
    }

    #[tokio::test]
    async fn test_ask_attaches_files() {
        let dir = TempDir::new().unwrap();
        let pdf = write_pdf(&dir, "paper.pdf");
        let backend = Arc::new(ScriptedBackend::new(vec![Reply::Answer(
            "It is **fine**.".to_string(),
        )]));

        let result = cmd_ask(
            &Config::default(),
            backend.clone(),
            "  Is it fine?  ",
            AskOptions {
                files: vec![pdf],
                source: Some(ContextSource::Uploads),
            },
        )
        .await
        .unwrap();

        assert_eq!(result.question, "Is it fine?");
        assert_eq!(result.answer, "It is **fine**.");
        assert!(!result.failed);
        assert_eq!(result.documents.len(), 1);

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].question, "Is it fine?");
        let files = requests[0].pdf_files.as_ref().unwrap();
        assert_eq!(files[0].name, "paper.pdf");
        assert!(requests[0].use_s3.is_none());
    }

    #[tokio::test]
    async fn test_ask_uploads_without_documents_is_rejected() {
        let backend = Arc::new(ScriptedBackend::new(Vec::new()));
        let err = cmd_ask(
            &Config::default(),
            backend.clone(),
            "anything?",
            AskOptions {
                files: Vec::new(),
                source: Some(ContextSource::Uploads),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_ask_service_error_is_reported_as_answer() {
        let backend = Arc::new(ScriptedBackend::new(vec![Reply::Service(
            "model unavailable".to_string(),
        )]));
        let result = cmd_ask(
            &Config::default(),
            backend,
            "hello",
            AskOptions::default(),
        )
        .await
        .unwrap();

        assert!(result.failed);
        assert_eq!(result.answer, "❌ Error: model unavailable");
    }

    #[tokio::test]
    async fn test_ask_does_not_wait_for_health() {
        let backend = Arc::new(
            ScriptedBackend::new(vec![Reply::Answer("Y".to_string())]).with_hung_health(),
        );

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            cmd_ask(&Config::default(), backend.clone(), "hello", AskOptions::default()),
        )
        .await
        .expect("ask must not block on a hung health check")
        .unwrap();

        assert_eq!(result.answer, "Y");
        assert_eq!(result.health, HealthIndicator::Checking);
        assert_eq!(backend.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_ask_empty_question() {
        let backend = Arc::new(ScriptedBackend::new(Vec::new()));
        let err = cmd_ask(&Config::default(), backend, "   ", AskOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_answer_format_render() {
        assert_eq!(AnswerFormat::Text.render("**a** `b`"), "a b");
        assert_eq!(
            AnswerFormat::Html.render("**a** <b>"),
            "<p><strong>a</strong> &lt;b&gt;</p>"
        );
    }
}
