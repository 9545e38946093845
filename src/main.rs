//! paperdesk CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use paperdesk::{
    backend::create_backend,
    commands::{
        cmd_ask, cmd_chat, cmd_health, cmd_init, print_answer, print_health, print_init,
        AnswerFormat, AskOptions, ChatOptions,
    },
    config::Config,
    error::Result,
    progress::LogWriterFactory,
    source::ContextSource,
};
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "paperdesk")]
#[command(version, about = "Ask questions about your PDFs from the terminal", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Check whether the backend is reachable
    Health,

    /// Ask a single question and print the answer
    Ask {
        /// The question
        question: String,

        /// PDF files to attach (repeatable)
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,

        /// Context source: uploads, external or both
        #[arg(short, long)]
        source: Option<ContextSource>,

        /// Print the answer as HTML
        #[arg(long)]
        html: bool,
    },

    /// Start an interactive chat session
    Chat {
        /// PDF files to upload at start (repeatable)
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,

        /// Context source: uploads, external or both
        #[arg(short, long)]
        source: Option<ContextSource>,

        /// Print answers as HTML
        #[arg(long)]
        html: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    // Neither init nor completions need an existing config
    match cli.command {
        Commands::Init { force } => {
            let base_dir = cli.config.as_deref().map(init_base_dir);
            let config = cmd_init(base_dir, force)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print_init(&config);
            }
            return Ok(());
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "paperdesk", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(cli.config.as_deref())?;
    let backend = create_backend(&config.backend)?;

    match cli.command {
        Commands::Health => {
            let info = cmd_health(backend.as_ref()).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print_health(&info);
            }
        }

        Commands::Ask {
            question,
            files,
            source,
            html,
        } => {
            let options = AskOptions { files, source };
            let result = cmd_ask(&config, backend, &question, options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_answer(&result, answer_format(html));
            }
        }

        Commands::Chat {
            files,
            source,
            html,
        } => {
            let options = ChatOptions {
                files,
                source,
                format: answer_format(html),
            };
            cmd_chat(&config, backend, options).await?;
        }

        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}

fn answer_format(html: bool) -> AnswerFormat {
    if html {
        AnswerFormat::Html
    } else {
        AnswerFormat::Text
    }
}

/// A `.toml` path means its parent directory; anything else is the directory
fn init_base_dir(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|e| e == "toml") {
        path.parent()
            .map(PathBuf::from)
            .unwrap_or_else(Config::default_base_dir)
    } else {
        path.to_path_buf()
    }
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path),
        None => Config::load_from(None),
    }
}
