//! Main module for the pdfchat CLI application.
//!
//! Parses the command line, resolves configuration, loads the PDF, sets up the chat
//! session for the configured provider and hands over to the interactive question loop.
//!
//! # Examples
//!
//! Chatting about a document:
//!
//! ```sh
//! PDF_PATH=manual.pdf API_KEY=... pdfchat
//! pdfchat --pdf manual.pdf --language German
//! ```
//!
//! Writing the default configuration:
//!
//! ```sh
//! pdfchat init
//! ```

use clap::Parser;
use once_cell::sync::OnceCell;
use std::{error::Error, io, process::ExitCode};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use pdf_chat::{
    api::{ChatBackend, OpenAiSession},
    assistant::Assistant,
    commands::{Cli, Commands},
    config::{self, PdfChatConfig, Provider},
    console::Console,
    default_config_path,
    document::Document,
    gemini::GeminiSession,
    interactive::interactive_mode,
    rate_limiter::RateLimiter,
};

static TRACING: OnceCell<()> = OnceCell::new();

fn init_tracing(verbose: bool) {
    TRACING.get_or_init(|| {
        let default = if verbose { "debug" } else { "warn" };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    });
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.chat.verbose);

    let result = tokio::runtime::Runtime::new()
        .map_err(|e| Box::new(e) as Box<dyn Error>)
        .and_then(|runtime| runtime.block_on(run(cli)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Main asynchronous function of the pdfchat CLI application.
///
/// # Errors
///
/// Returns an error if configuration cannot be resolved, the PDF cannot be loaded, or the
/// chat session cannot be created. Errors while answering a question never end up here.
async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Some(Commands::Init { force }) => init(force),
        None => {
            let default_path = default_config_path().ok();
            let config = config::resolve(&cli.chat, default_path.as_deref())?;
            debug!("Config resolved: {:?}", config);
            Ok(chat(config).await?)
        }
    }
}

/// Writes the default configuration file.
fn init(force: bool) -> Result<(), Box<dyn Error>> {
    let path = default_config_path()?;
    debug!("Initializing configuration at {}", path.display());
    config::write_default_config(&path, force)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

async fn chat(config: PdfChatConfig) -> pdf_chat::error::Result<()> {
    let pdf_path = config.pdf_path()?;
    println!("PDF file: {}", pdf_path.display());

    let document = Document::load(pdf_path, &config.splitter)?;
    info!("Loaded {} fragments from {}", document.len(), pdf_path.display());
    println!("Loaded {} text fragments.", document.len());

    let api_key = config.api_key();
    match config.provider {
        Provider::Gemini => {
            let session = GeminiSession::new(&api_key, config.api_base(), &config.model)?;
            converse(&config, document, session).await
        }
        Provider::OpenAi => {
            let session = OpenAiSession::new(&api_key, config.api_base(), &config.model)?;
            converse(&config, document, session).await
        }
    }
}

async fn converse<B: ChatBackend>(
    config: &PdfChatConfig,
    document: Document,
    session: B,
) -> pdf_chat::error::Result<()> {
    let mut assistant = Assistant::new(
        document,
        session,
        RateLimiter::new(&config.rate_limit),
        config.prompt.clone(),
        Console::stdout(),
    )
    .with_max_retries(config.max_retries);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    interactive_mode(&mut assistant, stdin.lock(), &mut stdout).await?;
    println!("Goodbye!");
    Ok(())
}
