//! This module defines the command-line interface for the application using `clap`.
//!
//! Without a subcommand `pdfchat` starts the interactive question loop. Every chat option
//! can also come from the environment; the two required values are the PDF (`PDF_PATH`)
//! and the API key (`API_KEY`).
//!
//! ```sh
//! PDF_PATH=manual.pdf API_KEY=... pdfchat
//! pdfchat --pdf manual.pdf --provider openai --model gemini-1.5-flash
//! pdfchat init
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Provider;

/// Represents the parsed command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, propagate_version = true, color = clap::ColorChoice::Always)]
pub struct Cli {
    /// Optional subcommand; chatting is the default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub chat: ChatArgs,
}

/// Represents the available subcommands and their options.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default config file into the config directory.
    Init {
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
}

/// Options for a chat session. Each overrides the matching config file value.
#[derive(Args, Debug, Default, Clone)]
pub struct ChatArgs {
    /// PDF document to answer questions about.
    #[arg(long, short = 'p', env = "PDF_PATH")]
    pub pdf: Option<PathBuf>,

    /// API key for the chat provider.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Config file to use instead of the default location.
    #[arg(long, short = 'c', env = "PDFCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Chat API flavour.
    #[arg(long, value_enum, env = "PDFCHAT_PROVIDER")]
    pub provider: Option<Provider>,

    /// Model name.
    #[arg(long, short = 'm', env = "PDFCHAT_MODEL")]
    pub model: Option<String>,

    /// Base URL of the chat API.
    #[arg(long, env = "PDFCHAT_API_BASE")]
    pub api_base: Option<String>,

    /// Language answers are written in.
    #[arg(long, short = 'l', env = "PDFCHAT_LANGUAGE")]
    pub language: Option<String>,

    /// Log debug output to stderr.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
