//! # pdf_chat (library root)
//!
//! This crate provides the core plumbing for the **pdfchat** CLI: ask questions about a PDF
//! and get short answers from a chat model, grounded in the most relevant passage.
//!
//! - Document loading & chunking (`document`, `splitter`).
//! - Keyword relevance selection (`relevance`).
//! - Chat API bindings (`api` for OpenAI-compatible endpoints, `gemini` for Google's native API).
//! - Request pacing, quota handling & retries (`rate_limiter`, `quota`, `assistant`).
//! - Prompt handling (`template`).
//! - CLI parsing, configuration & the question loop (`commands`, `config`, `interactive`).
//!
//! ## Configuration layout
//! The optional config file lives in your per-platform config directory, e.g.:
//!
//! - macOS: `~/Library/Application Support/com.pdf-chat.pdfchat/config.yaml`
//! - Linux (XDG): `~/.config/pdfchat/config.yaml`
//! - Windows: `C:\Users\<you>\AppData\Roaming\pdf-chat\pdfchat\config\config.yaml`
//!
//! `pdfchat init` writes one with every default spelled out.
//!
//! ## Modules
//! - [`api`], [`assistant`], [`commands`], [`config`], [`console`], [`document`], [`error`],
//!   [`gemini`], [`interactive`], [`quota`], [`rate_limiter`], [`relevance`], [`splitter`],
//!   [`template`]

use directories::ProjectDirs;
use std::path::PathBuf;

pub mod api;
pub mod assistant;
pub mod commands;
pub mod config;
pub mod console;
pub mod document;
pub mod error;
pub mod gemini;
pub mod interactive;
pub mod quota;
pub mod rate_limiter;
pub mod relevance;
pub mod splitter;
pub mod template;

use error::ConfigError;

/// File name of the config file inside [`config_dir`].
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Return the per-platform configuration directory used by pdfchat.
///
/// This uses [`directories::ProjectDirs`] with the application triple
/// `("com", "pdf-chat", "pdfchat")`. The directory is **not** created by this function.
///
/// # Errors
/// [`ConfigError::NoConfigDir`] if the platform configuration directory cannot be determined
/// (no home directory, heavily sandboxed environments).
///
/// # Examples
/// ```rust
/// if let Ok(dir) = pdf_chat::config_dir() {
///     println!("config at {}", dir.display());
/// }
/// ```
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("com", "pdf-chat", "pdfchat").ok_or(ConfigError::NoConfigDir)?;
    Ok(proj_dirs.config_dir().to_path_buf())
}

/// Default location of the config file.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}
