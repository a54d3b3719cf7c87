//! Error types for pdf_chat.
//!
//! Startup failures ([`LoadError`], [`ModelSetupError`], [`ConfigError`]) are fatal and
//! stop the program. [`ApiError`] is per question: the assistant turns it into a display
//! string, optionally after waiting out a [`QuotaExceeded`](crate::quota::QuotaExceeded).

use std::path::PathBuf;
use thiserror::Error;

use crate::quota::{self, QuotaExceeded};

/// Result type alias for pdf_chat operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Umbrella error for everything that can abort startup.
#[derive(Error, Debug)]
pub enum Error {
    /// The document could not be loaded.
    #[error("could not load document: {0}")]
    Load(#[from] LoadError),

    /// The chat model could not be set up.
    #[error("could not set up the model: {0}")]
    ModelSetup(#[from] ModelSetupError),

    /// Configuration could not be read or resolved.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Document loading errors.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The PDF could not be parsed.
    #[error("failed to parse PDF {path}: {reason}")]
    Parse {
        /// Path of the PDF.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// Extraction succeeded but produced nothing to retrieve from.
    #[error("no extractable text in {path}")]
    NoText {
        /// Path of the PDF.
        path: PathBuf,
    },

    /// Splitter settings are unusable.
    #[error("invalid splitter settings: {reason}")]
    Splitter {
        /// Why the settings were rejected.
        reason: String,
    },
}

/// Errors raised while creating a chat session.
#[derive(Error, Debug)]
pub enum ModelSetupError {
    /// No API key was supplied.
    #[error("no API key configured; pass --api-key or set API_KEY")]
    MissingApiKey,

    /// The configured base URL is not a URL.
    #[error("invalid API base URL {url}: {reason}")]
    InvalidApiBase {
        /// Offending value.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Failures of a single remote send.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered with a non-success status. The body is kept verbatim.
    #[error("API error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// An error reported by the provider client library.
    #[error("{0}")]
    Provider(String),

    /// The API answered but without any text.
    #[error("the model returned an empty reply")]
    EmptyReply,
}

impl ApiError {
    /// The quota sub-case of this error, if the message marks one.
    pub fn quota(&self) -> Option<QuotaExceeded> {
        quota::detect(&self.to_string())
    }
}

impl From<async_openai::error::OpenAIError> for ApiError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        use async_openai::error::OpenAIError;
        match err {
            OpenAIError::Reqwest(e) => ApiError::Transport(e.to_string()),
            other => ApiError::Provider(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for [`PdfChatConfig`](crate::config::PdfChatConfig).
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file could not be written.
    #[error("failed to write config {path}: {reason}")]
    Write {
        /// Config file path.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The platform configuration directory could not be determined.
    #[error("unable to determine config directory")]
    NoConfigDir,

    /// No PDF was named anywhere.
    #[error("no PDF path configured; pass --pdf or set PDF_PATH")]
    MissingPdfPath,
}
