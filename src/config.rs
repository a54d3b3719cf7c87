//! This module provides functionality for loading and resolving the application's
//! configuration.
//!
//! Values come from three layers, later ones winning:
//!
//! 1. built-in defaults ([`PdfChatConfig::default`]),
//! 2. the YAML config file (`<config_dir>/config.yaml`, or `--config`),
//! 3. command-line flags and their environment variables ([`ChatArgs`]).
//!
//! Every field in the file is optional. A complete file looks like:
//!
//! ```yaml
//! provider: gemini          # or: openai
//! model: gemini-1.5-pro-latest
//! api_base: null            # provider default when unset
//! api_key: null             # prefer API_KEY in the environment
//! pdf_path: null
//! max_retries: 3
//! rate_limit:
//!   min_interval_secs: 4
//!   max_requests_per_window: 15
//!   window_secs: 60
//! splitter:
//!   kind: fixed             # or: recursive
//!   chunk_size: 500
//!   chunk_overlap: 100
//! prompt:
//!   language: English
//!   max_sentences: "2-3"
//! ```

use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::{
    api::GEMINI_OPENAI_API_BASE,
    assistant::DEFAULT_MAX_RETRIES,
    commands::ChatArgs,
    error::ConfigError,
    gemini::GEMINI_API_BASE,
    rate_limiter::RateLimitConfig,
    splitter::SplitterConfig,
    template::PromptTemplate,
};

/// Fallback environment variable for the API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Which chat API to talk to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Gemini's native REST API.
    #[default]
    Gemini,
    /// Any OpenAI-compatible chat-completions API.
    #[value(name = "openai")]
    #[serde(rename = "openai")]
    OpenAi,
}

impl Provider {
    /// Base URL used when none is configured.
    pub fn default_api_base(&self) -> &'static str {
        match self {
            Provider::Gemini => GEMINI_API_BASE,
            Provider::OpenAi => GEMINI_OPENAI_API_BASE,
        }
    }
}

/// Represents the application's configuration.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct PdfChatConfig {
    /// Chat API flavour.
    pub provider: Provider,

    /// The name of the model to be used for generating responses.
    pub model: String,

    /// Base URL of the API; the provider default when `None`.
    pub api_base: Option<String>,

    /// The API key. Normally supplied through `API_KEY` instead.
    pub api_key: Option<String>,

    /// The PDF to load.
    pub pdf_path: Option<PathBuf>,

    /// Attempts per question when the API reports quota errors.
    pub max_retries: u32,

    pub rate_limit: RateLimitConfig,

    pub splitter: SplitterConfig,

    pub prompt: PromptTemplate,
}

impl Default for PdfChatConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            model: "gemini-1.5-pro-latest".to_string(),
            api_base: None,
            api_key: None,
            pdf_path: None,
            max_retries: DEFAULT_MAX_RETRIES,
            rate_limit: RateLimitConfig::default(),
            splitter: SplitterConfig::default(),
            prompt: PromptTemplate::default(),
        }
    }
}

impl PdfChatConfig {
    /// Layers `args` over this configuration.
    pub fn apply_args(&mut self, args: &ChatArgs) {
        if let Some(pdf) = &args.pdf {
            self.pdf_path = Some(pdf.clone());
        }
        if let Some(key) = &args.api_key {
            self.api_key = Some(key.clone());
        }
        if let Some(provider) = args.provider {
            self.provider = provider;
        }
        if let Some(model) = &args.model {
            self.model = model.clone();
        }
        if let Some(base) = &args.api_base {
            self.api_base = Some(base.clone());
        }
        if let Some(language) = &args.language {
            self.prompt.language = language.clone();
        }
    }

    /// Effective base URL.
    pub fn api_base(&self) -> &str {
        self.api_base
            .as_deref()
            .unwrap_or_else(|| self.provider.default_api_base())
    }

    /// Effective API key, falling back to `GEMINI_API_KEY`. Empty when none is set; session
    /// setup rejects that.
    pub fn api_key(&self) -> String {
        self.api_key
            .clone()
            .or_else(|| env::var(GEMINI_API_KEY_ENV).ok())
            .unwrap_or_default()
    }

    /// The PDF path, which must be configured somewhere.
    pub fn pdf_path(&self) -> Result<&Path, ConfigError> {
        self.pdf_path.as_deref().ok_or(ConfigError::MissingPdfPath)
    }
}

/// Loads the application's configuration from a YAML file.
///
/// # Errors
/// [`ConfigError::Read`] if the file cannot be read, [`ConfigError::Parse`] if it is not a
/// valid configuration.
///
/// # Examples
///
/// ```no_run
/// use pdf_chat::config::load_config;
///
/// match load_config("/path/to/config.yaml") {
///     Ok(config) => println!("{:?}", config),
///     Err(err) => eprintln!("Error loading config: {}", err),
/// }
/// ```
pub fn load_config(file: impl AsRef<Path>) -> Result<PdfChatConfig, ConfigError> {
    let path = file.as_ref();
    debug!("Loading config from: {}", path.display());
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the full configuration for a chat session.
///
/// An explicit `--config` file must exist. The default file is optional; without it the
/// built-in defaults are used.
pub fn resolve(args: &ChatArgs, default_path: Option<&Path>) -> Result<PdfChatConfig, ConfigError> {
    let mut config = match (&args.config, default_path) {
        (Some(explicit), _) => load_config(explicit)?,
        (None, Some(path)) if path.exists() => load_config(path)?,
        (None, _) => {
            info!("No config file found, using defaults");
            PdfChatConfig::default()
        }
    };
    config.apply_args(args);
    Ok(config)
}

/// Writes the default configuration to `path`, creating parent directories.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::Write {
            path: path.to_path_buf(),
            reason: "file exists (use --force to overwrite)".to_string(),
        });
    }
    if let Some(parent) = path.parent() {
        info!("Creating config directory: {}", parent.display());
        fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }

    let yaml = serde_yaml::to_string(&PdfChatConfig::default()).map_err(|e| ConfigError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    info!("Creating config file: {}", path.display());
    fs::write(path, yaml).map_err(|e| ConfigError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::SplitterKind;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_load_config_valid_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
provider: openai
model: "example_model"
api_base: "http://example.com/v1"
pdf_path: "docs/manual.pdf"
rate_limit:
  min_interval_secs: 2
splitter:
  kind: recursive
prompt:
  language: Turkish
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.provider, Provider::OpenAi);
        assert_eq!(config.model, "example_model");
        assert_eq!(config.api_base(), "http://example.com/v1");
        assert_eq!(config.pdf_path().unwrap(), Path::new("docs/manual.pdf"));
        assert_eq!(config.rate_limit.min_interval_secs, 2);
        assert_eq!(config.rate_limit.max_requests_per_window, 15);
        assert_eq!(config.splitter.kind, SplitterKind::Recursive);
        assert_eq!(config.splitter.chunk_size, 500);
        assert_eq!(config.prompt.language, "Turkish");
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_load_config_invalid_file() {
        assert!(matches!(
            load_config("non/existent/path"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_load_config_invalid_format() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, r#"invalid: config: format"#).unwrap();
        assert!(matches!(
            load_config(temp_file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn flags_override_file_and_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "model: from-file\npdf_path: file.pdf").unwrap();

        let args = ChatArgs {
            config: Some(temp_file.path().to_path_buf()),
            pdf: Some(PathBuf::from("flag.pdf")),
            language: Some("German".to_string()),
            ..ChatArgs::default()
        };
        let config = resolve(&args, None).unwrap();

        assert_eq!(config.pdf_path().unwrap(), Path::new("flag.pdf"));
        assert_eq!(config.model, "from-file");
        assert_eq!(config.prompt.language, "German");
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.api_base(), GEMINI_API_BASE);
    }

    #[test]
    fn missing_default_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = resolve(&ChatArgs::default(), Some(&dir.path().join("config.yaml"))).unwrap();
        assert_eq!(config, PdfChatConfig::default());
        assert!(matches!(config.pdf_path(), Err(ConfigError::MissingPdfPath)));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let args = ChatArgs {
            config: Some(PathBuf::from("non/existent/config.yaml")),
            ..ChatArgs::default()
        };
        assert!(resolve(&args, None).is_err());
    }

    #[test]
    fn default_config_round_trips_through_init() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        write_default_config(&path, false).unwrap();
        assert_eq!(load_config(&path).unwrap(), PdfChatConfig::default());

        assert!(write_default_config(&path, false).is_err());
        assert!(write_default_config(&path, true).is_ok());
    }
}
