use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the vodseek library and CLI.
///
/// Fetch failures inside a search never reach this type directly; the
/// orchestrator records them on its state and the CLI maps a failed search
/// to [`VodseekError::Search`].
#[derive(Error, Debug)]
pub enum VodseekError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every problem found by the config validator, in check order
    #[error("Invalid configuration: {}", join_problems(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// A single key failed to parse or was overridden with a bad value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// SQLite or connection pool failure in the persisted store
    #[error("Store error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A value was too large for the persisted store
    #[error("Storage quota exceeded for {key}: {size} bytes > {limit} bytes")]
    StorageQuota { key: String, size: usize, limit: u64 },

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// A search ended in the failed state
    #[error("Search failed: {0}")]
    Search(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// One configuration problem, addressed by its dotted key (`retry.base_delay`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn join_problems(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, VodseekError>;
