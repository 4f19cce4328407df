use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("data source {path:?} unavailable: {message}")]
    DataSource { path: PathBuf, message: String },

    #[error("row {line} of {file} could not be parsed: {message}")]
    RowParse {
        file: String,
        line: u64,
        message: String,
    },

    #[error("row {line} of {file} has no ISIN or NSE code")]
    IdentityMissing { file: String, line: u64 },

    #[error("identity directory unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("no instrument matches '{0}'")]
    NotFound(String),

    #[error("invalid filter criteria: {0}")]
    InvalidCriteria(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScreenerError {
    pub fn data_source(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ScreenerError::DataSource {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScreenerError>;
