use std::{io, path::PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArrowError>;

#[derive(Debug, Error)]
pub enum ArrowError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid CSV Header: {0}")]
    CsvHeader(String),

    #[error("Invalid CSV row {row}: expected at least {expected} columns, got {got}")]
    CsvRow {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("Invalid {column} at row {row}: {value}")]
    ValueParse {
        row: usize,
        column: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("Invalid tier table: {0}")]
    TierTable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create file {path}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<toml::de::Error> for ArrowError {
    fn from(err: toml::de::Error) -> Self {
        ArrowError::ConfigError(format!("TOML parse error: {}", err))
    }
}
