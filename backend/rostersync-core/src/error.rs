// src/error.rs
use thiserror::Error;

// --- Error Types ---

/// Fatal failures of a reconciliation run. Any of these aborts the whole run;
/// nothing written to the attendance grid before the failure should be treated as durable.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Required structure not found: {0}")]
    StructureNotFound(String),
    #[error("Roster file count ({files}) does not match day count ({days})")]
    ArgumentMismatch { files: usize, days: usize },
    #[error("Day {day} not found in attendance sheet")]
    ColumnNotFound { day: u32 },
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Spreadsheet decoding failed: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid shift mapping entry '{0}', expected keyword=code")]
    MalformedMapping(String),
    #[error("Duplicate shift keyword '{0}'")]
    DuplicateKeyword(String),
    #[error("Environment configuration error: {0}")]
    Env(String),
}

impl From<envy::Error> for ConfigError {
    fn from(e: envy::Error) -> Self {
        ConfigError::Env(e.to_string())
    }
}
