use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("store write failed for key '{key}': {reason}")]
    StoreWriteFailure { key: String, reason: String },

    #[error("invalid period: start {start} is after end {end}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("export error: {0}")]
    ExportError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
