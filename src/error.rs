use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Unrecognized format: {0}")]
    UnrecognizedFormat(String),

    #[error("Malformed {field}: {value:?}")]
    MalformedField { field: &'static str, value: String },

    #[error("Invalid reconciliation input: {0}")]
    ReconciliationInputInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
