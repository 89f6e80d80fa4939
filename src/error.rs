use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HeatmapError>;

#[derive(Debug, Error)]
pub enum HeatmapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Plotting error: {0}")]
    Plot(String),

    #[error("Database not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),

    #[error("Unknown metric: {0} (expected `distance` or `wait`)")]
    UnknownMetric(String),

    #[error("No points left to bin after filtering")]
    EmptyDataset,

    #[error("Column length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("Configuration error: {0}")]
    InvalidConfiguration(String),
}

impl HeatmapError {
    pub fn plot<E: std::fmt::Display>(err: E) -> Self {
        HeatmapError::Plot(err.to_string())
    }
}
