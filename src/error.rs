use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected input file '{}' does not exist", path.display())]
    InputNotFound { path: PathBuf },

    #[error("No numeric columns detected for aggregation (temperature/rainfall/humidity)")]
    NoNumericFields,

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Chart rendering error: {0}")]
    Chart(String),

    #[error("{failed} artifact(s) could not be written")]
    ArtifactsFailed { failed: usize },
}

impl<E: std::error::Error + Send + Sync + 'static>
    From<plotters::drawing::DrawingAreaErrorKind<E>> for ProcessingError
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ProcessingError::Chart(format!("Plot drawing error: {}", err))
    }
}
