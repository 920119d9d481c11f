/// Errors raised while writing batch artifacts
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// I/O error creating an output file
    #[error("Failed to write report: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV serialization error
    #[error("CSV writing error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}
