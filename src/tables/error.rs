/// Errors raised while reading the analyte and alignment lists
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// I/O error reading the table
    #[error("Failed to read table: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed CSV
    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// A required column is absent from the header
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A required cell is empty
    #[error("Row {row}: missing value in column '{column}'")]
    MissingValue { row: usize, column: String },

    /// A cell is not a number where one is expected
    #[error("Row {row}: column '{column}' expects a number, found '{value}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    /// A numeric cell is below zero
    #[error("Row {row}: column '{column}' must not be negative")]
    NegativeValue { row: usize, column: String },
}
