use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Required column '{column}' is missing from the header row")]
    Schema { column: String },

    #[error("Row {row}, column '{column}': cannot parse '{value}': {reason}")]
    Parse {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error("Row {row} violates a table invariant: {reason}")]
    Invariant { row: usize, reason: String },

    #[error("Failed to open dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read CSV data: {0}")]
    Csv(#[from] csv::Error),
}

impl DatasetError {
    /// True for errors that concern a single row and may be skipped under a
    /// lenient policy.
    pub fn is_row_level(&self) -> bool {
        matches!(self, DatasetError::Parse { .. } | DatasetError::Invariant { .. })
    }
}
