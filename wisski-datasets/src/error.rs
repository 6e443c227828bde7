//! Dataset error types.

use thiserror::Error;
use wisski_model::ModelError;

/// Result type for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Errors raised while reading, building or flattening tabular data.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No dataset is loaded for the bundle.
    #[error("no dataset for bundle `{0}`")]
    UnknownDataset(String),
}

impl DatasetError {
    /// Returns true when a row or entity lacks the URI it is keyed by.
    pub fn is_missing_identifier(&self) -> bool {
        matches!(self, DatasetError::Model(ModelError::MissingIdentifier(_)))
    }
}
