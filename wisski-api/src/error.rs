//! API client error types.

use thiserror::Error;
use wisski_datasets::DatasetError;
use wisski_model::ModelError;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur while talking to a WissKI instance.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered with a non-success status.
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote confirmed a different number of entities than were sent.
    #[error("entity batch mismatch: sent {sent}, received {received}")]
    BatchMismatch { sent: usize, received: usize },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// The HTTP status of a failed request, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if this error represents a 404 response.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
