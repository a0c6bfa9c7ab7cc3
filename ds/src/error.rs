//! Document store error types

use thiserror::Error;

/// Errors that can occur talking to the persistence boundary
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store rejected the request with an application-level error.
    /// The message is the boundary's response body, passed through verbatim.
    #[error("Store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid store response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// HTTP status of the rejection, if this is a rejection
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
