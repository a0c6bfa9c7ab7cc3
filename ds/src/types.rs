//! Wire shapes for the persistence boundary

use serde::{Deserialize, Serialize};

/// Bulk cost-item save request
///
/// One request carries the full reconciled batch for a destination. The
/// boundary applies it atomically; there is no per-item retry on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSaveRequest {
    /// Session scoping the write
    pub session_id: String,

    /// Scenario receiving the cost items (required by the boundary)
    pub scenario_id: String,

    /// Canonical destination id the batch belongs to
    pub destination_id: String,

    /// Display name of the destination
    pub destination_name: String,

    /// Reconciled cost items, serialized by the caller
    pub cost_items: Vec<serde_json::Value>,
}

/// Application-level response envelope from the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreResponse {
    /// "success" or "error"
    pub status: String,

    /// Human-readable outcome description
    #[serde(default)]
    pub message: String,
}

impl StoreResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
