//! The DocStore capability trait

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::types::{BulkSaveRequest, StoreResponse};

/// Remote document store boundary
///
/// Documents are opaque JSON values keyed by `(session_id, key)`. The store
/// is authoritative: callers read the current document, transform it, and
/// write it back whole. Concurrent writers race and the last successful
/// write wins; there is no versioning at this layer.
#[async_trait]
pub trait DocStore: Send + Sync {
    /// Fetch a document, `None` if it does not exist
    async fn get_document(&self, session_id: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Create or replace a document
    async fn put_document(&self, session_id: &str, key: &str, doc: Value) -> Result<StoreResponse, StoreError>;

    /// Submit a reconciled cost batch as one atomic write
    async fn save_cost_items(&self, request: BulkSaveRequest) -> Result<StoreResponse, StoreError>;
}
