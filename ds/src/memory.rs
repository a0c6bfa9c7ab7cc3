//! In-memory DocStore for tests and offline runs

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::client::DocStore;
use crate::error::StoreError;
use crate::types::{BulkSaveRequest, StoreResponse};

/// HashMap-backed document store
///
/// Mirrors the HTTP store's observable behavior: documents keyed by
/// `(session_id, key)`, bulk saves recorded per scenario, a missing
/// scenario id rejected the same way the real boundary rejects it.
#[derive(Default)]
pub struct MemoryDocStore {
    documents: Mutex<HashMap<(String, String), Value>>,
    cost_batches: Mutex<Vec<BulkSaveRequest>>,
    /// When set, every write is rejected with this message (for failure-path tests)
    reject_writes: Mutex<Option<String>>,
}

impl MemoryDocStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with the given message
    pub fn reject_writes(&self, message: impl Into<String>) {
        *self.reject_writes.lock().unwrap() = Some(message.into());
    }

    /// Stop rejecting writes
    pub fn accept_writes(&self) {
        *self.reject_writes.lock().unwrap() = None;
    }

    /// All bulk-save requests received, in order
    pub fn cost_batches(&self) -> Vec<BulkSaveRequest> {
        self.cost_batches.lock().unwrap().clone()
    }

    /// Number of stored documents
    pub fn document_count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    /// Drop all stored state
    pub fn clear(&self) {
        self.documents.lock().unwrap().clear();
        self.cost_batches.lock().unwrap().clear();
    }

    fn check_rejection(&self) -> Result<(), StoreError> {
        if let Some(message) = self.reject_writes.lock().unwrap().clone() {
            return Err(StoreError::Rejected { status: 500, message });
        }
        Ok(())
    }
}

#[async_trait]
impl DocStore for MemoryDocStore {
    async fn get_document(&self, session_id: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let docs = self.documents.lock().unwrap();
        Ok(docs.get(&(session_id.to_string(), key.to_string())).cloned())
    }

    async fn put_document(&self, session_id: &str, key: &str, doc: Value) -> Result<StoreResponse, StoreError> {
        self.check_rejection()?;
        debug!(%session_id, %key, "put_document: storing");
        self.documents
            .lock()
            .unwrap()
            .insert((session_id.to_string(), key.to_string()), doc);
        Ok(StoreResponse::success("document saved"))
    }

    async fn save_cost_items(&self, request: BulkSaveRequest) -> Result<StoreResponse, StoreError> {
        self.check_rejection()?;
        if request.scenario_id.is_empty() {
            return Err(StoreError::Rejected {
                status: 400,
                message: "scenario_id is required".to_string(),
            });
        }
        let count = request.cost_items.len();
        debug!(scenario_id = %request.scenario_id, count, "save_cost_items: recording batch");
        self.cost_batches.lock().unwrap().push(request);
        Ok(StoreResponse::success(format!("saved {count} cost items")))
    }
}
