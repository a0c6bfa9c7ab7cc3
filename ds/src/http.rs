//! HTTP implementation of the DocStore boundary

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::DocStore;
use crate::error::StoreError;
use crate::types::{BulkSaveRequest, StoreResponse};

/// Client for the remote document store service
///
/// Endpoints:
///   GET  {base}/sessions/{session_id}/documents/{key}
///   PUT  {base}/sessions/{session_id}/documents/{key}
///   POST {base}/costs/bulk
///
/// Every call is a single blocking request with a fixed timeout. Failures
/// are reported verbatim to the caller; retry is the caller's decision.
pub struct HttpDocStore {
    base_url: String,
    http: Client,
}

impl HttpDocStore {
    /// Build a client against the given base URL with the given timeout
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(StoreError::Network)?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn document_url(&self, session_id: &str, key: &str) -> String {
        format!("{}/sessions/{}/documents/{}", self.base_url, session_id, key)
    }

    /// Map a non-success response to a Rejected error carrying the body verbatim
    async fn reject(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        warn!(status, "store rejected request");
        StoreError::Rejected { status, message }
    }
}

#[async_trait]
impl DocStore for HttpDocStore {
    async fn get_document(&self, session_id: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let url = self.document_url(session_id, key);
        debug!(%url, "get_document: fetching");

        let response = self.http.get(&url).send().await?;

        if response.status().as_u16() == 404 {
            debug!(%url, "get_document: not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let doc: Value = response.json().await?;
        Ok(Some(doc))
    }

    async fn put_document(&self, session_id: &str, key: &str, doc: Value) -> Result<StoreResponse, StoreError> {
        let url = self.document_url(session_id, key);
        debug!(%url, "put_document: writing");

        let response = self.http.put(&url).json(&doc).send().await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let envelope: StoreResponse = response
            .json()
            .await
            .unwrap_or_else(|_| StoreResponse::success("document saved"));
        Ok(envelope)
    }

    async fn save_cost_items(&self, request: BulkSaveRequest) -> Result<StoreResponse, StoreError> {
        if request.scenario_id.is_empty() {
            return Err(StoreError::InvalidResponse(
                "bulk save requires a scenario_id".to_string(),
            ));
        }

        let url = format!("{}/costs/bulk", self.base_url);
        debug!(%url, count = request.cost_items.len(), "save_cost_items: submitting batch");

        let response = self.http.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let envelope: StoreResponse = response.json().await?;
        Ok(envelope)
    }
}
