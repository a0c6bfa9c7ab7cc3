//! docstore - remote JSON document store client
//!
//! The trip-planning backend persists each session's itinerary as an opaque
//! JSON document keyed by session and document name, and pushes reconciled
//! cost batches through a single bulk-save endpoint. This crate owns that
//! boundary: the `DocStore` trait, the HTTP implementation used in
//! production, and an in-memory implementation for tests and offline runs.
//!
//! The store never interprets document contents. Callers serialize their own
//! domain types to `serde_json::Value` before handing them over.

pub mod client;
pub mod error;
pub mod http;
pub mod memory;
pub mod types;

pub use client::DocStore;
pub use error::StoreError;
pub use http::HttpDocStore;
pub use memory::MemoryDocStore;
pub use types::{BulkSaveRequest, StoreResponse};

/// Default request timeout for the persistence boundary, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Document key under which a session's itinerary is stored
pub const ITINERARY_DOC_KEY: &str = "itinerary";
