//! Error taxonomy for the store, provisioning, ingestion, and query layers.
//!
//! Backends report [`StoreError`]. Each component wraps it in its own
//! error kind so callers can match on *which* operation failed while still
//! reaching the store cause through [`std::error::Error::source`].
//!
//! Per-record ingestion rejections are not errors at this level; they are
//! collected in [`BatchResult`](crate::models::BatchResult).

use thiserror::Error;

/// Failure reported by a [`Store`](crate::store::Store) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached (connect, timeout, TLS, broken body).
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// The store answered with a non-success HTTP status.
    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A collection with this name already exists.
    #[error("collection already exists: {0}")]
    AlreadyExists(String),

    /// The collection does not exist in the store.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// The store answered, but the payload could not be understood.
    #[error("invalid store response: {0}")]
    InvalidResponse(String),

    /// The store refused the request (e.g. malformed schema or query).
    #[error("store rejected request: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::InvalidResponse(err.to_string())
        } else {
            StoreError::Unreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::InvalidResponse(err.to_string())
    }
}

/// Looking up or creating the target collection failed.
#[derive(Debug, Error)]
#[error("failed to provision collection '{collection}': {source}")]
pub struct ProvisionError {
    pub collection: String,
    #[source]
    pub source: StoreError,
}

/// The store connection failed while batches were being submitted.
///
/// Records accepted by earlier batches stay persisted; `attempted` says how
/// many records had been sent before the failure.
#[derive(Debug, Error)]
#[error("ingestion into '{collection}' failed after {attempted} records: {source}")]
pub struct IngestError {
    pub collection: String,
    pub attempted: usize,
    #[source]
    pub source: StoreError,
}

/// A read against the collection failed.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The store was unreachable or the collection handle is no longer valid.
    #[error("query against '{collection}' failed: {source}")]
    Store {
        collection: String,
        #[source]
        source: StoreError,
    },

    /// The filter names a property the collection does not declare.
    #[error("collection '{collection}' has no property '{field}'")]
    UnknownField { collection: String, field: String },
}
