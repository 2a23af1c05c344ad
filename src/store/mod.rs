//! Storage abstraction for News Harness.
//!
//! The [`Store`] trait is the seam between the workflows (provisioning,
//! ingestion, queries) and the document store that actually holds the
//! articles. Two backends ship with the crate:
//!
//! - [`memory::InMemoryStore`] keeps collections in process memory.
//! - [`weaviate::WeaviateStore`] talks to a Weaviate instance over HTTP.
//!
//! Ranking for keyword search is owned by the backend. Implementations must
//! be `Send + Sync` to work with the tokio runtime.

pub mod memory;
pub mod weaviate;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::StoreError;
use crate::models::{ArticleRecord, CollectionSchema, InsertOutcome};

pub use memory::InMemoryStore;
pub use weaviate::WeaviateStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Exact-match condition on one collection property.
#[derive(Debug, Clone, Copy)]
pub struct PropertyFilter<'a> {
    pub property: &'a str,
    pub equals: &'a str,
}

/// Abstract document store.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_collection`](Store::get_collection) | Look up a collection's declared schema |
/// | [`create_collection`](Store::create_collection) | Create a collection from a schema |
/// | [`insert_batch`](Store::insert_batch) | Insert records, one outcome per record |
/// | [`fetch_objects`](Store::fetch_objects) | List records, optionally filtered |
/// | [`keyword_search`](Store::keyword_search) | Relevance-ranked keyword lookup |
/// | [`count`](Store::count) | Total records in a collection |
/// | [`close`](Store::close) | Release the connection |
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend identifier (`"memory"`, `"weaviate"`).
    fn backend_name(&self) -> &str;

    /// Returns `None` when no collection with this name exists.
    async fn get_collection(&self, name: &str) -> StoreResult<Option<CollectionSchema>>;

    /// Create a collection. Fails with [`StoreError::AlreadyExists`] if the
    /// name is taken.
    async fn create_collection(&self, schema: &CollectionSchema) -> StoreResult<()>;

    /// Insert a batch of records.
    ///
    /// Records succeed or fail independently: the returned vector has one
    /// entry per input record, in input order, holding either the id the
    /// store assigned or the store's rejection message. `Err` means the
    /// batch as a whole could not be submitted.
    async fn insert_batch(
        &self,
        collection: &str,
        records: &[ArticleRecord],
    ) -> StoreResult<Vec<InsertOutcome>>;

    /// Return at most `limit` records, optionally restricted by `filter`.
    /// Order is backend-defined.
    async fn fetch_objects(
        &self,
        collection: &str,
        filter: Option<PropertyFilter<'_>>,
        limit: usize,
    ) -> StoreResult<Vec<ArticleRecord>>;

    /// Return at most `limit` records ordered by descending relevance.
    async fn keyword_search(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
    ) -> StoreResult<Vec<ArticleRecord>>;

    async fn count(&self, collection: &str) -> StoreResult<u64>;

    /// Release the underlying connection. Called once per workflow, on every
    /// exit path.
    async fn close(&self) {}
}

/// Open the backend named in `config.store.backend`.
///
/// Remote backends are probed for readiness here; an unreachable store is
/// fatal to the workflow.
pub async fn open_store(config: &Config) -> Result<Box<dyn Store>> {
    let store: Box<dyn Store> = match config.store.backend.as_str() {
        "memory" => Box::new(InMemoryStore::new()),
        "weaviate" => Box::new(WeaviateStore::connect(&config.store).await?),
        other => bail!("Unknown store backend: {}", other),
    };
    debug!(backend = store.backend_name(), "store opened");
    Ok(store)
}
