//! Collection provisioning.
//!
//! Every workflow starts by making sure its target collection exists.
//! [`ensure_collection`] looks the collection up and creates it only when it
//! is missing. An existing collection is trusted as-is; its schema is not
//! compared against the requested one.
//!
//! Lookup-then-create is not atomic. When a concurrent caller wins the race
//! and creation fails with "already exists", the collection is looked up
//! again and that handle is returned instead of an error.

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ProvisionError, StoreError};
use crate::models::CollectionSchema;
use crate::store::{open_store, Store};

/// Reference to a provisioned collection, scoping reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionHandle {
    schema: CollectionSchema,
    created: bool,
}

impl CollectionHandle {
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Schema as the store reports it (or as created).
    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    /// True if this call created the collection.
    pub fn was_created(&self) -> bool {
        self.created
    }
}

/// Return a handle to collection `name`, creating it from `schema` if absent.
///
/// `schema.name` is ignored in favor of `name`. No retry is attempted for
/// store failures; the caller decides what to do with a [`ProvisionError`].
pub async fn ensure_collection(
    store: &dyn Store,
    name: &str,
    schema: &CollectionSchema,
) -> Result<CollectionHandle, ProvisionError> {
    let fail = |source: StoreError| ProvisionError {
        collection: name.to_string(),
        source,
    };

    if let Some(existing) = store.get_collection(name).await.map_err(fail)? {
        info!(collection = name, "found existing collection");
        return Ok(CollectionHandle {
            schema: existing,
            created: false,
        });
    }

    let wanted = CollectionSchema {
        name: name.to_string(),
        properties: schema.properties.clone(),
    };

    match store.create_collection(&wanted).await {
        Ok(()) => {
            info!(
                collection = name,
                properties = wanted.properties.len(),
                "created collection"
            );
            Ok(CollectionHandle {
                schema: wanted,
                created: true,
            })
        }
        Err(StoreError::AlreadyExists(_)) => {
            warn!(collection = name, "collection appeared concurrently, re-fetching");
            match store.get_collection(name).await.map_err(fail)? {
                Some(existing) => Ok(CollectionHandle {
                    schema: existing,
                    created: false,
                }),
                None => Err(fail(StoreError::CollectionNotFound(name.to_string()))),
            }
        }
        Err(e) => Err(fail(e)),
    }
}

/// CLI entry point: make sure the configured collection exists.
pub async fn run_provision(config: &Config) -> Result<()> {
    let name = &config.collection.name;
    let store = open_store(config).await?;
    let outcome = ensure_collection(store.as_ref(), name, &CollectionSchema::articles(name)).await;
    store.close().await;
    let handle = outcome?;

    if handle.was_created() {
        println!("Created collection '{}'.", handle.name());
    } else {
        println!("Found existing collection '{}'.", handle.name());
    }
    for prop in &handle.schema().properties {
        println!("  {:<20} {:?}", prop.name, prop.data_type);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn creates_missing_collection() {
        let store = InMemoryStore::new();
        let handle = ensure_collection(&store, "News", &CollectionSchema::articles("ignored"))
            .await
            .unwrap();
        assert!(handle.was_created());
        assert_eq!(handle.name(), "News");
        assert!(store.get_collection("News").await.unwrap().is_some());
        assert!(store.get_collection("ignored").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn existing_collection_is_trusted() {
        let store = InMemoryStore::new();
        let narrow = CollectionSchema {
            name: "News".to_string(),
            properties: Vec::new(),
        };
        store.create_collection(&narrow).await.unwrap();

        let handle = ensure_collection(&store, "News", &CollectionSchema::articles("News"))
            .await
            .unwrap();
        assert!(!handle.was_created());
        assert!(handle.schema().properties.is_empty());
    }
}
