//! Collection overview.
//!
//! Prints the collection name, declared properties, and the total object
//! count. Used by `nh stats` to confirm that provisioning and ingestion
//! landed where expected.

use anyhow::Result;

use crate::config::Config;
use crate::models::CollectionSchema;
use crate::provision::ensure_collection;
use crate::query;
use crate::store::{open_store, Store};

/// Summary of one collection.
#[derive(Debug, Clone)]
pub struct CollectionStats {
    pub backend: String,
    pub schema: CollectionSchema,
    pub created: bool,
    pub total: u64,
}

pub async fn collection_stats(store: &dyn Store, config: &Config) -> Result<CollectionStats> {
    let name = &config.collection.name;
    let handle = ensure_collection(store, name, &CollectionSchema::articles(name)).await?;
    let total = query::count(store, &handle).await?;
    Ok(CollectionStats {
        backend: store.backend_name().to_string(),
        schema: handle.schema().clone(),
        created: handle.was_created(),
        total,
    })
}

/// Run the stats command: provision, count, print.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let outcome = collection_stats(store.as_ref(), config).await;
    store.close().await;
    let stats = outcome?;

    println!("News Harness — Collection Stats");
    println!("===============================");
    println!();
    println!("  Backend:     {}", stats.backend);
    if let Some(url) = &config.store.url {
        println!("  URL:         {}", url);
    }
    println!(
        "  Collection:  {}{}",
        stats.schema.name,
        if stats.created { " (created now)" } else { "" }
    );
    println!("  Objects:     {}", stats.total);
    println!();
    println!("  Properties:");
    for prop in &stats.schema.properties {
        println!("    {:<20} {:?}", prop.name, prop.data_type);
    }
    if stats.total == 0 {
        println!();
        println!("  The collection is empty.");
    }
    println!();

    Ok(())
}
