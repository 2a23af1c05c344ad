//! Batch ingestion.
//!
//! Normalizes raw records and writes them to a provisioned collection in
//! batches of at most `batch_size`. Records inside a batch succeed or fail
//! independently. Failures are counted across the whole call; once the
//! count exceeds `max_errors` no further batches are sent. Records already
//! accepted stay in the store.

use anyhow::Result;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::IngestError;
use crate::models::{BatchResult, CollectionSchema, FailedRecord, RawRecord};
use crate::provision::{ensure_collection, CollectionHandle};
use crate::record::FieldMapping;
use crate::sources;
use crate::store::{open_store, Store};

/// Ingest `raw_records` with the default field mapping.
pub async fn ingest(
    store: &dyn Store,
    handle: &CollectionHandle,
    raw_records: &[RawRecord],
    batch_size: usize,
    max_errors: usize,
) -> Result<BatchResult, IngestError> {
    ingest_with_mapping(
        store,
        handle,
        raw_records,
        &FieldMapping::default(),
        batch_size,
        max_errors,
    )
    .await
}

/// Ingest `raw_records`, normalizing them with `mapping`.
///
/// Returns `Err` only when a batch could not be submitted at all; rejected
/// records are reported in the [`BatchResult`].
pub async fn ingest_with_mapping(
    store: &dyn Store,
    handle: &CollectionHandle,
    raw_records: &[RawRecord],
    mapping: &FieldMapping,
    batch_size: usize,
    max_errors: usize,
) -> Result<BatchResult, IngestError> {
    let batch_size = batch_size.max(1);
    let records: Vec<_> = raw_records.iter().map(|r| mapping.normalize(r)).collect();
    let mut result = BatchResult::default();

    for (batch_no, batch) in records.chunks(batch_size).enumerate() {
        let offset = batch_no * batch_size;
        let outcomes = store
            .insert_batch(handle.name(), batch)
            .await
            .map_err(|source| IngestError {
                collection: handle.name().to_string(),
                attempted: result.attempted,
                source,
            })?;
        result.attempted += batch.len();

        for (i, record) in batch.iter().enumerate() {
            let message = match outcomes.get(i) {
                Some(Ok(_)) => continue,
                Some(Err(message)) => message.clone(),
                None => "store reported no outcome for this record".to_string(),
            };
            result.failed += 1;
            result.failures.push(FailedRecord {
                index: offset + i,
                record: record.clone(),
                message,
            });
        }

        debug!(
            batch = batch_no,
            size = batch.len(),
            attempted = result.attempted,
            failed = result.failed,
            "batch submitted"
        );

        if result.failed > max_errors {
            warn!(
                failed = result.failed,
                max_errors,
                remaining = records.len() - result.attempted,
                "too many failed records, stopping ingestion"
            );
            result.aborted = true;
            break;
        }
    }

    info!(
        collection = handle.name(),
        attempted = result.attempted,
        failed = result.failed,
        "ingestion finished"
    );
    Ok(result)
}

/// Options for [`run_ingest`]; `None` falls back to the config values.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub batch_size: Option<usize>,
    pub max_errors: Option<usize>,
    pub limit: Option<usize>,
    pub dry_run: bool,
}

/// CLI entry point: load a records file, provision, ingest, and print a summary.
pub async fn run_ingest(config: &Config, path: &Path, opts: &IngestOptions) -> Result<()> {
    let mut raw = sources::load_raw_records(path)?;
    let read = raw.len();
    if let Some(lim) = opts.limit {
        raw.truncate(lim);
    }

    let batch_size = opts.batch_size.unwrap_or(config.ingest.batch_size).max(1);
    let max_errors = opts.max_errors.unwrap_or(config.ingest.max_errors);

    if opts.dry_run {
        println!("ingest {} (dry-run)", path.display());
        println!("  records read: {}", read);
        println!("  records to ingest: {}", raw.len());
        println!("  batches: {}", raw.len().div_ceil(batch_size));
        return Ok(());
    }

    let store = open_store(config).await?;
    let outcome = ingest_into(store.as_ref(), config, &raw, batch_size, max_errors).await;
    store.close().await;
    let (handle, result, total) = outcome?;

    println!("ingest {}", path.display());
    println!("  collection: {}", handle.name());
    println!("  records read: {}", read);
    println!("  attempted: {}", result.attempted);
    println!("  succeeded: {}", result.succeeded());
    println!("  failed: {}", result.failed);
    if let Some(first) = result.failures.first() {
        println!(
            "  first failure: record {} ({:?}): {}",
            first.index, first.record.title, first.message
        );
    }
    if result.aborted {
        println!(
            "  stopped early: more than {} failed records, {} not submitted",
            max_errors,
            raw.len() - result.attempted
        );
    }
    println!("  total objects in collection: {}", total);
    println!("ok");

    Ok(())
}

async fn ingest_into(
    store: &dyn Store,
    config: &Config,
    raw: &[RawRecord],
    batch_size: usize,
    max_errors: usize,
) -> Result<(CollectionHandle, BatchResult, u64)> {
    let name = &config.collection.name;
    let handle = ensure_collection(store, name, &CollectionSchema::articles(name)).await?;
    let mapping = config.mapping.field_mapping();
    let result =
        ingest_with_mapping(store, &handle, raw, &mapping, batch_size, max_errors).await?;
    let total = store.count(handle.name()).await?;
    Ok((handle, result, total))
}
