//! Read-side gateway over a provisioned collection.
//!
//! Three lookups, all read-only:
//!
//! - [`fetch_by_filter`]: exact match on one property, store-defined order.
//! - [`search_by_keyword`]: relevance-ranked by the store (BM25 on Weaviate).
//! - [`fetch_all`]: unfiltered listing for inspection.
//!
//! Each returns at most `limit` records. Zero matches is an empty vector,
//! not an error.

use anyhow::Result;

use crate::config::Config;
use crate::error::{QueryError, StoreError};
use crate::models::{ArticleField, ArticleRecord, CollectionSchema};
use crate::provision::{ensure_collection, CollectionHandle};
use crate::store::{open_store, PropertyFilter, Store};

const CONTENT_PREVIEW_CHARS: usize = 200;

fn store_error(handle: &CollectionHandle) -> impl Fn(StoreError) -> QueryError + '_ {
    move |source| QueryError::Store {
        collection: handle.name().to_string(),
        source,
    }
}

fn capped(mut records: Vec<ArticleRecord>, limit: usize) -> Vec<ArticleRecord> {
    records.truncate(limit);
    records
}

/// Records whose `field_name` equals `equals_value` exactly.
///
/// `field_name` is a store property name; `publishedDate` is accepted as an
/// alias of `published_date`. Properties the handle's schema does not
/// declare fail with [`QueryError::UnknownField`].
pub async fn fetch_by_filter(
    store: &dyn Store,
    handle: &CollectionHandle,
    field_name: &str,
    equals_value: &str,
    limit: usize,
) -> Result<Vec<ArticleRecord>, QueryError> {
    let field = field_name.parse::<ArticleField>().ok();
    let property: &str = match field {
        Some(f) => f.property_name(),
        None => field_name,
    };
    if !handle.schema().has_property(property) {
        return Err(QueryError::UnknownField {
            collection: handle.name().to_string(),
            field: field_name.to_string(),
        });
    }
    if limit == 0 {
        return Ok(Vec::new());
    }

    let filter = PropertyFilter {
        property,
        equals: equals_value,
    };
    let records = store
        .fetch_objects(handle.name(), Some(filter), limit)
        .await
        .map_err(store_error(handle))?;
    // Collections created elsewhere may use word tokenization, where the
    // store's `Equal` matches by token and ignores case.
    let exact = records
        .into_iter()
        .filter(|r| field.map_or(true, |f| r.get(f) == equals_value))
        .collect();
    Ok(capped(exact, limit))
}

/// Records ranked by the store's keyword relevance, best first.
pub async fn search_by_keyword(
    store: &dyn Store,
    handle: &CollectionHandle,
    query: &str,
    limit: usize,
) -> Result<Vec<ArticleRecord>, QueryError> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let records = store
        .keyword_search(handle.name(), query, limit)
        .await
        .map_err(store_error(handle))?;
    Ok(capped(records, limit))
}

/// Up to `limit` records, unfiltered.
pub async fn fetch_all(
    store: &dyn Store,
    handle: &CollectionHandle,
    limit: usize,
) -> Result<Vec<ArticleRecord>, QueryError> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let records = store
        .fetch_objects(handle.name(), None, limit)
        .await
        .map_err(store_error(handle))?;
    Ok(capped(records, limit))
}

/// Total number of records in the collection.
pub async fn count(store: &dyn Store, handle: &CollectionHandle) -> Result<u64, QueryError> {
    store
        .count(handle.name())
        .await
        .map_err(store_error(handle))
}

/// Which lookup a CLI query command runs.
#[derive(Debug, Clone)]
pub enum QueryRequest {
    Filter { field: String, value: String },
    Keyword { query: String },
    All,
}

/// CLI entry point: provision, run one lookup, print the records.
pub async fn run_query(config: &Config, request: &QueryRequest, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(config.query.default_limit);
    let store = open_store(config).await?;
    let outcome = query_with(store.as_ref(), config, request, limit).await;
    store.close().await;
    let records = outcome?;

    match request {
        QueryRequest::Filter { field, value } => {
            println!("filter {} = {:?}", field, value);
        }
        QueryRequest::Keyword { query } => {
            println!("search {:?}", query);
        }
        QueryRequest::All => {
            println!("list");
        }
    }

    if records.is_empty() {
        println!("No articles found.");
        return Ok(());
    }

    println!("Found {} article(s)", records.len());
    for (i, record) in records.iter().enumerate() {
        println!();
        print_record(i + 1, record);
    }

    Ok(())
}

async fn query_with(
    store: &dyn Store,
    config: &Config,
    request: &QueryRequest,
    limit: usize,
) -> Result<Vec<ArticleRecord>> {
    let name = &config.collection.name;
    let handle = ensure_collection(store, name, &CollectionSchema::articles(name)).await?;
    let records = match request {
        QueryRequest::Filter { field, value } => {
            fetch_by_filter(store, &handle, field, value, limit).await?
        }
        QueryRequest::Keyword { query } => search_by_keyword(store, &handle, query, limit).await?,
        QueryRequest::All => fetch_all(store, &handle, limit).await?,
    };
    Ok(records)
}

fn print_record(n: usize, record: &ArticleRecord) {
    println!("{}. {}", n, or_na(&record.title));
    println!("    source: {}", or_na(&record.source));
    println!("    url: {}", or_na(&record.url));
    println!("    published: {}", or_na(&record.published_date));
    println!("    content: {}", preview(&record.content));
}

fn or_na(s: &str) -> &str {
    if s.is_empty() {
        "N/A"
    } else {
        s
    }
}

/// First [`CONTENT_PREVIEW_CHARS`] characters, with `...` when cut.
fn preview(content: &str) -> String {
    let flat = content.replace('\n', " ");
    let flat = flat.trim();
    if flat.is_empty() {
        return "N/A".to_string();
    }
    match flat.char_indices().nth(CONTENT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_cuts_on_char_boundary() {
        let long = "é".repeat(250);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), CONTENT_PREVIEW_CHARS + 3);
    }

    #[test]
    fn preview_keeps_short_content() {
        assert_eq!(preview("short\nbody"), "short body");
        assert_eq!(preview(""), "N/A");
    }
}
