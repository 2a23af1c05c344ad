//! In-memory [`Store`] implementation.
//!
//! Collections live in a `HashMap` behind a `tokio::sync::RwLock`. Object
//! ids are random UUIDs. Keyword search scores each record by how often the
//! query terms occur in its text properties; records without a hit are not
//! returned.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{ArticleField, ArticleRecord, CollectionSchema, InsertOutcome};

use super::{PropertyFilter, Store, StoreResult};

struct MemCollection {
    schema: CollectionSchema,
    objects: Vec<ArticleRecord>,
}

/// In-memory store for tests and local dry use.
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, MemCollection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(name: &str) -> StoreError {
    StoreError::CollectionNotFound(name.to_string())
}

fn text_properties(record: &ArticleRecord) -> impl Iterator<Item = &str> {
    ArticleField::ALL.into_iter().map(move |f| record.get(f))
}

fn keyword_score(record: &ArticleRecord, terms: &[String]) -> usize {
    text_properties(record)
        .map(|text| {
            let lower = text.to_lowercase();
            terms.iter().map(|t| lower.matches(t.as_str()).count()).sum::<usize>()
        })
        .sum()
}

#[async_trait]
impl Store for InMemoryStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn get_collection(&self, name: &str) -> StoreResult<Option<CollectionSchema>> {
        let collections = self.collections.read().await;
        Ok(collections.get(name).map(|c| c.schema.clone()))
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(&schema.name) {
            return Err(StoreError::AlreadyExists(schema.name.clone()));
        }
        collections.insert(
            schema.name.clone(),
            MemCollection {
                schema: schema.clone(),
                objects: Vec::new(),
            },
        );
        Ok(())
    }

    async fn insert_batch(
        &self,
        collection: &str,
        records: &[ArticleRecord],
    ) -> StoreResult<Vec<InsertOutcome>> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection))?;
        let outcomes: Vec<InsertOutcome> = records
            .iter()
            .map(|record| {
                target.objects.push(record.clone());
                Ok(Uuid::new_v4().to_string())
            })
            .collect();
        Ok(outcomes)
    }

    async fn fetch_objects(
        &self,
        collection: &str,
        filter: Option<PropertyFilter<'_>>,
        limit: usize,
    ) -> StoreResult<Vec<ArticleRecord>> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| not_found(collection))?;

        let field = match filter {
            Some(f) => {
                let field: ArticleField = f.property.parse().map_err(StoreError::Rejected)?;
                Some((field, f.equals))
            }
            None => None,
        };

        Ok(target
            .objects
            .iter()
            .filter(|r| field.map_or(true, |(f, value)| r.get(f) == value))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn keyword_search(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
    ) -> StoreResult<Vec<ArticleRecord>> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| not_found(collection))?;

        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, &ArticleRecord)> = target
            .objects
            .iter()
            .map(|r| (keyword_score(r, &terms), r))
            .filter(|(score, _)| *score > 0)
            .collect();
        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(limit);
        Ok(scored.into_iter().map(|(_, r)| r.clone()).collect())
    }

    async fn count(&self, collection: &str) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| not_found(collection))?;
        Ok(target.objects.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, content: &str, source: &str) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            content: content.to_string(),
            source: source.to_string(),
            ..Default::default()
        }
    }

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .create_collection(&CollectionSchema::articles("News"))
            .await
            .unwrap();
        store
            .insert_batch(
                "News",
                &[
                    article("Tariff talks", "Trade tariff news", "BBC"),
                    article("Weather", "Sunny all week", "FOX"),
                    article("Tariffs again", "tariff tariff tariff", "BBC"),
                ],
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn create_twice_reports_already_exists() {
        let store = InMemoryStore::new();
        let schema = CollectionSchema::articles("News");
        store.create_collection(&schema).await.unwrap();
        let err = store.create_collection(&schema).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn insert_returns_a_fresh_id_per_record() {
        let store = InMemoryStore::new();
        store
            .create_collection(&CollectionSchema::articles("News"))
            .await
            .unwrap();
        let outcomes = store
            .insert_batch("News", &[ArticleRecord::default(), ArticleRecord::default()])
            .await
            .unwrap();
        let ids: Vec<String> = outcomes.into_iter().map(Result::unwrap).collect();
        assert_ne!(ids[0], ids[1]);
        assert!(ids.iter().all(|id| Uuid::parse_str(id).is_ok()));
    }

    #[tokio::test]
    async fn insert_into_missing_collection_fails() {
        let store = InMemoryStore::new();
        let err = store
            .insert_batch("Nope", &[ArticleRecord::default()])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CollectionNotFound(_)));
    }

    #[tokio::test]
    async fn keyword_search_ranks_by_term_frequency() {
        let store = seeded().await;
        let hits = store.keyword_search("News", "tariff", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Tariffs again");
    }

    #[tokio::test]
    async fn empty_keyword_query_returns_nothing() {
        let store = seeded().await;
        let hits = store.keyword_search("News", "   ", 10).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn filter_on_unknown_property_is_rejected() {
        let store = seeded().await;
        let filter = PropertyFilter {
            property: "author",
            equals: "x",
        };
        let err = store
            .fetch_objects("News", Some(filter), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }

    #[tokio::test]
    async fn count_tracks_inserts() {
        let store = seeded().await;
        assert_eq!(store.count("News").await.unwrap(), 3);
    }
}
