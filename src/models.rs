//! Core data models used throughout News Harness.
//!
//! These types describe the article records that flow from raw source
//! files into the store, the schema the store holds them under, and the
//! outcome of an ingestion run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw item produced by an upstream source before normalization.
///
/// Keys vary per source (`"Title"`, `"News Source"`, `"publishedAt"`, ...).
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Normalized article stored in the collection.
///
/// Every field is always present; missing source data becomes `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "published_date", default)]
    pub published_date: String,
    #[serde(default)]
    pub source: String,
}

impl ArticleRecord {
    /// Value of a single field.
    pub fn get(&self, field: ArticleField) -> &str {
        match field {
            ArticleField::Title => &self.title,
            ArticleField::Content => &self.content,
            ArticleField::Url => &self.url,
            ArticleField::PublishedDate => &self.published_date,
            ArticleField::Source => &self.source,
        }
    }

    fn slot(&mut self, field: ArticleField) -> &mut String {
        match field {
            ArticleField::Title => &mut self.title,
            ArticleField::Content => &mut self.content,
            ArticleField::Url => &mut self.url,
            ArticleField::PublishedDate => &mut self.published_date,
            ArticleField::Source => &mut self.source,
        }
    }

    pub(crate) fn set(&mut self, field: ArticleField, value: String) {
        *self.slot(field) = value;
    }
}

/// The five properties of an [`ArticleRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArticleField {
    Title,
    Content,
    Url,
    PublishedDate,
    Source,
}

impl ArticleField {
    pub const ALL: [ArticleField; 5] = [
        ArticleField::Title,
        ArticleField::Content,
        ArticleField::Url,
        ArticleField::PublishedDate,
        ArticleField::Source,
    ];

    /// Property name used in the store.
    pub fn property_name(self) -> &'static str {
        match self {
            ArticleField::Title => "title",
            ArticleField::Content => "content",
            ArticleField::Url => "url",
            ArticleField::PublishedDate => "published_date",
            ArticleField::Source => "source",
        }
    }
}

impl fmt::Display for ArticleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.property_name())
    }
}

impl FromStr for ArticleField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(ArticleField::Title),
            "content" => Ok(ArticleField::Content),
            "url" => Ok(ArticleField::Url),
            "published_date" | "publishedDate" => Ok(ArticleField::PublishedDate),
            "source" => Ok(ArticleField::Source),
            other => Err(format!("unknown article field: '{}'", other)),
        }
    }
}

/// Data type of a collection property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
}

/// One declared property of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub data_type: DataType,
}

/// Declared shape of a collection. No vectorizer is attached; the store
/// holds text only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    pub properties: Vec<PropertyDef>,
}

impl CollectionSchema {
    /// Schema declaring the five article properties as text.
    pub fn articles(name: &str) -> Self {
        Self {
            name: name.to_string(),
            properties: ArticleField::ALL
                .iter()
                .map(|f| PropertyDef {
                    name: f.property_name().to_string(),
                    data_type: DataType::Text,
                })
                .collect(),
        }
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }
}

/// Per-object outcome reported by a store for one submitted batch.
pub type InsertOutcome = std::result::Result<String, String>;

/// A record the store refused during ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRecord {
    /// Position of the record in the raw input sequence.
    pub index: usize,
    pub record: ArticleRecord,
    pub message: String,
}

/// Outcome of one ingestion call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    /// Records submitted to the store.
    pub attempted: usize,
    /// Records the store rejected.
    pub failed: usize,
    pub failures: Vec<FailedRecord>,
    /// True when ingestion stopped early because too many records failed.
    pub aborted: bool,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed
    }
}
