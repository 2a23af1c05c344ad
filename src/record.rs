//! Raw record normalization.
//!
//! Upstream sources name their fields differently: spreadsheet exports use
//! `"Title"`, `"Article"`, `"News Source"`; news APIs use `"description"`,
//! `"publishedAt"`, or a nested `"source": {"name": ...}`. A [`FieldMapping`]
//! lists, per article field, the source keys to try in order. The first
//! key that yields a usable value wins; if none does, the field is `""`.
//!
//! [`normalize`] is total: every JSON object maps to an [`ArticleRecord`].

use serde_json::Value;
use std::collections::HashMap;

use crate::models::{ArticleField, ArticleRecord, RawRecord};

/// Ordered source-key aliases for each article field.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    aliases: HashMap<ArticleField, Vec<String>>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        let table: [(ArticleField, &[&str]); 5] = [
            (ArticleField::Title, &["Title", "title", "headline"]),
            (
                ArticleField::Content,
                &["Article", "content", "body", "abstract", "description"],
            ),
            (ArticleField::Url, &["URL", "url", "link"]),
            (
                ArticleField::PublishedDate,
                &[
                    "Date",
                    "published_date",
                    "publishedDate",
                    "publishedAt",
                    "published_at",
                ],
            ),
            (ArticleField::Source, &["News Source", "source", "publisher"]),
        ];
        let aliases = table
            .iter()
            .map(|(field, keys)| (*field, keys.iter().map(|k| k.to_string()).collect()))
            .collect();
        Self { aliases }
    }
}

impl FieldMapping {
    /// Put `keys` ahead of the existing aliases for `field`.
    pub fn prepend(&mut self, field: ArticleField, keys: &[String]) {
        let entry = self.aliases.entry(field).or_default();
        let mut merged: Vec<String> = keys.to_vec();
        merged.extend(entry.drain(..).filter(|k| !keys.contains(k)));
        *entry = merged;
    }

    pub fn aliases(&self, field: ArticleField) -> &[String] {
        self.aliases.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Map one raw record onto the article shape. Never fails.
    pub fn normalize(&self, raw: &RawRecord) -> ArticleRecord {
        let mut record = ArticleRecord::default();
        for field in ArticleField::ALL {
            let value = self
                .aliases(field)
                .iter()
                .filter_map(|key| raw.get(key))
                .find_map(coerce)
                .unwrap_or_default();
            record.set(field, value);
        }
        record
    }
}

/// Normalize with the default mapping.
pub fn normalize(raw: &RawRecord) -> ArticleRecord {
    FieldMapping::default().normalize(raw)
}

/// Turn a JSON value into field text.
///
/// Strings pass through, numbers and booleans are stringified, and an
/// object contributes its `"name"` string (NewsAPI's `source` shape).
/// `null`, arrays and other objects yield nothing so later aliases get a
/// chance.
fn coerce(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
        Value::Null | Value::Array(_) => None,
    }
}
