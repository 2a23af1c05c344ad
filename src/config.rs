use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::models::ArticleField;
use crate::record::FieldMapping;
use crate::store::weaviate::validate_class_name;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backend() -> String {
    "weaviate".to_string()
}
fn default_api_key_env() -> String {
    "WEAVIATE_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectionConfig {
    #[serde(default = "default_collection_name")]
    pub name: String,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: default_collection_name(),
        }
    }
}

fn default_collection_name() -> String {
    "News".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_errors")]
    pub max_errors: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_errors: default_max_errors(),
        }
    }
}

fn default_batch_size() -> usize {
    200
}
fn default_max_errors() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    5
}

/// Extra source keys, tried before the built-in aliases.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MappingConfig {
    #[serde(default)]
    pub title: Vec<String>,
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default)]
    pub url: Vec<String>,
    #[serde(default)]
    pub published_date: Vec<String>,
    #[serde(default)]
    pub source: Vec<String>,
}

impl MappingConfig {
    pub fn field_mapping(&self) -> FieldMapping {
        let mut mapping = FieldMapping::default();
        for (field, keys) in [
            (ArticleField::Title, &self.title),
            (ArticleField::Content, &self.content),
            (ArticleField::Url, &self.url),
            (ArticleField::PublishedDate, &self.published_date),
            (ArticleField::Source, &self.source),
        ] {
            if !keys.is_empty() {
                mapping.prepend(field, keys);
            }
        }
        mapping
    }
}

impl Config {
    /// Memory-backed configuration with all defaults.
    pub fn in_memory() -> Self {
        Self {
            store: StoreConfig {
                backend: "memory".to_string(),
                url: None,
                api_key_env: default_api_key_env(),
                timeout_secs: default_timeout_secs(),
            },
            collection: CollectionConfig::default(),
            ingest: IngestConfig::default(),
            query: QueryConfig::default(),
            mapping: MappingConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    match config.store.backend.as_str() {
        "memory" => {}
        "weaviate" => {
            let url = config.store.url.as_deref().unwrap_or("").trim();
            if url.is_empty() {
                anyhow::bail!("store.url must be set when backend is 'weaviate'");
            }
        }
        other => anyhow::bail!(
            "Unknown store backend: '{}'. Must be weaviate or memory.",
            other
        ),
    }

    if config.collection.name.trim().is_empty() {
        anyhow::bail!("collection.name must not be empty");
    }

    if config.store.backend == "weaviate" {
        validate_class_name(&config.collection.name)
            .with_context(|| "collection.name is not a valid Weaviate class name")?;
    }

    if config.ingest.batch_size == 0 {
        anyhow::bail!("ingest.batch_size must be > 0");
    }

    if config.query.default_limit < 1 {
        anyhow::bail!("query.default_limit must be >= 1");
    }

    Ok(config)
}
