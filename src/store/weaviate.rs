//! Weaviate-backed [`Store`] implementation.
//!
//! Speaks the Weaviate v1 REST API for schema and batch writes, and its
//! GraphQL endpoint for reads:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | readiness | `GET /v1/.well-known/ready` |
//! | get collection | `GET /v1/schema/{class}` |
//! | create collection | `POST /v1/schema` |
//! | insert batch | `POST /v1/batch/objects` |
//! | fetch / keyword search | `POST /v1/graphql` (`Get` with `where` / `bm25`) |
//! | count | `POST /v1/graphql` (`Aggregate { meta { count } }`) |
//!
//! Collections are created with `vectorizer: "none"`; only text is stored.
//! When an API key is configured it is sent as a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::{
    ArticleField, ArticleRecord, CollectionSchema, DataType, InsertOutcome, PropertyDef,
};

use super::{PropertyFilter, Store, StoreResult};

/// Connection to one Weaviate instance.
pub struct WeaviateStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeaviateStore {
    /// Build a client without contacting the server.
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> StoreResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Build a client from configuration and verify the server is ready.
    ///
    /// The API key is read from the environment variable named by
    /// `api_key_env`; an unset variable means anonymous access.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Unreachable("store.url is not set".to_string()))?;
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            debug!(var = %config.api_key_env, "no API key in environment, connecting anonymously");
        }
        let store = Self::new(url, api_key, Duration::from_secs(config.timeout_secs))?;
        store.ready().await?;
        Ok(store)
    }

    /// Check `/.well-known/ready`.
    pub async fn ready(&self) -> StoreResult<()> {
        let response = self.request(Method::GET, "/v1/.well-known/ready").send().await?;
        expect_success(response).await.map(|_| ())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn graphql(&self, query: &str) -> StoreResult<Value> {
        debug!(query, "graphql request");
        let response = self
            .request(Method::POST, "/v1/graphql")
            .json(&json!({ "query": query }))
            .send()
            .await?;
        let body: Value = expect_success(response).await?.json().await?;
        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                return Err(StoreError::Rejected(graphql_error_messages(errors)));
            }
        }
        Ok(body)
    }
}

async fn expect_success(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Check that `name` is usable as a Weaviate class name.
///
/// Class names are GraphQL identifiers and get spliced into query text:
/// an uppercase ASCII letter followed by letters, digits, or `_`.
pub fn validate_class_name(name: &str) -> StoreResult<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::Rejected(format!(
            "invalid collection name '{}': must start with an uppercase letter and contain only letters, digits, or '_'",
            name
        )))
    }
}

fn class_ident(name: &str) -> StoreResult<&str> {
    validate_class_name(name).map(|_| name)
}

/// Quote a string as a GraphQL literal. JSON string escaping is valid
/// GraphQL string escaping.
fn gql_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn selection_set() -> String {
    ArticleField::ALL
        .iter()
        .map(|f| f.property_name())
        .collect::<Vec<_>>()
        .join(" ")
}

fn schema_body(schema: &CollectionSchema) -> Value {
    let properties: Vec<Value> = schema
        .properties
        .iter()
        .map(|p| {
            let data_type = match p.data_type {
                DataType::Text => "text",
            };
            // `field` tokenization keeps `Equal` filters exact and case-sensitive.
            json!({ "name": p.name, "dataType": [data_type], "tokenization": "field" })
        })
        .collect();
    json!({
        "class": schema.name,
        "vectorizer": "none",
        "properties": properties,
    })
}

fn parse_schema(body: &Value) -> StoreResult<CollectionSchema> {
    let name = body
        .get("class")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidResponse("schema without 'class'".to_string()))?;
    let properties = body
        .get("properties")
        .and_then(Value::as_array)
        .map(|props| {
            props
                .iter()
                .filter_map(|p| {
                    let name = p.get("name")?.as_str()?;
                    let is_text = p
                        .get("dataType")?
                        .as_array()?
                        .iter()
                        .any(|t| t.as_str() == Some("text"));
                    is_text.then(|| PropertyDef {
                        name: name.to_string(),
                        data_type: DataType::Text,
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(CollectionSchema {
        name: name.to_string(),
        properties,
    })
}

fn batch_body(collection: &str, records: &[ArticleRecord]) -> Value {
    let objects: Vec<Value> = records
        .iter()
        .map(|r| {
            let properties: serde_json::Map<String, Value> = ArticleField::ALL
                .iter()
                .map(|f| (f.property_name().to_string(), Value::from(r.get(*f))))
                .collect();
            json!({ "class": collection, "properties": properties })
        })
        .collect();
    json!({ "objects": objects })
}

/// Map the batch response array onto one outcome per submitted record.
fn parse_batch_response(body: &Value, expected: usize) -> StoreResult<Vec<InsertOutcome>> {
    let items = body
        .as_array()
        .ok_or_else(|| StoreError::InvalidResponse("batch response is not an array".to_string()))?;
    if items.len() != expected {
        return Err(StoreError::InvalidResponse(format!(
            "batch response has {} results for {} objects",
            items.len(),
            expected
        )));
    }
    Ok(items
        .iter()
        .map(|item| {
            let errors: Vec<&str> = item
                .pointer("/result/errors/error")
                .and_then(Value::as_array)
                .map(|errs| {
                    errs.iter()
                        .filter_map(|e| e.get("message").and_then(Value::as_str))
                        .collect()
                })
                .unwrap_or_default();
            if errors.is_empty() {
                Ok(item
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string())
            } else {
                Err(errors.join("; "))
            }
        })
        .collect())
}

fn record_from_properties(obj: &Value) -> ArticleRecord {
    let mut record = ArticleRecord::default();
    for field in ArticleField::ALL {
        let value = obj
            .get(field.property_name())
            .and_then(Value::as_str)
            .unwrap_or_default();
        record.set(field, value.to_string());
    }
    record
}

fn parse_get_response(body: &Value, class: &str) -> StoreResult<Vec<ArticleRecord>> {
    let path = format!("/data/Get/{}", class);
    match body.pointer(&path) {
        Some(Value::Array(items)) => Ok(items.iter().map(record_from_properties).collect()),
        Some(Value::Null) => Ok(Vec::new()),
        _ => Err(StoreError::InvalidResponse(format!(
            "missing {} in GraphQL response",
            path
        ))),
    }
}

fn parse_count_response(body: &Value, class: &str) -> StoreResult<u64> {
    let path = format!("/data/Aggregate/{}/0/meta/count", class);
    body.pointer(&path)
        .and_then(Value::as_u64)
        .ok_or_else(|| StoreError::InvalidResponse(format!("missing {} in GraphQL response", path)))
}

fn graphql_error_messages(errors: &[Value]) -> String {
    errors
        .iter()
        .map(|e| {
            e.get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown GraphQL error")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn get_query(class: &str, arguments: &str) -> String {
    format!(
        "{{ Get {{ {}({}) {{ {} }} }} }}",
        class,
        arguments,
        selection_set()
    )
}

#[async_trait]
impl Store for WeaviateStore {
    fn backend_name(&self) -> &str {
        "weaviate"
    }

    async fn get_collection(&self, name: &str) -> StoreResult<Option<CollectionSchema>> {
        let class = class_ident(name)?;
        let response = self
            .request(Method::GET, &format!("/v1/schema/{}", class))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: Value = expect_success(response).await?.json().await?;
        parse_schema(&body).map(Some)
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> StoreResult<()> {
        class_ident(&schema.name)?;
        let response = self
            .request(Method::POST, "/v1/schema")
            .json(&schema_body(schema))
            .send()
            .await?;
        match expect_success(response).await {
            Ok(_) => Ok(()),
            Err(StoreError::Status { status, body })
                if (400..500).contains(&status) && body.contains("already exists") =>
            {
                Err(StoreError::AlreadyExists(schema.name.clone()))
            }
            Err(StoreError::Status { status, body }) if (400..500).contains(&status) => {
                Err(StoreError::Rejected(body))
            }
            Err(e) => Err(e),
        }
    }

    async fn insert_batch(
        &self,
        collection: &str,
        records: &[ArticleRecord],
    ) -> StoreResult<Vec<InsertOutcome>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let class = class_ident(collection)?;
        let response = self
            .request(Method::POST, "/v1/batch/objects")
            .json(&batch_body(class, records))
            .send()
            .await?;
        let body: Value = expect_success(response).await?.json().await?;
        let outcomes = parse_batch_response(&body, records.len())?;
        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        if failed > 0 {
            warn!(collection, failed, submitted = records.len(), "batch had rejected objects");
        }
        Ok(outcomes)
    }

    async fn fetch_objects(
        &self,
        collection: &str,
        filter: Option<PropertyFilter<'_>>,
        limit: usize,
    ) -> StoreResult<Vec<ArticleRecord>> {
        let class = class_ident(collection)?;
        let mut arguments = format!("limit: {}", limit);
        if let Some(f) = filter {
            arguments.push_str(&format!(
                ", where: {{ path: [{}], operator: Equal, valueText: {} }}",
                gql_string(f.property),
                gql_string(f.equals)
            ));
        }
        let body = self.graphql(&get_query(class, &arguments)).await?;
        parse_get_response(&body, class)
    }

    async fn keyword_search(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
    ) -> StoreResult<Vec<ArticleRecord>> {
        let class = class_ident(collection)?;
        let arguments = format!("limit: {}, bm25: {{ query: {} }}", limit, gql_string(query));
        let body = self.graphql(&get_query(class, &arguments)).await?;
        parse_get_response(&body, class)
    }

    async fn count(&self, collection: &str) -> StoreResult<u64> {
        let class = class_ident(collection)?;
        let query = format!("{{ Aggregate {{ {} {{ meta {{ count }} }} }} }}", class);
        let body = self.graphql(&query).await?;
        parse_count_response(&body, class)
    }

    async fn close(&self) {
        debug!(url = %self.base_url, "closing weaviate connection");
    }
}
