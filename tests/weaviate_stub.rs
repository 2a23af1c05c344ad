//! Weaviate backend against a local stub of the Weaviate HTTP API.
//!
//! The stub keeps classes and objects in memory, rejects batch objects
//! whose title starts with `bad`, and answers the small subset of GraphQL
//! the backend sends (`Get` with `limit`/`where`/`bm25`, `Aggregate`).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use news_harness::config::StoreConfig;
use news_harness::error::StoreError;
use news_harness::ingest::ingest;
use news_harness::models::{CollectionSchema, RawRecord};
use news_harness::provision::ensure_collection;
use news_harness::query::{count, fetch_all, fetch_by_filter, search_by_keyword};
use news_harness::store::{Store, WeaviateStore};

#[derive(Default)]
struct StubState {
    classes: HashMap<String, Value>,
    objects: Vec<Value>,
    queries: Vec<String>,
    auth: Vec<String>,
}

type Shared = Arc<Mutex<StubState>>;

async fn ready() -> StatusCode {
    StatusCode::OK
}

async fn get_schema(
    State(state): State<Shared>,
    Path(class): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let st = state.lock().unwrap();
    st.classes
        .get(&class)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create_schema(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    let class = body["class"].as_str().unwrap_or_default().to_string();
    if st.classes.contains_key(&class) {
        let message = format!("class name \"{}\" already exists", class);
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": [{"message": message}]})),
        );
    }
    st.classes.insert(class, body.clone());
    (StatusCode::OK, Json(body))
}

async fn batch_objects(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut st = state.lock().unwrap();
    if let Some(auth) = headers.get(header::AUTHORIZATION) {
        st.auth.push(auth.to_str().unwrap_or_default().to_string());
    }
    let mut results = Vec::new();
    for obj in body["objects"].as_array().cloned().unwrap_or_default() {
        let props = obj["properties"].clone();
        let id = format!("id-{}", st.objects.len() + results.len());
        let title = props["title"].as_str().unwrap_or_default();
        if title.starts_with("bad") {
            results.push(json!({
                "id": id,
                "result": {"errors": {"error": [{"message": "rejected by stub"}]}}
            }));
        } else {
            st.objects.push(props);
            results.push(json!({"id": id, "result": {}}));
        }
    }
    Json(Value::Array(results))
}

/// First JSON string literal following `marker` in `query`.
fn string_after(query: &str, marker: &str) -> Option<String> {
    let start = query.find(marker)? + marker.len();
    serde_json::Deserializer::from_str(&query[start..])
        .into_iter::<String>()
        .next()?
        .ok()
}

fn number_after(query: &str, marker: &str) -> Option<usize> {
    let start = query.find(marker)? + marker.len();
    let digits: String = query[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

async fn graphql(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut st = state.lock().unwrap();
    let query = body["query"].as_str().unwrap_or_default().to_string();
    st.queries.push(query.clone());

    if !st.classes.contains_key("News") {
        return Json(json!({
            "data": null,
            "errors": [{"message": "Cannot query field \"News\" on type \"GetObjectsObj\"."}]
        }));
    }

    if query.contains("Aggregate") {
        return Json(json!({
            "data": {"Aggregate": {"News": [{"meta": {"count": st.objects.len()}}]}}
        }));
    }

    let limit = number_after(&query, "limit: ").unwrap_or(usize::MAX);
    let equals = string_after(&query, "valueText: ");
    let keyword = string_after(&query, "query: ").map(|k| k.to_lowercase());

    let hits: Vec<Value> = st
        .objects
        .iter()
        .filter(|o| {
            equals
                .as_deref()
                .map_or(true, |v| o["source"].as_str() == Some(v))
        })
        .filter(|o| {
            keyword.as_deref().map_or(true, |k| {
                ["title", "content"].iter().any(|p| {
                    o[*p]
                        .as_str()
                        .unwrap_or_default()
                        .to_lowercase()
                        .contains(k)
                })
            })
        })
        .take(limit)
        .cloned()
        .collect();

    Json(json!({"data": {"Get": {"News": hits}}}))
}

async fn spawn_stub() -> (String, Shared) {
    let state = Shared::default();
    let app = Router::new()
        .route("/v1/.well-known/ready", get(ready))
        .route("/v1/schema", post(create_schema))
        .route("/v1/schema/{class}", get(get_schema))
        .route("/v1/batch/objects", post(batch_objects))
        .route("/v1/graphql", post(graphql))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), state)
}

fn client(url: &str, api_key: Option<&str>) -> WeaviateStore {
    WeaviateStore::new(url, api_key.map(str::to_string), Duration::from_secs(5)).unwrap()
}

fn raw(title: &str, content: &str, source: &str) -> RawRecord {
    json!({"Title": title, "Article": content, "News Source": source})
        .as_object()
        .cloned()
        .unwrap()
}

#[tokio::test]
async fn test_ready_and_provision_once() {
    let (url, state) = spawn_stub().await;
    let store = client(&url, None);
    store.ready().await.unwrap();

    let schema = CollectionSchema::articles("News");
    let first = ensure_collection(&store, "News", &schema).await.unwrap();
    let second = ensure_collection(&store, "News", &schema).await.unwrap();
    assert!(first.was_created());
    assert!(!second.was_created());
    assert_eq!(second.schema().properties.len(), 5);

    let st = state.lock().unwrap();
    assert_eq!(st.classes.len(), 1);
    assert_eq!(st.classes["News"]["vectorizer"], "none");
    let props = st.classes["News"]["properties"].as_array().unwrap();
    assert!(props.iter().all(|p| p["tokenization"] == "field"));
}

#[tokio::test]
async fn test_duplicate_create_maps_to_already_exists() {
    let (url, _state) = spawn_stub().await;
    let store = client(&url, None);
    let schema = CollectionSchema::articles("News");

    store.create_collection(&schema).await.unwrap();
    let err = store.create_collection(&schema).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));
}

#[tokio::test]
async fn test_ingest_reports_rejected_objects() {
    let (url, _state) = spawn_stub().await;
    let store = client(&url, None);
    let handle = ensure_collection(&store, "News", &CollectionSchema::articles("News"))
        .await
        .unwrap();

    let records = vec![
        raw("one", "first", "BBC"),
        raw("bad one", "second", "BBC"),
        raw("two", "third", "FOX"),
        raw("three", "fourth", "BBC"),
    ];
    let result = ingest(&store, &handle, &records, 3, 5).await.unwrap();
    assert_eq!(result.attempted, 4);
    assert_eq!(result.failed, 1);
    assert_eq!(result.failures[0].index, 1);
    assert_eq!(result.failures[0].message, "rejected by stub");
    assert!(!result.aborted);

    assert_eq!(count(&store, &handle).await.unwrap(), 3);
}

#[tokio::test]
async fn test_queries_round_trip_through_graphql() {
    let (url, state) = spawn_stub().await;
    let store = client(&url, None);
    let handle = ensure_collection(&store, "News", &CollectionSchema::articles("News"))
        .await
        .unwrap();
    let records = vec![
        raw("Tariffs", "tariff news", "BBC"),
        raw("Weather", "sunny", "FOX"),
        raw("Markets", "more tariff talk", "BBC"),
    ];
    ingest(&store, &handle, &records, 10, 0).await.unwrap();

    let bbc = fetch_by_filter(&store, &handle, "source", "BBC", 10)
        .await
        .unwrap();
    assert_eq!(bbc.len(), 2);
    assert!(bbc.iter().all(|r| r.source == "BBC"));

    let hits = search_by_keyword(&store, &handle, "tariff", 1).await.unwrap();
    assert_eq!(hits.len(), 1);

    let all = fetch_all(&store, &handle, 10).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[1].title, "Weather");
    assert_eq!(all[1].url, "");

    let none = fetch_by_filter(&store, &handle, "source", "CNN", 10)
        .await
        .unwrap();
    assert!(none.is_empty());

    let st = state.lock().unwrap();
    assert!(st.queries.iter().any(|q| q.contains(r#"valueText: "BBC""#)));
    assert!(st.queries.iter().any(|q| q.contains(r#"bm25: { query: "tariff" }"#)));
}

#[tokio::test]
async fn test_graphql_errors_surface_as_rejected() {
    let (url, _state) = spawn_stub().await;
    let store = client(&url, None);

    let err = store.fetch_objects("News", None, 5).await.unwrap_err();
    assert!(matches!(err, StoreError::Rejected(_)));
}

#[tokio::test]
async fn test_api_key_is_sent_as_bearer_token() {
    let (url, state) = spawn_stub().await;
    let store = client(&url, Some("secret"));
    let handle = ensure_collection(&store, "News", &CollectionSchema::articles("News"))
        .await
        .unwrap();
    ingest(&store, &handle, &[raw("a", "b", "BBC")], 10, 0)
        .await
        .unwrap();

    let st = state.lock().unwrap();
    assert_eq!(st.auth, vec!["Bearer secret".to_string()]);
}

#[tokio::test]
async fn test_connect_from_config_without_key() {
    let (url, _state) = spawn_stub().await;
    let config = StoreConfig {
        backend: "weaviate".to_string(),
        url: Some(url),
        api_key_env: "NEWS_HARNESS_TEST_UNSET_KEY".to_string(),
        timeout_secs: 5,
    };
    let store = WeaviateStore::connect(&config).await.unwrap();
    assert_eq!(store.backend_name(), "weaviate");
}

#[tokio::test]
async fn test_unreachable_server() {
    let store = client("http://127.0.0.1:1", None);
    let err = store.ready().await.unwrap_err();
    assert!(matches!(err, StoreError::Unreachable(_)));
}
