use super::*;
use crate::config::{BotConfig, RetrievalConfig};
use crate::embeddings::{CompletionProvider, EmbeddingProvider};
use crate::store::{ChunkRecord, StoreFile, VectorStore};
use axum::body::{Body, to_bytes};
use axum::http::Request;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

struct FixedEmbedder(Vec<f32>);

impl EmbeddingProvider for FixedEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(self.0.clone())
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| self.0.clone()).collect())
    }
}

struct FailingEmbedder;

impl EmbeddingProvider for FailingEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(KokobotError::EmbeddingService("stub outage".to_string()))
    }

    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(KokobotError::EmbeddingService("stub outage".to_string()))
    }
}

struct FixedCompleter(String);

impl CompletionProvider for FixedCompleter {
    fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

fn write_store(path: &Path) {
    let file = StoreFile::new(
        "text-embedding-3-small".to_string(),
        2,
        vec![ChunkRecord {
            text: "Der Ofen heizt gut.".to_string(),
            title: "Heizen im Winter".to_string(),
            slug: "heizen-im-winter".to_string(),
            chunk_index: 0,
            embedding: vec![1.0, 0.0],
        }],
    );
    fs::write(path, serde_json::to_string(&file).unwrap()).unwrap();
}

fn router_with(
    store_path: &Path,
    embedder: Arc<dyn EmbeddingProvider>,
    completer: Arc<dyn CompletionProvider>,
) -> Router {
    let engine = QueryEngine::new(
        Arc::new(VectorStore::new(store_path)),
        embedder,
        completer,
        &RetrievalConfig::default(),
        BotConfig::default(),
    );
    build_router(Arc::new(AppState { engine }))
}

fn chat_request(query: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/kokobot")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&ChatRequest {
                query: query.to_string(),
            })
            .unwrap(),
        ))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn health_endpoint_reports_ok() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("vector-db.json");
    write_store(&store_path);
    let router = router_with(
        &store_path,
        Arc::new(FixedEmbedder(vec![1.0, 0.0])),
        Arc::new(FixedCompleter("unused".to_string())),
    );

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    // Nothing has queried yet, so the store is still on disk
    assert_eq!(body["store_loaded"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn chat_returns_answer_and_sources() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("vector-db.json");
    write_store(&store_path);
    let router = router_with(
        &store_path,
        Arc::new(FixedEmbedder(vec![1.0, 0.0])),
        Arc::new(FixedCompleter("Mit einem Holzofen.".to_string())),
    );

    let response = router
        .oneshot(chat_request("Wie heize ich im Winter?"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["answer"], "Mit einem Holzofen.");
    assert_eq!(body["sources"][0]["slug"], "heizen-im-winter");
    assert_eq!(body["sources"][0]["title"], "Heizen im Winter");
}

#[tokio::test(flavor = "multi_thread")]
async fn blank_query_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("vector-db.json");
    write_store(&store_path);
    let router = router_with(
        &store_path,
        Arc::new(FixedEmbedder(vec![1.0, 0.0])),
        Arc::new(FixedCompleter("unused".to_string())),
    );

    let response = router.oneshot(chat_request("   ")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Invalid query"));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_store_is_service_unavailable() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("does-not-exist.json");
    let router = router_with(
        &store_path,
        Arc::new(FixedEmbedder(vec![1.0, 0.0])),
        Arc::new(FixedCompleter("unused".to_string())),
    );

    let response = router.oneshot(chat_request("Frage")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test(flavor = "multi_thread")]
async fn embedding_outage_is_bad_gateway() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("vector-db.json");
    write_store(&store_path);
    let router = router_with(
        &store_path,
        Arc::new(FailingEmbedder),
        Arc::new(FixedCompleter("unused".to_string())),
    );

    let response = router.oneshot(chat_request("Frage")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[test]
fn error_status_covers_the_taxonomy() {
    assert_eq!(
        error_status(&KokobotError::InvalidQuery("x".to_string())),
        StatusCode::BAD_REQUEST
    );
    // A scorer length mismatch is index corruption, not a bad request
    assert_eq!(
        error_status(&KokobotError::InvalidInput("x".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        error_status(&KokobotError::StoreUnavailable("x".to_string())),
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(
        error_status(&KokobotError::EmbeddingService("x".to_string())),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        error_status(&KokobotError::CompletionService("x".to_string())),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        error_status(&KokobotError::Content("x".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
