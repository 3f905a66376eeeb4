//! `HttpBackend` against a local axum stand-in for the assistant backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use ryan_client::{Backend, ClientError, HttpBackend};
use ryan_core::{ChatRequest, UploadRequest};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Seen(Arc<Mutex<Vec<String>>>);

impl Seen {
    fn push(&self, s: String) {
        self.0.lock().unwrap().push(s);
    }
}

async fn chat(State(seen): State<Seen>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    seen.push(body.to_string());
    if body["message"] == "fail" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"type": "error", "content": "model crashed"})),
        );
    }
    (StatusCode::OK, Json(json!({"type": "text", "content": "hi"})))
}

async fn logs(State(seen): State<Seen>, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    seen.push(format!("logs limit={} offset={}", q["limit"], q["offset"]));
    Json(json!({"type": "logs", "content": "a - INFO - x\n", "next_offset": 1, "has_more": false}))
}

async fn update(State(seen): State<Seen>, Path(key): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    seen.push(format!("put {} {}", key, body["value"]));
    Json(json!({"content": format!("saved {}", key)}))
}

async fn upload(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"type": "text", "content": format!("got {}", body["fileName"].as_str().unwrap_or(""))}))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

async fn spawn_backend() -> (String, Seen) {
    init_tracing();
    let seen = Seen::default();
    let app = Router::new()
        .route("/chat", post(chat))
        .route("/logs", get(logs))
        .route("/memory", get(|| async { Json(json!([{"key": "k", "value": 1}])) }))
        .route("/memory/:key", put(update))
        .route("/upload_document", post(upload))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), seen)
}

#[tokio::test]
async fn chat_round_trip_and_http_error() {
    let (url, seen) = spawn_backend().await;
    let backend = HttpBackend::new(&url).unwrap();

    let reply = backend
        .chat(&ChatRequest {
            message: "hello".into(),
            creative_context: None,
        })
        .await
        .unwrap();
    assert_eq!(reply.content_text().as_deref(), Some("hi"));
    let sent: Value = serde_json::from_str(&seen.0.lock().unwrap()[0]).unwrap();
    assert_eq!(sent, json!({"message": "hello", "creative_context": null}));

    let err = backend
        .chat(&ChatRequest {
            message: "fail".into(),
            creative_context: None,
        })
        .await
        .unwrap_err();
    match err {
        ClientError::Http { status, content, .. } => {
            assert_eq!(status, 500);
            assert_eq!(content.as_deref(), Some("model crashed"));
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

#[tokio::test]
async fn logs_memory_and_upload() {
    let (url, seen) = spawn_backend().await;
    let backend = HttpBackend::new(&url).unwrap();

    let page = backend.logs(50, 100).await.unwrap();
    assert_eq!(page.next_offset, Some(1));
    assert_eq!(page.has_more, Some(false));

    let items = backend.memory().await.unwrap();
    assert_eq!(items[0].display_value(), "1");

    let ack = backend.update_memory("favourite colour", "blue").await.unwrap();
    assert_eq!(ack.content.as_deref(), Some("saved favourite colour"));

    let reply = backend
        .upload_document(&UploadRequest {
            file_name: "a.txt".into(),
            file_content: "x".into(),
        })
        .await
        .unwrap();
    assert_eq!(reply.content_text().as_deref(), Some("got a.txt"));

    let seen = seen.0.lock().unwrap();
    assert!(seen.contains(&"logs limit=50 offset=100".to_string()));
    assert!(seen.contains(&"put favourite colour \"blue\"".to_string()));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    init_tracing();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(&format!("http://{}", addr)).unwrap();
    let err = backend.memory().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
    assert!(!err.is_http());
}
