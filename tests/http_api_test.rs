mod common;

use aerograph::http::{AppState, HttpServer};
use aerograph::retrieve::RetrievalConfig;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn state() -> AppState {
    AppState {
        retriever: Arc::new(common::fixture_retriever(RetrievalConfig::default()).await),
        assistant: None,
    }
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let app = HttpServer::router(state().await);
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_status() {
    let (status, body) = send(Request::get("/api/status").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["version"], json!(aerograph::VERSION));
    assert_eq!(body["store"], json!("memory"));
    assert_eq!(body["embedders"], json!(["minilm", "mpnet"]));
    assert_eq!(body["retrieval"]["strategy"], json!("store_search"));
    assert_eq!(body["assistant"], Value::Null);
}

#[tokio::test]
async fn test_intents() {
    let (status, body) = send(Request::get("/api/intents").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let intents = body["intents"].as_array().unwrap();
    assert_eq!(intents.len(), 10);
    assert_eq!(intents[0]["name"], json!("most_delayed_flights"));
    assert_eq!(intents[0]["params"], json!(["origin", "destination", "limit"]));
}

#[tokio::test]
async fn test_retrieve_round_trip() {
    let (status, body) = send(post(
        "/api/retrieve",
        json!({
            "intent": "most_delayed_flights",
            "entities": {"origin": "LAX", "destination": "ORD", "limit": 5},
            "query": "delayed flights LAX to ORD",
            "embedder": "doesnotexist"
        }),
    ))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_data"], json!(true));
    assert_eq!(body["baseline"][0]["flight"], json!(200));
    assert_eq!(body["baseline"][1]["flight"], json!(100));
    let message = body["embedding"][0]["message"].as_str().unwrap();
    assert!(message.contains("minilm"));
}

#[tokio::test]
async fn test_retrieve_sentinels_are_rows() {
    let (status, body) = send(post("/api/retrieve", json!({"intent": "weather"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_data"], json!(false));
    assert!(body["baseline"][0]["message"].as_str().unwrap().contains("weather"));
}

#[tokio::test]
async fn test_retrieve_rejects_zero_top_k() {
    let (status, body) = send(post(
        "/api/retrieve",
        json!({"intent": "popular_airports", "top_k": 0}),
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_ask_without_assistant() {
    let (status, body) = send(post("/api/ask", json!({"question": "Busiest airports?"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], json!("no language model configured"));
}
