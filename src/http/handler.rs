//! HTTP handlers for the retrieval API

use crate::intent::{Entities, Intent};
use crate::pipeline::Assistant;
use crate::retrieve::Retriever;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub retriever: Arc<Retriever>,
    pub assistant: Option<Arc<Assistant>>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("{0}")]
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Request for retrieval with an already classified question
#[derive(Debug, Deserialize)]
pub struct RetrieveRequest {
    pub intent: String,
    #[serde(default)]
    pub entities: Entities,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub embedder: Option<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub embedder: Option<String>,
}

/// Handler for baseline and embedding retrieval
pub async fn retrieve_handler(
    State(state): State<AppState>,
    Json(payload): Json<RetrieveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.top_k == Some(0) {
        return Err(ApiError::BadRequest("top_k must be at least 1".to_string()));
    }
    debug!("Retrieve request for intent '{}'", payload.intent);

    let bundle = state
        .retriever
        .retrieve(
            &payload.intent,
            &payload.entities,
            &payload.query,
            payload.embedder.as_deref(),
            payload.top_k,
        )
        .await;

    Ok(Json(json!({
        "intent": payload.intent,
        "has_data": bundle.has_data(),
        "baseline": bundle.baseline,
        "embedding": bundle.embedding,
    })))
}

/// Handler for full question answering
pub async fn ask_handler(
    State(state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let assistant = state
        .assistant
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("no language model configured".to_string()))?;
    if payload.question.trim().is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }

    match assistant.ask(&payload.question, payload.embedder.as_deref()).await {
        Ok(interaction) => Ok(Json(interaction)),
        Err(e) => {
            warn!("Could not understand '{}': {}", payload.question, e);
            Err(ApiError::Unprocessable(e.to_string()))
        }
    }
}

/// Handler listing the intent registry
pub async fn intents_handler() -> impl IntoResponse {
    let intents: Vec<_> = Intent::ALL
        .iter()
        .map(|intent| {
            let template = intent.template();
            json!({
                "name": intent.as_str(),
                "params": template.params.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
                "columns": template.columns,
                "cypher": template.cypher,
            })
        })
        .collect();
    Json(json!({ "intents": intents }))
}

/// Handler for system status
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.retriever.config();
    Json(json!({
        "status": "healthy",
        "version": crate::VERSION,
        "store": state.retriever.dispatcher().accessor().name(),
        "embedders": state.retriever.available_embedders(),
        "retrieval": {
            "strategy": config.strategy,
            "top_k": config.top_k,
            "cutoff": config.cutoff,
            "default_limit": config.default_limit,
        },
        "assistant": state.assistant.as_ref().map(|a| a.model_name()),
    }))
}
