//! HTTP server for the retrieval API

use super::handler::{ask_handler, intents_handler, retrieve_handler, status_handler, AppState};
use crate::config::ServerConfig;
use axum::{
    routing::{get, post},
    Router,
};
use tracing::info;

pub struct HttpServer {
    state: AppState,
    host: String,
    port: u16,
}

impl HttpServer {
    pub fn new(state: AppState, config: &ServerConfig) -> Self {
        Self {
            state,
            host: config.host.clone(),
            port: config.port,
        }
    }

    /// Routes with state attached
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/api/status", get(status_handler))
            .route("/api/intents", get(intents_handler))
            .route("/api/retrieve", post(retrieve_handler))
            .route("/api/ask", post(ask_handler))
            .with_state(state)
    }

    /// Start the HTTP server
    pub async fn start(&self) -> std::io::Result<()> {
        let app = Self::router(self.state.clone());

        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("Retrieval API listening on http://{}", addr);

        axum::serve(listener, app).await
    }
}
