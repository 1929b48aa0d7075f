//! JSON HTTP API over retrieval and question answering

pub mod handler;
pub mod server;

pub use handler::{ApiError, AppState, AskRequest, RetrieveRequest};
pub use server::HttpServer;
