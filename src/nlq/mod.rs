//! Natural-language understanding
//!
//! Turns a question into an [`Intent`](crate::intent::Intent) and
//! [`Entities`](crate::intent::Entities). Each stage has a chat-model
//! strategy and a heuristic strategy; [`Fallback`] composes a primary with
//! a fallback for either stage.

pub mod classify;
pub mod client;
pub mod extract;
pub mod prompts;

use async_trait::async_trait;
use thiserror::Error;

pub use classify::{IntentClassifier, KeywordIntentClassifier, LlmIntentClassifier};
pub use client::{resolve_model_alias, LlmClient};
pub use extract::{EntityExtractor, LlmEntityExtractor, PatternEntityExtractor};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NLQError {
    #[error("LLM API error: {0}")]
    ApiError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type NLQResult<T> = Result<T, NLQError>;

/// A single-turn chat completion model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier for logs and reports
    fn name(&self) -> &str;

    async fn chat(&self, prompt: &str, temperature: f32) -> NLQResult<String>;
}

/// Primary strategy with a fallback used whenever the primary fails
pub struct Fallback<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> Fallback<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

/// Strip Markdown code fences a chat model may wrap its output in
pub(crate) fn strip_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after_fence = &trimmed[start + 3..];
    // skip a language tag such as "json"
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("  popular_airports \n"), "popular_airports");
        assert_eq!(strip_fences("```json\n{\"limit\": 3}\n```"), "{\"limit\": 3}");
        assert_eq!(strip_fences("Here:\n```\n{}\n```\nDone"), "{}");
    }
}
