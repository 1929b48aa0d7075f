//! Sentence embeddings
//!
//! A closed registry of embedding models ([`EmbeddingModel`]), the
//! [`Embedder`] seam the ranker and retriever talk to, and the clients that
//! implement it: hosted inference over HTTP and an offline hashing model.

pub mod client;
pub mod hashing;
pub mod indexer;

use crate::config::{EmbedConfig, StoreBackend};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use client::EmbeddingClient;
pub use hashing::HashingEmbedder;
pub use indexer::{journey_description, JourneyIndexer};

/// Embed errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbedError {
    /// Error reported by the embedding provider
    #[error("Embedding API error: {0}")]
    ApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("{model} produced {got}-dim vectors, expected {expected}")]
    DimensionMismatch {
        model: EmbeddingModel,
        expected: usize,
        got: usize,
    },

    #[error("expected {expected} embeddings, got {got}")]
    CountMismatch { expected: usize, got: usize },

    #[error("Embedding timed out after {0:?}")]
    Timeout(Duration),

    #[error("Graph error: {0}")]
    Graph(String),
}

pub type EmbedResult<T> = Result<T, EmbedError>;

/// Embedding models known to the system
///
/// The key doubles as the Journey property holding that model's vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingModel {
    MiniLm,
    MpNet,
}

impl EmbeddingModel {
    pub const ALL: [EmbeddingModel; 2] = [EmbeddingModel::MiniLm, EmbeddingModel::MpNet];

    pub fn key(&self) -> &'static str {
        match self {
            EmbeddingModel::MiniLm => "minilm",
            EmbeddingModel::MpNet => "mpnet",
        }
    }

    /// Hugging Face repository id
    pub fn repo(&self) -> &'static str {
        match self {
            EmbeddingModel::MiniLm => "sentence-transformers/all-MiniLM-L6-v2",
            EmbeddingModel::MpNet => "sentence-transformers/all-mpnet-base-v2",
        }
    }

    pub fn dimensions(&self) -> usize {
        match self {
            EmbeddingModel::MiniLm => 384,
            EmbeddingModel::MpNet => 768,
        }
    }

    pub fn keys() -> Vec<String> {
        Self::ALL.iter().map(|m| m.key().to_string()).collect()
    }
}

impl fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for EmbeddingModel {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        EmbeddingModel::ALL
            .iter()
            .copied()
            .find(|m| m.key() == wanted)
            .ok_or_else(|| EmbedError::ConfigError(format!("unknown embedding model '{}'", s)))
    }
}

/// Text encoder with a fixed output dimension
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model(&self) -> EmbeddingModel;

    /// Encode a batch; one vector per input text, in input order
    async fn encode(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>>;

    fn dimensions(&self) -> usize {
        self.model().dimensions()
    }
}

/// Check a provider's output against the model's contract
pub(crate) fn check_batch(model: EmbeddingModel, expected: usize, vectors: &[Vec<f32>]) -> EmbedResult<()> {
    if vectors.len() != expected {
        return Err(EmbedError::CountMismatch {
            expected,
            got: vectors.len(),
        });
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != model.dimensions()) {
        return Err(EmbedError::DimensionMismatch {
            model,
            expected: model.dimensions(),
            got: bad.len(),
        });
    }
    Ok(())
}

/// Embedders available to a retriever, by model key
#[derive(Clone, Default)]
pub struct Embedders {
    by_key: IndexMap<&'static str, Arc<dyn Embedder>>,
}

impl fmt::Debug for Embedders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.by_key.keys()).finish()
    }
}

impl Embedders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offline hashing embedders for every known model
    pub fn offline() -> Self {
        let mut embedders = Self::new();
        for model in EmbeddingModel::ALL {
            embedders.register(Arc::new(HashingEmbedder::new(model)));
        }
        embedders
    }

    /// Embedders as configured: hosted when a provider is set, offline otherwise
    pub fn from_config(config: &EmbedConfig) -> EmbedResult<Self> {
        if config.provider.is_none() {
            return Ok(Self::offline());
        }
        let mut embedders = Self::new();
        for model in EmbeddingModel::ALL {
            embedders.register(Arc::new(EmbeddingClient::new(config, model)?));
        }
        Ok(embedders)
    }

    /// Embedders for a given store backend. Journey vectors in a remote
    /// store come from hosted models, so a remote store with no hosted
    /// provider gets no embedders and the embedding channel stays off.
    pub fn for_backend(config: &EmbedConfig, backend: StoreBackend) -> EmbedResult<Self> {
        if backend == StoreBackend::Neo4j && config.provider.is_none() {
            tracing::warn!("No embedding provider configured for the neo4j backend; embedding retrieval disabled");
            return Ok(Self::new());
        }
        Self::from_config(config)
    }

    /// Register an embedder, replacing any previous one for the same model
    pub fn register(&mut self, embedder: Arc<dyn Embedder>) {
        self.by_key.insert(embedder.model().key(), embedder);
    }

    /// Case-insensitive lookup by model key
    pub fn get(&self, name: &str) -> Option<Arc<dyn Embedder>> {
        let wanted = name.trim().to_ascii_lowercase();
        self.by_key.get(wanted.as_str()).cloned()
    }

    /// Registered model keys, in registration order
    pub fn available(&self) -> Vec<String> {
        self.by_key.keys().map(|k| k.to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_registry() {
        assert_eq!(EmbeddingModel::MiniLm.dimensions(), 384);
        assert_eq!(EmbeddingModel::MpNet.dimensions(), 768);
        assert_eq!("miniLM".parse::<EmbeddingModel>().unwrap(), EmbeddingModel::MiniLm);
        assert!("bert".parse::<EmbeddingModel>().is_err());
        assert_eq!(EmbeddingModel::keys(), vec!["minilm", "mpnet"]);
    }

    #[test]
    fn test_embedders_lookup() {
        let embedders = Embedders::offline();
        assert_eq!(embedders.available(), vec!["minilm", "mpnet"]);
        assert_eq!(embedders.get("MPNet").unwrap().model(), EmbeddingModel::MpNet);
        assert!(embedders.get("bert").is_none());
        assert!(Embedders::new().is_empty());
    }

    #[test]
    fn test_check_batch() {
        let ok = vec![vec![0.0; 384]; 2];
        assert!(check_batch(EmbeddingModel::MiniLm, 2, &ok).is_ok());
        assert_eq!(
            check_batch(EmbeddingModel::MiniLm, 3, &ok),
            Err(EmbedError::CountMismatch { expected: 3, got: 2 })
        );
        assert!(matches!(
            check_batch(EmbeddingModel::MpNet, 2, &ok),
            Err(EmbedError::DimensionMismatch { expected: 768, got: 384, .. })
        ));
    }
}
