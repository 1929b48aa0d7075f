//! Aerograph
//!
//! Graph-RAG retrieval engine for an airline operations knowledge graph.
//!
//! A question is classified into one of a closed set of analytic intents,
//! parameters are extracted from it, and the intent's Cypher template runs
//! against the graph to produce baseline evidence. Embedding evidence comes
//! from a similarity search over pre-embedded journeys (or from re-ranking
//! the baseline rows). A chat model then answers strictly from that
//! evidence.
//!
//! # Layout
//!
//! - [`intent`]: intent registry, parameterized templates, parameter binding
//! - [`store`]: graph accessors (in-process [`graph::GraphStore`], Neo4j HTTP)
//! - [`dispatch`]: intent to evidence, failures folded into sentinels
//! - [`rank`]: embedding similarity ranking of rows
//! - [`retrieve`]: baseline plus embedding retrieval
//! - [`embed`], [`nlq`], [`answer`], [`pipeline`]: model-facing collaborators
//! - [`http`]: JSON API
//!
//! ## Example Usage
//!
//! ```rust
//! use aerograph::intent::{BindDefaults, Entities, Intent};
//!
//! let template = Intent::MostDelayedFlights.template();
//! let params = template
//!     .bind(&Entities::route("lax", "ORD"), &BindDefaults::default())
//!     .unwrap();
//!
//! assert_eq!(params["origin"].as_string(), Some("LAX"));
//! assert_eq!(params["limit"].as_integer(), Some(5));
//! assert!(template.cypher.contains("$origin"));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod answer;
pub mod config;
pub mod dispatch;
pub mod embed;
pub mod eval;
pub mod evidence;
pub mod graph;
pub mod http;
pub mod intent;
pub mod nlq;
pub mod pipeline;
pub mod rank;
pub mod retrieve;
pub mod store;
pub mod vector;

// Re-export main types for convenience
pub use graph::{
    AirlineGraph, Edge, EdgeId, EdgeType, GraphError, GraphResult, GraphStore, JourneyRecord, Label, Node,
    NodeId, PropertyMap, PropertyValue,
};

pub use intent::{BindDefaults, Entities, Intent, Param, ParamError, Params, Template};

pub use evidence::{EmptyReason, Evidence, EvidenceBundle, Row};

pub use store::{GraphAccessor, HttpAccessor, MemoryAccessor, Statement, StoreError, StoreResult};

pub use dispatch::QueryDispatcher;

pub use rank::{RankPolicy, ScoredRow, SimilarityRanker};

pub use retrieve::{EmbeddingStrategy, RetrievalConfig, Retriever};

pub use embed::{EmbedError, EmbedResult, Embedder, Embedders, EmbeddingModel, HashingEmbedder, JourneyIndexer};

pub use nlq::{ChatModel, EntityExtractor, Fallback, IntentClassifier, NLQError, NLQResult};

pub use answer::{AnswerGenerator, REFUSAL};

pub use pipeline::{Assistant, Interaction, StageTimings};

pub use config::{AppConfig, ConfigError, ConfigResult, LLMProvider};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.3.0");
    }
}
