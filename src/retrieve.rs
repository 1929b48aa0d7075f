//! Two-channel retrieval
//!
//! Baseline evidence comes from the intent's template through the
//! dispatcher. Embedding evidence is optional and comes either from a
//! store-side nearest-neighbour search over pre-embedded journeys or from
//! re-ranking the baseline rows.

use crate::dispatch::QueryDispatcher;
use crate::embed::{Embedder, Embedders};
use crate::evidence::{EmptyReason, Evidence, EvidenceBundle};
use crate::graph::PropertyValue;
use crate::intent::{BindDefaults, Entities, Params};
use crate::rank::{RankPolicy, SimilarityRanker};
use crate::store::{GraphAccessor, Statement};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Source of embedding evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingStrategy {
    /// Nearest-neighbour search over journey embeddings in the store
    #[default]
    StoreSearch,
    /// Full re-ranking of the baseline rows
    Rerank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// `limit` used when the question does not name one
    pub default_limit: i64,
    /// Maximum similar journeys returned by the store search
    pub top_k: usize,
    /// Similarity must be strictly above this value
    pub cutoff: f32,
    /// Deadline for each store read and each embedding call
    pub timeout_secs: u64,
    pub strategy: EmbeddingStrategy,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            top_k: 5,
            cutoff: 0.5,
            timeout_secs: 10,
            strategy: EmbeddingStrategy::StoreSearch,
        }
    }
}

impl RetrievalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

pub struct Retriever {
    dispatcher: QueryDispatcher,
    ranker: SimilarityRanker,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(accessor: Arc<dyn GraphAccessor>, embedders: Embedders, config: RetrievalConfig) -> Self {
        let dispatcher = QueryDispatcher::new(accessor)
            .with_defaults(BindDefaults {
                limit: config.default_limit,
            })
            .with_deadline(config.timeout());
        let ranker = SimilarityRanker::new(embedders).with_deadline(config.timeout());
        Self {
            dispatcher,
            ranker,
            config,
        }
    }

    pub fn dispatcher(&self) -> &QueryDispatcher {
        &self.dispatcher
    }

    pub fn ranker(&self) -> &SimilarityRanker {
        &self.ranker
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn available_embedders(&self) -> Vec<String> {
        self.ranker.embedders().available()
    }

    /// Retrieve baseline and (optionally) embedding evidence for a question.
    ///
    /// `top_k` overrides the configured store-search size for this call.
    pub async fn retrieve(
        &self,
        intent: &str,
        entities: &Entities,
        query: &str,
        embedder: Option<&str>,
        top_k: Option<usize>,
    ) -> EvidenceBundle {
        let baseline = self.dispatcher.dispatch(intent, entities).await;
        info!(
            "Retrieved baseline for '{}': {}",
            intent,
            if baseline.is_data() { "data" } else { "no data" }
        );

        let embedding = match embedder {
            None => Evidence::Empty(EmptyReason::EmbeddingsNotUsed {
                available: self.available_embedders(),
            }),
            Some(name) => match self.ranker.embedders().get(name) {
                None => Evidence::Empty(EmptyReason::InvalidEmbedder {
                    requested: name.to_string(),
                    available: self.available_embedders(),
                }),
                Some(embedder) => match self.config.strategy {
                    EmbeddingStrategy::StoreSearch => {
                        let top_k = top_k.unwrap_or(self.config.top_k);
                        self.similar_journeys(query, embedder.as_ref(), top_k).await
                    }
                    EmbeddingStrategy::Rerank => self.rerank(query, &baseline, embedder.as_ref()).await,
                },
            },
        };

        EvidenceBundle { baseline, embedding }
    }

    /// Journeys whose stored embedding is most similar to the question
    pub async fn similar_journeys(&self, query: &str, embedder: &dyn Embedder, top_k: usize) -> Evidence {
        let model = embedder.model();
        let vector = match self.ranker.encode(embedder, &[query.to_string()]).await {
            Ok(mut vectors) => vectors.remove(0),
            Err(e) => {
                warn!("Encoding the question with {} failed: {}", model, e);
                return Evidence::failed(format!("embedding search failed: {}", e));
            }
        };

        let mut params = Params::new();
        params.insert("query_embedding".to_string(), PropertyValue::Vector(vector));
        params.insert("cutoff".to_string(), PropertyValue::Float(self.config.cutoff as f64));
        params.insert("top_k".to_string(), PropertyValue::Integer(top_k as i64));

        match self
            .dispatcher
            .execute(&Statement::SimilarJourneys(model), &params)
            .await
        {
            Ok(rows) if rows.is_empty() => Evidence::Empty(EmptyReason::NoSimilarJourneys),
            Ok(rows) => {
                debug!("{} similar journeys via {}", rows.len(), model);
                Evidence::Rows(rows)
            }
            Err(e) => {
                warn!("Similarity search with {} failed: {}", model, e);
                Evidence::failed(format!("embedding search failed: {}", e))
            }
        }
    }

    async fn rerank(&self, query: &str, baseline: &Evidence, embedder: &dyn Embedder) -> Evidence {
        if !baseline.is_data() {
            return Evidence::Empty(EmptyReason::NoSimilarJourneys);
        }
        match self
            .ranker
            .rank_scored(query, baseline.rows(), embedder, RankPolicy::FullPermutation)
            .await
        {
            Ok(scored) => Evidence::Rows(scored.into_iter().map(|s| s.into_row()).collect()),
            Err(e) => {
                warn!("Re-ranking with {} failed: {}", embedder.model(), e);
                Evidence::failed(format!("embedding re-rank failed: {}", e))
            }
        }
    }
}
