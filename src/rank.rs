//! Similarity ranking of result rows against the question
//!
//! Rows are flattened to `key: value` text, embedded together with the
//! question in one batch, and ordered by cosine similarity. Input rows are
//! never mutated; output rows are clones with a `score` column appended.

use crate::embed::{EmbedError, EmbedResult, Embedder, Embedders};
use crate::evidence::{EmptyReason, Evidence, Row};
use crate::vector::cosine_similarity;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const SCORE_KEY: &str = "score";

/// How scored rows are selected and ordered
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RankPolicy {
    /// Every row, most similar first; ties keep input order
    FullPermutation,
    /// Rows with similarity strictly above `cutoff`, at most `top_k`
    Threshold { cutoff: f32, top_k: usize },
}

/// A row and its similarity to the question
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRow {
    pub row: Row,
    pub score: f32,
}

impl ScoredRow {
    /// The row with its score appended as a column
    pub fn into_row(self) -> Row {
        let mut row = self.row;
        row.insert(SCORE_KEY.to_string(), Value::from(self.score as f64));
        row
    }
}

/// Flat text rendering of a row in its own column order
pub fn row_text(row: &Row) -> String {
    row.iter()
        .map(|(k, v)| format!("{}: {}", k, value_text(v)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub struct SimilarityRanker {
    embedders: Embedders,
    deadline: Duration,
}

impl SimilarityRanker {
    pub fn new(embedders: Embedders) -> Self {
        Self {
            embedders,
            deadline: Duration::from_secs(30),
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn embedders(&self) -> &Embedders {
        &self.embedders
    }

    /// Rank rows with the named embedder
    pub async fn rank(&self, query: &str, rows: &[Row], embedder: &str, policy: RankPolicy) -> Evidence {
        let Some(embedder) = self.embedders.get(embedder) else {
            return Evidence::Empty(EmptyReason::InvalidEmbedder {
                requested: embedder.to_string(),
                available: self.embedders.available(),
            });
        };
        match self.rank_scored(query, rows, embedder.as_ref(), policy).await {
            Ok(scored) => Evidence::Rows(scored.into_iter().map(ScoredRow::into_row).collect()),
            Err(e) => {
                warn!("Ranking with {} failed: {}", embedder.model(), e);
                Evidence::failed(e)
            }
        }
    }

    /// Score and order rows. An empty input returns immediately without
    /// calling the model.
    pub async fn rank_scored(
        &self,
        query: &str,
        rows: &[Row],
        embedder: &dyn Embedder,
        policy: RankPolicy,
    ) -> EmbedResult<Vec<ScoredRow>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut texts = Vec::with_capacity(rows.len() + 1);
        texts.push(query.to_string());
        texts.extend(rows.iter().map(row_text));

        let vectors = self.encode(embedder, &texts).await?;
        let (query_vec, row_vecs) = vectors
            .split_first()
            .ok_or(EmbedError::CountMismatch { expected: texts.len(), got: 0 })?;

        let mut scored: Vec<ScoredRow> = rows
            .iter()
            .zip(row_vecs)
            .map(|(row, vec)| ScoredRow {
                row: row.clone(),
                score: cosine_similarity(query_vec, vec),
            })
            .collect();
        // stable: equal scores keep input order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));

        if let RankPolicy::Threshold { cutoff, top_k } = policy {
            scored.retain(|s| s.score > cutoff);
            scored.truncate(top_k);
        }
        debug!("Ranked {} rows with {}, kept {}", rows.len(), embedder.model(), scored.len());
        Ok(scored)
    }

    /// One embedding call under the ranker's deadline
    pub async fn encode(&self, embedder: &dyn Embedder, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        let vectors = tokio::time::timeout(self.deadline, embedder.encode(texts))
            .await
            .map_err(|_| EmbedError::Timeout(self.deadline))??;
        if vectors.len() != texts.len() {
            return Err(EmbedError::CountMismatch {
                expected: texts.len(),
                got: vectors.len(),
            });
        }
        Ok(vectors)
    }
}
