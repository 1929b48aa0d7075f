//! Graph store access
//!
//! Retrieval talks to the knowledge graph through [`GraphAccessor`]: run one
//! compiled [`Statement`] with out-of-band parameters, get rows back as
//! ordered column maps. Each call acquires its own scoped session and
//! releases it on completion or failure.
//!
//! Two backends:
//! - [`MemoryAccessor`]: an in-process [`GraphStore`](crate::graph::GraphStore)
//!   evaluated natively
//! - [`HttpAccessor`]: a Neo4j server over its HTTP transactional API

pub mod memory;
pub mod neo4j;
mod traversal;

use crate::embed::EmbeddingModel;
use crate::evidence::Row;
use crate::intent::{Intent, ParamError, Params};
use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use memory::MemoryAccessor;
pub use neo4j::HttpAccessor;

/// Store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Parameter error: {0}")]
    Parameter(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<ParamError> for StoreError {
    fn from(e: ParamError) -> Self {
        StoreError::Parameter(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Columns of a similar-journeys row
pub const SIMILAR_JOURNEY_COLUMNS: &[&str] = &[
    "id",
    "class",
    "food",
    "delay",
    "miles",
    "flight",
    "aircraft",
    "origin",
    "destination",
    "score",
];

/// A read statement the accessors know how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statement {
    /// The template bound to an intent
    Intent(Intent),
    /// Journeys whose stored embedding for the model is closest to
    /// `$query_embedding`, with cosine similarity above `$cutoff`, at most
    /// `$top_k`, most similar first
    SimilarJourneys(EmbeddingModel),
}

impl Statement {
    pub fn cypher(&self) -> Cow<'static, str> {
        match self {
            Statement::Intent(intent) => Cow::Borrowed(intent.template().cypher),
            // The model key is a closed-registry identifier, never user input.
            // vector.similarity.cosine is rescaled to [0, 1]; undo that so the
            // cutoff applies to raw cosine similarity.
            Statement::SimilarJourneys(model) => Cow::Owned(format!(
                "\
MATCH (j:Journey)-[:ON]->(f:Flight)
MATCH (f)-[:DEPARTS_FROM]->(o:Airport)
MATCH (f)-[:ARRIVES_AT]->(d:Airport)
WHERE j.{key} IS NOT NULL
WITH j, f, o, d, 2 * vector.similarity.cosine(j.{key}, $query_embedding) - 1 AS score
WHERE score > $cutoff
RETURN j.feedback_ID AS id, j.passenger_class AS class, j.food_satisfaction_score AS food,
       j.arrival_delay_minutes AS delay, j.actual_flown_miles AS miles,
       f.flight_number AS flight, f.fleet_type_description AS aircraft,
       o.station_code AS origin, d.station_code AS destination, score
ORDER BY score DESC, id ASC
LIMIT $top_k",
                key = model.key()
            )),
        }
    }

    /// Documented output columns, in order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Statement::Intent(intent) => intent.template().columns,
            Statement::SimilarJourneys(_) => SIMILAR_JOURNEY_COLUMNS,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Intent(intent) => write!(f, "{}", intent),
            Statement::SimilarJourneys(model) => write!(f, "similar_journeys[{}]", model),
        }
    }
}

/// Executes parameterized read statements against the knowledge graph
#[async_trait]
pub trait GraphAccessor: Send + Sync {
    /// Backend name for logs and status output
    fn name(&self) -> &str;

    async fn run(&self, statement: &Statement, params: &Params) -> StoreResult<Vec<Row>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_statement_uses_model_property() {
        let cypher = Statement::SimilarJourneys(EmbeddingModel::MpNet).cypher();
        assert!(cypher.contains("j.mpnet IS NOT NULL"));
        assert!(cypher.contains("$query_embedding"));
        assert!(cypher.contains("$cutoff"));
        assert!(cypher.contains("LIMIT $top_k"));
        assert!(!cypher.contains("minilm"));
    }

    #[test]
    fn test_statement_columns() {
        assert_eq!(
            Statement::Intent(Intent::PopularAirports).columns(),
            &["airport", "journey_count", "examples"]
        );
        assert_eq!(Statement::SimilarJourneys(EmbeddingModel::MiniLm).columns().last(), Some(&"score"));
        assert_eq!(Statement::SimilarJourneys(EmbeddingModel::MiniLm).to_string(), "similar_journeys[minilm]");
    }

    #[test]
    fn test_param_error_maps_to_parameter() {
        let err: StoreError = ParamError::Missing {
            intent: "direct_flight",
            param: crate::intent::Param::Origin,
        }
        .into();
        assert!(matches!(err, StoreError::Parameter(_)));
    }
}
