//! Evidence: what retrieval hands to answer generation
//!
//! Retrieval never raises to its caller. Every channel yields an
//! [`Evidence`] value: data rows, an explained absence, or a failure. The
//! sentinel forms render as single-key rows (`message` / `error`) so that a
//! prompt or a JSON client sees the same shape either way.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// One result row: column name to value, in template column order
pub type Row = IndexMap<String, serde_json::Value>;

pub const MESSAGE_KEY: &str = "message";
pub const ERROR_KEY: &str = "error";

/// True for the single-key sentinel rows produced by [`Evidence::records`]
pub fn is_sentinel(row: &Row) -> bool {
    row.contains_key(MESSAGE_KEY) || row.contains_key(ERROR_KEY)
}

/// Why a channel produced no data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    UnknownIntent(String),
    NoMatchingData,
    NoSimilarJourneys,
    EmbeddingsNotUsed { available: Vec<String> },
    InvalidEmbedder { requested: String, available: Vec<String> },
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::UnknownIntent(name) => {
                write!(f, "no template for intent '{}'; please rephrase the question", name)
            }
            EmptyReason::NoMatchingData => {
                f.write_str("no matching data found in the knowledge graph")
            }
            EmptyReason::NoSimilarJourneys => {
                f.write_str("no similar journeys found")
            }
            EmptyReason::EmbeddingsNotUsed { available } => write!(
                f,
                "embeddings not used; available embedders: {}",
                available.join(", ")
            ),
            EmptyReason::InvalidEmbedder { requested, available } => write!(
                f,
                "invalid embedder '{}'; available embedders: {}",
                requested,
                available.join(", ")
            ),
        }
    }
}

/// Result of one retrieval channel
#[derive(Debug, Clone, PartialEq)]
pub enum Evidence {
    Rows(Vec<Row>),
    Empty(EmptyReason),
    Failed(String),
}

impl Evidence {
    pub fn failed(cause: impl fmt::Display) -> Self {
        Evidence::Failed(cause.to_string())
    }

    /// True when the channel produced data rows
    pub fn is_data(&self) -> bool {
        matches!(self, Evidence::Rows(rows) if !rows.is_empty())
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Evidence::Failed(_))
    }

    /// Data rows; empty for sentinels
    pub fn rows(&self) -> &[Row] {
        match self {
            Evidence::Rows(rows) => rows,
            _ => &[],
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Evidence::Rows(rows) => rows,
            _ => Vec::new(),
        }
    }

    pub fn empty_reason(&self) -> Option<&EmptyReason> {
        match self {
            Evidence::Empty(reason) => Some(reason),
            _ => None,
        }
    }

    /// Rows as presented downstream; sentinels become one single-key row
    pub fn records(&self) -> Vec<Row> {
        match self {
            Evidence::Rows(rows) => rows.clone(),
            Evidence::Empty(reason) => vec![sentinel(MESSAGE_KEY, reason.to_string())],
            Evidence::Failed(cause) => vec![sentinel(ERROR_KEY, cause.clone())],
        }
    }
}

fn sentinel(key: &str, text: String) -> Row {
    let mut row = Row::new();
    row.insert(key.to_string(), serde_json::Value::String(text));
    row
}

impl Serialize for Evidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records().serialize(serializer)
    }
}

/// Baseline and embedding evidence for one question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceBundle {
    pub baseline: Evidence,
    pub embedding: Evidence,
}

impl EvidenceBundle {
    /// True when at least one channel carries data
    pub fn has_data(&self) -> bool {
        self.baseline.is_data() || self.embedding.is_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_sentinel_records() {
        let empty = Evidence::Empty(EmptyReason::UnknownIntent("weather".into()));
        let records = empty.records();
        assert_eq!(records.len(), 1);
        assert!(is_sentinel(&records[0]));
        assert_eq!(records[0][MESSAGE_KEY], json!("no template for intent 'weather'; please rephrase the question"));
        assert!(!empty.is_data());

        let failed = Evidence::failed("store unreachable");
        assert_eq!(failed.records()[0][ERROR_KEY], json!("store unreachable"));
        assert!(failed.is_failed());
        assert!(failed.rows().is_empty());
    }

    #[test]
    fn test_rows_are_data() {
        let rows = vec![row(&[("airport", json!("LAX")), ("journey_count", json!(4))])];
        let evidence = Evidence::Rows(rows.clone());
        assert!(evidence.is_data());
        assert!(!is_sentinel(&rows[0]));
        assert_eq!(evidence.records(), rows);
        assert!(!Evidence::Rows(Vec::new()).is_data());
    }

    #[test]
    fn test_bundle_serializes_as_records() {
        let bundle = EvidenceBundle {
            baseline: Evidence::Rows(vec![row(&[("airport", json!("LAX"))])]),
            embedding: Evidence::Empty(EmptyReason::EmbeddingsNotUsed {
                available: vec!["minilm".into(), "mpnet".into()],
            }),
        };
        let value = serde_json::to_value(&bundle).unwrap();
        assert_eq!(value["baseline"], json!([{"airport": "LAX"}]));
        assert_eq!(
            value["embedding"],
            json!([{"message": "embeddings not used; available embedders: minilm, mpnet"}])
        );
        assert!(bundle.has_data());
    }
}
