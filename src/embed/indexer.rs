//! Journey embedding indexer
//!
//! Renders every Journey as a short description, encodes the descriptions
//! with one model and stores the vectors on the Journey under the model's
//! key, then builds the matching vector index.

use crate::embed::{EmbedError, EmbedResult, Embedder};
use crate::graph::airline::{
    AirlineGraph, ARRIVAL_DELAY, ARRIVES_AT, DEPARTS_FROM, FEEDBACK_ID, FLEET_TYPE, FLIGHT_NUMBER,
    FLOWN_MILES, FOOD_SCORE, JOURNEY, ON, PASSENGER_CLASS, STATION_CODE,
};
use crate::graph::{GraphStore, Label, Node, NodeId};
use tokio::sync::RwLock;

const DEFAULT_BATCH_SIZE: usize = 1000;

/// Natural-language description of a journey
pub fn journey_description(journey: &Node, flight: &Node, origin: &Node, destination: &Node) -> String {
    let show = |node: &Node, key: &str| {
        node.non_null(key)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    };
    format!(
        "A {} class journey on flight {} ({}) from {} to {}. \
         The flight covered {} miles. \
         Passenger food rating: {}/5. \
         Arrival delay: {} minutes.",
        show(journey, PASSENGER_CLASS),
        show(flight, FLIGHT_NUMBER),
        show(flight, FLEET_TYPE),
        show(origin, STATION_CODE),
        show(destination, STATION_CODE),
        show(journey, FLOWN_MILES),
        show(journey, FOOD_SCORE),
        show(journey, ARRIVAL_DELAY),
    )
}

/// Descriptions of all journeys that have a complete flight/route, by feedback id
pub fn journey_descriptions(store: &GraphStore) -> Vec<(NodeId, String)> {
    let mut journeys = store.get_nodes_by_label(&Label::new(JOURNEY));
    journeys.sort_by(|a, b| a.get_string(FEEDBACK_ID).cmp(&b.get_string(FEEDBACK_ID)));
    journeys
        .into_iter()
        .filter_map(|journey| {
            let flight = *store.out_neighbors(journey.id, ON).first()?;
            let origin = *store.out_neighbors(flight.id, DEPARTS_FROM).first()?;
            let destination = *store.out_neighbors(flight.id, ARRIVES_AT).first()?;
            Some((journey.id, journey_description(journey, flight, origin, destination)))
        })
        .collect()
}

/// Writes per-model journey embeddings into a shared store
pub struct JourneyIndexer {
    batch_size: usize,
}

impl Default for JourneyIndexer {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl JourneyIndexer {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Embed every journey with `embedder`. Returns the number of journeys
    /// embedded. The store lock is not held while the model runs.
    pub async fn index(&self, store: &RwLock<GraphStore>, embedder: &dyn Embedder) -> EmbedResult<usize> {
        let model = embedder.model();
        let descriptions = journey_descriptions(&*store.read().await);
        tracing::info!("Indexing {} journeys with {}", descriptions.len(), model);

        let mut indexed = 0;
        for batch in descriptions.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
            let vectors = embedder.encode(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(EmbedError::CountMismatch {
                    expected: batch.len(),
                    got: vectors.len(),
                });
            }

            let mut guard = store.write().await;
            let mut graph = AirlineGraph::new(&mut guard);
            for ((journey, _), vector) in batch.iter().zip(vectors) {
                graph
                    .set_journey_embedding(*journey, model.key(), vector)
                    .map_err(|e| EmbedError::Graph(e.to_string()))?;
            }
            indexed += batch.len();
        }

        store
            .write()
            .await
            .create_vector_index(JOURNEY, model.key(), model.dimensions())
            .map_err(|e| EmbedError::Graph(e.to_string()))?;
        Ok(indexed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{EmbeddingModel, HashingEmbedder};
    use crate::graph::airline::JourneyRecord;

    fn store_with_journeys() -> GraphStore {
        let mut store = GraphStore::new();
        let mut graph = AirlineGraph::new(&mut store);
        for (id, delay) in [("F2", Some(30)), ("F1", None)] {
            graph
                .merge_journey(&JourneyRecord {
                    feedback_id: id.to_string(),
                    record_locator: "P1".to_string(),
                    loyalty_level: None,
                    generation: None,
                    food_score: Some(4),
                    arrival_delay: delay,
                    flown_miles: Some(1744.0),
                    legs: 1,
                    passenger_class: Some("economy".to_string()),
                    flight_number: 2411,
                    aircraft: "B737-800".to_string(),
                    origin: "LAX".to_string(),
                    destination: "ORD".to_string(),
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn test_descriptions() {
        let store = store_with_journeys();
        let descriptions = journey_descriptions(&store);
        assert_eq!(descriptions.len(), 2);
        assert_eq!(
            descriptions[0].1,
            "A economy class journey on flight 2411 (B737-800) from LAX to ORD. \
             The flight covered 1744 miles. Passenger food rating: 4/5. \
             Arrival delay: unknown minutes."
        );
        assert!(descriptions[1].1.ends_with("Arrival delay: 30 minutes."));
    }

    #[tokio::test]
    async fn test_index_writes_vectors_and_index() {
        let store = RwLock::new(store_with_journeys());
        let embedder = HashingEmbedder::new(EmbeddingModel::MiniLm);
        let count = JourneyIndexer::new(1).index(&store, &embedder).await.unwrap();
        assert_eq!(count, 2);

        let guard = store.read().await;
        let index = guard.vector_index.get_index(JOURNEY, "minilm").unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.dimensions(), 384);
        for journey in guard.get_nodes_by_label(&Label::new(JOURNEY)) {
            let vector = journey.get_property("minilm").and_then(|v| v.as_vector()).unwrap();
            assert_eq!(vector.len(), 384);
        }
    }

    struct ConstantEmbedder(Vec<f32>);

    #[async_trait::async_trait]
    impl Embedder for ConstantEmbedder {
        fn model(&self) -> EmbeddingModel {
            EmbeddingModel::MiniLm
        }

        async fn encode(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| self.0.clone()).collect())
        }
    }

    #[tokio::test]
    async fn test_reindex_replaces_stale_vectors() {
        let store = RwLock::new(store_with_journeys());
        let hashing = HashingEmbedder::new(EmbeddingModel::MiniLm);
        JourneyIndexer::default().index(&store, &hashing).await.unwrap();

        let mut axis = vec![0.0; 384];
        axis[7] = 1.0;
        let count = JourneyIndexer::default()
            .index(&store, &ConstantEmbedder(axis.clone()))
            .await
            .unwrap();
        assert_eq!(count, 2);

        let guard = store.read().await;
        let index = guard.vector_index.get_index(JOURNEY, "minilm").unwrap();
        assert_eq!(index.len(), 2);
        let hits = index.search(&axis, 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|(_, distance)| *distance < 1e-4), "{:?}", hits);
    }
}
