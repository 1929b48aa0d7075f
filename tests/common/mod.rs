//! Shared fixture graph for integration tests
//!
//! Routes:
//! - LAX->ORD: flight 100 (delays 10, 14) and flight 200 (delays 40, 50)
//! - JFK->SFO: flight 2411, two economy journeys and one business
//! - DEN->SEA: flight 300, one two-leg journey only

#![allow(dead_code)]

use aerograph::embed::{Embedders, JourneyIndexer};
use aerograph::graph::{AirlineGraph, GraphStore, JourneyRecord};
use aerograph::retrieve::{RetrievalConfig, Retriever};
use aerograph::store::MemoryAccessor;
use std::sync::Arc;

#[allow(clippy::too_many_arguments)]
pub fn record(
    id: &str,
    locator: &str,
    loyalty: Option<&str>,
    generation: &str,
    food: i64,
    delay: i64,
    miles: f64,
    legs: i64,
    class: &str,
    flight: i64,
    aircraft: &str,
    origin: &str,
    destination: &str,
) -> JourneyRecord {
    JourneyRecord {
        feedback_id: id.to_string(),
        record_locator: locator.to_string(),
        loyalty_level: loyalty.map(str::to_string),
        generation: Some(generation.to_string()),
        food_score: Some(food),
        arrival_delay: Some(delay),
        flown_miles: Some(miles),
        legs,
        passenger_class: Some(class.to_string()),
        flight_number: flight,
        aircraft: aircraft.to_string(),
        origin: origin.to_string(),
        destination: destination.to_string(),
    }
}

pub fn records() -> Vec<JourneyRecord> {
    vec![
        record("J01", "P01", Some("Gold"), "Millennials", 2, 10, 1744.0, 1, "economy", 100, "B737-800", "LAX", "ORD"),
        record("J02", "P02", None, "Gen X", 3, 14, 1744.0, 1, "economy", 100, "B737-800", "LAX", "ORD"),
        record("J03", "P03", Some("Gold"), "Boomer", 1, 40, 1750.0, 1, "business", 200, "A320-200", "LAX", "ORD"),
        record("J04", "P04", None, "Millennials", 2, 50, 1750.0, 1, "economy", 200, "A320-200", "LAX", "ORD"),
        record("J05", "P05", None, "Gen X", 4, 5, 2586.0, 1, "economy", 2411, "B737-800", "JFK", "SFO"),
        record("J06", "P06", Some("Silver"), "Gen X", 5, 0, 2586.0, 1, "economy", 2411, "B737-800", "JFK", "SFO"),
        record("J07", "P07", None, "Boomer", 4, -3, 2586.0, 1, "business", 2411, "B737-800", "JFK", "SFO"),
        record("J08", "P08", None, "Millennials", 3, 20, 1020.0, 2, "economy", 300, "E175", "DEN", "SEA"),
    ]
}

pub fn fixture_graph() -> GraphStore {
    let mut store = GraphStore::new();
    let mut graph = AirlineGraph::new(&mut store);
    for record in records() {
        graph.merge_journey(&record).unwrap();
    }
    store
}

pub fn fixture_accessor() -> MemoryAccessor {
    MemoryAccessor::new(fixture_graph())
}

/// Retriever over the fixture with offline embedders and indexed journeys
pub async fn fixture_retriever(config: RetrievalConfig) -> Retriever {
    let accessor = fixture_accessor();
    let embedders = Embedders::offline();
    let indexer = JourneyIndexer::default();
    let store = accessor.shared();
    for name in embedders.available() {
        let embedder = embedders.get(&name).unwrap();
        indexer.index(&store, embedder.as_ref()).await.unwrap();
    }
    Retriever::new(Arc::new(accessor), embedders, config)
}
