//! Airline knowledge-graph schema
//!
//! ```text
//! (Passenger)-[:TOOK]->(Journey)-[:ON]->(Flight)-[:DEPARTS_FROM]->(Airport)
//!                                        (Flight)-[:ARRIVES_AT]->(Airport)
//! ```
//!
//! Identity rules: Passenger by `record_locator`, Journey by `feedback_ID`,
//! Flight by (`flight_number`, `fleet_type_description`), Airport by
//! `station_code`. The names below are the contract with whatever loads the
//! graph; query templates resolve against them.

use super::property::{PropertyMap, PropertyValue};
use super::store::{GraphResult, GraphStore};
use super::types::{Label, NodeId};
use serde::{Deserialize, Serialize};

pub const PASSENGER: &str = "Passenger";
pub const JOURNEY: &str = "Journey";
pub const FLIGHT: &str = "Flight";
pub const AIRPORT: &str = "Airport";

pub const TOOK: &str = "TOOK";
pub const ON: &str = "ON";
pub const DEPARTS_FROM: &str = "DEPARTS_FROM";
pub const ARRIVES_AT: &str = "ARRIVES_AT";

pub const RECORD_LOCATOR: &str = "record_locator";
pub const LOYALTY_LEVEL: &str = "loyalty_program_level";
pub const GENERATION: &str = "generation";

pub const FEEDBACK_ID: &str = "feedback_ID";
pub const FOOD_SCORE: &str = "food_satisfaction_score";
pub const ARRIVAL_DELAY: &str = "arrival_delay_minutes";
pub const FLOWN_MILES: &str = "actual_flown_miles";
pub const LEGS: &str = "number_of_legs";
pub const PASSENGER_CLASS: &str = "passenger_class";

pub const FLIGHT_NUMBER: &str = "flight_number";
pub const FLEET_TYPE: &str = "fleet_type_description";

pub const STATION_CODE: &str = "station_code";

/// One survey row: a passenger's journey on a flight between two airports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyRecord {
    pub feedback_id: String,
    pub record_locator: String,
    #[serde(default)]
    pub loyalty_level: Option<String>,
    #[serde(default)]
    pub generation: Option<String>,
    #[serde(default)]
    pub food_score: Option<i64>,
    #[serde(default)]
    pub arrival_delay: Option<i64>,
    #[serde(default)]
    pub flown_miles: Option<f64>,
    #[serde(default = "single_leg")]
    pub legs: i64,
    #[serde(default)]
    pub passenger_class: Option<String>,
    pub flight_number: i64,
    pub aircraft: String,
    pub origin: String,
    pub destination: String,
}

fn single_leg() -> i64 {
    1
}

/// Merge-style writer over a [`GraphStore`] that enforces the airline
/// identity rules. Re-adding a record is idempotent.
pub struct AirlineGraph<'a> {
    store: &'a mut GraphStore,
}

impl<'a> AirlineGraph<'a> {
    pub fn new(store: &'a mut GraphStore) -> Self {
        Self { store }
    }

    pub fn merge_airport(&mut self, code: &str) -> GraphResult<NodeId> {
        self.store
            .merge_node(AIRPORT, &[(STATION_CODE, code.into())], PropertyMap::new())
    }

    /// Merge a flight and its two airport edges
    pub fn merge_flight(
        &mut self,
        flight_number: i64,
        aircraft: &str,
        origin: &str,
        destination: &str,
    ) -> GraphResult<NodeId> {
        let flight = self.store.merge_node(
            FLIGHT,
            &[(FLIGHT_NUMBER, flight_number.into()), (FLEET_TYPE, aircraft.into())],
            PropertyMap::new(),
        )?;
        let o = self.merge_airport(origin)?;
        let d = self.merge_airport(destination)?;
        // A flight keeps the first route it was loaded with
        if self.store.out_neighbors(flight, DEPARTS_FROM).is_empty() {
            self.store.create_edge(flight, o, DEPARTS_FROM)?;
        }
        if self.store.out_neighbors(flight, ARRIVES_AT).is_empty() {
            self.store.create_edge(flight, d, ARRIVES_AT)?;
        }
        Ok(flight)
    }

    pub fn merge_passenger(
        &mut self,
        locator: &str,
        loyalty_level: Option<&str>,
        generation: Option<&str>,
    ) -> GraphResult<NodeId> {
        let mut props = PropertyMap::new();
        props.insert(LOYALTY_LEVEL.to_string(), loyalty_level.into());
        props.insert(GENERATION.to_string(), generation.into());
        self.store
            .merge_node(PASSENGER, &[(RECORD_LOCATOR, locator.into())], props)
    }

    /// Merge a full survey record: passenger, journey, flight and airports
    pub fn merge_journey(&mut self, record: &JourneyRecord) -> GraphResult<NodeId> {
        let passenger = self.merge_passenger(
            &record.record_locator,
            record.loyalty_level.as_deref(),
            record.generation.as_deref(),
        )?;
        let flight = self.merge_flight(
            record.flight_number,
            &record.aircraft,
            &record.origin,
            &record.destination,
        )?;

        let mut props = PropertyMap::new();
        props.insert(FOOD_SCORE.to_string(), record.food_score.into());
        props.insert(ARRIVAL_DELAY.to_string(), record.arrival_delay.into());
        props.insert(FLOWN_MILES.to_string(), record.flown_miles.into());
        props.insert(LEGS.to_string(), record.legs.into());
        props.insert(PASSENGER_CLASS.to_string(), record.passenger_class.as_deref().into());
        let journey = self.store.merge_node(
            JOURNEY,
            &[(FEEDBACK_ID, record.feedback_id.as_str().into())],
            props,
        )?;

        self.store.create_edge(passenger, journey, TOOK)?;
        if self.store.out_neighbors(journey, ON).is_empty() {
            self.store.create_edge(journey, flight, ON)?;
        }
        Ok(journey)
    }

    /// Look up a journey by its feedback id
    pub fn journey(&self, feedback_id: &str) -> Option<NodeId> {
        self.store
            .get_nodes_by_label(&Label::new(JOURNEY))
            .into_iter()
            .find(|n| n.get_string(FEEDBACK_ID) == Some(feedback_id))
            .map(|n| n.id)
    }

    /// Store an embedding vector on a journey under the model's property name
    pub fn set_journey_embedding(&mut self, journey: NodeId, model_key: &str, vector: Vec<f32>) -> GraphResult<()> {
        self.store
            .set_node_property(journey, model_key, PropertyValue::Vector(vector))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, locator: &str, flight: i64) -> JourneyRecord {
        JourneyRecord {
            feedback_id: id.to_string(),
            record_locator: locator.to_string(),
            loyalty_level: Some("Gold".to_string()),
            generation: Some("Millennials".to_string()),
            food_score: Some(3),
            arrival_delay: Some(-5),
            flown_miles: Some(1744.0),
            legs: 1,
            passenger_class: Some("economy".to_string()),
            flight_number: flight,
            aircraft: "B737-800".to_string(),
            origin: "LAX".to_string(),
            destination: "ORD".to_string(),
        }
    }

    #[test]
    fn test_merge_journey_is_idempotent() {
        let mut store = GraphStore::new();
        let mut graph = AirlineGraph::new(&mut store);
        let j1 = graph.merge_journey(&record("F1", "P1", 2411)).unwrap();
        let j1_again = graph.merge_journey(&record("F1", "P1", 2411)).unwrap();
        graph.merge_journey(&record("F2", "P1", 2411)).unwrap();
        assert_eq!(j1, j1_again);
        assert!(graph.journey("F2").is_some());

        // passenger, 2 journeys, flight, 2 airports
        assert_eq!(store.node_count(), 6);
        // 2x TOOK, 2x ON, DEPARTS_FROM, ARRIVES_AT
        assert_eq!(store.edge_count(), 6);
    }

    #[test]
    fn test_journey_has_exactly_one_flight() {
        let mut store = GraphStore::new();
        let mut graph = AirlineGraph::new(&mut store);
        let j = graph.merge_journey(&record("F1", "P1", 2411)).unwrap();
        // Same journey id with a different flight does not add a second ON edge
        graph.merge_journey(&record("F1", "P1", 924)).unwrap();
        assert_eq!(store.out_neighbors(j, ON).len(), 1);
    }
}
