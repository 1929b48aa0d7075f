//! Built-in sample graph for trying the engine without a dataset

use aerograph::graph::{AirlineGraph, GraphResult, GraphStore, JourneyRecord};

#[allow(clippy::too_many_arguments)]
fn journey(
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
    route: (&str, &str),
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
        origin: route.0.to_string(),
        destination: route.1.to_string(),
    }
}

pub fn records() -> Vec<JourneyRecord> {
    vec![
        journey("S1", "P01", Some("premier gold"), "Millennials", 2, 45, 1744.0, 1, "economy", 2411, "B737-800", ("LAX", "IAX")),
        journey("S2", "P02", None, "Gen X", 3, 38, 1744.0, 1, "economy", 2411, "B737-800", ("LAX", "IAX")),
        journey("S3", "P03", Some("global services"), "Boomer", 4, 52, 1744.0, 1, "business", 2411, "B737-800", ("LAX", "IAX")),
        journey("S4", "P04", None, "Gen Z", 3, 12, 1744.0, 1, "economy", 518, "A320-200", ("LAX", "IAX")),
        journey("S5", "P05", Some("premier silver"), "Millennials", 1, -4, 719.0, 1, "economy", 924, "E175", ("ORX", "IAX")),
        journey("S6", "P06", None, "Gen X", 2, 7, 719.0, 1, "economy", 924, "E175", ("ORX", "IAX")),
        journey("S7", "P07", None, "Boomer", 4, 0, 719.0, 1, "economy", 1130, "B757-200", ("ORX", "IAX")),
        journey("S8", "P08", Some("non-elite"), "Millennials", 5, 21, 1285.0, 2, "economy", 333, "A319", ("DFX", "ORX")),
        journey("S9", "P09", None, "Gen X", 4, 3, 1290.0, 1, "business", 334, "A319", ("DFX", "ORX")),
        journey("S10", "P10", Some("premier 1k"), "Boomer", 3, 15, 1190.0, 2, "economy", 1710, "B737-900", ("DEX", "LAX")),
        journey("S11", "P11", Some("premier platinum"), "Millennials", 2, 64, 1400.0, 1, "economy", 845, "B767-300", ("EWX", "IAX")),
        journey("S12", "P01", Some("premier gold"), "Millennials", 3, 9, 1400.0, 1, "business", 845, "B767-300", ("EWX", "IAX")),
    ]
}

/// Sample graph loaded into a fresh store
pub fn graph() -> GraphResult<GraphStore> {
    let mut store = GraphStore::new();
    load(&mut store, &records())?;
    Ok(store)
}

pub fn load(store: &mut GraphStore, records: &[JourneyRecord]) -> GraphResult<usize> {
    let mut graph = AirlineGraph::new(store);
    for record in records {
        graph.merge_journey(record)?;
    }
    Ok(records.len())
}
