mod common;

use aerograph::dispatch::QueryDispatcher;
use aerograph::evidence::{EmptyReason, Evidence, ERROR_KEY, MESSAGE_KEY};
use aerograph::graph::{AirlineGraph, GraphStore};
use aerograph::intent::{Entities, Intent, Params};
use aerograph::store::{GraphAccessor, HttpAccessor, MemoryAccessor, Statement, StoreError, StoreResult};
use aerograph::config::StoreConfig;
use aerograph::Row;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn dispatcher() -> QueryDispatcher {
    QueryDispatcher::new(Arc::new(common::fixture_accessor()))
}

fn floats(rows: &[Row], column: &str) -> Vec<f64> {
    rows.iter().map(|r| r[column].as_f64().unwrap()).collect()
}

fn entities_for(intent: Intent) -> Entities {
    match intent {
        Intent::MostDelayedFlights
        | Intent::LeastCrowdedFlights
        | Intent::RouteDistance
        | Intent::DirectFlight
        | Intent::FrequentFlyersRoute => Entities::route("LAX", "ORD"),
        Intent::WorstFoodRoutes | Intent::PopularAirports => Entities::new(),
        Intent::FlightClassesOffered | Intent::FlightAircraft => Entities::flight(2411),
        Intent::DominantGenerationAirport => Entities::airport("LAX"),
    }
}

#[tokio::test]
async fn test_every_intent_returns_documented_columns() {
    let dispatcher = dispatcher();
    for intent in Intent::ALL {
        let evidence = dispatcher.dispatch(intent.as_str(), &entities_for(intent)).await;
        assert!(evidence.is_data(), "{} returned {:?}", intent, evidence);
        for row in evidence.rows() {
            let keys: Vec<&str> = row.keys().map(String::as_str).collect();
            assert_eq!(keys, intent.template().columns, "{}", intent);
        }
    }
}

#[tokio::test]
async fn test_most_delayed_flights_ranks_by_average_delay() {
    // 45 and 12 minute averages on LAX->ORD
    let evidence = dispatcher()
        .dispatch("most_delayed_flights", &Entities::route("LAX", "ORD").with_limit(5))
        .await;
    let rows = evidence.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["flight"], json!(200));
    assert_eq!(rows[1]["flight"], json!(100));
    assert_eq!(floats(rows, "avg_delay"), vec![45.0, 12.0]);
    assert_eq!(rows[0]["samples"], json!(2));
    assert_eq!(rows[0]["examples"].as_array().unwrap().len(), 2);
    assert_eq!(rows[0]["examples"][0]["aircraft"], json!("A320-200"));
}

#[tokio::test]
async fn test_flight_without_delays_ranks_last() {
    let mut records = common::records();
    let mut missing = common::record(
        "J10", "P10", None, "Gen X", 3, 0, 1744.0, 1, "economy", 500, "B757-200", "LAX", "ORD",
    );
    missing.arrival_delay = None;
    records.push(missing);
    let mut store = GraphStore::new();
    let mut graph = AirlineGraph::new(&mut store);
    for record in &records {
        graph.merge_journey(record).unwrap();
    }
    let dispatcher = QueryDispatcher::new(Arc::new(MemoryAccessor::new(store)));

    let evidence = dispatcher
        .dispatch("most_delayed_flights", &Entities::route("LAX", "ORD"))
        .await;
    let flights: Vec<&Value> = evidence.rows().iter().map(|r| &r["flight"]).collect();
    assert_eq!(flights, vec![&json!(200), &json!(100), &json!(500)]);
    assert_eq!(evidence.rows()[2]["avg_delay"], Value::Null);
}

#[tokio::test]
async fn test_limit_caps_rows() {
    let evidence = dispatcher()
        .dispatch("most_delayed_flights", &Entities::route("LAX", "ORD").with_limit(1))
        .await;
    assert_eq!(evidence.rows().len(), 1);
    assert_eq!(evidence.rows()[0]["flight"], json!(200));
}

#[tokio::test]
async fn test_least_crowded_flights_ascending() {
    let evidence = dispatcher()
        .dispatch("least_crowded_flights", &Entities::route("LAX", "ORD"))
        .await;
    let counts: Vec<i64> = evidence
        .rows()
        .iter()
        .map(|r| r["passenger_count"].as_i64().unwrap())
        .collect();
    assert_eq!(counts, vec![2, 2]);
}

#[tokio::test]
async fn test_worst_food_routes_ascending() {
    let evidence = dispatcher().dispatch("worst_food_routes", &Entities::new()).await;
    let rows = evidence.rows();
    let routes: Vec<(Value, Value)> = rows
        .iter()
        .map(|r| (r["origin"].clone(), r["destination"].clone()))
        .collect();
    assert_eq!(
        routes,
        vec![
            (json!("LAX"), json!("ORD")),
            (json!("DEN"), json!("SEA")),
            (json!("JFK"), json!("SFO")),
        ]
    );
    let food = floats(rows, "avg_food");
    assert!(food.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(food[0], 2.0);
    // examples are capped at three
    assert_eq!(rows[0]["samples"], json!(4));
    assert_eq!(rows[0]["examples"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_popular_airports_descending() {
    let evidence = dispatcher()
        .dispatch("popular_airports", &Entities::new().with_limit(2))
        .await;
    let rows = evidence.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["airport"], json!("LAX"));
    assert_eq!(rows[0]["journey_count"], json!(4));
    assert_eq!(rows[1]["airport"], json!("JFK"));
    assert_eq!(rows[1]["journey_count"], json!(3));
}

#[tokio::test]
async fn test_flight_classes_grouped_by_class() {
    let evidence = dispatcher()
        .dispatch("flight_classes_offered", &Entities::flight(2411))
        .await;
    let rows = evidence.rows();
    assert_eq!(rows.len(), 2);

    let economy = rows.iter().find(|r| r["offered_class"] == json!("economy")).unwrap();
    let business = rows.iter().find(|r| r["offered_class"] == json!("business")).unwrap();
    assert_eq!(economy["examples"].as_array().unwrap().len(), 2);
    assert_eq!(business["examples"].as_array().unwrap().len(), 1);
    assert_eq!(economy["aircraft"], json!("B737-800"));
    assert_eq!(economy["origin"], json!("JFK"));
}

#[tokio::test]
async fn test_flight_class_examples_are_capped_at_two() {
    let mut records = common::records();
    records.push(common::record(
        "J09", "P09", None, "Gen Z", 3, 12, 2586.0, 1, "economy", 2411, "B737-800", "JFK", "SFO",
    ));
    let mut store = GraphStore::new();
    let mut graph = AirlineGraph::new(&mut store);
    for record in &records {
        graph.merge_journey(record).unwrap();
    }
    let dispatcher = QueryDispatcher::new(Arc::new(MemoryAccessor::new(store)));

    let evidence = dispatcher
        .dispatch("flight_classes_offered", &Entities::flight(2411))
        .await;
    let rows = evidence.rows();
    let classes: Vec<&Value> = rows.iter().map(|r| &r["offered_class"]).collect();
    assert_eq!(classes, vec![&json!("business"), &json!("economy")]);
    assert!(rows.iter().all(|r| r["aircraft"] == json!("B737-800")));

    let business = rows[0]["examples"].as_array().unwrap();
    assert_eq!(business.len(), 1);
    assert_eq!(business[0]["id"], json!("J07"));

    // three economy journeys, first two by id
    let economy = rows[1]["examples"].as_array().unwrap();
    let ids: Vec<&Value> = economy.iter().map(|e| &e["id"]).collect();
    assert_eq!(ids, vec![&json!("J05"), &json!("J06")]);
}

#[tokio::test]
async fn test_flight_number_text_is_coerced() {
    let entities: Entities = serde_json::from_value(json!({"flight_number": "UA2411"})).unwrap();
    let evidence = dispatcher().dispatch("flight_aircraft", &entities).await;
    let rows = evidence.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["flight"], json!(2411));
    assert_eq!(rows[0]["aircraft"], json!("B737-800"));
    assert_eq!(rows[0]["examples"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_route_distance_single_row() {
    let evidence = dispatcher()
        .dispatch("route_distance", &Entities::route("lax", "ord"))
        .await;
    let rows = evidence.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["avg_distance"].as_f64(), Some(1747.0));
    assert_eq!(rows[0]["samples"], json!(4));
}

#[tokio::test]
async fn test_direct_flight_negative_answer_is_data() {
    let evidence = dispatcher()
        .dispatch("direct_flight", &Entities::route("DEN", "SEA"))
        .await;
    assert!(evidence.is_data());
    let row = &evidence.rows()[0];
    assert_eq!(row["direct_available"], json!(false));
    assert_eq!(row["direct_count"], json!(0));
    assert_eq!(row["examples"], json!([]));

    let evidence = dispatcher()
        .dispatch("direct_flight", &Entities::route("LAX", "ORD"))
        .await;
    let row = &evidence.rows()[0];
    assert_eq!(row["direct_available"], json!(true));
    assert_eq!(row["direct_count"], json!(4));
}

#[tokio::test]
async fn test_frequent_flyers_route() {
    let evidence = dispatcher()
        .dispatch("frequent_flyers_route", &Entities::route("LAX", "ORD"))
        .await;
    let row = &evidence.rows()[0];
    assert_eq!(row["frequent_flyers_use_route"], json!(true));
    assert_eq!(row["frequent_flyer_count"], json!(2));
    assert_eq!(row["examples"][0]["loyalty_level"], json!("Gold"));

    let evidence = dispatcher()
        .dispatch("frequent_flyers_route", &Entities::route("DEN", "SEA"))
        .await;
    assert_eq!(evidence.rows()[0]["frequent_flyers_use_route"], json!(false));
}

#[tokio::test]
async fn test_dominant_generation_top_one() {
    let evidence = dispatcher()
        .dispatch("dominant_generation_airport", &Entities::airport("LAX"))
        .await;
    let rows = evidence.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["generation"], json!("Millennials"));
    assert_eq!(rows[0]["passenger_count"], json!(2));
}

#[tokio::test]
async fn test_unknown_intent_is_message_sentinel() {
    let evidence = dispatcher().dispatch("not_a_real_intent", &Entities::new()).await;
    assert_eq!(
        evidence,
        Evidence::Empty(EmptyReason::UnknownIntent("not_a_real_intent".to_string()))
    );
    let records = evidence.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].contains_key(MESSAGE_KEY));
}

#[tokio::test]
async fn test_unmatched_and_empty_store_are_message_sentinels() {
    let evidence = dispatcher()
        .dispatch("most_delayed_flights", &Entities::route("LAX", "XXX"))
        .await;
    assert_eq!(evidence, Evidence::Empty(EmptyReason::NoMatchingData));

    let empty = QueryDispatcher::new(Arc::new(MemoryAccessor::new(GraphStore::new())));
    for intent in Intent::ALL {
        let evidence = empty.dispatch(intent.as_str(), &entities_for(intent)).await;
        let records = evidence.records();
        assert_eq!(records.len(), 1, "{}", intent);
        assert!(records[0].contains_key(MESSAGE_KEY), "{}", intent);
    }
}

#[tokio::test]
async fn test_missing_parameter_is_error_sentinel() {
    let evidence = dispatcher().dispatch("route_distance", &Entities::new().with_origin("LAX")).await;
    assert!(evidence.is_failed());
    let records = evidence.records();
    assert!(records[0][ERROR_KEY].as_str().unwrap().contains("destination"));
}

struct FailingAccessor;

#[async_trait]
impl GraphAccessor for FailingAccessor {
    fn name(&self) -> &str {
        "failing"
    }

    async fn run(&self, _statement: &Statement, _params: &Params) -> StoreResult<Vec<Row>> {
        Err(StoreError::Connection("connection refused".to_string()))
    }
}

struct SlowAccessor;

#[async_trait]
impl GraphAccessor for SlowAccessor {
    fn name(&self) -> &str {
        "slow"
    }

    async fn run(&self, _statement: &Statement, _params: &Params) -> StoreResult<Vec<Row>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_store_failure_is_error_sentinel() {
    let dispatcher = QueryDispatcher::new(Arc::new(FailingAccessor));
    let evidence = dispatcher.dispatch("popular_airports", &Entities::new()).await;
    let records = evidence.records();
    assert_eq!(records.len(), 1);
    let cause = records[0][ERROR_KEY].as_str().unwrap();
    assert!(cause.starts_with("query failed:"));
    assert!(cause.contains("connection refused"));
}

#[tokio::test]
async fn test_deadline_is_error_sentinel() {
    let dispatcher = QueryDispatcher::new(Arc::new(SlowAccessor)).with_deadline(Duration::from_millis(20));
    let evidence = dispatcher.dispatch("popular_airports", &Entities::new()).await;
    assert!(evidence.is_failed());
    assert!(evidence.records()[0][ERROR_KEY].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_unreachable_server_is_error_sentinel() {
    let config = StoreConfig {
        uri: "http://127.0.0.1:9".to_string(),
        timeout_secs: 2,
        ..StoreConfig::default()
    };
    let accessor = HttpAccessor::new(&config).unwrap();
    let dispatcher = QueryDispatcher::new(Arc::new(accessor));
    let evidence = dispatcher.dispatch("popular_airports", &Entities::new()).await;
    assert!(evidence.is_failed());
    assert_eq!(evidence.records().len(), 1);
}

#[tokio::test]
async fn test_dispatch_is_deterministic() {
    let dispatcher = dispatcher();
    for intent in Intent::ALL {
        let first = dispatcher.dispatch(intent.as_str(), &entities_for(intent)).await;
        let second = dispatcher.dispatch(intent.as_str(), &entities_for(intent)).await;
        assert_eq!(first, second, "{}", intent);
    }
}
