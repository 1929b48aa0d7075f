//! Native evaluation of the compiled statements over a [`GraphStore`]
//!
//! Each function here computes exactly what the corresponding Cypher
//! template returns: same columns, same grouping, same ordering and example
//! caps. Null aggregates sort last.

use super::{Statement, StoreError, StoreResult};
use crate::embed::EmbeddingModel;
use crate::evidence::Row;
use crate::graph::airline::{
    AIRPORT, ARRIVAL_DELAY, ARRIVES_AT, DEPARTS_FROM, FEEDBACK_ID, FLEET_TYPE, FLIGHT, FLIGHT_NUMBER,
    FLOWN_MILES, FOOD_SCORE, GENERATION, JOURNEY, LEGS, LOYALTY_LEVEL, ON, PASSENGER_CLASS,
    STATION_CODE, TOOK,
};
use crate::graph::{GraphStore, Label, Node, NodeId, PropertyValue};
use crate::intent::{Intent, Params};
use crate::vector::cosine_similarity;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// Below this many embedded journeys the similarity search scans exactly
const EXACT_SCAN_LIMIT: usize = 4096;

pub(super) fn evaluate(store: &GraphStore, statement: &Statement, params: &Params) -> StoreResult<Vec<Row>> {
    match statement {
        Statement::Intent(intent) => match intent {
            Intent::MostDelayedFlights => most_delayed_flights(store, params),
            Intent::LeastCrowdedFlights => least_crowded_flights(store, params),
            Intent::WorstFoodRoutes => worst_food_routes(store, params),
            Intent::PopularAirports => popular_airports(store, params),
            Intent::FlightClassesOffered => flight_classes_offered(store, params),
            Intent::FlightAircraft => flight_aircraft(store, params),
            Intent::RouteDistance => route_distance(store, params),
            Intent::DirectFlight => direct_flight(store, params),
            Intent::FrequentFlyersRoute => frequent_flyers_route(store, params),
            Intent::DominantGenerationAirport => dominant_generation_airport(store, params),
        },
        Statement::SimilarJourneys(model) => similar_journeys(store, *model, params),
    }
}

// ---------------------------------------------------------------------------
// parameters

fn param<'p>(params: &'p Params, name: &str) -> StoreResult<&'p PropertyValue> {
    params
        .get(name)
        .filter(|v| !v.is_null())
        .ok_or_else(|| StoreError::Parameter(format!("expected parameter ${}", name)))
}

fn string_param<'p>(params: &'p Params, name: &str) -> StoreResult<&'p str> {
    param(params, name)?
        .as_string()
        .ok_or_else(|| StoreError::Parameter(format!("${} must be a string", name)))
}

fn integer_param(params: &Params, name: &str) -> StoreResult<i64> {
    param(params, name)?
        .as_integer()
        .ok_or_else(|| StoreError::Parameter(format!("${} must be an integer", name)))
}

fn limit_param(params: &Params) -> StoreResult<usize> {
    let limit = integer_param(params, "limit")?;
    usize::try_from(limit).map_err(|_| StoreError::Parameter("$limit must be non-negative".to_string()))
}

// ---------------------------------------------------------------------------
// graph navigation

fn airport<'g>(store: &'g GraphStore, code: &str) -> Option<&'g Node> {
    store
        .get_nodes_by_label(&Label::new(AIRPORT))
        .into_iter()
        .find(|a| a.get_string(STATION_CODE) == Some(code))
}

/// A flight with both route endpoints
struct Routed<'g> {
    flight: &'g Node,
    origin: &'g Node,
    destination: &'g Node,
}

impl<'g> Routed<'g> {
    fn of(store: &'g GraphStore, flight: &'g Node) -> Option<Self> {
        let origin = *store.out_neighbors(flight.id, DEPARTS_FROM).first()?;
        let destination = *store.out_neighbors(flight.id, ARRIVES_AT).first()?;
        Some(Self {
            flight,
            origin,
            destination,
        })
    }

    fn number(&self) -> Value {
        self.flight.json(FLIGHT_NUMBER)
    }

    fn aircraft(&self) -> Option<&'g str> {
        self.flight.get_string(FLEET_TYPE)
    }

    fn origin_code(&self) -> &'g str {
        self.origin.get_string(STATION_CODE).unwrap_or_default()
    }

    fn destination_code(&self) -> &'g str {
        self.destination.get_string(STATION_CODE).unwrap_or_default()
    }

    fn key(&self) -> (Option<i64>, Option<&'g str>) {
        (self.flight.get_integer(FLIGHT_NUMBER), self.aircraft())
    }
}

/// All flights that have a full route, by (flight number, aircraft)
fn routed_flights(store: &GraphStore) -> Vec<Routed<'_>> {
    let mut flights: Vec<Routed<'_>> = store
        .get_nodes_by_label(&Label::new(FLIGHT))
        .into_iter()
        .filter_map(|f| Routed::of(store, f))
        .collect();
    flights.sort_by(|a, b| a.key().cmp(&b.key()));
    flights
}

fn flights_on_route<'g>(store: &'g GraphStore, origin: &Node, destination: &Node) -> Vec<Routed<'g>> {
    routed_flights(store)
        .into_iter()
        .filter(|r| r.origin.id == origin.id && r.destination.id == destination.id)
        .collect()
}

fn flights_numbered(store: &GraphStore, number: i64) -> Vec<Routed<'_>> {
    routed_flights(store)
        .into_iter()
        .filter(|r| r.flight.get_integer(FLIGHT_NUMBER) == Some(number))
        .collect()
}

/// Journeys on a flight, by feedback id
fn journeys_on<'g>(store: &'g GraphStore, flight: &Node) -> Vec<&'g Node> {
    let label = Label::new(JOURNEY);
    let mut journeys: Vec<&Node> = store
        .in_neighbors(flight.id, ON)
        .into_iter()
        .filter(|j| j.has_label(&label))
        .collect();
    sort_by_feedback_id(&mut journeys);
    journeys
}

fn sort_by_feedback_id(journeys: &mut [&Node]) {
    journeys.sort_by(|a, b| a.get_string(FEEDBACK_ID).cmp(&b.get_string(FEEDBACK_ID)));
}

fn passenger_of<'g>(store: &'g GraphStore, journey: &Node) -> Option<&'g Node> {
    store.in_neighbors(journey.id, TOOK).into_iter().next()
}

fn is_loyalty_member(passenger: &Node) -> bool {
    matches!(passenger.get_string(LOYALTY_LEVEL), Some(level) if level != "None")
}

// ---------------------------------------------------------------------------
// row building

/// Extra attributes carried by an example record beyond the journey's own
#[derive(Clone, Copy)]
enum Extra {
    None,
    Aircraft,
    FlightAndAircraft,
    Loyalty,
}

fn example(journey: &Node, flight: &Node, passenger: Option<&Node>, extra: Extra) -> Value {
    let mut record = Map::new();
    record.insert("id".to_string(), journey.json(FEEDBACK_ID));
    record.insert("class".to_string(), journey.json(PASSENGER_CLASS));
    record.insert("food".to_string(), journey.json(FOOD_SCORE));
    record.insert("delay".to_string(), journey.json(ARRIVAL_DELAY));
    record.insert("miles".to_string(), journey.json(FLOWN_MILES));
    match extra {
        Extra::None => {}
        Extra::Aircraft => {
            record.insert("aircraft".to_string(), flight.json(FLEET_TYPE));
        }
        Extra::FlightAndAircraft | Extra::Loyalty => {
            record.insert("flight".to_string(), flight.json(FLIGHT_NUMBER));
            record.insert("aircraft".to_string(), flight.json(FLEET_TYPE));
            if let (Extra::Loyalty, Some(p)) = (extra, passenger) {
                record.insert("loyalty_level".to_string(), p.json(LOYALTY_LEVEL));
            }
        }
    }
    Value::Object(record)
}

/// Class is the grouping key in flight_classes_offered, so it is left out
fn class_example(journey: &Node) -> Value {
    json!({
        "id": journey.json(FEEDBACK_ID),
        "food": journey.json(FOOD_SCORE),
        "delay": journey.json(ARRIVAL_DELAY),
        "miles": journey.json(FLOWN_MILES),
    })
}

fn examples<'g>(items: impl Iterator<Item = (&'g Node, &'g Node)>, extra: Extra, cap: usize) -> Value {
    Value::Array(items.take(cap).map(|(j, f)| example(j, f, None, extra)).collect())
}

fn row<const N: usize>(pairs: [(&str, Value); N]) -> Row {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Average of the non-null numeric values of a journey attribute
fn average<'g>(journeys: impl Iterator<Item = &'g Node>, key: &str) -> Option<f64> {
    let (sum, n) = journeys
        .filter_map(|j| j.non_null(key).and_then(PropertyValue::as_float))
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn float(value: Option<f64>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

fn nulls_last(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) if descending => y.total_cmp(&x),
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn nulls_last_str(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn opt_str(value: Option<&str>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

// ---------------------------------------------------------------------------
// intents

fn route_endpoints<'g>(store: &'g GraphStore, params: &Params) -> StoreResult<Option<(&'g Node, &'g Node)>> {
    let origin = string_param(params, "origin")?;
    let destination = string_param(params, "destination")?;
    Ok(airport(store, origin).zip(airport(store, destination)))
}

fn most_delayed_flights(store: &GraphStore, params: &Params) -> StoreResult<Vec<Row>> {
    let limit = limit_param(params)?;
    let Some((o, d)) = route_endpoints(store, params)? else {
        return Ok(Vec::new());
    };

    let mut groups: Vec<(Routed<'_>, Vec<&Node>, Option<f64>)> = flights_on_route(store, o, d)
        .into_iter()
        .map(|r| {
            let journeys = journeys_on(store, r.flight);
            let avg = average(journeys.iter().copied(), ARRIVAL_DELAY);
            (r, journeys, avg)
        })
        .filter(|(_, journeys, _)| !journeys.is_empty())
        .collect();
    // routed flights are already in (number, aircraft) order; the sort is stable
    groups.sort_by(|a, b| nulls_last(a.2, b.2, true));

    Ok(groups
        .into_iter()
        .take(limit)
        .map(|(r, journeys, avg)| {
            row([
                ("flight", r.number()),
                ("origin", r.origin_code().into()),
                ("destination", r.destination_code().into()),
                ("avg_delay", float(avg)),
                ("samples", journeys.len().into()),
                (
                    "examples",
                    examples(journeys.iter().map(|j| (*j, r.flight)), Extra::Aircraft, 3),
                ),
            ])
        })
        .collect())
}

fn least_crowded_flights(store: &GraphStore, params: &Params) -> StoreResult<Vec<Row>> {
    let limit = limit_param(params)?;
    let Some((o, d)) = route_endpoints(store, params)? else {
        return Ok(Vec::new());
    };

    let mut groups: Vec<(Routed<'_>, Vec<&Node>, usize)> = flights_on_route(store, o, d)
        .into_iter()
        .map(|r| {
            let mut passengers: HashSet<NodeId> = HashSet::new();
            let journeys: Vec<&Node> = journeys_on(store, r.flight)
                .into_iter()
                .filter(|j| match passenger_of(store, j) {
                    Some(p) => {
                        passengers.insert(p.id);
                        true
                    }
                    None => false,
                })
                .collect();
            let count = passengers.len();
            (r, journeys, count)
        })
        .filter(|(_, journeys, _)| !journeys.is_empty())
        .collect();
    groups.sort_by_key(|(_, _, count)| *count);

    Ok(groups
        .into_iter()
        .take(limit)
        .map(|(r, journeys, count)| {
            row([
                ("flight", r.number()),
                ("origin", r.origin_code().into()),
                ("destination", r.destination_code().into()),
                ("passenger_count", count.into()),
                (
                    "examples",
                    examples(journeys.iter().map(|j| (*j, r.flight)), Extra::Aircraft, 3),
                ),
            ])
        })
        .collect())
}

fn worst_food_routes(store: &GraphStore, params: &Params) -> StoreResult<Vec<Row>> {
    let limit = limit_param(params)?;

    let mut routes: BTreeMap<(&str, &str), Vec<(&Node, &Node)>> = BTreeMap::new();
    for r in routed_flights(store) {
        let journeys = journeys_on(store, r.flight);
        if journeys.is_empty() {
            continue;
        }
        routes
            .entry((r.origin_code(), r.destination_code()))
            .or_default()
            .extend(journeys.into_iter().map(|j| (j, r.flight)));
    }

    let mut grouped: Vec<((&str, &str), Vec<(&Node, &Node)>, Option<f64>)> = routes
        .into_iter()
        .map(|(route, mut items)| {
            items.sort_by(|a, b| a.0.get_string(FEEDBACK_ID).cmp(&b.0.get_string(FEEDBACK_ID)));
            let avg = average(items.iter().map(|(j, _)| *j), FOOD_SCORE);
            (route, items, avg)
        })
        .collect();
    // BTreeMap iteration already ordered routes by (origin, destination)
    grouped.sort_by(|a, b| nulls_last(a.2, b.2, false));

    Ok(grouped
        .into_iter()
        .take(limit)
        .map(|((origin, destination), items, avg)| {
            row([
                ("origin", origin.into()),
                ("destination", destination.into()),
                ("avg_food", float(avg)),
                ("samples", items.len().into()),
                (
                    "examples",
                    examples(items.into_iter(), Extra::FlightAndAircraft, 3),
                ),
            ])
        })
        .collect())
}

fn popular_airports(store: &GraphStore, params: &Params) -> StoreResult<Vec<Row>> {
    let limit = limit_param(params)?;

    let mut airports: BTreeMap<&str, Vec<(&Node, &Node)>> = BTreeMap::new();
    for r in routed_flights(store) {
        let journeys = journeys_on(store, r.flight);
        if journeys.is_empty() {
            continue;
        }
        airports
            .entry(r.origin_code())
            .or_default()
            .extend(journeys.into_iter().map(|j| (j, r.flight)));
    }

    let mut grouped: Vec<(&str, Vec<(&Node, &Node)>)> = airports.into_iter().collect();
    for (_, items) in grouped.iter_mut() {
        items.sort_by(|a, b| a.0.get_string(FEEDBACK_ID).cmp(&b.0.get_string(FEEDBACK_ID)));
    }
    grouped.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    Ok(grouped
        .into_iter()
        .take(limit)
        .map(|(code, items)| {
            row([
                ("airport", code.into()),
                ("journey_count", items.len().into()),
                (
                    "examples",
                    examples(items.into_iter(), Extra::FlightAndAircraft, 3),
                ),
            ])
        })
        .collect())
}

fn flight_classes_offered(store: &GraphStore, params: &Params) -> StoreResult<Vec<Row>> {
    let number = integer_param(params, "flight_number")?;

    let mut rows: Vec<(Option<&str>, Option<&str>, Row)> = Vec::new();
    for r in flights_numbered(store, number) {
        let mut classes: BTreeMap<Option<&str>, Vec<&Node>> = BTreeMap::new();
        for journey in journeys_on(store, r.flight) {
            classes
                .entry(journey.get_string(PASSENGER_CLASS))
                .or_default()
                .push(journey);
        }
        for (class, journeys) in classes {
            let sample = Value::Array(journeys.iter().take(2).copied().map(class_example).collect());
            let record = row([
                ("flight", r.number()),
                ("origin", r.origin_code().into()),
                ("destination", r.destination_code().into()),
                ("aircraft", opt_str(r.aircraft())),
                ("offered_class", opt_str(class)),
                ("examples", sample),
            ]);
            rows.push((r.aircraft(), class, record));
        }
    }
    rows.sort_by(|a, b| nulls_last_str(a.0, b.0).then_with(|| nulls_last_str(a.1, b.1)));
    Ok(rows.into_iter().map(|(_, _, record)| record).collect())
}

fn flight_aircraft(store: &GraphStore, params: &Params) -> StoreResult<Vec<Row>> {
    let number = integer_param(params, "flight_number")?;

    let mut flights = flights_numbered(store, number);
    flights.sort_by(|a, b| nulls_last_str(a.aircraft(), b.aircraft()));
    Ok(flights
        .into_iter()
        .map(|r| {
            let journeys = journeys_on(store, r.flight);
            row([
                ("flight", r.number()),
                ("origin", r.origin_code().into()),
                ("destination", r.destination_code().into()),
                ("aircraft", opt_str(r.aircraft())),
                (
                    "examples",
                    examples(journeys.into_iter().map(|j| (j, r.flight)), Extra::None, 3),
                ),
            ])
        })
        .collect())
}

/// Journeys (with their flight) on every flight of a route, by feedback id
fn route_journeys<'g>(store: &'g GraphStore, o: &Node, d: &Node) -> Vec<(&'g Node, &'g Node)> {
    let mut items: Vec<(&Node, &Node)> = flights_on_route(store, o, d)
        .into_iter()
        .flat_map(|r| {
            journeys_on(store, r.flight)
                .into_iter()
                .map(move |j| (j, r.flight))
        })
        .collect();
    items.sort_by(|a, b| a.0.get_string(FEEDBACK_ID).cmp(&b.0.get_string(FEEDBACK_ID)));
    items
}

fn route_distance(store: &GraphStore, params: &Params) -> StoreResult<Vec<Row>> {
    let Some((o, d)) = route_endpoints(store, params)? else {
        return Ok(Vec::new());
    };
    let items = route_journeys(store, o, d);
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let avg = average(items.iter().map(|(j, _)| *j), FLOWN_MILES);

    Ok(vec![row([
        ("origin", o.json(STATION_CODE)),
        ("destination", d.json(STATION_CODE)),
        ("avg_distance", float(avg)),
        ("samples", items.len().into()),
        (
            "examples",
            examples(items.into_iter(), Extra::FlightAndAircraft, 3),
        ),
    ])])
}

fn direct_flight(store: &GraphStore, params: &Params) -> StoreResult<Vec<Row>> {
    let Some((o, d)) = route_endpoints(store, params)? else {
        return Ok(Vec::new());
    };
    let direct: Vec<(&Node, &Node)> = route_journeys(store, o, d)
        .into_iter()
        .filter(|(j, _)| j.get_integer(LEGS) == Some(1))
        .collect();

    Ok(vec![row([
        ("origin", o.json(STATION_CODE)),
        ("destination", d.json(STATION_CODE)),
        ("direct_available", (!direct.is_empty()).into()),
        ("direct_count", direct.len().into()),
        (
            "examples",
            examples(direct.into_iter(), Extra::FlightAndAircraft, 3),
        ),
    ])])
}

fn frequent_flyers_route(store: &GraphStore, params: &Params) -> StoreResult<Vec<Row>> {
    let Some((o, d)) = route_endpoints(store, params)? else {
        return Ok(Vec::new());
    };
    let members: Vec<(&Node, &Node, &Node)> = route_journeys(store, o, d)
        .into_iter()
        .filter_map(|(j, f)| {
            let p = passenger_of(store, j).filter(|p| is_loyalty_member(p))?;
            Some((j, f, p))
        })
        .collect();

    let sample = Value::Array(
        members
            .iter()
            .take(3)
            .map(|&(j, f, p)| example(j, f, Some(p), Extra::Loyalty))
            .collect(),
    );
    Ok(vec![row([
        ("origin", o.json(STATION_CODE)),
        ("destination", d.json(STATION_CODE)),
        ("frequent_flyers_use_route", (!members.is_empty()).into()),
        ("frequent_flyer_count", members.len().into()),
        ("examples", sample),
    ])])
}

fn dominant_generation_airport(store: &GraphStore, params: &Params) -> StoreResult<Vec<Row>> {
    let code = string_param(params, "code")?;
    let Some(a) = airport(store, code) else {
        return Ok(Vec::new());
    };

    let mut generations: BTreeMap<Option<&str>, Vec<(&Node, &Node)>> = BTreeMap::new();
    for r in routed_flights(store).into_iter().filter(|r| r.origin.id == a.id) {
        for journey in journeys_on(store, r.flight) {
            if let Some(p) = passenger_of(store, journey) {
                generations
                    .entry(p.get_string(GENERATION))
                    .or_default()
                    .push((journey, r.flight));
            }
        }
    }

    let best = generations
        .into_iter()
        .map(|(generation, mut items)| {
            items.sort_by(|x, y| x.0.get_string(FEEDBACK_ID).cmp(&y.0.get_string(FEEDBACK_ID)));
            (generation, items)
        })
        .min_by(|x, y| {
            y.1.len()
                .cmp(&x.1.len())
                .then_with(|| nulls_last_str(x.0, y.0))
        });

    Ok(best
        .map(|(generation, items)| {
            row([
                ("airport", a.json(STATION_CODE)),
                ("generation", opt_str(generation)),
                ("passenger_count", items.len().into()),
                (
                    "examples",
                    examples(items.into_iter(), Extra::FlightAndAircraft, 3),
                ),
            ])
        })
        .into_iter()
        .collect())
}

// ---------------------------------------------------------------------------
// similarity search

fn similar_journeys(store: &GraphStore, model: EmbeddingModel, params: &Params) -> StoreResult<Vec<Row>> {
    let query = param(params, "query_embedding")?
        .as_vector()
        .ok_or_else(|| StoreError::Parameter("$query_embedding must be a vector".to_string()))?;
    let cutoff = param(params, "cutoff")?
        .as_float()
        .ok_or_else(|| StoreError::Parameter("$cutoff must be a number".to_string()))?;
    let top_k = usize::try_from(integer_param(params, "top_k")?)
        .map_err(|_| StoreError::Parameter("$top_k must be non-negative".to_string()))?;
    let key = model.key();

    if query.len() != model.dimensions() {
        return Err(StoreError::Parameter(format!(
            "query embedding has {} dimensions, {} expects {}",
            query.len(),
            key,
            model.dimensions()
        )));
    }

    let candidates: Vec<&Node> = match store.vector_index.get_index(JOURNEY, key) {
        Some(index) if index.len() > EXACT_SCAN_LIMIT => {
            let k = (top_k * 4).max(64);
            store
                .vector_search(JOURNEY, key, query, k)
                .transpose()
                .map_err(|e| StoreError::Query(e.to_string()))?
                .unwrap_or_default()
                .into_iter()
                .filter_map(|(id, _)| store.get_node(id))
                .collect()
        }
        _ => store.get_nodes_by_label(&Label::new(JOURNEY)),
    };

    let mut scored: Vec<(f64, &Node, Routed<'_>)> = Vec::new();
    for journey in candidates {
        let Some(vector) = journey.non_null(key).and_then(PropertyValue::as_vector) else {
            continue;
        };
        if vector.len() != query.len() {
            return Err(StoreError::Query(format!(
                "journey {} has a {}-dim {} vector, expected {}",
                journey.json(FEEDBACK_ID),
                vector.len(),
                key,
                query.len()
            )));
        }
        let Some(flight) = store.out_neighbors(journey.id, ON).into_iter().next() else {
            continue;
        };
        let Some(routed) = Routed::of(store, flight) else {
            continue;
        };
        let score = cosine_similarity(query, vector) as f64;
        if score > cutoff {
            scored.push((score, journey, routed));
        }
    }
    scored.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.get_string(FEEDBACK_ID).cmp(&b.1.get_string(FEEDBACK_ID)))
    });

    Ok(scored
        .into_iter()
        .take(top_k)
        .map(|(score, j, r)| {
            row([
                ("id", j.json(FEEDBACK_ID)),
                ("class", j.json(PASSENGER_CLASS)),
                ("food", j.json(FOOD_SCORE)),
                ("delay", j.json(ARRIVAL_DELAY)),
                ("miles", j.json(FLOWN_MILES)),
                ("flight", r.number()),
                ("aircraft", r.flight.json(FLEET_TYPE)),
                ("origin", r.origin_code().into()),
                ("destination", r.destination_code().into()),
                ("score", Value::from(score)),
            ])
        })
        .collect())
}
