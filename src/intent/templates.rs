//! Static Cypher templates, one per intent

use super::params::{bind_flight_number, bind_limit, bind_station, BindDefaults, Entities, Param, ParamError, Params};
use super::Intent;

/// Ordering rule of a template's result rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// Non-increasing on the column
    Descending(&'static str),
    /// Non-decreasing on the column
    Ascending(&'static str),
    /// One row per value of the column
    GroupedBy(&'static str),
    /// At most one row, the maximum of the column
    TopOne(&'static str),
    /// At most one row
    Single,
    Unordered,
}

/// A parameterized query bound to one intent
#[derive(Debug)]
pub struct Template {
    pub intent: Intent,
    pub cypher: &'static str,
    pub params: &'static [Param],
    pub columns: &'static [&'static str],
    pub order: RowOrder,
    /// Maximum journey records in the `examples` column (per group)
    pub example_cap: usize,
}

impl Template {
    /// Bind extracted entities to this template's parameters.
    ///
    /// Entities the template does not use are ignored.
    pub fn bind(&self, entities: &Entities, defaults: &BindDefaults) -> Result<Params, ParamError> {
        let mut params = Params::new();
        for param in self.params {
            let value = match param {
                Param::Limit => bind_limit(entities.get(Param::Limit), defaults.limit)?,
                Param::FlightNumber => bind_flight_number(self.require(entities, *param)?)?,
                Param::Origin | Param::Destination | Param::Code => {
                    bind_station(*param, self.require(entities, *param)?)?
                }
            };
            params.insert(param.as_str().to_string(), value);
        }
        Ok(params)
    }

    fn require<'e>(&self, entities: &'e Entities, param: Param) -> Result<&'e serde_json::Value, ParamError> {
        entities.get(param).ok_or(ParamError::Missing {
            intent: self.intent.as_str(),
            param,
        })
    }

    /// Whether a result row has exactly this template's columns, in order
    pub fn matches_columns<'a>(&self, keys: impl Iterator<Item = &'a String>) -> bool {
        keys.map(String::as_str).eq(self.columns.iter().copied())
    }
}

pub(super) fn template_for(intent: Intent) -> &'static Template {
    match intent {
        Intent::MostDelayedFlights => &MOST_DELAYED_FLIGHTS,
        Intent::LeastCrowdedFlights => &LEAST_CROWDED_FLIGHTS,
        Intent::WorstFoodRoutes => &WORST_FOOD_ROUTES,
        Intent::PopularAirports => &POPULAR_AIRPORTS,
        Intent::FlightClassesOffered => &FLIGHT_CLASSES_OFFERED,
        Intent::FlightAircraft => &FLIGHT_AIRCRAFT,
        Intent::RouteDistance => &ROUTE_DISTANCE,
        Intent::DirectFlight => &DIRECT_FLIGHT,
        Intent::FrequentFlyersRoute => &FREQUENT_FLYERS_ROUTE,
        Intent::DominantGenerationAirport => &DOMINANT_GENERATION_AIRPORT,
    }
}

static MOST_DELAYED_FLIGHTS: Template = Template {
    intent: Intent::MostDelayedFlights,
    cypher: "\
MATCH (j:Journey)-[:ON]->(f:Flight)
MATCH (f)-[:DEPARTS_FROM]->(o:Airport {station_code: $origin})
MATCH (f)-[:ARRIVES_AT]->(d:Airport {station_code: $destination})
WITH f, o, d, j ORDER BY j.feedback_ID
WITH f, o, d,
     avg(j.arrival_delay_minutes) AS avg_delay,
     count(j) AS samples,
     collect({id: j.feedback_ID, class: j.passenger_class, food: j.food_satisfaction_score,
              delay: j.arrival_delay_minutes, miles: j.actual_flown_miles,
              aircraft: f.fleet_type_description})[0..3] AS examples
RETURN f.flight_number AS flight, o.station_code AS origin, d.station_code AS destination,
       avg_delay, samples, examples
ORDER BY avg_delay IS NULL, avg_delay DESC, flight ASC, f.fleet_type_description ASC
LIMIT $limit",
    params: &[Param::Origin, Param::Destination, Param::Limit],
    columns: &["flight", "origin", "destination", "avg_delay", "samples", "examples"],
    order: RowOrder::Descending("avg_delay"),
    example_cap: 3,
};

static LEAST_CROWDED_FLIGHTS: Template = Template {
    intent: Intent::LeastCrowdedFlights,
    cypher: "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey)-[:ON]->(f:Flight)
MATCH (f)-[:DEPARTS_FROM]->(o:Airport {station_code: $origin})
MATCH (f)-[:ARRIVES_AT]->(d:Airport {station_code: $destination})
WITH f, o, d, p, j ORDER BY j.feedback_ID
WITH f, o, d,
     count(DISTINCT p) AS passenger_count,
     collect({id: j.feedback_ID, class: j.passenger_class, food: j.food_satisfaction_score,
              delay: j.arrival_delay_minutes, miles: j.actual_flown_miles,
              aircraft: f.fleet_type_description})[0..3] AS examples
RETURN f.flight_number AS flight, o.station_code AS origin, d.station_code AS destination,
       passenger_count, examples
ORDER BY passenger_count ASC, flight ASC, f.fleet_type_description ASC
LIMIT $limit",
    params: &[Param::Origin, Param::Destination, Param::Limit],
    columns: &["flight", "origin", "destination", "passenger_count", "examples"],
    order: RowOrder::Ascending("passenger_count"),
    example_cap: 3,
};

static WORST_FOOD_ROUTES: Template = Template {
    intent: Intent::WorstFoodRoutes,
    cypher: "\
MATCH (j:Journey)-[:ON]->(f:Flight)
MATCH (f)-[:DEPARTS_FROM]->(o:Airport)
MATCH (f)-[:ARRIVES_AT]->(d:Airport)
WITH o, d, f, j ORDER BY j.feedback_ID
WITH o, d,
     avg(j.food_satisfaction_score) AS avg_food,
     count(j) AS samples,
     collect({id: j.feedback_ID, class: j.passenger_class, food: j.food_satisfaction_score,
              delay: j.arrival_delay_minutes, miles: j.actual_flown_miles,
              flight: f.flight_number, aircraft: f.fleet_type_description})[0..3] AS examples
RETURN o.station_code AS origin, d.station_code AS destination, avg_food, samples, examples
ORDER BY avg_food ASC, origin ASC, destination ASC
LIMIT $limit",
    params: &[Param::Limit],
    columns: &["origin", "destination", "avg_food", "samples", "examples"],
    order: RowOrder::Ascending("avg_food"),
    example_cap: 3,
};

static POPULAR_AIRPORTS: Template = Template {
    intent: Intent::PopularAirports,
    cypher: "\
MATCH (j:Journey)-[:ON]->(f:Flight)-[:DEPARTS_FROM]->(a:Airport)
WITH a, f, j ORDER BY j.feedback_ID
WITH a,
     count(j) AS journey_count,
     collect({id: j.feedback_ID, class: j.passenger_class, food: j.food_satisfaction_score,
              delay: j.arrival_delay_minutes, miles: j.actual_flown_miles,
              flight: f.flight_number, aircraft: f.fleet_type_description})[0..3] AS examples
RETURN a.station_code AS airport, journey_count, examples
ORDER BY journey_count DESC, airport ASC
LIMIT $limit",
    params: &[Param::Limit],
    columns: &["airport", "journey_count", "examples"],
    order: RowOrder::Descending("journey_count"),
    example_cap: 3,
};

static FLIGHT_CLASSES_OFFERED: Template = Template {
    intent: Intent::FlightClassesOffered,
    cypher: "\
MATCH (f:Flight {flight_number: $flight_number})
MATCH (j:Journey)-[:ON]->(f)
MATCH (f)-[:DEPARTS_FROM]->(o:Airport)
MATCH (f)-[:ARRIVES_AT]->(d:Airport)
WITH f, o, d, j ORDER BY j.feedback_ID
WITH f, o, d, j.passenger_class AS offered_class,
     collect({id: j.feedback_ID, food: j.food_satisfaction_score,
              delay: j.arrival_delay_minutes, miles: j.actual_flown_miles})[0..2] AS examples
RETURN f.flight_number AS flight, o.station_code AS origin, d.station_code AS destination,
       f.fleet_type_description AS aircraft, offered_class, examples
ORDER BY aircraft ASC, offered_class ASC",
    params: &[Param::FlightNumber],
    columns: &["flight", "origin", "destination", "aircraft", "offered_class", "examples"],
    order: RowOrder::GroupedBy("offered_class"),
    example_cap: 2,
};

static FLIGHT_AIRCRAFT: Template = Template {
    intent: Intent::FlightAircraft,
    cypher: "\
MATCH (f:Flight {flight_number: $flight_number})
MATCH (f)-[:DEPARTS_FROM]->(o:Airport)
MATCH (f)-[:ARRIVES_AT]->(d:Airport)
OPTIONAL MATCH (j:Journey)-[:ON]->(f)
WITH f, o, d, j ORDER BY j.feedback_ID
WITH f, o, d,
     collect(CASE WHEN j IS NOT NULL THEN
       {id: j.feedback_ID, class: j.passenger_class, food: j.food_satisfaction_score,
        delay: j.arrival_delay_minutes, miles: j.actual_flown_miles} END)[0..3] AS examples
RETURN f.flight_number AS flight, o.station_code AS origin, d.station_code AS destination,
       f.fleet_type_description AS aircraft, examples
ORDER BY aircraft ASC",
    params: &[Param::FlightNumber],
    columns: &["flight", "origin", "destination", "aircraft", "examples"],
    order: RowOrder::Unordered,
    example_cap: 3,
};

static ROUTE_DISTANCE: Template = Template {
    intent: Intent::RouteDistance,
    cypher: "\
MATCH (j:Journey)-[:ON]->(f:Flight)
MATCH (f)-[:DEPARTS_FROM]->(o:Airport {station_code: $origin})
MATCH (f)-[:ARRIVES_AT]->(d:Airport {station_code: $destination})
WITH o, d, f, j ORDER BY j.feedback_ID
WITH o, d,
     avg(j.actual_flown_miles) AS avg_distance,
     count(j) AS samples,
     collect({id: j.feedback_ID, class: j.passenger_class, food: j.food_satisfaction_score,
              delay: j.arrival_delay_minutes, miles: j.actual_flown_miles,
              flight: f.flight_number, aircraft: f.fleet_type_description})[0..3] AS examples
RETURN o.station_code AS origin, d.station_code AS destination, avg_distance, samples, examples",
    params: &[Param::Origin, Param::Destination],
    columns: &["origin", "destination", "avg_distance", "samples", "examples"],
    order: RowOrder::Single,
    example_cap: 3,
};

static DIRECT_FLIGHT: Template = Template {
    intent: Intent::DirectFlight,
    cypher: "\
MATCH (o:Airport {station_code: $origin})
MATCH (d:Airport {station_code: $destination})
OPTIONAL MATCH (j:Journey)-[:ON]->(f:Flight)-[:DEPARTS_FROM]->(o)
WHERE (f)-[:ARRIVES_AT]->(d) AND j.number_of_legs = 1
WITH o, d, f, j ORDER BY j.feedback_ID
WITH o, d,
     count(j) AS direct_count,
     collect(CASE WHEN j IS NOT NULL THEN
       {id: j.feedback_ID, class: j.passenger_class, food: j.food_satisfaction_score,
        delay: j.arrival_delay_minutes, miles: j.actual_flown_miles,
        flight: f.flight_number, aircraft: f.fleet_type_description} END)[0..3] AS examples
RETURN o.station_code AS origin, d.station_code AS destination,
       direct_count > 0 AS direct_available, direct_count, examples",
    params: &[Param::Origin, Param::Destination],
    columns: &["origin", "destination", "direct_available", "direct_count", "examples"],
    order: RowOrder::Single,
    example_cap: 3,
};

static FREQUENT_FLYERS_ROUTE: Template = Template {
    intent: Intent::FrequentFlyersRoute,
    cypher: "\
MATCH (o:Airport {station_code: $origin})
MATCH (d:Airport {station_code: $destination})
OPTIONAL MATCH (p:Passenger)-[:TOOK]->(j:Journey)-[:ON]->(f:Flight)-[:DEPARTS_FROM]->(o)
WHERE (f)-[:ARRIVES_AT]->(d)
  AND p.loyalty_program_level IS NOT NULL AND p.loyalty_program_level <> 'None'
WITH o, d, p, f, j ORDER BY j.feedback_ID
WITH o, d,
     count(j) AS frequent_flyer_count,
     collect(CASE WHEN j IS NOT NULL THEN
       {id: j.feedback_ID, class: j.passenger_class, food: j.food_satisfaction_score,
        delay: j.arrival_delay_minutes, miles: j.actual_flown_miles,
        flight: f.flight_number, aircraft: f.fleet_type_description,
        loyalty_level: p.loyalty_program_level} END)[0..3] AS examples
RETURN o.station_code AS origin, d.station_code AS destination,
       frequent_flyer_count > 0 AS frequent_flyers_use_route, frequent_flyer_count, examples",
    params: &[Param::Origin, Param::Destination],
    columns: &[
        "origin",
        "destination",
        "frequent_flyers_use_route",
        "frequent_flyer_count",
        "examples",
    ],
    order: RowOrder::Single,
    example_cap: 3,
};

static DOMINANT_GENERATION_AIRPORT: Template = Template {
    intent: Intent::DominantGenerationAirport,
    cypher: "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey)-[:ON]->(f:Flight)
MATCH (f)-[:DEPARTS_FROM]->(a:Airport {station_code: $code})
WITH a, p, f, j ORDER BY j.feedback_ID
WITH a, p.generation AS generation,
     count(j) AS passenger_count,
     collect({id: j.feedback_ID, class: j.passenger_class, food: j.food_satisfaction_score,
              delay: j.arrival_delay_minutes, miles: j.actual_flown_miles,
              flight: f.flight_number, aircraft: f.fleet_type_description})[0..3] AS examples
RETURN a.station_code AS airport, generation, passenger_count, examples
ORDER BY passenger_count DESC, generation ASC
LIMIT 1",
    params: &[Param::Code],
    columns: &["airport", "generation", "passenger_count", "examples"],
    order: RowOrder::TopOne("passenger_count"),
    example_cap: 3,
};
