//! Intent registry
//!
//! The closed set of analytic question shapes the engine can answer. Each
//! [`Intent`] maps to one static [`Template`]: injection-safe Cypher text
//! (parameters travel out-of-band as `$name`), the parameters it requires,
//! its output columns and ordering rule.

pub mod params;
pub mod templates;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use params::{BindDefaults, Entities, Param, ParamError, Params};
pub use templates::{RowOrder, Template};

/// Analytic question categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    MostDelayedFlights,
    LeastCrowdedFlights,
    WorstFoodRoutes,
    PopularAirports,
    FlightClassesOffered,
    FlightAircraft,
    RouteDistance,
    DirectFlight,
    FrequentFlyersRoute,
    DominantGenerationAirport,
}

impl Intent {
    pub const ALL: [Intent; 10] = [
        Intent::MostDelayedFlights,
        Intent::LeastCrowdedFlights,
        Intent::WorstFoodRoutes,
        Intent::PopularAirports,
        Intent::FlightClassesOffered,
        Intent::FlightAircraft,
        Intent::RouteDistance,
        Intent::DirectFlight,
        Intent::FrequentFlyersRoute,
        Intent::DominantGenerationAirport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::MostDelayedFlights => "most_delayed_flights",
            Intent::LeastCrowdedFlights => "least_crowded_flights",
            Intent::WorstFoodRoutes => "worst_food_routes",
            Intent::PopularAirports => "popular_airports",
            Intent::FlightClassesOffered => "flight_classes_offered",
            Intent::FlightAircraft => "flight_aircraft",
            Intent::RouteDistance => "route_distance",
            Intent::DirectFlight => "direct_flight",
            Intent::FrequentFlyersRoute => "frequent_flyers_route",
            Intent::DominantGenerationAirport => "dominant_generation_airport",
        }
    }

    /// The query template bound to this intent
    pub fn template(&self) -> &'static Template {
        templates::template_for(*self)
    }

    /// All intent names, in registry order
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Intent::as_str).collect()
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for names outside the registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intent '{0}'")]
pub struct UnknownIntent(pub String);

impl FromStr for Intent {
    type Err = UnknownIntent;

    /// Case-insensitive; surrounding whitespace, quotes and trailing
    /// punctuation (as emitted by chat models) are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.')
            .trim()
            .to_ascii_lowercase();
        Intent::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == cleaned)
            .ok_or_else(|| UnknownIntent(s.to_string()))
    }
}
