//! Model comparison harness
//!
//! Runs a fixed set of questions through an [`Assistant`] per chat model and
//! scores intent and entity accuracy together with per-stage latency.

use crate::intent::{Entities, Intent, Param};
use crate::pipeline::{Assistant, StageTimings};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Parameters compared when scoring entity extraction
const COMPARED_PARAMS: [Param; 4] = [Param::Origin, Param::Destination, Param::FlightNumber, Param::Code];

#[derive(Debug, Clone)]
pub struct EvalCase {
    pub id: u32,
    pub question: &'static str,
    pub expected_intent: Intent,
    pub expected_entities: Entities,
    pub description: &'static str,
}

/// Reference questions, one per intent
pub fn default_cases() -> Vec<EvalCase> {
    vec![
        EvalCase {
            id: 1,
            question: "Which flights from LAX to IAX have the most delays?",
            expected_intent: Intent::MostDelayedFlights,
            expected_entities: Entities::route("LAX", "IAX"),
            description: "Flight delay analysis on a specific route",
        },
        EvalCase {
            id: 2,
            question: "What are the least crowded flights from ORX to IAX?",
            expected_intent: Intent::LeastCrowdedFlights,
            expected_entities: Entities::route("ORX", "IAX"),
            description: "Passenger crowd analysis on a route",
        },
        EvalCase {
            id: 3,
            question: "Show me the top 3 routes with the worst food",
            expected_intent: Intent::WorstFoodRoutes,
            expected_entities: Entities::new().with_limit(3),
            description: "Food satisfaction ranking",
        },
        EvalCase {
            id: 4,
            question: "What are the most popular airports?",
            expected_intent: Intent::PopularAirports,
            expected_entities: Entities::new(),
            description: "Airport popularity ranking",
        },
        EvalCase {
            id: 5,
            question: "What classes are available on flight 2411?",
            expected_intent: Intent::FlightClassesOffered,
            expected_entities: Entities::flight(2411),
            description: "Flight class information lookup",
        },
        EvalCase {
            id: 6,
            question: "What is the flight distance from DFX to ORX?",
            expected_intent: Intent::RouteDistance,
            expected_entities: Entities::route("DFX", "ORX"),
            description: "Route distance calculation",
        },
        EvalCase {
            id: 7,
            question: "What is the dominant passenger generation at LAX?",
            expected_intent: Intent::DominantGenerationAirport,
            expected_entities: Entities::airport("LAX"),
            description: "Passenger generation demographics at airport",
        },
        EvalCase {
            id: 8,
            question: "Can I go from DEX to LAX directly?",
            expected_intent: Intent::DirectFlight,
            expected_entities: Entities::route("DEX", "LAX"),
            description: "Direct flight availability check",
        },
        EvalCase {
            id: 9,
            question: "Which aircraft will I be flying on flight 924?",
            expected_intent: Intent::FlightAircraft,
            expected_entities: Entities::flight(924),
            description: "Aircraft type lookup",
        },
        EvalCase {
            id: 10,
            question: "Do frequent flyers use the route from EWX to IAX?",
            expected_intent: Intent::FrequentFlyersRoute,
            expected_entities: Entities::route("EWX", "IAX"),
            description: "Frequent flyer route usage",
        },
    ]
}

/// Compare extracted entities on origin, destination, flight number and
/// airport code. Blank and "null" values count as absent; station codes are
/// compared case-insensitively and numbers by value.
pub fn entities_match(extracted: &Entities, expected: &Entities) -> bool {
    COMPARED_PARAMS
        .iter()
        .all(|param| normalized(extracted, *param) == normalized(expected, *param))
}

fn normalized(entities: &Entities, param: Param) -> Option<Value> {
    let value = entities.get(param)?;
    Some(match value {
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(n) => json!(n),
                Err(_) => json!(s.to_ascii_uppercase()),
            }
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 => json!(f as i64),
            _ => value.clone(),
        },
        other => other.clone(),
    })
}

/// Rough token estimate for an answer
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Outcome of one question on one model
#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub case_id: u32,
    pub model: String,
    pub success: bool,
    pub error: Option<String>,
    pub intent: Option<Intent>,
    pub entities: Option<Entities>,
    pub intent_correct: bool,
    pub entities_correct: bool,
    pub answer: Option<String>,
    pub estimated_tokens: usize,
    pub timings: StageTimings,
}

pub async fn run_case(assistant: &Assistant, case: &EvalCase) -> CaseOutcome {
    let model = assistant.model_name().to_string();
    match assistant.ask(case.question, None).await {
        Ok(interaction) => CaseOutcome {
            case_id: case.id,
            model,
            success: true,
            error: None,
            intent: Some(interaction.intent),
            intent_correct: interaction.intent == case.expected_intent,
            entities_correct: entities_match(&interaction.entities, &case.expected_entities),
            entities: Some(interaction.entities),
            estimated_tokens: estimate_tokens(&interaction.answer),
            answer: Some(interaction.answer),
            timings: interaction.timings,
        },
        Err(e) => {
            warn!("Case {} failed on {}: {}", case.id, model, e);
            CaseOutcome {
                case_id: case.id,
                model,
                success: false,
                error: Some(e.to_string()),
                intent: None,
                entities: None,
                intent_correct: false,
                entities_correct: false,
                answer: None,
                estimated_tokens: 0,
                timings: StageTimings::default(),
            }
        }
    }
}

pub async fn run_cases(assistant: &Assistant, cases: &[EvalCase]) -> Vec<CaseOutcome> {
    let mut outcomes = Vec::with_capacity(cases.len());
    for case in cases {
        info!("Case {}: {}", case.id, case.description);
        outcomes.push(run_case(assistant, case).await);
    }
    outcomes
}

/// Aggregate scores for one model
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelSummary {
    pub model: String,
    pub cases: usize,
    pub successes: usize,
    pub intent_correct: usize,
    pub entities_correct: usize,
    /// Averages over successful cases
    pub mean_timings: StageTimings,
    pub mean_tokens: usize,
}

impl ModelSummary {
    pub fn from_outcomes(model: &str, outcomes: &[CaseOutcome]) -> Self {
        let mut summary = ModelSummary {
            model: model.to_string(),
            cases: outcomes.len(),
            ..Default::default()
        };
        let mut tokens = 0;
        for outcome in outcomes.iter().filter(|o| o.success) {
            summary.successes += 1;
            summary.intent_correct += outcome.intent_correct as usize;
            summary.entities_correct += outcome.entities_correct as usize;
            tokens += outcome.estimated_tokens;
            let t = &mut summary.mean_timings;
            t.intent += outcome.timings.intent;
            t.entities += outcome.timings.entities;
            t.retrieval += outcome.timings.retrieval;
            t.answer += outcome.timings.answer;
            t.total += outcome.timings.total;
        }
        if summary.successes > 0 {
            let n = summary.successes as f64;
            let t = &mut summary.mean_timings;
            t.intent /= n;
            t.entities /= n;
            t.retrieval /= n;
            t.answer /= n;
            t.total /= n;
            summary.mean_tokens = tokens / summary.successes;
        }
        summary
    }

    pub fn intent_accuracy(&self) -> Option<f64> {
        (self.successes > 0).then(|| self.intent_correct as f64 / self.cases as f64)
    }

    pub fn entity_accuracy(&self) -> Option<f64> {
        (self.successes > 0).then(|| self.entities_correct as f64 / self.cases as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cases_cover_every_intent() {
        let cases = default_cases();
        assert_eq!(cases.len(), 10);
        for intent in Intent::ALL {
            assert!(cases.iter().any(|c| c.expected_intent == intent), "{}", intent);
        }
    }

    #[test]
    fn test_entities_match_normalizes_values() {
        let expected = Entities::route("LAX", "IAX");
        let extracted: Entities = serde_json::from_value(json!({
            "origin": "lax", "destination": "IAX", "flight_number": "null", "code": "", "limit": 10
        }))
        .unwrap();
        assert!(entities_match(&extracted, &expected));

        let expected = Entities::flight(2411);
        let extracted: Entities = serde_json::from_value(json!({"flight_number": "2411"})).unwrap();
        assert!(entities_match(&extracted, &expected));
        let extracted: Entities = serde_json::from_value(json!({"flight_number": 2411.0})).unwrap();
        assert!(entities_match(&extracted, &expected));

        assert!(!entities_match(&Entities::route("LAX", "ORD"), &Entities::route("LAX", "IAX")));
        assert!(!entities_match(&Entities::airport("LAX"), &Entities::new()));
    }

    #[test]
    fn test_summary() {
        let outcome = |success: bool, intent_correct: bool, total: f64| CaseOutcome {
            case_id: 1,
            model: "qwen".to_string(),
            success,
            error: None,
            intent: None,
            entities: None,
            intent_correct,
            entities_correct: success,
            answer: None,
            estimated_tokens: 40,
            timings: StageTimings {
                total,
                ..Default::default()
            },
        };
        let summary = ModelSummary::from_outcomes(
            "qwen",
            &[outcome(true, true, 1.0), outcome(true, false, 3.0), outcome(false, false, 0.0)],
        );
        assert_eq!(summary.cases, 3);
        assert_eq!(summary.successes, 2);
        assert_eq!(summary.intent_correct, 1);
        assert_eq!(summary.mean_timings.total, 2.0);
        assert_eq!(summary.mean_tokens, 40);
        assert_eq!(summary.entity_accuracy(), Some(2.0 / 3.0));

        assert_eq!(ModelSummary::from_outcomes("meta", &[]).intent_accuracy(), None);
    }
}
