//! Intent classification strategies

use super::prompts::intent_prompt;
use super::{strip_fences, ChatModel, Fallback, NLQError, NLQResult};
use crate::intent::Intent;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, question: &str) -> NLQResult<Intent>;
}

/// Asks a chat model to name the intent
pub struct LlmIntentClassifier {
    model: Arc<dyn ChatModel>,
    temperature: f32,
}

impl LlmIntentClassifier {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model, temperature: 0.0 }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// First intent name found in a chat response
fn parse_intent(response: &str) -> NLQResult<Intent> {
    let body = strip_fences(response);
    if let Some(intent) = body.lines().find_map(|line| line.parse::<Intent>().ok()) {
        return Ok(intent);
    }
    // chatty models wrap the name in a sentence
    let lowered = body.to_ascii_lowercase();
    Intent::ALL
        .iter()
        .copied()
        .find(|intent| lowered.contains(intent.as_str()))
        .ok_or_else(|| NLQError::ValidationError(format!("no known intent in response: {}", body)))
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(&self, question: &str) -> NLQResult<Intent> {
        let response = self.model.chat(&intent_prompt(question), self.temperature).await?;
        let intent = parse_intent(&response)?;
        debug!("{} classified question as {}", self.model.name(), intent);
        Ok(intent)
    }
}

/// Keyword rules, checked in order
const KEYWORD_RULES: &[(&[&str], Intent)] = &[
    (&["generation", "demographic"], Intent::DominantGenerationAirport),
    (&["frequent flyer", "frequent flier", "loyalty"], Intent::FrequentFlyersRoute),
    (&["direct", "nonstop", "non-stop"], Intent::DirectFlight),
    (&["aircraft", "plane", "airplane"], Intent::FlightAircraft),
    (&["class", "cabin"], Intent::FlightClassesOffered),
    (&["distance", "how far", "miles"], Intent::RouteDistance),
    (&["food", "meal", "catering"], Intent::WorstFoodRoutes),
    (&["crowded", "fewest passengers", "emptiest", "least busy"], Intent::LeastCrowdedFlights),
    (&["delay", "late"], Intent::MostDelayedFlights),
    (&["popular", "busiest", "most journeys"], Intent::PopularAirports),
];

/// Offline classifier over keyword rules
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntentClassifier;

impl KeywordIntentClassifier {
    pub fn classify_text(&self, question: &str) -> Option<Intent> {
        let lowered = question.to_lowercase();
        KEYWORD_RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(_, intent)| *intent)
    }
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify(&self, question: &str) -> NLQResult<Intent> {
        self.classify_text(question)
            .ok_or_else(|| NLQError::ValidationError(format!("no intent keyword in question: {}", question)))
    }
}

#[async_trait]
impl<P, F> IntentClassifier for Fallback<P, F>
where
    P: IntentClassifier,
    F: IntentClassifier,
{
    async fn classify(&self, question: &str) -> NLQResult<Intent> {
        match self.primary.classify(question).await {
            Ok(intent) => Ok(intent),
            Err(e) => {
                warn!("Intent classification failed ({}), using fallback", e);
                self.fallback.classify(question).await
            }
        }
    }
}

#[async_trait]
impl<T: IntentClassifier + ?Sized> IntentClassifier for Arc<T> {
    async fn classify(&self, question: &str) -> NLQResult<Intent> {
        (**self).classify(question).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_intent_from_chatty_response() {
        assert_eq!(parse_intent("route_distance").unwrap(), Intent::RouteDistance);
        assert_eq!(
            parse_intent("```\nflight_aircraft\n```").unwrap(),
            Intent::FlightAircraft
        );
        assert_eq!(
            parse_intent("The intent is: popular_airports because...").unwrap(),
            Intent::PopularAirports
        );
        assert!(matches!(parse_intent("weather"), Err(NLQError::ValidationError(_))));
    }

    #[test]
    fn test_keyword_rules() {
        let classifier = KeywordIntentClassifier;
        let cases = [
            ("Which flights from LAX to IAX have the most delays?", Intent::MostDelayedFlights),
            ("What are the least crowded flights from ORX to IAX?", Intent::LeastCrowdedFlights),
            ("Show me the top 3 routes with the worst food", Intent::WorstFoodRoutes),
            ("What are the most popular airports?", Intent::PopularAirports),
            ("What classes are available on flight 2411?", Intent::FlightClassesOffered),
            ("What is the flight distance from DFX to ORX?", Intent::RouteDistance),
            ("What is the dominant passenger generation at LAX?", Intent::DominantGenerationAirport),
            ("Can I go from DEX to LAX directly?", Intent::DirectFlight),
            ("Which aircraft will I be flying on flight 924?", Intent::FlightAircraft),
            ("Do frequent flyers use the route from EWX to IAX?", Intent::FrequentFlyersRoute),
        ];
        for (question, expected) in cases {
            assert_eq!(classifier.classify_text(question), Some(expected), "{}", question);
        }
        assert_eq!(classifier.classify_text("What's the weather like?"), None);
    }
}
