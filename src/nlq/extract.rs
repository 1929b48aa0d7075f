//! Entity extraction strategies

use super::prompts::entity_prompt;
use super::{strip_fences, ChatModel, Fallback, NLQError, NLQResult};
use crate::intent::{Entities, Intent, Param};
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

#[async_trait]
pub trait EntityExtractor: Send + Sync {
    async fn extract(&self, intent: Intent, question: &str) -> NLQResult<Entities>;
}

/// Asks a chat model for a JSON object of parameters
pub struct LlmEntityExtractor {
    model: Arc<dyn ChatModel>,
    temperature: f32,
}

impl LlmEntityExtractor {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model, temperature: 0.0 }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Decode the first JSON object in a chat response
pub(crate) fn parse_entities(response: &str) -> NLQResult<Entities> {
    let body = strip_fences(response);
    let (start, end) = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            return Err(NLQError::SerializationError(format!(
                "no JSON object in response: {}",
                body
            )))
        }
    };
    serde_json::from_str(&body[start..=end]).map_err(|e| NLQError::SerializationError(e.to_string()))
}

#[async_trait]
impl EntityExtractor for LlmEntityExtractor {
    async fn extract(&self, intent: Intent, question: &str) -> NLQResult<Entities> {
        let response = self
            .model
            .chat(&entity_prompt(intent, question), self.temperature)
            .await?;
        let entities = parse_entities(&response)?;
        debug!("{} extracted {:?}", self.model.name(), entities);
        Ok(entities)
    }
}

fn station_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z]{3})\b").unwrap())
}

fn from_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:[Ff]rom|[Ll]eaving|[Oo]ut of)\s+([A-Z]{3})\b").unwrap())
}

fn to_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:[Tt]o|[Ii]nto|[Aa]rriving at)\s+([A-Z]{3})\b").unwrap())
}

fn flight_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bflight\s*(?:number|no\.?|#)?\s*(?:[A-Z]{2})?\s*(\d{1,5})\b").unwrap())
}

fn carrier_flight_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z]{2}(\d{2,4})\b").unwrap())
}

fn limit_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:top|first|best|worst)\s+(\d{1,3})\b|\b(\d{1,3})\s+(?:most|least|worst|best|busiest)?\s*(?:flights|routes|airports)\b")
            .unwrap()
    })
}

/// Offline extractor over regular expressions.
///
/// Station codes are upper-case three-letter tokens; only the parameters the
/// intent's template uses are filled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternEntityExtractor;

impl PatternEntityExtractor {
    pub fn extract_text(&self, intent: Intent, question: &str) -> Entities {
        let mut entities = Entities::new();
        let params = intent.template().params;
        let codes: Vec<&str> = station_pattern()
            .captures_iter(question)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect();

        if params.contains(&Param::Origin) || params.contains(&Param::Destination) {
            let origin = capture(from_pattern(), question).or_else(|| codes.first().copied());
            let destination = capture(to_pattern(), question)
                .or_else(|| codes.iter().copied().find(|c| Some(*c) != origin));
            entities.origin = origin.map(Into::into);
            entities.destination = destination.map(Into::into);
        }

        if params.contains(&Param::Code) {
            entities.code = codes.first().map(|c| (*c).into());
        }

        if params.contains(&Param::FlightNumber) {
            entities.flight_number = capture(flight_pattern(), question)
                .or_else(|| capture(carrier_flight_pattern(), question))
                .and_then(|n| n.parse::<i64>().ok())
                .map(Into::into);
        }

        if params.contains(&Param::Limit) {
            entities.limit = limit_pattern()
                .captures(question)
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
                .and_then(|m| m.as_str().parse::<i64>().ok())
                .map(Into::into);
        }

        entities
    }
}

fn capture<'q>(pattern: &Regex, text: &'q str) -> Option<&'q str> {
    pattern.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

#[async_trait]
impl EntityExtractor for PatternEntityExtractor {
    async fn extract(&self, intent: Intent, question: &str) -> NLQResult<Entities> {
        Ok(self.extract_text(intent, question))
    }
}

#[async_trait]
impl<P, F> EntityExtractor for Fallback<P, F>
where
    P: EntityExtractor,
    F: EntityExtractor,
{
    async fn extract(&self, intent: Intent, question: &str) -> NLQResult<Entities> {
        match self.primary.extract(intent, question).await {
            Ok(entities) => Ok(entities),
            Err(e) => {
                warn!("Entity extraction failed ({}), using fallback", e);
                self.fallback.extract(intent, question).await
            }
        }
    }
}

#[async_trait]
impl<T: EntityExtractor + ?Sized> EntityExtractor for Arc<T> {
    async fn extract(&self, intent: Intent, question: &str) -> NLQResult<Entities> {
        (**self).extract(intent, question).await
    }
}
