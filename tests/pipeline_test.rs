mod common;

use aerograph::answer::REFUSAL;
use aerograph::config::NLQConfig;
use aerograph::evidence::{EmptyReason, Evidence};
use aerograph::intent::{Intent, Param};
use aerograph::nlq::{ChatModel, NLQError, NLQResult};
use aerograph::pipeline::Assistant;
use aerograph::retrieve::RetrievalConfig;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Chat model answering each stage with a fixed script
struct ScriptedModel {
    intent: NLQResult<String>,
    entities: NLQResult<String>,
    answer: NLQResult<String>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedModel {
    fn new(intent: &str, entities: &str, answer: &str) -> Self {
        Self {
            intent: Ok(intent.to_string()),
            entities: Ok(entities.to_string()),
            answer: Ok(answer.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn stages(&self) -> Vec<String> {
        self.prompts.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }

    fn prompt(&self, stage: &str) -> Option<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .find(|(s, _)| s == stage)
            .map(|(_, p)| p.clone())
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, prompt: &str, _temperature: f32) -> NLQResult<String> {
        let (stage, reply) = if prompt.contains("BASELINE CONTEXT") {
            ("answer", &self.answer)
        } else if prompt.trim_end().ends_with("JSON:") {
            ("entities", &self.entities)
        } else {
            ("intent", &self.intent)
        };
        self.prompts
            .lock()
            .unwrap()
            .push((stage.to_string(), prompt.to_string()));
        reply.clone()
    }
}

async fn assistant(model: Arc<ScriptedModel>) -> Assistant {
    let retriever = Arc::new(common::fixture_retriever(RetrievalConfig::default()).await);
    Assistant::with_model(model, retriever, &NLQConfig::default())
}

#[tokio::test]
async fn test_answer_is_grounded_in_baseline() {
    let model = Arc::new(ScriptedModel::new(
        "most_delayed_flights",
        r#"{"origin": "LAX", "destination": "ORD", "flight_number": null, "code": null, "limit": 5}"#,
        "Flight 200 is the most delayed, averaging 45 minutes.",
    ));
    let assistant = assistant(model.clone()).await;

    let interaction = assistant
        .ask("Which flights from LAX to ORD have the most delays?", None)
        .await
        .unwrap();
    assert_eq!(interaction.intent, Intent::MostDelayedFlights);
    assert_eq!(interaction.entities.station(Param::Origin).as_deref(), Some("LAX"));
    assert!(interaction.evidence.baseline.is_data());
    assert_eq!(interaction.answer, "Flight 200 is the most delayed, averaging 45 minutes.");
    assert!(interaction.timings.total >= interaction.timings.answer);

    assert_eq!(model.stages(), vec!["intent", "entities", "answer"]);
    let prompt = model.prompt("answer").unwrap();
    assert!(prompt.contains("\"flight\":200"));
    assert!(prompt.contains("embeddings not used"));
    assert!(prompt.contains(REFUSAL));
}

#[tokio::test]
async fn test_heuristics_take_over_when_model_output_is_unusable() {
    let model = Arc::new(ScriptedModel::new(
        "I am not sure what you mean.",
        "Sorry, I cannot produce JSON.",
        "Flight 200 is the most delayed.",
    ));
    let assistant = assistant(model).await;

    let interaction = assistant
        .ask("Which flights from LAX to ORD have the most delays?", None)
        .await
        .unwrap();
    assert_eq!(interaction.intent, Intent::MostDelayedFlights);
    assert_eq!(interaction.entities.station(Param::Destination).as_deref(), Some("ORD"));
    assert!(interaction.evidence.baseline.is_data());
}

#[tokio::test]
async fn test_no_data_refuses_without_answer_call() {
    let model = Arc::new(ScriptedModel::new(
        "route_distance",
        r#"{"origin": "LAX", "destination": "XXX"}"#,
        "It is 900 miles.",
    ));
    let assistant = assistant(model.clone()).await;

    let interaction = assistant.ask("How far is LAX from XXX?", None).await.unwrap();
    assert_eq!(interaction.evidence.baseline, Evidence::Empty(EmptyReason::NoMatchingData));
    assert_eq!(interaction.answer, REFUSAL);
    assert!(!model.stages().contains(&"answer".to_string()));
}

#[tokio::test]
async fn test_answer_failure_yields_refusal() {
    let model = Arc::new(ScriptedModel {
        answer: Err(NLQError::NetworkError("connection reset".to_string())),
        ..ScriptedModel::new("popular_airports", r#"{"limit": 2}"#, "")
    });
    let assistant = assistant(model).await;

    let interaction = assistant.ask("What are the most popular airports?", None).await.unwrap();
    assert_eq!(interaction.evidence.baseline.rows().len(), 2);
    assert_eq!(interaction.answer, REFUSAL);
}

#[tokio::test]
async fn test_unclassifiable_question_is_an_error() {
    let model = Arc::new(ScriptedModel {
        intent: Err(NLQError::ApiError("rate limited".to_string())),
        ..ScriptedModel::new("", "{}", "")
    });
    let assistant = assistant(model).await;

    let result = assistant.ask("What's the weather like in Paris?", None).await;
    assert!(matches!(result, Err(NLQError::ValidationError(_))));
}
