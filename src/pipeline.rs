//! Question answering pipeline: classify, extract, retrieve, answer

use crate::answer::AnswerGenerator;
use crate::config::NLQConfig;
use crate::evidence::EvidenceBundle;
use crate::intent::{Entities, Intent};
use crate::nlq::{
    ChatModel, EntityExtractor, Fallback, IntentClassifier, KeywordIntentClassifier, LlmClient,
    LlmEntityExtractor, LlmIntentClassifier, NLQResult, PatternEntityExtractor,
};
use crate::retrieve::Retriever;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Wall-clock time spent in each stage, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StageTimings {
    pub intent: f64,
    pub entities: f64,
    pub retrieval: f64,
    pub answer: f64,
    pub total: f64,
}

/// Everything produced while answering one question
#[derive(Debug, Clone, Serialize)]
pub struct Interaction {
    pub question: String,
    pub intent: Intent,
    pub entities: Entities,
    pub evidence: EvidenceBundle,
    pub answer: String,
    pub timings: StageTimings,
}

pub struct Assistant {
    classifier: Box<dyn IntentClassifier>,
    extractor: Box<dyn EntityExtractor>,
    retriever: Arc<Retriever>,
    generator: AnswerGenerator,
}

impl Assistant {
    pub fn new(
        classifier: Box<dyn IntentClassifier>,
        extractor: Box<dyn EntityExtractor>,
        retriever: Arc<Retriever>,
        generator: AnswerGenerator,
    ) -> Self {
        Self {
            classifier,
            extractor,
            retriever,
            generator,
        }
    }

    /// Chat-model stages with heuristic fallback, all on one model
    pub fn with_model(model: Arc<dyn ChatModel>, retriever: Arc<Retriever>, config: &NLQConfig) -> Self {
        let classifier = Fallback::new(
            LlmIntentClassifier::new(model.clone()).with_temperature(config.temperature),
            KeywordIntentClassifier,
        );
        let extractor = Fallback::new(
            LlmEntityExtractor::new(model.clone()).with_temperature(config.temperature),
            PatternEntityExtractor,
        );
        let generator = AnswerGenerator::new(model).with_temperature(config.answer_temperature);
        Self::new(Box::new(classifier), Box::new(extractor), retriever, generator)
    }

    pub fn from_config(config: &NLQConfig, retriever: Arc<Retriever>) -> NLQResult<Self> {
        let client = LlmClient::new(config)?;
        info!("Assistant using {} via {}", client.name(), config.provider);
        Ok(Self::with_model(Arc::new(client), retriever, config))
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    /// Answer a question.
    ///
    /// Fails only when the question cannot be understood; retrieval and
    /// answer problems surface as evidence sentinels and the refusal.
    pub async fn ask(&self, question: &str, embedder: Option<&str>) -> NLQResult<Interaction> {
        let started = Instant::now();
        let mut timings = StageTimings::default();

        let stage = Instant::now();
        let intent = self.classifier.classify(question).await?;
        timings.intent = secs(stage.elapsed());

        let stage = Instant::now();
        let entities = self.extractor.extract(intent, question).await?;
        timings.entities = secs(stage.elapsed());

        let stage = Instant::now();
        let evidence = self
            .retriever
            .retrieve(intent.as_str(), &entities, question, embedder, None)
            .await;
        timings.retrieval = secs(stage.elapsed());

        let stage = Instant::now();
        let answer = self.generator.answer(question, &evidence).await;
        timings.answer = secs(stage.elapsed());
        timings.total = secs(started.elapsed());

        info!("Answered '{}' as {} in {:.2}s", question, intent, timings.total);
        Ok(Interaction {
            question: question.to_string(),
            intent,
            entities,
            evidence,
            answer,
            timings,
        })
    }
}

fn secs(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64()
}
