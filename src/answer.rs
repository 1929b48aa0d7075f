//! Grounded answer generation
//!
//! The chat model only ever sees retrieved evidence. When the baseline
//! channel carries no data the model is not called at all and the fixed
//! [`REFUSAL`] is returned.

use crate::evidence::{Evidence, EvidenceBundle};
use crate::nlq::prompts::answer_prompt;
use crate::nlq::ChatModel;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reply used whenever the graph holds no answer
pub const REFUSAL: &str = "The KG does not contain the answer.";

/// One JSON object per line, sentinels included
pub fn render_block(evidence: &Evidence) -> String {
    let lines: Vec<String> = evidence
        .records()
        .iter()
        .map(|record| serde_json::to_string(record).unwrap_or_default())
        .collect();
    if lines.is_empty() {
        "(none)".to_string()
    } else {
        lines.join("\n")
    }
}

/// Full answer prompt for a question and its evidence
pub fn grounded_prompt(question: &str, bundle: &EvidenceBundle) -> String {
    answer_prompt(
        question,
        &render_block(&bundle.baseline),
        &render_block(&bundle.embedding),
        REFUSAL,
    )
}

pub struct AnswerGenerator {
    model: Arc<dyn ChatModel>,
    temperature: f32,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            temperature: 0.5,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Answer a question from retrieved evidence. Never fails.
    pub async fn answer(&self, question: &str, bundle: &EvidenceBundle) -> String {
        if !bundle.baseline.is_data() {
            debug!("Baseline carries no data, refusing without a model call");
            return REFUSAL.to_string();
        }

        let prompt = grounded_prompt(question, bundle);
        match self.model.chat(&prompt, self.temperature).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("{} returned an empty answer", self.model.name());
                REFUSAL.to_string()
            }
            Err(e) => {
                warn!("Answer generation with {} failed: {}", self.model.name(), e);
                REFUSAL.to_string()
            }
        }
    }
}
