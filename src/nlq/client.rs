//! Chat client for hosted LLM providers

use crate::config::{LLMProvider, NLQConfig};
use crate::nlq::{ChatModel, NLQError, NLQResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Short model aliases accepted in configuration
pub const MODEL_ALIASES: [(&str, &str); 5] = [
    ("deepseek", "deepseek-ai/DeepSeek-V3.2"),
    ("qwen", "Qwen/Qwen3-4B-Instruct-2507"),
    ("openai", "openai/gpt-oss-20b"),
    ("google", "google/gemma-2-2b-it"),
    ("meta", "meta-llama/Llama-3.2-1B-Instruct"),
];

/// Full model id for an alias; other names pass through unchanged
pub fn resolve_model_alias(name: &str) -> &str {
    MODEL_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name.trim()))
        .map(|(_, model)| *model)
        .unwrap_or(name)
}

pub struct LlmClient {
    client: Client,
    provider: LLMProvider,
    model: String,
    api_key: Option<String>,
    api_base_url: String,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(config: &NLQConfig) -> NLQResult<Self> {
        if config.provider.requires_api_key() && config.api_key.is_none() {
            return Err(NLQError::ConfigError(format!("{} requires an API key", config.provider)));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NLQError::ConfigError(e.to_string()))?;

        let api_base_url = config
            .api_base_url
            .clone()
            .unwrap_or_else(|| config.provider.default_base_url().to_string());

        Ok(Self {
            client,
            provider: config.provider,
            model: resolve_model_alias(&config.model).to_string(),
            api_key: config.api_key.clone(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
        })
    }

    fn api_key(&self) -> NLQResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| NLQError::ConfigError(format!("{} requires an API key", self.provider)))
    }

    /// OpenAI-compatible chat completions (OpenAI and the Hugging Face router)
    async fn openai_chat(&self, prompt: &str, temperature: f32) -> NLQResult<String> {
        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MessageContent,
        }

        #[derive(Deserialize)]
        struct MessageContent {
            #[serde(default)]
            content: Option<String>,
        }

        let url = format!("{}/chat/completions", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.api_key()?)
            .json(&Request {
                model: &self.model,
                messages: vec![Message {
                    role: "user",
                    content: prompt,
                }],
                temperature,
                max_tokens: self.max_tokens,
            })
            .send()
            .await
            .map_err(|e| NLQError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(NLQError::ApiError(format!("{} error: {}", self.provider, text)));
        }

        let result: Response = resp
            .json()
            .await
            .map_err(|e| NLQError::SerializationError(e.to_string()))?;
        Ok(result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    async fn ollama_chat(&self, prompt: &str, temperature: f32) -> NLQResult<String> {
        #[derive(Serialize)]
        struct Options {
            temperature: f32,
            num_predict: u32,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            prompt: &'a str,
            stream: bool,
            options: Options,
        }

        #[derive(Deserialize)]
        struct Response {
            response: String,
        }

        let url = format!("{}/api/generate", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .json(&Request {
                model: &self.model,
                prompt,
                stream: false,
                options: Options {
                    temperature,
                    num_predict: self.max_tokens,
                },
            })
            .send()
            .await
            .map_err(|e| NLQError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(NLQError::ApiError(format!("Ollama error: {}", resp.status())));
        }

        let result: Response = resp
            .json()
            .await
            .map_err(|e| NLQError::SerializationError(e.to_string()))?;
        Ok(result.response)
    }

    async fn gemini_chat(&self, prompt: &str, temperature: f32) -> NLQResult<String> {
        #[derive(Serialize)]
        struct Request<'a> {
            contents: Vec<Content<'a>>,
            #[serde(rename = "generationConfig")]
            generation_config: GenerationConfig,
        }

        #[derive(Serialize)]
        struct Content<'a> {
            role: &'a str,
            parts: Vec<Part<'a>>,
        }

        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }

        #[derive(Serialize)]
        struct GenerationConfig {
            temperature: f32,
            #[serde(rename = "maxOutputTokens")]
            max_output_tokens: u32,
        }

        #[derive(Deserialize)]
        struct Response {
            candidates: Option<Vec<Candidate>>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: CandidateContent,
        }

        #[derive(Deserialize)]
        struct CandidateContent {
            parts: Vec<CandidatePart>,
        }

        #[derive(Deserialize)]
        struct CandidatePart {
            text: String,
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base_url,
            self.model,
            self.api_key()?
        );

        let resp = self
            .client
            .post(&url)
            .json(&Request {
                contents: vec![Content {
                    role: "user",
                    parts: vec![Part { text: prompt }],
                }],
                generation_config: GenerationConfig {
                    temperature,
                    max_output_tokens: self.max_tokens,
                },
            })
            .send()
            .await
            .map_err(|e| NLQError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(NLQError::ApiError(format!("Gemini error: {}", text)));
        }

        let result: Response = resp
            .json()
            .await
            .map_err(|e| NLQError::SerializationError(e.to_string()))?;

        Ok(result
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default())
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, prompt: &str, temperature: f32) -> NLQResult<String> {
        tracing::debug!("Chat request to {} ({})", self.model, self.provider);
        match self.provider {
            LLMProvider::HuggingFace | LLMProvider::OpenAI => self.openai_chat(prompt, temperature).await,
            LLMProvider::Ollama => self.ollama_chat(prompt, temperature).await,
            LLMProvider::Gemini => self.gemini_chat(prompt, temperature).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_aliases() {
        assert_eq!(resolve_model_alias("qwen"), "Qwen/Qwen3-4B-Instruct-2507");
        assert_eq!(resolve_model_alias("Meta"), "meta-llama/Llama-3.2-1B-Instruct");
        assert_eq!(resolve_model_alias("llama3"), "llama3");
    }

    #[test]
    fn test_client_from_config() {
        let config = NLQConfig {
            enabled: true,
            api_key: Some("hf_token".to_string()),
            ..NLQConfig::default()
        };
        let client = LlmClient::new(&config).unwrap();
        assert_eq!(client.name(), "deepseek-ai/DeepSeek-V3.2");
        assert_eq!(client.api_base_url, "https://router.huggingface.co/v1");

        let missing_key = NLQConfig {
            provider: LLMProvider::OpenAI,
            ..NLQConfig::default()
        };
        assert!(LlmClient::new(&missing_key).is_err());
    }
}
