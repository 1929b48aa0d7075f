//! Embedding client for hosted inference providers

use crate::config::{EmbedConfig, LLMProvider};
use crate::embed::{check_batch, EmbedError, EmbedResult, Embedder, EmbeddingModel};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hugging Face serverless inference for sentence-transformers models
const HF_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Client for one embedding model on one provider
pub struct EmbeddingClient {
    client: Client,
    provider: LLMProvider,
    model: EmbeddingModel,
    api_key: Option<String>,
    api_base_url: String,
}

impl EmbeddingClient {
    pub fn new(config: &EmbedConfig, model: EmbeddingModel) -> EmbedResult<Self> {
        let provider = config
            .provider
            .ok_or_else(|| EmbedError::ConfigError("no embedding provider configured".to_string()))?;

        if provider.requires_api_key() && config.api_key.is_none() {
            return Err(EmbedError::ConfigError(format!("{} requires an API key", provider)));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbedError::ConfigError(e.to_string()))?;

        let api_base_url = config.api_base_url.clone().unwrap_or_else(|| match provider {
            LLMProvider::HuggingFace => HF_INFERENCE_URL.to_string(),
            other => other.default_base_url().to_string(),
        });

        Ok(Self {
            client,
            provider,
            model,
            api_key: config.api_key.clone(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Model name as the provider knows it
    fn model_name(&self) -> &'static str {
        match self.provider {
            LLMProvider::HuggingFace => self.model.repo(),
            _ => self
                .model
                .repo()
                .rsplit('/')
                .next()
                .unwrap_or_else(|| self.model.repo()),
        }
    }

    fn api_key(&self) -> EmbedResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| EmbedError::ConfigError(format!("{} requires an API key", self.provider)))
    }

    async fn huggingface_embeddings(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct Request<'a> {
            inputs: &'a [String],
        }

        let url = format!("{}/{}/pipeline/feature-extraction", self.api_base_url, self.model_name());
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.api_key()?)
            .json(&Request { inputs: texts })
            .send()
            .await
            .map_err(|e| EmbedError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(EmbedError::ApiError(format!("Hugging Face returned error: {}", error_text)));
        }

        resp.json::<Vec<Vec<f32>>>()
            .await
            .map_err(|e| EmbedError::SerializationError(e.to_string()))
    }

    async fn openai_embeddings(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct OpenAIRequest<'a> {
            input: &'a [String],
            model: &'a str,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            data: Vec<OpenAIData>,
        }

        #[derive(Deserialize)]
        struct OpenAIData {
            embedding: Vec<f32>,
        }

        let url = format!("{}/embeddings", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.api_key()?)
            .json(&OpenAIRequest {
                input: texts,
                model: self.model_name(),
            })
            .send()
            .await
            .map_err(|e| EmbedError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(EmbedError::ApiError(format!("OpenAI returned error: {}", error_text)));
        }

        let result: OpenAIResponse = resp
            .json()
            .await
            .map_err(|e| EmbedError::SerializationError(e.to_string()))?;
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    async fn ollama_embeddings(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.api_base_url);
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            let resp = self
                .client
                .post(&url)
                .json(&OllamaRequest {
                    model: self.model_name(),
                    prompt: text,
                })
                .send()
                .await
                .map_err(|e| EmbedError::NetworkError(e.to_string()))?;

            if !resp.status().is_success() {
                let error_text = resp.text().await.unwrap_or_default();
                return Err(EmbedError::ApiError(format!("Ollama returned error: {}", error_text)));
            }

            let result: OllamaResponse = resp
                .json()
                .await
                .map_err(|e| EmbedError::SerializationError(e.to_string()))?;
            results.push(result.embedding);
        }

        Ok(results)
    }

    async fn gemini_embeddings(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct GeminiBatchRequest<'a> {
            requests: Vec<GeminiRequest<'a>>,
        }

        #[derive(Serialize)]
        struct GeminiRequest<'a> {
            model: String,
            content: GeminiContent<'a>,
            #[serde(rename = "outputDimensionality")]
            output_dimensionality: usize,
        }

        #[derive(Serialize)]
        struct GeminiContent<'a> {
            parts: Vec<GeminiPart<'a>>,
        }

        #[derive(Serialize)]
        struct GeminiPart<'a> {
            text: &'a str,
        }

        #[derive(Deserialize)]
        struct GeminiBatchResponse {
            embeddings: Vec<GeminiEmbedding>,
        }

        #[derive(Deserialize)]
        struct GeminiEmbedding {
            values: Vec<f32>,
        }

        let url = format!(
            "{}/models/{}:batchEmbedContents?key={}",
            self.api_base_url,
            self.model_name(),
            self.api_key()?
        );

        let requests = texts
            .iter()
            .map(|t| GeminiRequest {
                model: format!("models/{}", self.model_name()),
                content: GeminiContent {
                    parts: vec![GeminiPart { text: t }],
                },
                output_dimensionality: self.model.dimensions(),
            })
            .collect();

        let resp = self
            .client
            .post(&url)
            .json(&GeminiBatchRequest { requests })
            .send()
            .await
            .map_err(|e| EmbedError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(EmbedError::ApiError(format!("Gemini returned error: {}", error_text)));
        }

        let result: GeminiBatchResponse = resp
            .json()
            .await
            .map_err(|e| EmbedError::SerializationError(e.to_string()))?;
        Ok(result.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    fn model(&self) -> EmbeddingModel {
        self.model
    }

    async fn encode(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!("Embedding {} texts with {} via {}", texts.len(), self.model, self.provider);
        let vectors = match self.provider {
            LLMProvider::HuggingFace => self.huggingface_embeddings(texts).await?,
            LLMProvider::OpenAI => self.openai_embeddings(texts).await?,
            LLMProvider::Ollama => self.ollama_embeddings(texts).await?,
            LLMProvider::Gemini => self.gemini_embeddings(texts).await?,
        };
        check_batch(self.model, texts.len(), &vectors)?;
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: Option<LLMProvider>, api_key: Option<&str>) -> EmbedConfig {
        EmbedConfig {
            provider,
            api_key: api_key.map(str::to_string),
            ..EmbedConfig::default()
        }
    }

    #[test]
    fn test_requires_provider_and_key() {
        assert!(EmbeddingClient::new(&config(None, None), EmbeddingModel::MiniLm).is_err());
        assert!(EmbeddingClient::new(&config(Some(LLMProvider::HuggingFace), None), EmbeddingModel::MiniLm).is_err());
        assert!(EmbeddingClient::new(&config(Some(LLMProvider::Ollama), None), EmbeddingModel::MiniLm).is_ok());
    }

    #[test]
    fn test_model_names_per_provider() {
        let hf = EmbeddingClient::new(&config(Some(LLMProvider::HuggingFace), Some("hf_x")), EmbeddingModel::MpNet).unwrap();
        assert_eq!(hf.model_name(), "sentence-transformers/all-mpnet-base-v2");
        assert_eq!(hf.api_base_url, HF_INFERENCE_URL);

        let ollama = EmbeddingClient::new(&config(Some(LLMProvider::Ollama), None), EmbeddingModel::MiniLm).unwrap();
        assert_eq!(ollama.model_name(), "all-MiniLM-L6-v2");
        assert_eq!(ollama.api_base_url, "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_empty_batch_skips_network() {
        let mut cfg = config(Some(LLMProvider::Ollama), None);
        cfg.api_base_url = Some("http://127.0.0.1:9".to_string());
        let client = EmbeddingClient::new(&cfg, EmbeddingModel::MiniLm).unwrap();
        assert!(client.encode(&[]).await.unwrap().is_empty());
    }
}
