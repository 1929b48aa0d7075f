//! Application configuration
//!
//! Resolution order (highest priority first):
//! 1. Environment variables (`NEO4J_*`, `HUGGINGFACE_TOKEN`, `AEROGRAPH_*`)
//! 2. Config file: YAML (`*.yaml` / `*.yml`) or a `key=value` file
//! 3. Compiled defaults
//!
//! A `key=value` file must define `NEO4J_URI`, `NEO4J_USERNAME`,
//! `NEO4J_PASSWORD` and `HUGGINGFACE_TOKEN`.

use crate::retrieve::{EmbeddingStrategy, RetrievalConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Keys every `key=value` config file must define
pub const REQUIRED_KEYS: [&str; 4] = [
    "NEO4J_URI",
    "NEO4J_USERNAME",
    "NEO4J_PASSWORD",
    "HUGGINGFACE_TOKEN",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    #[error("failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("missing required keys in {path}: {}", keys.join(", "))]
    MissingKeys { path: String, keys: Vec<String> },

    #[error("invalid value for {field}: {message}")]
    ValidationFailed { field: String, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Hosted model providers shared by the chat and embedding clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    #[default]
    HuggingFace,
    OpenAI,
    Ollama,
    Gemini,
}

impl LLMProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LLMProvider::HuggingFace => "https://router.huggingface.co/v1",
            LLMProvider::OpenAI => "https://api.openai.com/v1",
            LLMProvider::Ollama => "http://localhost:11434",
            LLMProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LLMProvider::Ollama)
    }
}

impl fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LLMProvider::HuggingFace => "huggingface",
            LLMProvider::OpenAI => "openai",
            LLMProvider::Ollama => "ollama",
            LLMProvider::Gemini => "gemini",
        };
        f.write_str(name)
    }
}

impl FromStr for LLMProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hf" => Ok(LLMProvider::HuggingFace),
            "openai" => Ok(LLMProvider::OpenAI),
            "ollama" => Ok(LLMProvider::Ollama),
            "gemini" => Ok(LLMProvider::Gemini),
            other => Err(ConfigError::ValidationFailed {
                field: "provider".to_string(),
                message: format!("unknown provider '{}'", other),
            }),
        }
    }
}

/// Which graph store backs retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process [`GraphStore`](crate::graph::GraphStore)
    #[default]
    Memory,
    /// Remote Neo4j over its HTTP transactional API
    Neo4j,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// `http(s)://`, `neo4j(+s)://` or `bolt(+s)://` address of the server
    pub uri: String,
    pub username: String,
    pub password: Option<String>,
    pub database: String,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            uri: "http://localhost:7474".to_string(),
            username: "neo4j".to_string(),
            password: None,
            database: "neo4j".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Embedding client settings; no provider means the offline hashing embedder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    pub provider: Option<LLMProvider>,
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            provider: None,
            api_key: None,
            api_base_url: None,
            timeout_secs: 30,
        }
    }
}

/// Chat model settings for classification, extraction and answering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NLQConfig {
    pub enabled: bool,
    pub provider: LLMProvider,
    /// Model name or short alias (`deepseek`, `qwen`, `openai`, `google`, `meta`)
    pub model: String,
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub max_tokens: u32,
    /// Temperature for classification and extraction
    pub temperature: f32,
    /// Temperature for answer generation
    pub answer_temperature: f32,
    pub timeout_secs: u64,
}

impl Default for NLQConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: LLMProvider::HuggingFace,
            model: "deepseek".to_string(),
            api_key: None,
            api_base_url: None,
            max_tokens: 1024,
            temperature: 0.0,
            answer_temperature: 0.5,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub embed: EmbedConfig,
    pub nlq: NLQConfig,
    pub retrieval: RetrievalConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load a config file (if given), apply environment overrides and validate
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a file, choosing the format by extension
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let label = path.display().to_string();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content, &label),
            _ => Self::from_key_value_str(&content, &label),
        }
    }

    pub fn from_yaml_str(content: &str, label: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: label.to_string(),
            message: e.to_string(),
        })
    }

    /// Parse `key=value` lines; blank lines and `#` comments are skipped
    pub fn from_key_value_str(content: &str, label: &str) -> ConfigResult<Self> {
        let pairs: Vec<(String, String)> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();

        let missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|key| !pairs.iter().any(|(k, _)| k == *key))
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingKeys {
                path: label.to_string(),
                keys: missing,
            });
        }

        let mut config = Self::default();
        config.apply_overrides(pairs)?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_overrides(std::env::vars())
    }

    /// Apply recognized keys; unknown keys are ignored
    pub fn apply_overrides<I, K, V>(&mut self, pairs: I) -> ConfigResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            match key {
                "NEO4J_URI" => {
                    self.store.backend = StoreBackend::Neo4j;
                    self.store.uri = value.to_string();
                }
                "NEO4J_USERNAME" => self.store.username = value.to_string(),
                "NEO4J_PASSWORD" => self.store.password = Some(value.to_string()),
                "NEO4J_DATABASE" => self.store.database = value.to_string(),
                "HUGGINGFACE_TOKEN" => {
                    self.embed.provider = Some(LLMProvider::HuggingFace);
                    self.embed.api_key = Some(value.to_string());
                    self.nlq.enabled = true;
                    self.nlq.provider = LLMProvider::HuggingFace;
                    self.nlq.api_key = Some(value.to_string());
                }
                "AEROGRAPH_LLM_PROVIDER" => {
                    self.nlq.enabled = true;
                    self.nlq.provider = value.parse()?;
                }
                "AEROGRAPH_LLM_MODEL" => self.nlq.model = value.to_string(),
                "AEROGRAPH_LLM_API_KEY" => self.nlq.api_key = Some(value.to_string()),
                "AEROGRAPH_EMBED_PROVIDER" => {
                    self.embed.provider = match value.to_ascii_lowercase().as_str() {
                        "offline" | "hashing" | "none" => None,
                        other => Some(other.parse()?),
                    };
                }
                "AEROGRAPH_DEFAULT_LIMIT" => self.retrieval.default_limit = parse_field(key, value)?,
                "AEROGRAPH_TOP_K" => self.retrieval.top_k = parse_field(key, value)?,
                "AEROGRAPH_CUTOFF" => self.retrieval.cutoff = parse_field(key, value)?,
                "AEROGRAPH_STRATEGY" => {
                    self.retrieval.strategy = match value.to_ascii_lowercase().as_str() {
                        "store_search" | "search" => EmbeddingStrategy::StoreSearch,
                        "rerank" => EmbeddingStrategy::Rerank,
                        other => {
                            return Err(ConfigError::ValidationFailed {
                                field: key.to_string(),
                                message: format!("unknown strategy '{}'", other),
                            })
                        }
                    };
                }
                "AEROGRAPH_HOST" => self.server.host = value.to_string(),
                "AEROGRAPH_PORT" => self.server.port = parse_field(key, value)?,
                _ => {}
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.retrieval.default_limit < 1 {
            return Err(invalid("retrieval.default_limit", "must be at least 1"));
        }
        if self.retrieval.top_k < 1 {
            return Err(invalid("retrieval.top_k", "must be at least 1"));
        }
        if !(-1.0..=1.0).contains(&self.retrieval.cutoff) {
            return Err(invalid("retrieval.cutoff", "must be between -1.0 and 1.0"));
        }
        if self.store.backend == StoreBackend::Neo4j && self.store.password.is_none() {
            return Err(invalid("store.password", "required for the neo4j backend"));
        }
        if self.nlq.enabled && self.nlq.provider.requires_api_key() && self.nlq.api_key.is_none() {
            return Err(invalid("nlq.api_key", "required by the configured provider"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn parse_field<T: FromStr>(field: &str, value: &str) -> ConfigResult<T> {
    value.parse().map_err(|_| ConfigError::ValidationFailed {
        field: field.to_string(),
        message: format!("cannot parse '{}'", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.retrieval.default_limit, 5);
        assert_eq!(config.retrieval.top_k, 5);
        assert!(config.embed.provider.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("HF".parse::<LLMProvider>().unwrap(), LLMProvider::HuggingFace);
        assert_eq!("openai".parse::<LLMProvider>().unwrap(), LLMProvider::OpenAI);
        assert!("anthropic".parse::<LLMProvider>().is_err());
        assert_eq!(LLMProvider::Ollama.to_string(), "ollama");
    }

    #[test]
    fn test_override_parse_errors() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides([("AEROGRAPH_TOP_K", "many")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationFailed { ref field, .. } if field == "AEROGRAPH_TOP_K"));
        config.apply_overrides([("UNRELATED", "x")]).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
