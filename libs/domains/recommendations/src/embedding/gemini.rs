//! Gemini embedding provider
//!
//! Calls the Generative Language API `embedContent` endpoint with an API key.

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_required};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::error::{RecommendationError, RecommendationResult};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "text-embedding-004";

/// Gemini provider configuration
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Endpoint without the key query parameter
    fn endpoint_url(&self) -> String {
        format!(
            "{}/models/{}:embedContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl FromEnv for GeminiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env_required("GEMINI_API_KEY")?,
            base_url: env_or_default("GEMINI_BASE_URL", DEFAULT_BASE_URL),
            model: env_or_default("GEMINI_EMBEDDING_MODEL", DEFAULT_MODEL),
        })
    }
}

// Keep the key out of logs
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Gemini embeddings provider
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> RecommendationResult<Self> {
        Ok(Self::new(GeminiConfig::from_env()?))
    }
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> EmbedContentRequest<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            content: Content {
                parts: vec![Part { text }],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

impl EmbedContentResponse {
    fn into_values(self) -> RecommendationResult<Vec<f32>> {
        if self.embedding.values.is_empty() {
            return Err(RecommendationError::Embedding(
                "empty embedding returned".to_string(),
            ));
        }
        Ok(self.embedding.values)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn embed(&self, text: &str) -> RecommendationResult<Vec<f32>> {
        let response = self
            .client
            .post(self.config.endpoint_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&EmbedContentRequest::new(text))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RecommendationError::Embedding(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let body: EmbedContentResponse = response.json().await?;
        let values = body.into_values()?;

        tracing::debug!(model = %self.config.model, dimension = values.len(), "Generated embedding");
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(EmbedContentRequest::new("Desk lamp\nWarm light")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"content": {"parts": [{"text": "Desk lamp\nWarm light"}]}})
        );
    }

    #[test]
    fn test_response_values_extracted() {
        let body: EmbedContentResponse =
            serde_json::from_str(r#"{"embedding": {"values": [0.25, -0.5]}}"#).unwrap();
        assert_eq!(body.into_values().unwrap(), vec![0.25, -0.5]);
    }

    #[test]
    fn test_empty_response_is_an_error() {
        let body: EmbedContentResponse = serde_json::from_str(r#"{"embedding": {}}"#).unwrap();
        assert!(matches!(
            body.into_values(),
            Err(RecommendationError::Embedding(msg)) if msg.contains("empty")
        ));
    }

    #[test]
    fn test_endpoint_url() {
        let config = GeminiConfig::new("k").with_base_url("http://localhost:8080/v1beta/");
        assert_eq!(
            config.endpoint_url(),
            "http://localhost:8080/v1beta/models/text-embedding-004:embedContent"
        );
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("GEMINI_API_KEY", Some("secret")),
                ("GEMINI_BASE_URL", None),
                ("GEMINI_EMBEDDING_MODEL", Some("gemini-embedding-001")),
            ],
            || {
                let config = GeminiConfig::from_env().unwrap();
                assert_eq!(config.api_key, "secret");
                assert_eq!(config.base_url, DEFAULT_BASE_URL);
                assert_eq!(config.model, "gemini-embedding-001");
                assert!(!format!("{:?}", config).contains("secret"));
            },
        );
    }

    #[test]
    fn test_config_requires_api_key() {
        temp_env::with_var_unset("GEMINI_API_KEY", || {
            assert!(matches!(
                GeminiConfig::from_env(),
                Err(ConfigError::MissingEnvVar(key)) if key == "GEMINI_API_KEY"
            ));
        });
    }
}
