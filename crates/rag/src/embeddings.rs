//! Embedding service client
//!
//! Turns text into dense vectors via an external HTTP service with an
//! Ollama-compatible embeddings API. The client wraps a shared
//! `reqwest::Client`, so one instance is created at startup and reused by
//! every request.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::RagError;

/// Embedding client configuration
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Service endpoint
    pub endpoint: String,
    /// Embedding model name
    pub model: String,
    /// Expected vector dimension; responses of any other length are
    /// rejected before they can corrupt the index
    pub vector_dim: usize,
    /// Request timeout (the retriever applies its own overall budget on
    /// top of this)
    pub timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        use shop_agent_config::constants::{endpoints, rag};
        Self {
            endpoint: endpoints::EMBEDDINGS_DEFAULT.to_string(),
            model: "nomic-embed-text".to_string(),
            vector_dim: rag::VECTOR_DIM,
            timeout: Duration::from_secs(10),
        }
    }
}

impl From<&shop_agent_config::RagSettings> for EmbeddingConfig {
    fn from(settings: &shop_agent_config::RagSettings) -> Self {
        Self {
            endpoint: settings.embeddings_endpoint.clone(),
            model: settings.embeddings_model.clone(),
            vector_dim: settings.vector_dim,
            timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP embedding client
pub struct EmbeddingClient {
    client: Client,
    config: EmbeddingConfig,
}

impl EmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::Connection(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Embed one text into a dense vector
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let request = EmbeddingRequest {
            model: self.config.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(format!(
                "{}/api/embeddings",
                self.config.endpoint.trim_end_matches('/')
            ))
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Embedding(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!("HTTP {status}: {body}")));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("Invalid response: {e}")))?;

        if body.embedding.len() != self.config.vector_dim {
            return Err(RagError::Embedding(format!(
                "Expected {} dimensions, got {}",
                self.config.vector_dim,
                body.embedding.len()
            )));
        }

        Ok(body.embedding)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.vector_dim, 768);
    }

    #[test]
    fn test_request_serialization() {
        let request = EmbeddingRequest {
            model: "nomic-embed-text".to_string(),
            prompt: "red running shoes".to_string(),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("nomic-embed-text"));
        assert!(json.contains("red running shoes"));
    }
}
