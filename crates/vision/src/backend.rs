//! Vision model backend
//!
//! OpenAI-compatible multimodal chat client. The image travels as a
//! base64 `data:` URL content part next to the instruction text.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use shop_agent_core::{Result, VisionModel};

use crate::VisionError;

/// Vision backend configuration
#[derive(Debug, Clone)]
pub struct VisionBackendConfig {
    /// OpenAI-compatible multimodal endpoint
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for VisionBackendConfig {
    fn default() -> Self {
        use shop_agent_config::constants::endpoints;
        Self {
            endpoint: endpoints::VISION_DEFAULT.to_string(),
            api_key: None,
            model: "x-ai/grok-4-fast:free".to_string(),
            max_tokens: 2048,
            temperature: 0.3,
            timeout: Duration::from_secs(30),
        }
    }
}

impl From<&shop_agent_config::VisionSettings> for VisionBackendConfig {
    fn from(settings: &shop_agent_config::VisionSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            ..Default::default()
        }
    }
}

/// Multimodal chat backend
pub struct VisionBackend {
    client: Client,
    config: VisionBackendConfig,
}

impl VisionBackend {
    pub fn new(config: VisionBackendConfig) -> std::result::Result<Self, VisionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VisionError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    async fn invoke(&self, request: VisionRequest) -> std::result::Result<String, VisionError> {
        let mut builder = self
            .client
            .post(self.chat_url())
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(ref api_key) = self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| VisionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Api(format!("HTTP {status}: {body}")));
        }

        let body: VisionResponse = response
            .json()
            .await
            .map_err(|e| VisionError::Api(format!("Invalid response: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| VisionError::Api("No choices in response".to_string()))
    }
}

#[async_trait]
impl VisionModel for VisionBackend {
    async fn describe(
        &self,
        image_bytes: &[u8],
        mime_type: &str,
        instruction: &str,
    ) -> Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image_bytes);
        let data_url = format!("data:{mime_type};base64,{encoded}");

        let request = VisionRequest {
            model: self.config.model.clone(),
            messages: vec![VisionMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: instruction.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        };

        self.invoke(request).await.map_err(Into::into)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Multimodal API types

#[derive(Debug, Serialize)]
struct VisionRequest {
    model: String,
    messages: Vec<VisionMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct VisionMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VisionResponse {
    choices: Vec<VisionChoice>,
}

#[derive(Debug, Deserialize)]
struct VisionChoice {
    message: VisionResponseMessage,
}

#[derive(Debug, Deserialize)]
struct VisionResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = VisionRequest {
            model: "vision-model".to_string(),
            messages: vec![VisionMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: "describe".to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: "data:image/png;base64,AAAA".to_string(),
                        },
                    },
                ],
            }],
            max_tokens: Some(2048),
            temperature: Some(0.3),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"type\":\"text\""));
        assert!(json.contains("\"type\":\"image_url\""));
        assert!(json.contains("data:image/png;base64,AAAA"));
    }
}
