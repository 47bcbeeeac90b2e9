//! OpenAI-compatible chat backend
//!
//! Non-streaming generation races against a hard timer; on expiry the call
//! is abandoned from the caller's perspective and a distinct timeout error
//! propagates. HTTP 429 and quota wording classify as capacity errors so
//! the model hierarchy can react; everything else stays a plain API or
//! network failure.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use shop_agent_core::{
    Error, FinishReason, GenerateRequest, GenerateResponse, LanguageModel, Message, Result,
    StreamChunk,
};

use crate::LlmError;

/// Chat backend configuration
#[derive(Debug, Clone)]
pub struct ChatBackendConfig {
    /// OpenAI-compatible endpoint
    pub endpoint: String,
    /// API key
    pub api_key: Option<String>,
    /// Default model when a request carries no override
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Hard budget for one generation call
    pub timeout: Duration,
}

impl Default for ChatBackendConfig {
    fn default() -> Self {
        use shop_agent_config::constants::{endpoints, llm};
        Self {
            endpoint: endpoints::LLM_DEFAULT.to_string(),
            api_key: None,
            model: llm::HIERARCHY[0].to_string(),
            max_tokens: llm::MAX_TOKENS,
            temperature: llm::TEMPERATURE,
            timeout: Duration::from_secs(llm::TIMEOUT_SECS),
        }
    }
}

impl From<&shop_agent_config::LlmSettings> for ChatBackendConfig {
    fn from(settings: &shop_agent_config::LlmSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            model: settings
                .model_hierarchy
                .first()
                .cloned()
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.generation_timeout_secs),
        }
    }
}

/// OpenAI-compatible chat completions backend
pub struct ChatBackend {
    client: Client,
    config: ChatBackendConfig,
}

impl ChatBackend {
    pub fn new(config: ChatBackendConfig) -> std::result::Result<Self, LlmError> {
        // Client timeout covers streaming bodies too; the explicit race in
        // generate() is what produces the distinct per-call timeout error
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::HeaderValue;

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(ref api_key) = self.config.api_key {
            let auth_value = format!("Bearer {api_key}");
            if let Ok(val) = HeaderValue::from_str(&auth_value) {
                headers.insert(reqwest::header::AUTHORIZATION, val);
            }
        }
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers
    }

    fn build_request(&self, request: &GenerateRequest, stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages: request.messages.iter().map(ApiMessage::from).collect(),
            max_tokens: Some(request.max_tokens.unwrap_or(self.config.max_tokens)),
            temperature: Some(request.temperature.unwrap_or(self.config.temperature)),
            stream: Some(stream),
        }
    }

    /// Classify an error response by status and body wording
    fn classify_status(status: reqwest::StatusCode, body: String) -> LlmError {
        let lower = body.to_lowercase();
        if status.as_u16() == 429
            || lower.contains("rate limit")
            || lower.contains("quota")
            || lower.contains("overloaded")
        {
            LlmError::Capacity(format!("HTTP {status}: {body}"))
        } else if status.is_server_error() {
            LlmError::Network(format!("HTTP {status}: {body}"))
        } else {
            LlmError::Api(format!("HTTP {status}: {body}"))
        }
    }

    async fn execute(
        &self,
        request: ChatCompletionRequest,
    ) -> std::result::Result<GenerateResponse, LlmError> {
        let model = request.model.clone();

        let response = self
            .client
            .post(self.chat_url())
            .headers(self.build_headers())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, body));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        Ok(GenerateResponse {
            text: choice.message.content,
            finish_reason: match choice.finish_reason.as_deref() {
                Some("length") => FinishReason::Length,
                _ => FinishReason::Stop,
            },
            model,
        })
    }

    /// Stream tokens into the channel; returns once the stream finishes
    async fn execute_stream(
        &self,
        request: ChatCompletionRequest,
        tx: mpsc::Sender<String>,
    ) -> std::result::Result<(), LlmError> {
        let response = self
            .client
            .post(self.chat_url())
            .headers(self.build_headers())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, body));
        }

        use futures::StreamExt;
        let mut stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| LlmError::Network(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            // Process complete SSE lines
            while let Some(line_end) = buffer.find('\n') {
                let line = buffer[..line_end].trim().to_string();
                buffer = buffer[line_end + 1..].to_string();

                if line.is_empty() || line == "data: [DONE]" {
                    continue;
                }

                if let Some(json_str) = line.strip_prefix("data: ") {
                    if let Ok(chunk) = serde_json::from_str::<StreamChunkResponse>(json_str) {
                        if let Some(choice) = chunk.choices.first() {
                            if let Some(ref delta) = choice.delta {
                                if let Some(ref content) = delta.content {
                                    if tx.send(content.clone()).await.is_err() {
                                        // Reader gone, generation cancelled
                                        return Ok(());
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl LanguageModel for ChatBackend {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let api_request = self.build_request(&request, false);
        let budget = self.config.timeout;

        // Race against the timer; on expiry the in-flight call is
        // abandoned and its eventual result discarded
        match tokio::time::timeout(budget, self.execute(api_request)).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => {
                tracing::warn!(
                    timeout_secs = budget.as_secs(),
                    "Generation call timed out"
                );
                Err(LlmError::Timeout(budget.as_secs()).into())
            },
        }
    }

    fn generate_stream(
        &self,
        request: GenerateRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send + '_>> {
        let api_request = self.build_request(&request, true);

        Box::pin(async_stream::stream! {
            let (tx, mut rx) = mpsc::channel::<String>(64);

            let stream_task = self.execute_stream(api_request, tx);
            tokio::pin!(stream_task);

            let mut task_done = false;
            loop {
                tokio::select! {
                    chunk = rx.recv() => {
                        match chunk {
                            Some(text) => yield Ok(StreamChunk::text(text)),
                            None => break,
                        }
                    }
                    result = &mut stream_task, if !task_done => {
                        task_done = true;
                        if let Err(e) = result {
                            yield Err(Error::from(e));
                            return;
                        }
                    }
                }
            }

            yield Ok(StreamChunk::done());
        })
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/models", self.config.endpoint.trim_end_matches('/'));
        self.client
            .get(&url)
            .headers(self.build_headers())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

impl From<&Message> for ApiMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ApiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunkResponse {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}
