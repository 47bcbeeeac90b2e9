//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{endpoints, limits, llm, rag, session, vision};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub rag: RagSettings,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub vision: VisionSettings,

    /// Optional path to a vocabulary YAML overriding the built-in tables
    #[serde(default)]
    pub vocabulary_path: Option<String>,

    /// Optional path to a catalog JSON overriding the built-in products
    #[serde(default)]
    pub catalog_path: Option<String>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            max_message_len: default_max_message_len(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

/// Generation model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// OpenAI-compatible endpoint
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    /// API key; usually injected via SHOP_AGENT_LLM__API_KEY
    #[serde(default)]
    pub api_key: Option<String>,
    /// Ordered model hierarchy, cheapest/fastest first. Callers never
    /// address a model directly, only "the current model".
    #[serde(default = "default_hierarchy")]
    pub model_hierarchy: Vec<String>,
    /// Period of the hierarchy reset-to-primary timer
    #[serde(default = "default_hierarchy_reset_secs")]
    pub hierarchy_reset_secs: u64,
    /// Hard budget for one generation call
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key: None,
            model_hierarchy: default_hierarchy(),
            hierarchy_reset_secs: default_hierarchy_reset_secs(),
            generation_timeout_secs: default_generation_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagSettings {
    /// Qdrant endpoint
    #[serde(default = "default_qdrant_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Collection holding product embeddings
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Partition isolating product embeddings from other data
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Embedding dimension (must match the embedding model)
    #[serde(default = "default_vector_dim")]
    pub vector_dim: usize,
    /// Top-k for similarity search
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Maximum products surfaced per answer after dedup
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,
    /// Hard budget for one retrieval call
    #[serde(default = "default_retrieval_timeout_secs")]
    pub retrieval_timeout_secs: u64,
    /// Embedding service endpoint
    #[serde(default = "default_embeddings_endpoint")]
    pub embeddings_endpoint: String,
    /// Embedding model name
    #[serde(default = "default_embeddings_model")]
    pub embeddings_model: String,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            endpoint: default_qdrant_endpoint(),
            api_key: None,
            collection: default_collection(),
            namespace: default_namespace(),
            vector_dim: default_vector_dim(),
            top_k: default_top_k(),
            display_limit: default_display_limit(),
            retrieval_timeout_secs: default_retrieval_timeout_secs(),
            embeddings_endpoint: default_embeddings_endpoint(),
            embeddings_model: default_embeddings_model(),
        }
    }
}

/// Session memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Maximum turns kept per session; oldest evicted first
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Idle time after which a session is swept
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Interval of the background sweep task
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Vision model and image-search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionSettings {
    /// OpenAI-compatible multimodal endpoint
    #[serde(default = "default_vision_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_vision_model")]
    pub model: String,
    /// Below this, the structured analysis is retried via multiple choice
    #[serde(default = "default_structured_confidence")]
    pub structured_confidence_threshold: f32,
    /// Catalog-membership confidence gating direct-match presentation
    #[serde(default = "default_catalog_confidence")]
    pub catalog_confidence_threshold: f32,
    /// Minimum re-rank score on the top hit for a direct match
    #[serde(default = "default_min_top_score")]
    pub min_top_rerank_score: f32,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            endpoint: default_vision_endpoint(),
            api_key: None,
            model: default_vision_model(),
            structured_confidence_threshold: default_structured_confidence(),
            catalog_confidence_threshold: default_catalog_confidence(),
            min_top_rerank_score: default_min_top_score(),
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file layered with environment
    /// variables (SHOP_AGENT_ prefix, `__` as section separator).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(Environment::with_prefix("SHOP_AGENT").separator("__"))
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate invariants that serde defaults cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.model_hierarchy.is_empty() {
            return Err(ConfigError::Validation(
                "llm.model_hierarchy must contain at least one model".to_string(),
            ));
        }
        if self.rag.top_k == 0 {
            return Err(ConfigError::Validation(
                "rag.top_k must be positive".to_string(),
            ));
        }
        if self.session.max_turns == 0 {
            return Err(ConfigError::Validation(
                "session.max_turns must be positive".to_string(),
            ));
        }
        if self.environment.is_strict() && self.llm.api_key.is_none() {
            return Err(ConfigError::Validation(
                "llm.api_key is required outside development".to_string(),
            ));
        }
        Ok(())
    }
}

/// Convenience wrapper used by the server binary
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    Settings::load(path)
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_true() -> bool {
    true
}
fn default_max_message_len() -> usize {
    limits::MAX_MESSAGE_LEN
}
fn default_max_image_bytes() -> usize {
    limits::MAX_IMAGE_BYTES
}
fn default_llm_endpoint() -> String {
    endpoints::LLM_DEFAULT.to_string()
}
fn default_hierarchy() -> Vec<String> {
    llm::HIERARCHY.iter().map(|s| s.to_string()).collect()
}
fn default_hierarchy_reset_secs() -> u64 {
    llm::HIERARCHY_RESET_SECS
}
fn default_generation_timeout_secs() -> u64 {
    llm::TIMEOUT_SECS
}
fn default_max_tokens() -> u32 {
    llm::MAX_TOKENS
}
fn default_temperature() -> f32 {
    llm::TEMPERATURE
}
fn default_qdrant_endpoint() -> String {
    endpoints::QDRANT_DEFAULT.to_string()
}
fn default_collection() -> String {
    rag::COLLECTION.to_string()
}
fn default_namespace() -> String {
    rag::NAMESPACE.to_string()
}
fn default_vector_dim() -> usize {
    rag::VECTOR_DIM
}
fn default_top_k() -> usize {
    rag::TOP_K
}
fn default_display_limit() -> usize {
    rag::DISPLAY_LIMIT
}
fn default_retrieval_timeout_secs() -> u64 {
    rag::TIMEOUT_SECS
}
fn default_embeddings_endpoint() -> String {
    endpoints::EMBEDDINGS_DEFAULT.to_string()
}
fn default_embeddings_model() -> String {
    "nomic-embed-text".to_string()
}
fn default_vision_endpoint() -> String {
    endpoints::VISION_DEFAULT.to_string()
}
fn default_vision_model() -> String {
    "x-ai/grok-4-fast:free".to_string()
}
fn default_structured_confidence() -> f32 {
    vision::STRUCTURED_CONFIDENCE_THRESHOLD
}
fn default_catalog_confidence() -> f32 {
    vision::CATALOG_CONFIDENCE_THRESHOLD
}
fn default_min_top_score() -> f32 {
    vision::MIN_TOP_RERANK_SCORE
}
fn default_max_turns() -> usize {
    session::MAX_TURNS
}
fn default_idle_timeout_secs() -> u64 {
    session::IDLE_TIMEOUT_SECS
}
fn default_sweep_interval_secs() -> u64 {
    session::SWEEP_INTERVAL_SECS
}
