//! Configuration management for the shopping assistant
//!
//! Supports loading configuration from:
//! - TOML files
//! - Environment variables (SHOP_AGENT_ prefix)
//!
//! Keyword and synonym tables used for intent detection, filter extraction
//! and image feature matching live in [`vocabulary`] as swappable config
//! (YAML-loadable with compiled-in defaults) rather than inline literals.

pub mod constants;
pub mod settings;
pub mod vocabulary;

pub use settings::{
    load_settings, LlmSettings, RagSettings, RuntimeEnvironment, ServerConfig, SessionSettings,
    Settings, VisionSettings,
};
pub use vocabulary::{FeatureVocabulary, SearchVocabulary, VocabularyConfig};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

impl From<ConfigError> for shop_agent_core::Error {
    fn from(err: ConfigError) -> Self {
        shop_agent_core::Error::Config(err.to_string())
    }
}
