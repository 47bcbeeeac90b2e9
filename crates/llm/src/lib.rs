//! Generation model integration
//!
//! - `ChatBackend` - OpenAI-compatible chat completions client with
//!   streaming and a hard per-call timeout
//! - `ModelHierarchy` - process-wide ordered fallback chain by
//!   cost/capability with a timer-driven reset to the primary model
//! - `HierarchyModel` - `LanguageModel` decorator that always addresses
//!   "the current model" and retries once after a capacity signal

pub mod backend;
pub mod hierarchy;

pub use backend::{ChatBackend, ChatBackendConfig};
pub use hierarchy::{HierarchyModel, ModelHierarchy};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    /// Quota or rate-limit signal; drives hierarchy advancement
    #[error("Capacity error: {0}")]
    Capacity(String),

    /// Call exceeded its time budget
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // The per-call budget is applied by the caller; this covers
            // the client-level timeout
            LlmError::Timeout(0)
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for shop_agent_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Capacity(msg) => shop_agent_core::Error::GenerationCapacity(msg),
            LlmError::Timeout(secs) => shop_agent_core::Error::GenerationTimeout(secs),
            other => shop_agent_core::Error::Generation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_and_timeout_stay_distinct() {
        let err: shop_agent_core::Error = LlmError::Capacity("quota".into()).into();
        assert!(matches!(
            err,
            shop_agent_core::Error::GenerationCapacity(_)
        ));

        let err: shop_agent_core::Error = LlmError::Timeout(30).into();
        assert!(matches!(err, shop_agent_core::Error::GenerationTimeout(30)));

        let err: shop_agent_core::Error = LlmError::Api("bad".into()).into();
        assert!(matches!(err, shop_agent_core::Error::Generation(_)));
    }
}
