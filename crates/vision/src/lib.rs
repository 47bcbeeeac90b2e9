//! Image analysis and image-to-query bridge
//!
//! Turns an uploaded product photo into structured features, a derived
//! search query and a catalog-membership confidence, then re-enters the
//! text search path. Structured extraction is attempted first; a coarse
//! multiple-choice classification with keyword feature recovery backs it
//! up.

pub mod analyzer;
pub mod backend;
pub mod search;

pub use analyzer::{build_search_query, similar_product_suggestions, AnalyzerConfig, ImageAnalyzer};
pub use backend::{VisionBackend, VisionBackendConfig};
pub use search::{ImageSearchConfig, ImageSearchPipeline, ImageSearchResult};

use thiserror::Error;

/// Vision errors
#[derive(Error, Debug)]
pub enum VisionError {
    /// Structured output malformed; triggers the multiple-choice fallback
    #[error("Analysis parse error: {0}")]
    Parse(String),

    #[error("Vision API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<VisionError> for shop_agent_core::Error {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::Parse(msg) => shop_agent_core::Error::AnalysisParse(msg),
            other => shop_agent_core::Error::Vision(other.to_string()),
        }
    }
}
