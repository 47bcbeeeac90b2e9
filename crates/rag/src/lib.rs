//! Retrieval-augmented generation
//!
//! Features:
//! - Dense vector search via Qdrant with structured filters
//! - HTTP embedding client
//! - Hard-timeout retriever implementing the core Retriever trait
//! - History-aware query reformulation
//! - Grounded answer synthesis with exact-id citation
//! - Deterministic feature-based re-ranking

pub mod embeddings;
pub mod pipeline;
pub mod reformulate;
pub mod reranker;
pub mod retriever;
pub mod vector_store;

pub use embeddings::{EmbeddingClient, EmbeddingConfig};
pub use pipeline::{RagAnswer, RagPipeline, RagPipelineConfig};
pub use reformulate::{QueryReformulator, ReformulatorConfig};
pub use reranker::{FeatureReranker, ScoredProduct};
pub use retriever::{ProductRetriever, RetrieverConfig};
pub use vector_store::{SearchFilter, VectorStore, VectorStoreConfig};

use thiserror::Error;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Retrieval timed out after {0} seconds")]
    Timeout(u64),

    #[error("Connection error: {0}")]
    Connection(String),
}

impl From<RagError> for shop_agent_core::Error {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Timeout(secs) => shop_agent_core::Error::RetrievalTimeout(secs),
            other => shop_agent_core::Error::Retrieval(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_maps_to_distinct_variant() {
        let err: shop_agent_core::Error = RagError::Timeout(15).into();
        assert!(matches!(
            err,
            shop_agent_core::Error::RetrievalTimeout(15)
        ));

        let err: shop_agent_core::Error = RagError::Search("down".into()).into();
        assert!(matches!(err, shop_agent_core::Error::Retrieval(_)));
    }
}
