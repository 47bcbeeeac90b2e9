//! Retrieval trait for the RAG pipeline

use async_trait::async_trait;

use crate::error::Result;
use crate::product::{ProductFilter, RetrievedDocument};

/// Filtered top-k vector retrieval
///
/// Implementations must enforce their own hard time budget and surface
/// expiry as `Error::RetrievalTimeout` so the fallback ladder can treat it
/// distinctly from adapter failures.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve up to `k` documents for the query, most similar first
    async fn retrieve(
        &self,
        query: &str,
        filter: &ProductFilter,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>>;

    /// Retriever name for logging
    fn name(&self) -> &str;
}
