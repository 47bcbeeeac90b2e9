//! Product retriever
//!
//! Wraps the vector store and embedding client behind the core `Retriever`
//! trait, translating `ProductFilter` into the adapter's filter syntax and
//! enforcing a hard time budget over the whole embed-then-search call.
//! The store and embedding clients are constructed once at startup and
//! shared; concurrent callers never pay initialization cost.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use shop_agent_core::{Error, ProductFilter, Result, RetrievedDocument, Retriever};

use crate::embeddings::EmbeddingClient;
use crate::vector_store::{SearchFilter, VectorStore};
use crate::RagError;

/// Retriever configuration
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Default number of results when the caller does not override `k`
    pub top_k: usize,
    /// Hard budget for one retrieval call (embedding + vector search)
    pub timeout: Duration,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        use shop_agent_config::constants::rag;
        Self {
            top_k: rag::TOP_K,
            timeout: Duration::from_secs(rag::TIMEOUT_SECS),
        }
    }
}

impl From<&shop_agent_config::RagSettings> for RetrieverConfig {
    fn from(settings: &shop_agent_config::RagSettings) -> Self {
        Self {
            top_k: settings.top_k,
            timeout: Duration::from_secs(settings.retrieval_timeout_secs),
        }
    }
}

/// Vector-backed product retriever
pub struct ProductRetriever {
    store: Arc<VectorStore>,
    embedder: Arc<EmbeddingClient>,
    config: RetrieverConfig,
}

impl ProductRetriever {
    pub fn new(
        store: Arc<VectorStore>,
        embedder: Arc<EmbeddingClient>,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }

    async fn retrieve_inner(
        &self,
        query: &str,
        filter: &ProductFilter,
        k: usize,
    ) -> std::result::Result<Vec<RetrievedDocument>, RagError> {
        let embedding = self.embedder.embed(query).await?;
        let search_filter = SearchFilter::from_product_filter(filter);
        self.store.search(&embedding, k, search_filter).await
    }
}

#[async_trait]
impl Retriever for ProductRetriever {
    async fn retrieve(
        &self,
        query: &str,
        filter: &ProductFilter,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>> {
        let k = if k == 0 { self.config.top_k } else { k };
        let budget = self.config.timeout;

        let documents = match tokio::time::timeout(budget, self.retrieve_inner(query, filter, k))
            .await
        {
            Ok(result) => result.map_err(Error::from)?,
            Err(_) => {
                tracing::warn!(
                    query = query,
                    timeout_secs = budget.as_secs(),
                    "Vector retrieval timed out"
                );
                return Err(RagError::Timeout(budget.as_secs()).into());
            },
        };

        tracing::debug!(
            query = query,
            hits = documents.len(),
            "Vector retrieval complete"
        );

        Ok(documents)
    }

    fn name(&self) -> &str {
        "product-retriever"
    }
}
