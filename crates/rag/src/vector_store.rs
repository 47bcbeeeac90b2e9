//! Vector store using Qdrant
//!
//! Dense vector storage and similarity search over product embeddings.
//! Product points live in a dedicated collection and carry a namespace
//! payload key, keeping them partitioned from any other data in the same
//! Qdrant instance. Payloads are projected into the narrow
//! `RetrievedDocument` shape at this boundary; nothing downstream sees
//! Qdrant types.

use qdrant_client::{
    qdrant::{
        condition::ConditionOneOf, value::Kind, Condition, CreateCollectionBuilder, Distance,
        FieldCondition, Filter, Match, PointStruct, Range, SearchPointsBuilder,
        UpsertPointsBuilder, Value, VectorParamsBuilder,
    },
    Qdrant,
};
use std::collections::HashMap;

use shop_agent_core::{Category, Product, ProductFilter, RetrievedDocument};

use crate::RagError;

/// Vector store configuration
#[derive(Debug, Clone)]
pub struct VectorStoreConfig {
    /// Qdrant endpoint
    pub endpoint: String,
    /// Collection name
    pub collection: String,
    /// Namespace payload value partitioning product points
    pub namespace: String,
    /// Vector dimension
    pub vector_dim: usize,
    /// API key (optional)
    pub api_key: Option<String>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        use shop_agent_config::constants::{endpoints, rag};
        Self {
            endpoint: endpoints::QDRANT_DEFAULT.to_string(),
            collection: rag::COLLECTION.to_string(),
            namespace: rag::NAMESPACE.to_string(),
            vector_dim: rag::VECTOR_DIM,
            api_key: None,
        }
    }
}

impl From<&shop_agent_config::RagSettings> for VectorStoreConfig {
    fn from(settings: &shop_agent_config::RagSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            collection: settings.collection.clone(),
            namespace: settings.namespace.clone(),
            vector_dim: settings.vector_dim,
            api_key: settings.api_key.clone(),
        }
    }
}

/// Structured filter in the adapter's native terms: equality on category,
/// inclusive range on price, always scoped to the configured namespace.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub category: Option<Category>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl SearchFilter {
    pub fn from_product_filter(filter: &ProductFilter) -> Option<Self> {
        if filter.is_empty() {
            return None;
        }
        Some(Self {
            category: filter.category,
            min_price: filter.min_price,
            max_price: filter.max_price,
        })
    }

    fn into_conditions(self) -> Vec<Condition> {
        let mut conditions = Vec::new();

        if let Some(category) = self.category {
            conditions.push(keyword_condition("category", category.as_str()));
        }

        if self.min_price.is_some() || self.max_price.is_some() {
            conditions.push(Condition {
                condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
                    key: "price".to_string(),
                    range: Some(Range {
                        gte: self.min_price,
                        lte: self.max_price,
                        ..Default::default()
                    }),
                    ..Default::default()
                })),
            });
        }

        conditions
    }
}

fn keyword_condition(key: &str, value: &str) -> Condition {
    Condition {
        condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
            key: key.to_string(),
            r#match: Some(Match {
                match_value: Some(qdrant_client::qdrant::r#match::MatchValue::Keyword(
                    value.to_string(),
                )),
            }),
            ..Default::default()
        })),
    }
}

/// Vector store client
pub struct VectorStore {
    client: Qdrant,
    config: VectorStoreConfig,
}

impl VectorStore {
    /// Create a new vector store connection
    pub fn new(config: VectorStoreConfig) -> Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&config.endpoint);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| RagError::Connection(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create collection if not exists
    pub async fn ensure_collection(&self) -> Result<(), RagError> {
        let exists = self
            .client
            .collection_exists(&self.config.collection)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.config.collection).vectors_config(
                        VectorParamsBuilder::new(self.config.vector_dim as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| RagError::VectorStore(e.to_string()))?;

            tracing::info!(
                collection = %self.config.collection,
                dim = self.config.vector_dim,
                "Created vector collection"
            );
        }

        Ok(())
    }

    /// Insert products with their embeddings
    pub async fn upsert(
        &self,
        products: &[Product],
        embeddings: &[Vec<f32>],
    ) -> Result<(), RagError> {
        if products.len() != embeddings.len() {
            return Err(RagError::VectorStore(
                "Product and embedding count mismatch".to_string(),
            ));
        }

        let points: Vec<PointStruct> = products
            .iter()
            .zip(embeddings.iter())
            .enumerate()
            .map(|(seq, (product, embedding))| {
                let mut payload: HashMap<String, Value> = HashMap::new();
                payload.insert("namespace".to_string(), self.config.namespace.clone().into());
                payload.insert("id".to_string(), product.id.clone().into());
                payload.insert("name".to_string(), product.name.clone().into());
                payload.insert(
                    "description".to_string(),
                    product.description.clone().into(),
                );
                payload.insert(
                    "category".to_string(),
                    product.category.as_str().to_string().into(),
                );
                payload.insert("price".to_string(), product.price.into());
                payload.insert("image".to_string(), product.image.clone().into());

                PointStruct::new(seq as u64, embedding.clone(), payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.config.collection, points))
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        Ok(())
    }

    /// Similarity search, optionally constrained by a structured filter
    pub async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filter: Option<SearchFilter>,
    ) -> Result<Vec<RetrievedDocument>, RagError> {
        // Namespace scoping always applies, on top of any caller filter
        let mut conditions = vec![keyword_condition("namespace", &self.config.namespace)];
        if let Some(filter) = filter {
            conditions.extend(filter.into_conditions());
        }

        let search = SearchPointsBuilder::new(
            &self.config.collection,
            query_embedding.to_vec(),
            top_k as u64,
        )
        .filter(Filter {
            must: conditions,
            ..Default::default()
        })
        .with_payload(true);

        let results = self
            .client
            .search_points(search)
            .await
            .map_err(|e| RagError::Search(e.to_string()))?;

        let documents = results
            .result
            .into_iter()
            .filter_map(|point| {
                let score = point.score;
                match project_payload(point.payload) {
                    Some(product) => Some(RetrievedDocument::new(product, score)),
                    None => {
                        tracing::warn!("Dropping vector hit with malformed payload");
                        None
                    },
                }
            })
            .collect();

        Ok(documents)
    }
}

/// Project a Qdrant payload into the narrow product shape. Hits missing a
/// required field are dropped rather than guessed at.
fn project_payload(payload: HashMap<String, Value>) -> Option<Product> {
    let get_str = |key: &str| -> Option<String> {
        match payload.get(key)?.kind.as_ref()? {
            Kind::StringValue(s) => Some(s.clone()),
            _ => None,
        }
    };
    let get_f64 = |key: &str| -> Option<f64> {
        match payload.get(key)?.kind.as_ref()? {
            Kind::DoubleValue(v) => Some(*v),
            Kind::IntegerValue(v) => Some(*v as f64),
            _ => None,
        }
    };

    Some(Product {
        id: get_str("id")?,
        name: get_str("name")?,
        description: get_str("description").unwrap_or_default(),
        category: Category::parse(&get_str("category")?)?,
        price: get_f64("price")?,
        image: get_str("image").unwrap_or_default(),
    })
}
