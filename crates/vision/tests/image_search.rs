//! Image search flow against mock vision and retrieval backends

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;

use shop_agent_config::FeatureVocabulary;
use shop_agent_core::{
    Category, FinishReason, GenerateRequest, GenerateResponse, LanguageModel, Product,
    ProductFilter, Result, RetrievedDocument, Retriever, StreamChunk, VisionModel,
};
use shop_agent_rag::{
    FeatureReranker, QueryReformulator, RagPipeline, RagPipelineConfig, ReformulatorConfig,
};
use shop_agent_vision::{AnalyzerConfig, ImageAnalyzer, ImageSearchConfig, ImageSearchPipeline};

/// Vision model answering the structured prompt with a fixed JSON body
struct CannedVision(&'static str);

#[async_trait]
impl VisionModel for CannedVision {
    async fn describe(
        &self,
        _image_bytes: &[u8],
        _mime_type: &str,
        _instruction: &str,
    ) -> Result<String> {
        Ok(self.0.to_string())
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}

/// Retriever returning a fixed product list, ignoring the query
struct FixedRetriever(Vec<Product>);

#[async_trait]
impl Retriever for FixedRetriever {
    async fn retrieve(
        &self,
        _query: &str,
        filter: &ProductFilter,
        _k: usize,
    ) -> Result<Vec<RetrievedDocument>> {
        Ok(self
            .0
            .iter()
            .filter(|p| filter.matches(p))
            .map(|p| RetrievedDocument::new(p.clone(), 0.5))
            .collect())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Model used only to satisfy the RAG pipeline wiring on direct-search paths
struct EchoModel;

#[async_trait]
impl LanguageModel for EchoModel {
    async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse> {
        Ok(GenerateResponse {
            text: "These look close to your photo.".to_string(),
            finish_reason: FinishReason::Stop,
            model: "echo".to_string(),
        })
    }

    fn generate_stream(
        &self,
        _request: GenerateRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send + '_>> {
        Box::pin(futures::stream::empty())
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

fn product(id: &str, name: &str, description: &str, category: Category) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category,
        price: 50.0,
        image: String::new(),
    }
}

fn pipeline(vision_json: &'static str, products: Vec<Product>) -> ImageSearchPipeline {
    let vocabulary = Arc::new(FeatureVocabulary::default());
    let retriever: Arc<dyn Retriever> = Arc::new(FixedRetriever(products));
    let model: Arc<dyn LanguageModel> = Arc::new(EchoModel);

    let rag = Arc::new(RagPipeline::new(
        retriever.clone(),
        model.clone(),
        QueryReformulator::new(model, ReformulatorConfig::default()),
        RagPipelineConfig::default(),
    ));

    let analyzer = ImageAnalyzer::new(
        Arc::new(CannedVision(vision_json)),
        vocabulary.clone(),
        AnalyzerConfig::default(),
    );

    ImageSearchPipeline::new(
        analyzer,
        rag,
        retriever,
        FeatureReranker::new(vocabulary),
        ImageSearchConfig::default(),
    )
}

#[tokio::test]
async fn test_confident_match_is_presented_directly() {
    // A black headphones photo against a catalog that stocks them
    let json = r#"{"category":"electronics","type":"headphones","colors":["black"],"confidence":0.9,"description":"black wireless headphones"}"#;
    let products = vec![
        product(
            "9",
            "Wireless Headphones",
            "black wireless headphones with noise cancellation",
            Category::Electronics,
        ),
        product("12", "Bluetooth Speaker", "portable speaker", Category::Electronics),
    ];

    let result = pipeline(json, products)
        .search(b"img", "image/jpeg", true)
        .await
        .unwrap();

    assert!(result.is_in_catalog);
    assert!(result.suggestions.is_empty());
    // Full feature match ranks the headphones first
    assert_eq!(result.products[0].product.id, "9");
    assert!(result.products[0].score > 2.0);
    assert_eq!(result.search_query, "black headphones");
}

#[tokio::test]
async fn test_low_catalog_confidence_yields_suggestions() {
    // Unknown category, type the catalog does not stock: catalog
    // confidence stays at the 0.3 base
    let json = r#"{"category":"unknown","type":"gizmo","colors":[],"confidence":0.9,"description":"a strange gizmo on a desk"}"#;
    let products = vec![product(
        "19",
        "Modern Table Lamp",
        "sleek modern table lamp",
        Category::Home,
    )];

    let result = pipeline(json, products)
        .search(b"img", "image/jpeg", true)
        .await
        .unwrap();

    assert!(!result.is_in_catalog);
    assert!(!result.suggestions.is_empty());
    // Weak top hit: nothing about the lamp matches the gizmo's features
    assert!(result.products[0].score <= 2.0);
    // The response explains the mismatch instead of echoing the answer
    assert!(result.response.unwrap().contains("exact match"));
}

#[tokio::test]
async fn test_direct_search_skips_answer_synthesis() {
    let json = r#"{"category":"electronics","type":"headphones","colors":["black"],"confidence":0.9,"description":"black wireless headphones"}"#;
    let products = vec![product(
        "9",
        "Wireless Headphones",
        "black wireless headphones",
        Category::Electronics,
    )];

    let result = pipeline(json, products)
        .search(b"img", "image/jpeg", false)
        .await
        .unwrap();

    assert!(result.response.is_none());
    assert!(!result.products.is_empty());
}
