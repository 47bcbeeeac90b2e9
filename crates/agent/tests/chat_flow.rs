//! End-to-end agent flows against mock model and retriever backends

use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;

use shop_agent_agent::{ChatAgent, ChatAgentConfig, IntentRouter, SessionMemory, SessionMemoryConfig};
use shop_agent_catalog::Catalog;
use shop_agent_config::SearchVocabulary;
use shop_agent_core::{
    CatalogProvider, Category, Error, FinishReason, GenerateRequest, GenerateResponse,
    LanguageModel, ProductFilter, Result, RetrievedDocument, Retriever, StreamChunk,
};
use shop_agent_rag::{QueryReformulator, RagPipeline, RagPipelineConfig, ReformulatorConfig};

/// Deterministic stand-in for the generation model.
///
/// Grounded requests are answered by citing the first product in the
/// context; memory-grounded requests echo the recorded product context;
/// everything else gets a fixed line.
struct MockModel {
    fail_with: Option<fn() -> Error>,
}

impl MockModel {
    fn ok() -> Arc<Self> {
        Arc::new(Self { fail_with: None })
    }

    fn failing(f: fn() -> Error) -> Arc<Self> {
        Arc::new(Self { fail_with: Some(f) })
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        if let Some(fail) = self.fail_with {
            return Err(fail());
        }

        let system = request
            .messages
            .first()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let text = if system.contains("Product Context:") {
            // Cite the first grounded product by exact name and id
            let name = system
                .lines()
                .find_map(|l| l.strip_prefix("name: "))
                .unwrap_or("nothing");
            let id = system
                .lines()
                .find_map(|l| l.strip_prefix("id: "))
                .unwrap_or("0");
            format!("You might like the {name} [product_id: {id}].")
        } else if let Some(context) = request
            .messages
            .iter()
            .rev()
            .find_map(|m| m.content.split("[Products shown: ").nth(1))
        {
            let shown = context.trim_end_matches(']');
            format!("Earlier I showed you {shown}")
        } else {
            "Happy to help with your shopping!".to_string()
        };

        Ok(GenerateResponse {
            text,
            finish_reason: FinishReason::Stop,
            model: "mock".to_string(),
        })
    }

    fn generate_stream(
        &self,
        _request: GenerateRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send + '_>> {
        Box::pin(futures::stream::iter(vec![
            Ok(StreamChunk::text("Happy to ")),
            Ok(StreamChunk::text("help!")),
            Ok(StreamChunk::done()),
        ]))
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// Catalog-backed stand-in for the vector retriever
struct MockRetriever {
    catalog: Arc<Catalog>,
    calls: AtomicUsize,
    fail_with: Option<fn() -> Error>,
}

impl MockRetriever {
    fn ok(catalog: Arc<Catalog>) -> Arc<Self> {
        Arc::new(Self {
            catalog,
            calls: AtomicUsize::new(0),
            fail_with: None,
        })
    }

    fn failing(catalog: Arc<Catalog>, f: fn() -> Error) -> Arc<Self> {
        Arc::new(Self {
            catalog,
            calls: AtomicUsize::new(0),
            fail_with: Some(f),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn retrieve(
        &self,
        query: &str,
        filter: &ProductFilter,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(fail) = self.fail_with {
            return Err(fail());
        }

        let needle = query.to_lowercase();
        let terms: Vec<String> = needle
            .split_whitespace()
            .map(|t| t.trim_end_matches('s').to_string())
            .filter(|t| t.len() > 2)
            .collect();

        let documents = self
            .catalog
            .list_all()
            .into_iter()
            .filter(|p| filter.matches(p))
            .filter(|p| {
                let haystack = format!(
                    "{} {} {}",
                    p.name.to_lowercase(),
                    p.description.to_lowercase(),
                    p.category.as_str()
                );
                terms.iter().any(|t| haystack.contains(t.as_str()))
            })
            .take(k)
            .map(|p| RetrievedDocument::new(p, 0.9))
            .collect();

        Ok(documents)
    }

    fn name(&self) -> &str {
        "mock-retriever"
    }
}

fn build_agent(model: Arc<MockModel>, retriever: Arc<MockRetriever>) -> (ChatAgent, Arc<Catalog>) {
    let catalog = Arc::new(Catalog::builtin());
    let vocabulary = Arc::new(SearchVocabulary::default());

    let rag = Arc::new(RagPipeline::new(
        retriever,
        model.clone(),
        QueryReformulator::new(model.clone(), ReformulatorConfig::default()),
        RagPipelineConfig::default(),
    ));

    let agent = ChatAgent::new(
        IntentRouter::new(vocabulary),
        Arc::new(SessionMemory::new(SessionMemoryConfig::default())),
        rag,
        model,
        catalog.clone(),
        ChatAgentConfig::default(),
    );

    (agent, catalog)
}

#[tokio::test]
async fn test_search_message_returns_grounded_products() {
    let catalog = Arc::new(Catalog::builtin());
    let retriever = MockRetriever::ok(catalog);
    let (agent, _) = build_agent(MockModel::ok(), retriever.clone());

    let response = agent.process_message("s1", "Show me laptops").await.unwrap();

    assert!(!response.products.is_empty());
    assert!(response
        .products
        .iter()
        .all(|p| p.category == Category::Electronics));
    // The answer mentions a retrieved product's exact name
    let first = &response.products[0];
    assert!(response.response.contains(&first.name));
    assert_eq!(retriever.call_count(), 1);
}

#[tokio::test]
async fn test_category_and_price_filter_applied() {
    let catalog = Arc::new(Catalog::builtin());
    let retriever = MockRetriever::ok(catalog);
    let (agent, _) = build_agent(MockModel::ok(), retriever);

    let response = agent
        .process_message("s1", "show me clothing under $30")
        .await
        .unwrap();

    assert!(!response.products.is_empty());
    for product in &response.products {
        assert_eq!(product.category, Category::Clothing);
        assert!(product.price <= 30.0);
    }
}

#[tokio::test]
async fn test_history_reference_answers_from_memory_without_retrieval() {
    let catalog = Arc::new(Catalog::builtin());
    let retriever = MockRetriever::ok(catalog);
    let (agent, _) = build_agent(MockModel::ok(), retriever.clone());

    let first = agent
        .process_message("s1", "show me headphones")
        .await
        .unwrap();
    assert!(!first.products.is_empty());
    assert_eq!(retriever.call_count(), 1);

    let second = agent
        .process_message("s1", "what was the price of the first one")
        .await
        .unwrap();

    // No re-retrieval on the backreference turn
    assert_eq!(retriever.call_count(), 1);
    assert!(second.products.is_empty());
    // The reply references the product shown in the first turn
    assert!(second.response.contains(&first.products[0].name));
}

#[tokio::test]
async fn test_retrieval_timeout_falls_back_to_text_search() {
    let catalog = Arc::new(Catalog::builtin());
    let retriever = MockRetriever::failing(catalog, || Error::RetrievalTimeout(15));
    let (agent, _) = build_agent(MockModel::ok(), retriever);

    let response = agent.process_message("s1", "headphones").await.unwrap();

    // Still a well-formed answer, with products from the catalog scan
    assert!(!response.response.is_empty());
    assert!(response
        .products
        .iter()
        .any(|p| p.name.to_lowercase().contains("headphones")));
}

#[tokio::test]
async fn test_all_stages_failing_returns_apology_and_leaves_session_untouched() {
    let catalog = Arc::new(Catalog::builtin());
    let retriever = MockRetriever::failing(catalog, || Error::Retrieval("adapter down".into()));
    let model = MockModel::failing(|| Error::Generation("model down".into()));
    let (agent, _) = build_agent(model, retriever);

    let response = agent
        .process_message("s1", "show me headphones")
        .await
        .unwrap();

    assert_eq!(response.response, shop_agent_agent::prompts::APOLOGY);
    assert!(response.products.is_empty());
    // No partial session corruption
    assert!(agent.memory().history("s1").is_empty());
}

#[tokio::test]
async fn test_generation_timeout_propagates_distinctly() {
    let catalog = Arc::new(Catalog::builtin());
    let retriever = MockRetriever::ok(catalog);
    let model = MockModel::failing(|| Error::GenerationTimeout(30));
    let (agent, _) = build_agent(model, retriever);

    let result = agent.process_message("s1", "show me headphones").await;
    assert!(matches!(result, Err(Error::GenerationTimeout(30))));
    // Timed-out turns leave no trace in the session
    assert!(agent.memory().history("s1").is_empty());
}

#[tokio::test]
async fn test_turns_are_recorded_with_product_ids() {
    let catalog = Arc::new(Catalog::builtin());
    let retriever = MockRetriever::ok(catalog);
    let (agent, _) = build_agent(MockModel::ok(), retriever);

    agent
        .process_message("s1", "show me headphones")
        .await
        .unwrap();

    let history = agent.memory().history("s1");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "show me headphones");
    assert!(!history[1].product_ids.is_empty());
}

#[tokio::test]
async fn test_streaming_reply_records_completed_turn() {
    use futures::StreamExt;

    let catalog = Arc::new(Catalog::builtin());
    let retriever = MockRetriever::ok(catalog);
    let (agent, _) = build_agent(MockModel::ok(), retriever);

    let mut collected = String::new();
    {
        let mut stream = agent.process_message_stream("s1", "good morning");
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.unwrap();
            collected.push_str(&chunk.delta);
            if chunk.is_final {
                break;
            }
        }
    }

    assert_eq!(collected, "Happy to help!");
    let history = agent.memory().history("s1");
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].content, "Happy to help!");
    assert!(!history[1].is_streaming());
}
