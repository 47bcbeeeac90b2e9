//! Application state
//!
//! One process-scoped context object wired at startup. The vector store,
//! embedding client and model backends are constructed once here and
//! shared; request handlers only ever clone `Arc`s.

use std::sync::Arc;
use std::time::Duration;

use shop_agent_agent::{
    ChatAgent, ChatAgentConfig, IntentRouter, SessionMemory, SessionMemoryConfig,
};
use shop_agent_catalog::Catalog;
use shop_agent_config::{Settings, VocabularyConfig};
use shop_agent_core::{LanguageModel, Retriever};
use shop_agent_llm::{ChatBackend, ChatBackendConfig, HierarchyModel, ModelHierarchy};
use shop_agent_rag::{
    EmbeddingClient, EmbeddingConfig, FeatureReranker, ProductRetriever, QueryReformulator,
    RagPipeline, RagPipelineConfig, ReformulatorConfig, RetrieverConfig, VectorStore,
    VectorStoreConfig,
};
use shop_agent_vision::{
    AnalyzerConfig, ImageAnalyzer, ImageSearchConfig, ImageSearchPipeline, VisionBackend,
    VisionBackendConfig,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub catalog: Arc<Catalog>,
    pub agent: Arc<ChatAgent>,
    pub image_search: Arc<ImageSearchPipeline>,
    pub rag: Arc<RagPipeline>,
    pub retriever: Arc<dyn Retriever>,
    pub memory: Arc<SessionMemory>,
    pub hierarchy: Arc<ModelHierarchy>,
}

impl AppState {
    /// Wire the full component graph from settings
    pub fn build(settings: Settings) -> anyhow::Result<Self> {
        let settings = Arc::new(settings);

        let catalog = match settings.catalog_path.as_deref() {
            Some(path) => Arc::new(Catalog::load(path)?),
            None => Arc::new(Catalog::builtin()),
        };
        tracing::info!(products = catalog.len(), "Catalog loaded");

        let vocabulary = match settings.vocabulary_path.as_deref() {
            Some(path) => VocabularyConfig::load(path)?,
            None => VocabularyConfig::default(),
        };
        let search_vocabulary = Arc::new(vocabulary.search);
        let feature_vocabulary = Arc::new(vocabulary.features);

        // Process-wide singletons: one store, one embedder, one backend
        let store = Arc::new(VectorStore::new(VectorStoreConfig::from(&settings.rag))?);
        let embedder = Arc::new(EmbeddingClient::new(EmbeddingConfig::from(&settings.rag))?);
        let retriever: Arc<dyn Retriever> = Arc::new(ProductRetriever::new(
            store,
            embedder,
            RetrieverConfig::from(&settings.rag),
        ));

        let hierarchy = Arc::new(ModelHierarchy::new(settings.llm.model_hierarchy.clone())?);
        let backend = Arc::new(ChatBackend::new(ChatBackendConfig::from(&settings.llm))?);
        let model: Arc<dyn LanguageModel> =
            Arc::new(HierarchyModel::new(backend, hierarchy.clone()));

        let rag = Arc::new(RagPipeline::new(
            retriever.clone(),
            model.clone(),
            QueryReformulator::new(model.clone(), ReformulatorConfig::default()),
            RagPipelineConfig {
                top_k: settings.rag.top_k,
                display_limit: settings.rag.display_limit,
                max_tokens: settings.llm.max_tokens,
                temperature: settings.llm.temperature,
            },
        ));

        let memory = Arc::new(SessionMemory::new(SessionMemoryConfig::from(
            &settings.session,
        )));

        let agent = Arc::new(ChatAgent::new(
            IntentRouter::new(search_vocabulary),
            memory.clone(),
            rag.clone(),
            model,
            catalog.clone(),
            ChatAgentConfig {
                max_tokens: settings.llm.max_tokens,
                temperature: settings.llm.temperature,
                ..Default::default()
            },
        ));

        let vision_backend = Arc::new(VisionBackend::new(VisionBackendConfig::from(
            &settings.vision,
        ))?);
        let analyzer = ImageAnalyzer::new(
            vision_backend,
            feature_vocabulary.clone(),
            AnalyzerConfig {
                structured_confidence_threshold: settings.vision.structured_confidence_threshold,
                ..Default::default()
            },
        );
        let image_search = Arc::new(ImageSearchPipeline::new(
            analyzer,
            rag.clone(),
            retriever.clone(),
            FeatureReranker::new(feature_vocabulary),
            ImageSearchConfig::from(&settings.vision),
        ));

        Ok(Self {
            settings,
            catalog,
            agent,
            image_search,
            rag,
            retriever,
            memory,
            hierarchy,
        })
    }

    /// Spawn the background tasks: session sweep and hierarchy reset.
    /// Returns the shutdown senders, dropped on process exit.
    pub fn start_background_tasks(
        &self,
    ) -> (
        tokio::sync::watch::Sender<bool>,
        tokio::sync::watch::Sender<bool>,
    ) {
        let sweep = self.memory.start_sweep_task();
        let reset = self
            .hierarchy
            .start_reset_task(Duration::from_secs(self.settings.llm.hierarchy_reset_secs));
        (sweep, reset)
    }
}
