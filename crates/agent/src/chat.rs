//! Chat agent
//!
//! Per-request flow: acquire the session gate, route intent, then walk
//! the retrieval fallback ladder - RAG first, then catalog text search
//! with a plain completion, then the fixed apology. Each stage runs at
//! most once per request. Generation timeouts are never converted into
//! the apology; they propagate distinctly so the boundary can return a
//! retryable status.

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;

use shop_agent_core::{
    CatalogProvider, ChatTurn, Error, GenerateRequest, LanguageModel, Message, Product, Result,
    StreamChunk, TurnRole,
};
use shop_agent_rag::RagPipeline;

use crate::intent::IntentRouter;
use crate::memory::SessionMemory;
use crate::prompts::{APOLOGY, SYSTEM_PROMPT};

/// Chat agent configuration
#[derive(Debug, Clone)]
pub struct ChatAgentConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Result cap for the catalog text-search fallback
    pub text_search_limit: usize,
}

impl Default for ChatAgentConfig {
    fn default() -> Self {
        use shop_agent_config::constants::{limits, llm};
        Self {
            max_tokens: llm::MAX_TOKENS,
            temperature: llm::TEMPERATURE,
            text_search_limit: limits::TEXT_SEARCH_LIMIT,
        }
    }
}

/// One answered message
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub response: String,
    /// Empty when no products apply to this turn
    pub products: Vec<Product>,
    pub session_id: String,
}

/// Conversational agent orchestrating intent, retrieval and memory
pub struct ChatAgent {
    router: IntentRouter,
    memory: Arc<SessionMemory>,
    rag: Arc<RagPipeline>,
    model: Arc<dyn LanguageModel>,
    catalog: Arc<dyn CatalogProvider>,
    config: ChatAgentConfig,
}

impl ChatAgent {
    pub fn new(
        router: IntentRouter,
        memory: Arc<SessionMemory>,
        rag: Arc<RagPipeline>,
        model: Arc<dyn LanguageModel>,
        catalog: Arc<dyn CatalogProvider>,
        config: ChatAgentConfig,
    ) -> Self {
        Self {
            router,
            memory,
            rag,
            model,
            catalog,
            config,
        }
    }

    pub fn memory(&self) -> &Arc<SessionMemory> {
        &self.memory
    }

    /// Process one message within its session.
    ///
    /// The session gate is held for the whole call, so concurrent
    /// requests against the same session id serialize and turns land in
    /// gate-acquisition order. On apology paths the session history is
    /// left untouched for this turn.
    pub async fn process_message(&self, session_id: &str, message: &str) -> Result<ChatResponse> {
        let session = self.memory.get_or_create(session_id);
        let _gate = session.lock().await;

        let history = session.history();

        let result = if self.router.should_search(message) {
            self.search_ladder(message, &history).await
        } else {
            // Answer from memory; backreferences resolve against the
            // recorded [Products shown: ...] context without re-searching
            self.plain_completion(message, &history)
                .await
                .map(|text| (text, Vec::new()))
        };

        match result {
            Ok((response, products)) => {
                let max_turns = self.memory.config().max_turns;
                session.append(ChatTurn::user(message), max_turns);
                session.append(
                    ChatTurn::assistant(response.clone())
                        .with_product_ids(products.iter().map(|p| p.id.clone()).collect()),
                    max_turns,
                );

                Ok(ChatResponse {
                    response,
                    products,
                    session_id: session_id.to_string(),
                })
            },
            // Timeouts surface distinctly; the boundary returns a
            // retryable status instead of a fake answer
            Err(e) if matches!(e, Error::GenerationTimeout(_)) => Err(e),
            Err(e) => {
                tracing::error!(error = %e, "All fallback stages failed, returning apology");
                Ok(ChatResponse {
                    response: APOLOGY.to_string(),
                    products: Vec::new(),
                    session_id: session_id.to_string(),
                })
            },
        }
    }

    /// Retrieval ladder: RAG, then text search + plain completion. Each
    /// stage is attempted at most once.
    async fn search_ladder(
        &self,
        message: &str,
        history: &[ChatTurn],
    ) -> Result<(String, Vec<Product>)> {
        let filter = self.router.extract_filters(message);

        match self.rag.answer(message, history, &filter).await {
            Ok(answer) => return Ok((answer.text, answer.products)),
            // Generation timeouts are not caught as generic failures
            Err(Error::GenerationTimeout(secs)) => return Err(Error::GenerationTimeout(secs)),
            Err(e) => {
                tracing::warn!(error = %e, "RAG failed, falling back to text search");
            },
        }

        // Plain keyword search over the in-memory catalog, products fed to
        // the model as inline text rather than structured retrieval
        let mut found = self.catalog.text_search(message);
        found.truncate(self.config.text_search_limit);

        let enhanced = if found.is_empty() {
            message.to_string()
        } else {
            let listing = found
                .iter()
                .map(|p| format!("- {} (${}) - {}", p.name, p.price, p.description))
                .collect::<Vec<_>>()
                .join("\n");
            format!("{message}\n\nAvailable products that might be relevant:\n{listing}")
        };

        let text = self.plain_completion(&enhanced, history).await?;
        Ok((text, found))
    }

    /// Non-grounded completion over the session history
    async fn plain_completion(&self, message: &str, history: &[ChatTurn]) -> Result<String> {
        let request = self.build_request(message, history);
        let response = self.model.generate(request).await?;
        Ok(response.text)
    }

    /// Streaming reply for the plain-conversation path. Search messages
    /// get relevant catalog hits inlined before streaming; the stream is
    /// a finite one-shot chunk sequence.
    pub fn process_message_stream(
        &self,
        session_id: &str,
        message: &str,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send + '_>> {
        let session_id = session_id.to_string();
        let message = message.to_string();

        Box::pin(async_stream::stream! {
            let session = self.memory.get_or_create(&session_id);
            let _gate = session.lock().await;
            let history = session.history();

            let input = if self.router.should_search(&message) {
                let mut found = self.catalog.text_search(&message);
                found.truncate(self.config.text_search_limit);
                if found.is_empty() {
                    message.clone()
                } else {
                    let listing = found
                        .iter()
                        .map(|p| format!("- {} (${}) - {}", p.name, p.price, p.description))
                        .collect::<Vec<_>>()
                        .join("\n");
                    format!("{message}\n\nAvailable products that might be relevant:\n{listing}")
                }
            } else {
                message.clone()
            };

            let request = self.build_request(&input, &history);
            let mut streamed = ChatTurn::streaming_assistant();

            let mut inner = self.model.generate_stream(request);
            let mut failed = false;

            use futures::StreamExt;
            while let Some(item) = inner.next().await {
                match item {
                    Ok(chunk) => {
                        streamed.append_content(&chunk.delta);
                        let is_final = chunk.is_final;
                        yield Ok(chunk);
                        if is_final {
                            break;
                        }
                    },
                    Err(e) => {
                        failed = true;
                        yield Err(e);
                        break;
                    },
                }
            }

            if !failed {
                streamed.mark_complete();
                let max_turns = self.memory.config().max_turns;
                session.append(ChatTurn::user(message), max_turns);
                session.append(streamed, max_turns);
            }
        })
    }

    fn build_request(&self, message: &str, history: &[ChatTurn]) -> GenerateRequest {
        let mut request = GenerateRequest::new(SYSTEM_PROMPT);

        for turn in history {
            let content = self.render_turn(turn);
            let message = match turn.role {
                TurnRole::User => Message::user(content),
                TurnRole::Assistant => Message::assistant(content),
            };
            request = request.with_message(message);
        }

        request
            .with_user_message(message)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature)
    }

    /// Render a turn for the model, annotating assistant turns with the
    /// products they showed so backreferences resolve from memory
    fn render_turn(&self, turn: &ChatTurn) -> String {
        if turn.role != TurnRole::Assistant || turn.product_ids.is_empty() {
            return turn.content.clone();
        }

        let shown = turn
            .product_ids
            .iter()
            .map(|id| match self.catalog.get_by_id(id) {
                Some(p) => format!("{} (id {}, ${})", p.name, p.id, p.price),
                None => format!("id {id}"),
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!("{}\n\n[Products shown: {}]", turn.content, shown)
    }
}
