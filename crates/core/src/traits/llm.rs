//! Language model trait

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;
use crate::llm_types::{GenerateRequest, GenerateResponse, StreamChunk};

/// Generation model interface
///
/// Implementations:
/// - `ChatBackend` - OpenAI-compatible chat completions over HTTP
/// - `HierarchyModel` - decorator adding model-capacity fallback
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a complete response
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Generate with streaming
    ///
    /// Returns a finite, one-shot sequence of text chunks terminated by a
    /// chunk with `is_final` set or by an error. Not restartable; consumed
    /// by a single reader per request.
    fn generate_stream(
        &self,
        request: GenerateRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send + '_>>;

    /// Check if the backend is reachable
    async fn is_available(&self) -> bool;

    /// Configured model name (the default when a request has no override)
    fn model_name(&self) -> &str;

    /// Estimate token count for budgeting context.
    ///
    /// Roughly four characters per token for English text, counted in
    /// grapheme clusters so multi-byte text is not overestimated.
    fn estimate_tokens(&self, text: &str) -> usize {
        use unicode_segmentation::UnicodeSegmentation;
        text.graphemes(true).count().max(1) / 4
    }
}
