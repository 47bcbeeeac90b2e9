//! Centralized constants for the shopping assistant
//!
//! Single source of truth for defaults and thresholds used across the
//! codebase. Use these instead of hardcoding values in multiple files.

/// Service endpoints (defaults for local development)
pub mod endpoints {
    /// Qdrant vector store endpoint (REST API port)
    pub const QDRANT_DEFAULT: &str = "http://127.0.0.1:6333";

    /// Embedding service endpoint (Ollama-compatible)
    pub const EMBEDDINGS_DEFAULT: &str = "http://localhost:11434";

    /// Generation model endpoint (OpenAI-compatible)
    pub const LLM_DEFAULT: &str = "https://api.openai.com/v1";

    /// Vision model endpoint (OpenAI-compatible, multimodal)
    pub const VISION_DEFAULT: &str = "https://openrouter.ai/api/v1";
}

/// Retrieval defaults
pub mod rag {
    /// Vector collection holding product embeddings
    pub const COLLECTION: &str = "products";

    /// Partition isolating product embeddings from other data
    pub const NAMESPACE: &str = "catalog";

    /// Embedding dimension (must match the embedding model)
    pub const VECTOR_DIM: usize = 768;

    /// Top-k for similarity search, tuned for latency
    pub const TOP_K: usize = 4;

    /// Maximum products surfaced to the user per answer
    pub const DISPLAY_LIMIT: usize = 4;

    /// Hard budget for one retrieval call (embed + search)
    pub const TIMEOUT_SECS: u64 = 15;
}

/// Generation defaults
pub mod llm {
    /// Model hierarchy, cheapest/fastest first
    pub const HIERARCHY: [&str; 3] = ["gemini-2.0-flash-lite", "gemini-2.0-flash", "gemini-2.5-pro"];

    /// Hard budget for one generation call
    pub const TIMEOUT_SECS: u64 = 30;

    /// Period after which the hierarchy pointer returns to the primary model
    pub const HIERARCHY_RESET_SECS: u64 = 300;

    pub const MAX_TOKENS: u32 = 2048;
    pub const TEMPERATURE: f32 = 0.7;
}

/// Session memory defaults
pub mod session {
    /// Maximum turns kept per session; oldest evicted first
    pub const MAX_TURNS: usize = 20;

    /// Idle time after which a session is swept
    pub const IDLE_TIMEOUT_SECS: u64 = 3600;

    /// Interval of the background sweep task
    pub const SWEEP_INTERVAL_SECS: u64 = 300;
}

/// Vision/image-search defaults
pub mod vision {
    /// Below this, the structured analysis is retried via multiple choice
    pub const STRUCTURED_CONFIDENCE_THRESHOLD: f32 = 0.6;

    /// Confidence assigned to the multiple-choice fallback path
    pub const FALLBACK_CONFIDENCE: f32 = 0.75;

    /// Catalog-membership confidence gating direct-match presentation
    pub const CATALOG_CONFIDENCE_THRESHOLD: f32 = 0.6;

    /// Minimum re-rank score on the top hit for a direct match
    pub const MIN_TOP_RERANK_SCORE: f32 = 2.0;

    /// Maximum "you might also like" suggestions
    pub const MAX_SUGGESTIONS: usize = 3;
}

/// HTTP boundary limits
pub mod limits {
    /// Maximum chat message length in characters
    pub const MAX_MESSAGE_LEN: usize = 1000;

    /// Maximum uploaded image size in bytes (4 MiB)
    pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

    /// Accepted image MIME types
    pub const ALLOWED_IMAGE_MIME: [&str; 4] =
        ["image/jpeg", "image/jpg", "image/png", "image/webp"];

    /// Result cap for the catalog text-search fallback
    pub const TEXT_SEARCH_LIMIT: usize = 6;
}
