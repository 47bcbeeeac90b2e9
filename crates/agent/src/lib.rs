//! Conversational agent
//!
//! - `IntentRouter` - decides per message whether product search is needed
//!   and extracts structured filters from free text
//! - `SessionMemory` - bounded per-session turn history with a per-session
//!   gate and idle-sweep task
//! - `ChatAgent` - the retrieval fallback ladder: RAG, then catalog text
//!   search with a plain completion, then a fixed apology

pub mod chat;
pub mod intent;
pub mod memory;
pub mod prompts;

pub use chat::{ChatAgent, ChatAgentConfig, ChatResponse};
pub use intent::IntentRouter;
pub use memory::{Session, SessionMemory, SessionMemoryConfig};
