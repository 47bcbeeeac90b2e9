//! Core traits for the shopping assistant
//!
//! All major external collaborators sit behind these traits so backends can
//! be swapped and tests can run against mocks:
//!
//! ```text
//! Generation:
//!   - LanguageModel: text generation, streaming and non-streaming
//! Vision:
//!   - VisionModel: image description for the image-to-query bridge
//! Retrieval:
//!   - Retriever: filtered top-k vector retrieval
//! Catalog:
//!   - CatalogProvider: static product set, substring fallback search
//! ```

mod catalog;
mod llm;
mod retriever;
mod vision;

pub use catalog::CatalogProvider;
pub use llm::LanguageModel;
pub use retriever::Retriever;
pub use vision::VisionModel;
