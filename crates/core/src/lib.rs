//! Core traits and types for the shopping assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Catalog entities and search filters
//! - Conversation turns and session types
//! - Image analysis types
//! - LLM request/response types
//! - Core traits for pluggable backends (LLM, vision, retrieval, catalog)
//! - Error taxonomy

pub mod conversation;
pub mod error;
pub mod image;
pub mod llm_types;
pub mod product;
pub mod traits;

pub use conversation::{ChatTurn, TurnRole};
pub use error::{Error, Result};
pub use image::{ImageAnalysis, ImageFeatures};
pub use llm_types::{
    FinishReason, GenerateRequest, GenerateResponse, Message, Role, StreamChunk,
};
pub use product::{Category, Product, ProductFilter, RetrievedDocument};
pub use traits::{CatalogProvider, LanguageModel, Retriever, VisionModel};
