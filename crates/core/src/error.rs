//! Shared error taxonomy
//!
//! Timeout and capacity variants stay distinct end to end so the fallback
//! ladder and the HTTP boundary can react to them differently from generic
//! failures.

use thiserror::Error;

/// Errors shared across all crates
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing input, rejected at the boundary
    #[error("Validation error: {0}")]
    Validation(String),

    /// Vector search exceeded its time budget
    #[error("Retrieval timed out after {0} seconds")]
    RetrievalTimeout(u64),

    /// Vector adapter or embedding failure
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Generation call exceeded its time budget; retryable by the caller
    #[error("Generation timed out after {0} seconds")]
    GenerationTimeout(u64),

    /// Quota or rate-limit signal from the generation model
    #[error("Generation capacity error: {0}")]
    GenerationCapacity(String),

    /// Other generation model failure
    #[error("Generation error: {0}")]
    Generation(String),

    /// Structured image analysis output could not be parsed
    #[error("Analysis parse error: {0}")]
    AnalysisParse(String),

    /// Vision model failure
    #[error("Vision error: {0}")]
    Vision(String),

    /// Session store failure
    #[error("Session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors the retrieval fallback ladder recovers from locally
    pub fn is_retrieval_failure(&self) -> bool {
        matches!(self, Error::RetrievalTimeout(_) | Error::Retrieval(_))
    }

    /// True for timeouts that must surface distinctly as retryable
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::RetrievalTimeout(_) | Error::GenerationTimeout(_)
        )
    }
}

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        assert!(Error::GenerationTimeout(30).is_timeout());
        assert!(Error::RetrievalTimeout(15).is_timeout());
        assert!(!Error::Generation("boom".into()).is_timeout());
    }

    #[test]
    fn test_retrieval_failure_classification() {
        assert!(Error::RetrievalTimeout(15).is_retrieval_failure());
        assert!(Error::Retrieval("adapter down".into()).is_retrieval_failure());
        assert!(!Error::GenerationTimeout(30).is_retrieval_failure());
    }
}
