//! Model-capacity fallback hierarchy
//!
//! Process-wide ordered list of model identifiers, cheapest/fastest first.
//! Callers never address a model directly, only "the current model". On a
//! capacity signal the pointer advances (saturating at the last entry); a
//! background timer resets it to the primary model on a fixed period,
//! independent of request traffic, so transient throttling self-heals.
//!
//! State machine: capacity error -> index+1 (saturating); timer fires ->
//! index 0. No other transitions.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::watch;

use shop_agent_core::{
    Error, GenerateRequest, GenerateResponse, LanguageModel, Result, StreamChunk,
};

use crate::LlmError;

/// Process-wide model hierarchy state
pub struct ModelHierarchy {
    models: Vec<String>,
    index: Mutex<usize>,
}

impl ModelHierarchy {
    /// Create from an ordered model list, cheapest/fastest first
    pub fn new(models: Vec<String>) -> std::result::Result<Self, LlmError> {
        if models.is_empty() {
            return Err(LlmError::Configuration(
                "Model hierarchy must contain at least one model".to_string(),
            ));
        }
        Ok(Self {
            models,
            index: Mutex::new(0),
        })
    }

    /// The model currently serving requests
    pub fn current(&self) -> String {
        self.models[*self.index.lock()].clone()
    }

    /// Position of the current model in the hierarchy
    pub fn index(&self) -> usize {
        *self.index.lock()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Advance to the next model after a capacity signal. Idempotent at
    /// the last entry. Returns the model now current.
    pub fn advance(&self) -> String {
        let mut index = self.index.lock();
        if *index + 1 < self.models.len() {
            *index += 1;
            tracing::warn!(
                model = %self.models[*index],
                position = *index,
                "Capacity signal: advanced model hierarchy"
            );
        }
        self.models[*index].clone()
    }

    /// Reset to the primary model
    pub fn reset(&self) {
        let mut index = self.index.lock();
        if *index != 0 {
            tracing::info!(
                from = %self.models[*index],
                to = %self.models[0],
                "Model hierarchy reset to primary"
            );
        }
        *index = 0;
    }

    /// Start the periodic reset task. Returns a shutdown sender; dropping
    /// it or sending `true` stops the task.
    pub fn start_reset_task(self: &Arc<Self>, period: Duration) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let hierarchy = Arc::clone(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; skip it so a fresh start
            // does not log a spurious reset
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        hierarchy.reset();
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Model hierarchy reset task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

/// `LanguageModel` decorator that routes every request to the hierarchy's
/// current model and retries exactly once after a capacity error.
pub struct HierarchyModel {
    inner: Arc<dyn LanguageModel>,
    hierarchy: Arc<ModelHierarchy>,
}

impl HierarchyModel {
    pub fn new(inner: Arc<dyn LanguageModel>, hierarchy: Arc<ModelHierarchy>) -> Self {
        Self { inner, hierarchy }
    }

    pub fn hierarchy(&self) -> &Arc<ModelHierarchy> {
        &self.hierarchy
    }
}

#[async_trait]
impl LanguageModel for HierarchyModel {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let mut stamped = request.clone();
        stamped.model = Some(self.hierarchy.current());

        match self.inner.generate(stamped).await {
            Err(Error::GenerationCapacity(msg)) => {
                let next = self.hierarchy.advance();
                tracing::warn!(
                    error = %msg,
                    retry_model = %next,
                    "Retrying request once after capacity error"
                );

                let mut retry = request;
                retry.model = Some(next);
                self.inner.generate(retry).await
            },
            other => other,
        }
    }

    fn generate_stream(
        &self,
        request: GenerateRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send + '_>> {
        // Streams are one-shot and not restartable, so no capacity retry
        let mut stamped = request;
        stamped.model = Some(self.hierarchy.current());
        self.inner.generate_stream(stamped)
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as SyncMutex;
    use shop_agent_core::FinishReason;

    fn hierarchy() -> Arc<ModelHierarchy> {
        Arc::new(
            ModelHierarchy::new(vec![
                "small".to_string(),
                "medium".to_string(),
                "large".to_string(),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_empty_hierarchy_rejected() {
        assert!(ModelHierarchy::new(Vec::new()).is_err());
    }

    #[test]
    fn test_advance_saturates() {
        let h = hierarchy();
        assert_eq!(h.current(), "small");
        assert_eq!(h.advance(), "medium");
        assert_eq!(h.advance(), "large");
        // Saturates at the last entry
        assert_eq!(h.advance(), "large");
        assert_eq!(h.index(), 2);
    }

    #[test]
    fn test_reset_returns_to_primary() {
        let h = hierarchy();
        h.advance();
        h.advance();
        h.reset();
        assert_eq!(h.index(), 0);
        assert_eq!(h.current(), "small");
        // Reset is idempotent
        h.reset();
        assert_eq!(h.index(), 0);
    }

    /// Records which model served each call; fails with a capacity error
    /// for the first `fail_count` calls.
    struct CapacityModel {
        fail_count: SyncMutex<usize>,
        served_by: SyncMutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for CapacityModel {
        async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
            let model = request.model.clone().unwrap_or_default();
            self.served_by.lock().push(model.clone());

            let mut remaining = self.fail_count.lock();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::GenerationCapacity("quota".to_string()));
            }

            Ok(GenerateResponse {
                text: "ok".to_string(),
                finish_reason: FinishReason::Stop,
                model,
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
            "capacity-test"
        }
    }

    #[tokio::test]
    async fn test_capacity_error_advances_and_retries_once() {
        let h = hierarchy();
        let inner = Arc::new(CapacityModel {
            fail_count: SyncMutex::new(1),
            served_by: SyncMutex::new(Vec::new()),
        });
        let model = HierarchyModel::new(inner.clone(), h.clone());

        let response = model.generate(GenerateRequest::default()).await.unwrap();
        assert_eq!(response.model, "medium");
        assert_eq!(*inner.served_by.lock(), vec!["small", "medium"]);
        assert_eq!(h.index(), 1);
    }

    #[tokio::test]
    async fn test_double_capacity_failure_propagates() {
        let h = hierarchy();
        let inner = Arc::new(CapacityModel {
            fail_count: SyncMutex::new(2),
            served_by: SyncMutex::new(Vec::new()),
        });
        let model = HierarchyModel::new(inner, h.clone());

        let result = model.generate(GenerateRequest::default()).await;
        assert!(matches!(result, Err(Error::GenerationCapacity(_))));
        // Advanced once for the single allowed retry, not twice
        assert_eq!(h.index(), 1);
    }

    #[tokio::test]
    async fn test_timeout_not_retried() {
        struct TimeoutModel;

        #[async_trait]
        impl LanguageModel for TimeoutModel {
            async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse> {
                Err(Error::GenerationTimeout(30))
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
                "timeout-test"
            }
        }

        let h = hierarchy();
        let model = HierarchyModel::new(Arc::new(TimeoutModel), h.clone());
        let result = model.generate(GenerateRequest::default()).await;

        // Timeouts pass through untouched and never advance the hierarchy
        assert!(matches!(result, Err(Error::GenerationTimeout(30))));
        assert_eq!(h.index(), 0);
    }
}
