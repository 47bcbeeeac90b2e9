//! Query reformulation
//!
//! Rewrites utterances that lean on conversational context ("cheaper
//! options", "in black", "show me more like that") into standalone search
//! queries before retrieval, so multi-turn refinement does not degrade
//! recall. Utterances that already stand alone pass through unchanged.
//! Reformulation is best-effort: on model failure the original utterance
//! is used and retrieval proceeds.

use std::sync::Arc;

use shop_agent_core::{ChatTurn, GenerateRequest, LanguageModel, Message, TurnRole};

/// Words that mark an utterance as depending on what came before
const CONTEXT_MARKERS: [&str; 14] = [
    "cheaper", "pricier", "more like", "similar", "another", "others", "instead", "that one",
    "those", "them", "these", "ones", "in black", "in blue",
];

/// Reformulator configuration
#[derive(Debug, Clone)]
pub struct ReformulatorConfig {
    /// How many trailing turns of history to show the model
    pub max_history_turns: usize,
    /// Utterances with at least this many words and no context marker are
    /// treated as already standalone
    pub min_standalone_words: usize,
}

impl Default for ReformulatorConfig {
    fn default() -> Self {
        Self {
            max_history_turns: 6,
            min_standalone_words: 3,
        }
    }
}

/// History-aware query rewriter
pub struct QueryReformulator {
    model: Arc<dyn LanguageModel>,
    config: ReformulatorConfig,
}

impl QueryReformulator {
    pub fn new(model: Arc<dyn LanguageModel>, config: ReformulatorConfig) -> Self {
        Self { model, config }
    }

    /// Rewrite `utterance` into a standalone search query given the
    /// session history. Returns the utterance unchanged when it already
    /// stands alone or when no history exists to resolve against.
    pub async fn reformulate(&self, history: &[ChatTurn], utterance: &str) -> String {
        if history.is_empty() || self.is_standalone(utterance) {
            return utterance.to_string();
        }

        let request = self.build_request(history, utterance);

        match self.model.generate(request).await {
            Ok(response) => {
                let rewritten = clean_query(&response.text);
                if rewritten.is_empty() {
                    tracing::warn!("Reformulator returned empty text, keeping original query");
                    return utterance.to_string();
                }
                tracing::debug!(
                    original = utterance,
                    rewritten = %rewritten,
                    "Query reformulated against history"
                );
                rewritten
            },
            Err(e) => {
                tracing::warn!(error = %e, "Reformulation failed, keeping original query");
                utterance.to_string()
            },
        }
    }

    fn is_standalone(&self, utterance: &str) -> bool {
        let lower = utterance.to_lowercase();
        if CONTEXT_MARKERS.iter().any(|m| lower.contains(m)) {
            return false;
        }
        lower.split_whitespace().count() >= self.config.min_standalone_words
    }

    fn build_request(&self, history: &[ChatTurn], utterance: &str) -> GenerateRequest {
        let recent = history
            .iter()
            .rev()
            .take(self.config.max_history_turns)
            .rev();

        let mut request = GenerateRequest::new(
            "Rewrite the user's latest message into a single standalone product \
             search query, resolving references to the conversation below. \
             Respond with the query only, no explanation, no quotes.",
        );

        for turn in recent {
            let message = match turn.role {
                TurnRole::User => Message::user(turn.content.clone()),
                TurnRole::Assistant => Message::assistant(turn.content.clone()),
            };
            request = request.with_message(message);
        }

        request
            .with_user_message(format!("Latest message: {utterance}"))
            .with_temperature(0.0)
            .with_max_tokens(64)
    }
}

/// Strip quotes and collapse the model output to one line
fn clean_query(text: &str) -> String {
    text.lines()
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}
