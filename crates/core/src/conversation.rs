//! Conversation turn types
//!
//! A turn appended to a session is immutable, with one exception: a turn
//! created in streaming mode accepts content appends until it is marked
//! complete. Role and referenced product ids never change after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role in a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One exchange unit in a session's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
    /// Product ids referenced by this turn (assistant turns that showed
    /// products record them here so later turns can answer from memory)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_ids: Vec<String>,
    /// Attached image reference, if the turn carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Still receiving content appends; false once complete
    #[serde(default)]
    streaming: bool,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            product_ids: Vec::new(),
            image_ref: None,
            timestamp: Utc::now(),
            streaming: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            product_ids: Vec::new(),
            image_ref: None,
            timestamp: Utc::now(),
            streaming: false,
        }
    }

    /// An assistant turn that starts empty and grows by content appends
    pub fn streaming_assistant() -> Self {
        Self {
            role: TurnRole::Assistant,
            content: String::new(),
            product_ids: Vec::new(),
            image_ref: None,
            timestamp: Utc::now(),
            streaming: true,
        }
    }

    pub fn with_product_ids(mut self, product_ids: Vec<String>) -> Self {
        self.product_ids = product_ids;
        self
    }

    pub fn with_image_ref(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Append content to a streaming turn. No-op once the turn is complete.
    pub fn append_content(&mut self, chunk: &str) {
        if self.streaming {
            self.content.push_str(chunk);
        }
    }

    /// Seal a streaming turn; further appends are ignored
    pub fn mark_complete(&mut self) {
        self.streaming = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_turn_rejects_appends() {
        let mut turn = ChatTurn::assistant("done");
        turn.append_content(" extra");
        assert_eq!(turn.content, "done");
    }

    #[test]
    fn test_streaming_turn_appends_until_complete() {
        let mut turn = ChatTurn::streaming_assistant();
        turn.append_content("Hello");
        turn.append_content(", world");
        assert!(turn.is_streaming());

        turn.mark_complete();
        turn.append_content("!");
        assert_eq!(turn.content, "Hello, world");
        assert_eq!(turn.role, TurnRole::Assistant);
    }
}
