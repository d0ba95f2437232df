use serde::{Deserialize, Serialize};

use crate::types::{Message, MessageRole, Universe};

/// A prior exchange sent as context with a chat request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    /// `user` or `assistant`.
    pub role: MessageRole,

    /// The message text.
    pub content: String,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// Server-side context for the reply.  Sent as `topic`.
    #[serde(rename = "topic")]
    pub universe: Universe,

    /// The message being sent.
    pub message: String,

    /// Earlier messages, oldest first.  Never contains intro entries or the
    /// message being sent.
    pub conversation: Vec<HistoryEntry>,
}

impl ChatRequest {
    /// Build a request from the log as it stood before `message` was appended.
    ///
    /// Intro entries are dropped.  When `limit` is set only the most recent
    /// `limit` entries are kept.
    pub fn new(
        universe: Universe,
        message: impl Into<String>,
        prior: &[Message],
        limit: Option<usize>,
    ) -> Self {
        let mut conversation: Vec<HistoryEntry> = prior
            .iter()
            .filter(|m| !m.is_intro())
            .map(HistoryEntry::from)
            .collect();
        if let Some(limit) = limit
            && conversation.len() > limit
        {
            conversation.drain(..conversation.len() - limit);
        }
        Self {
            universe,
            message: message.into(),
            conversation,
        }
    }
}
