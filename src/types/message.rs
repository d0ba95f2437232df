use serde::{Deserialize, Serialize};

/// Role of a message in the conversation log.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Text typed by the athlete.
    User,

    /// Text streamed back by the coach.
    Assistant,

    /// Synthetic greeting for the active universe.  Never sent as history.
    Intro,
}

/// One entry in the conversation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Who produced the message.
    pub role: MessageRole,

    /// The message text.
    pub content: String,
}

impl Message {
    /// Create a new `Message` with the given role and content.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a new user `Message`.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create a new assistant `Message`.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create a new intro `Message`.
    pub fn intro(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Intro, content)
    }

    /// Returns true if this is a synthetic intro message.
    pub fn is_intro(&self) -> bool {
        self.role == MessageRole::Intro
    }
}
