use serde::{Deserialize, Serialize};

/// One event decoded from the chat SSE stream.
///
/// The wire format is `{"type": "token", "content": ...}`,
/// `{"type": "done"}` or `{"type": "error", "message": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// A fragment of the assistant reply.
    Token {
        /// Text to append to the reply.
        content: String,
    },

    /// The server finished the reply.
    Done,

    /// The server reported a problem.  Already-streamed text stays valid.
    Error {
        /// Human-readable error message.
        message: String,
    },
}

impl StreamEvent {
    /// Create a token event.
    pub fn token(content: impl Into<String>) -> Self {
        StreamEvent::Token {
            content: content.into(),
        }
    }

    /// Create an error event.
    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            message: message.into(),
        }
    }
}
