use serde::{Deserialize, Serialize};

/// Body of `GET /api/chat/intro/{universe}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntroResponse {
    /// Greeting shown at the head of a fresh conversation.
    pub intro: String,
}

/// Body of `GET /api/journal-entries-count`.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalEntriesCount {
    /// Journal entries written in the last seven days.
    pub count_last_week: u32,
}
