// Public modules
pub mod chat_request;
pub mod intro;
pub mod message;
pub mod stream_event;
pub mod universe;
pub mod usage_snapshot;

// Re-exports
pub use chat_request::{ChatRequest, HistoryEntry};
pub use intro::{IntroResponse, JournalEntriesCount};
pub use message::{Message, MessageRole};
pub use stream_event::StreamEvent;
pub use universe::Universe;
pub use usage_snapshot::UsageSnapshot;
