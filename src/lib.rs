// Public modules
pub mod backend;
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod render;
pub mod sse;
pub mod types;

// Re-exports
pub use backend::{ChatBackend, EventStream};
pub use chat::{SessionConfig, SessionController, SessionPhase, SessionSnapshot, TurnOutcome};
pub use client::CoachClient;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{NullRenderer, PlainTextRenderer, Renderer};
pub use types::*;
