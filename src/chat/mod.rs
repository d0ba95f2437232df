//! Chat session module for streaming conversations with the coach.
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and session configuration
//! - [`conversation`]: the ordered message log and stable message handles
//! - [`session`]: the session controller driving request/stream cycles
//! - [`commands`]: slash command parsing for the REPL

mod commands;
mod config;
mod conversation;
mod session;

pub use crate::render::{NullRenderer, PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, SessionConfig};
pub use conversation::{ConversationLog, MessageHandle};
pub use session::{SessionController, SessionPhase, SessionSnapshot, TurnOutcome};
