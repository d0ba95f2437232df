//! Slash command parsing for the chat application.
//!
//! Input starting with `/` controls the session instead of being sent to the
//! coach.

use crate::types::Universe;

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Switch to another universe.
    Universe(Universe),

    /// List the available universes.
    ListUniverses,

    /// Refresh and show the message quota.
    Usage,

    /// Show the journal entry count for the last week.
    Journal,

    /// Clear the inline error.
    Dismiss,

    /// Print the conversation log.
    History,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a message.
///
/// # Examples
///
/// ```
/// # use coach_chat::chat::{ChatCommand, parse_command};
/// # use coach_chat::Universe;
/// assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
/// assert_eq!(
///     parse_command("/universe progress"),
///     Some(ChatCommand::Universe(Universe::Progress))
/// );
/// assert!(parse_command("How was my run?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "universe" | "u" => match argument {
            Some(name) => match name.parse::<Universe>() {
                Ok(universe) => ChatCommand::Universe(universe),
                Err(_) => ChatCommand::Invalid(format!(
                    "Unknown universe '{name}' (try /universes)"
                )),
            },
            None => ChatCommand::Invalid("/universe requires a universe name".to_string()),
        },
        "universes" => ChatCommand::ListUniverses,
        "usage" => ChatCommand::Usage,
        "journal" => ChatCommand::Journal,
        "dismiss" => ChatCommand::Dismiss,
        "history" => ChatCommand::History,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /universe <name>       Switch universe (starts a fresh conversation)
  /universes             List available universes
  /usage                 Show the message quota
  /journal               Show journal entries written in the last week
  /dismiss               Clear the current error
  /history               Print the conversation so far
  /help                  Show this help message
  /quit                  Exit the chat"#
}
