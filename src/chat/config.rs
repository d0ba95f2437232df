//! Configuration types for the chat session.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! [`SessionConfig`] that drives a [`SessionController`](super::SessionController).

use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::Error;
use crate::types::Universe;

/// Command-line arguments for the coach-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the coaching API.
    #[arrrg(
        optional,
        "API base URL (default: $COACH_CHAT_BASE_URL or http://localhost:8000/)",
        "URL"
    )]
    pub base_url: Option<String>,

    /// Universe to start the conversation in.
    #[arrrg(optional, "Universe to start in (default: general)", "UNIVERSE")]
    pub universe: Option<String>,

    /// Cap on prior messages sent as context.
    #[arrrg(optional, "Send at most this many prior messages", "COUNT")]
    pub history_limit: Option<u32>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECONDS")]
    pub timeout: Option<u32>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// The universe the session opens in.
    pub universe: Universe,

    /// Maximum number of prior messages sent with each request.
    /// `None` sends the whole conversation.
    pub history_limit: Option<usize>,

    /// API base URL; `None` defers to the client's environment lookup.
    pub base_url: Option<String>,

    /// Request timeout; `None` uses the client default.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl SessionConfig {
    /// Creates a new SessionConfig with default values.
    ///
    /// Defaults:
    /// - Universe: general
    /// - History: unlimited
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            universe: Universe::default(),
            history_limit: None,
            base_url: None,
            timeout: None,
            use_color: true,
        }
    }

    /// Sets the starting universe.
    pub fn with_universe(mut self, universe: Universe) -> Self {
        self.universe = universe;
        self
    }

    /// Sets the history cap.
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for SessionConfig {
    type Error = Error;

    fn try_from(args: ChatArgs) -> Result<Self, Self::Error> {
        let universe = match args.universe {
            Some(universe) => universe.parse()?,
            None => Universe::default(),
        };

        Ok(SessionConfig {
            universe,
            history_limit: args.history_limit.map(|limit| limit as usize),
            base_url: args.base_url,
            timeout: args.timeout.map(|secs| Duration::from_secs(u64::from(secs))),
            use_color: !args.no_color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SessionConfig::new();
        assert_eq!(config.universe, Universe::General);
        assert!(config.history_limit.is_none());
        assert!(config.base_url.is_none());
        assert!(config.timeout.is_none());
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_defaults() {
        let config = SessionConfig::try_from(ChatArgs::default()).unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            base_url: Some("http://coach.local:9000".to_string()),
            universe: Some("training-plan".to_string()),
            history_limit: Some(20),
            timeout: Some(15),
            no_color: true,
        };
        let config = SessionConfig::try_from(args).unwrap();
        assert_eq!(config.universe, Universe::TrainingPlan);
        assert_eq!(config.history_limit, Some(20));
        assert_eq!(config.base_url.as_deref(), Some("http://coach.local:9000"));
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert!(!config.use_color);
    }

    #[test]
    fn config_from_args_rejects_unknown_universe() {
        let args = ChatArgs {
            universe: Some("nutrition".to_string()),
            ..ChatArgs::default()
        };
        let err = SessionConfig::try_from(args).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn config_builder_pattern() {
        let config = SessionConfig::new()
            .with_universe(Universe::Autopsy)
            .with_history_limit(Some(6))
            .with_base_url("http://localhost:1234/")
            .with_timeout(Duration::from_secs(3))
            .without_color();

        assert_eq!(config.universe, Universe::Autopsy);
        assert_eq!(config.history_limit, Some(6));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:1234/"));
        assert_eq!(config.timeout, Some(Duration::from_secs(3)));
        assert!(!config.use_color);
    }
}
