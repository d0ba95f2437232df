//! Output rendering for streamed chat replies.
//!
//! The session controller reports what it applies to the conversation through
//! a [`Renderer`]; the REPL uses [`PlainTextRenderer`], tests and headless
//! callers use [`NullRenderer`].

use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{Universe, UsageSnapshot};

/// ANSI escape code for dim text (used for intros).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for cyan text (used for usage).
const ANSI_CYAN: &str = "\x1b[36m";

/// Trait for rendering streaming output.
///
/// Only events from the stream that currently owns the conversation reach the
/// renderer; stale events are dropped before rendering.
pub trait Renderer: Send {
    /// Print a chunk of the assistant reply.
    ///
    /// This is called incrementally as tokens are streamed from the API.
    fn print_text(&mut self, text: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print the greeting for a universe.
    fn print_intro(&mut self, universe: Universe, intro: &str) {
        self.print_info(&format!("[{universe}] {intro}"));
    }

    /// Print a usage snapshot.
    fn print_usage(&mut self, usage: &UsageSnapshot) {
        self.print_info(&describe_usage(usage));
    }

    /// Called when a response is complete.
    ///
    /// Used to ensure proper newlines and cleanup after streaming.
    fn finish_response(&mut self) {}

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self) {}

    /// Returns true if streaming should be interrupted.
    fn should_interrupt(&self) -> bool {
        false
    }
}

/// One-line summary of a usage snapshot.
pub fn describe_usage(usage: &UsageSnapshot) -> String {
    format!(
        "{} messages used, {} remaining ({:.0}% of quota)",
        usage.messages_used, usage.messages_remaining, usage.percentage_used
    )
}

/// A renderer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn print_text(&mut self, _: &str) {}

    fn print_error(&mut self, _: &str) {}

    fn print_info(&mut self, _: &str) {}
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    interrupted: Option<Arc<AtomicBool>>,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            interrupted: None,
        }
    }

    /// Attaches an interrupt flag to the renderer.
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(interrupted);
        self
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_text(&mut self, text: &str) {
        print!("{text}");
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        if self.use_color {
            eprintln!("\n{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("\nError: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
    }

    fn print_intro(&mut self, universe: Universe, intro: &str) {
        if intro.is_empty() {
            return;
        }
        if self.use_color {
            println!("{ANSI_DIM}[{universe}]{ANSI_RESET} {intro}");
        } else {
            println!("[{universe}] {intro}");
        }
    }

    fn print_usage(&mut self, usage: &UsageSnapshot) {
        if self.use_color {
            println!("{ANSI_CYAN}{}{ANSI_RESET}", describe_usage(usage));
        } else {
            println!("{}", describe_usage(usage));
        }
    }

    fn finish_response(&mut self) {
        println!();
        self.flush();
    }

    fn print_interrupted(&mut self) {
        println!("\n[interrupted]");
        self.flush();
    }

    fn should_interrupt(&self) -> bool {
        self.interrupted
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
        assert!(!renderer.should_interrupt());
    }

    #[test]
    fn renderer_interrupt_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let renderer = PlainTextRenderer::with_color(false).with_interrupt(flag.clone());
        assert!(!renderer.use_color);
        assert!(!renderer.should_interrupt());
        flag.store(true, Ordering::Relaxed);
        assert!(renderer.should_interrupt());
    }

    #[test]
    fn usage_description() {
        let usage = UsageSnapshot::new(12, 38, 24.0);
        assert_eq!(
            describe_usage(&usage),
            "12 messages used, 38 remaining (24% of quota)"
        );
    }
}
