//! Interactive chat application for talking with the fitness coach.
//!
//! This binary provides a streaming REPL interface on top of
//! [`SessionController`] and the coaching API.
//!
//! # Usage
//!
//! ```bash
//! # Talk to the general coach on a local server
//! coach-chat
//!
//! # Point at another server and start in a specific universe
//! coach-chat --base-url https://coach.example.com/ --universe training_plan
//!
//! # Disable colors (useful for piping output)
//! coach-chat --no-color
//! ```
//!
//! Set `RUST_LOG=coach_chat=debug` to see stream diagnostics on stderr.
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/universe <name>` - Switch universe and start a fresh conversation
//! - `/universes` - List the available universes
//! - `/usage` - Show the message quota
//! - `/journal` - Show journal entries written in the last week
//! - `/dismiss` - Clear the current error
//! - `/history` - Print the conversation
//! - `/help` - Show available commands
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use coach_chat::chat::{
    ChatArgs, ChatCommand, PlainTextRenderer, Renderer, SessionConfig, SessionController,
    TurnOutcome, help_text, parse_command,
};
use coach_chat::{CoachClient, Message, MessageRole, Universe};

/// Main entry point for the coach-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("coach-chat [OPTIONS]");
    let config = SessionConfig::try_from(args)?;
    let use_color = config.use_color;

    let client = CoachClient::with_options(config.base_url.clone(), config.timeout)?;
    let base_url = client.base_url().clone();
    let session = SessionController::new(client, config);

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    let mut renderer = PlainTextRenderer::with_color(use_color).with_interrupt(interrupted.clone());
    let mut rl = DefaultEditor::new()?;

    println!("Coach Chat ({base_url})");
    println!("Type /help for commands, /quit to exit\n");

    session.open().await;
    print_intro(&session, &mut renderer).await;
    if let Some(usage) = session.usage().await {
        renderer.print_usage(&usage);
    }

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let prompt = format!("[{}] You: ", session.universe().await);
        let readline = rl.readline(&prompt);

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Universe(universe) => {
                            session.switch_universe(universe).await;
                            renderer.print_info(&format!("Switched to {universe}."));
                            print_intro(&session, &mut renderer).await;
                        }
                        ChatCommand::ListUniverses => {
                            let current = session.universe().await;
                            for universe in Universe::ALL {
                                let marker = if universe == current { "*" } else { " " };
                                println!("    {marker} {universe}");
                            }
                        }
                        ChatCommand::Usage => {
                            session.refresh_usage().await;
                            match session.usage().await {
                                Some(usage) => renderer.print_usage(&usage),
                                None => renderer.print_error("Usage is not available."),
                            }
                        }
                        ChatCommand::Journal => {
                            match session.backend().journal_entries_count().await {
                                Ok(count) => renderer.print_info(&format!(
                                    "{count} journal entries in the last week."
                                )),
                                Err(err) => renderer
                                    .print_error(&format!("Failed to load journal count: {err}")),
                            }
                        }
                        ChatCommand::Dismiss => {
                            session.dismiss_error().await;
                            renderer.print_info("Error cleared.");
                        }
                        ChatCommand::History => {
                            print_history(&session.messages().await);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                println!("Coach:");
                match session.submit(line, &mut renderer).await {
                    TurnOutcome::Busy => {
                        renderer.print_error("Still waiting on the previous reply.");
                    }
                    TurnOutcome::Completed { .. } | TurnOutcome::Interrupted => {
                        if let Some(usage) = session.usage().await {
                            renderer.print_usage(&usage);
                        }
                    }
                    TurnOutcome::Ignored
                    | TurnOutcome::Failed(_)
                    | TurnOutcome::Superseded => {}
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

async fn print_intro(session: &SessionController<CoachClient>, renderer: &mut PlainTextRenderer) {
    let snapshot = session.snapshot().await;
    match snapshot.messages.first() {
        Some(message) if message.is_intro() && !message.content.is_empty() => {
            renderer.print_intro(snapshot.universe, &message.content);
        }
        _ => {}
    }
}

fn print_history(messages: &[Message]) {
    if messages.is_empty() {
        println!("    (no messages)");
        return;
    }
    for message in messages {
        let speaker = match message.role {
            MessageRole::User => "You",
            MessageRole::Assistant => "Coach",
            MessageRole::Intro => "Intro",
        };
        println!("    {speaker}: {}", message.content);
    }
}
