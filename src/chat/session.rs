//! Core chat session management.
//!
//! [`SessionController`] owns the conversation log, the inline error and the
//! usage snapshot, and drives one request/stream cycle per submitted message:
//!
//! ```text
//! Idle -> Submitting -> Streaming -> Completed | Failed -> Idle
//! ```
//!
//! Every cycle captures the session generation when it starts.  Switching
//! universe bumps the generation, so events from a stream opened under the
//! previous universe are recognised as stale and discarded before they touch
//! the log.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio::sync::{Mutex, watch};
use tokio::time::{self, MissedTickBehavior};

use crate::backend::ChatBackend;
use crate::chat::config::SessionConfig;
use crate::chat::conversation::{ConversationLog, MessageHandle};
use crate::observability::{
    INTRO_FETCH_ERRORS, SESSION_FAILED, SESSION_REJECTED, SESSION_STALE_EVENTS, SESSION_SUBMITS,
    SESSION_TURN_DURATION, SESSION_UNIVERSE_SWITCHES, USAGE_REFRESH_ERRORS, USAGE_REFRESHES,
};
use crate::render::Renderer;
use crate::types::{ChatRequest, Message, StreamEvent, Universe, UsageSnapshot};
use crate::Error;

/// How often a stalled stream re-checks the renderer's interrupt flag.
const INTERRUPT_POLL: Duration = Duration::from_millis(100);

/// Where the current request/stream cycle stands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No request in flight; input is accepted.
    #[default]
    Idle,
    /// The request has been sent; waiting for response headers.
    Submitting,
    /// The response stream is being consumed.
    Streaming,
    /// The stream ended normally; the usage refresh is running.  Input is
    /// accepted again in this phase.
    Completed,
    /// The request or the stream failed.
    Failed,
}

impl SessionPhase {
    /// Returns true while a cycle owns the input.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionPhase::Submitting | SessionPhase::Streaming)
    }
}

/// What happened to a submitted message.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The input was blank; nothing changed.
    Ignored,
    /// Another cycle is still active; nothing changed.
    Busy,
    /// The stream ended.  `done_received` tells whether the server sent an
    /// explicit `done` event before closing.
    Completed {
        /// Whether a `done` event arrived.
        done_received: bool,
    },
    /// The user interrupted the stream.  Streamed text is kept.
    Interrupted,
    /// The request was rejected or the stream broke.  Streamed text is kept
    /// and the error is recorded in the session.
    Failed(Error),
    /// The universe changed before the cycle finished; the rest of the stream
    /// was discarded.
    Superseded,
}

/// A point-in-time copy of the session for display.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// The active universe.
    pub universe: Universe,
    /// The conversation log, oldest first.
    pub messages: Vec<Message>,
    /// The inline error, if any.
    pub error: Option<String>,
    /// The last usage snapshot fetched, if any.
    pub usage: Option<UsageSnapshot>,
    /// The phase of the current cycle.
    pub phase: SessionPhase,
    /// True while the intro for the active universe is being fetched.
    pub intro_loading: bool,
    /// The current session generation.
    pub generation: u64,
}

#[derive(Debug, Default)]
struct SessionState {
    universe: Universe,
    log: ConversationLog,
    error: Option<String>,
    usage: Option<UsageSnapshot>,
    phase: SessionPhase,
    intro_loading: bool,
    generation: u64,
}

/// Identifies the cycle an event belongs to.
#[derive(Debug, Copy, Clone)]
struct Ticket {
    generation: u64,
    assistant: MessageHandle,
}

/// Drives chat exchanges for one session.
///
/// The controller is a cheap handle: clones share the same session, so a
/// universe switch issued from one clone takes effect on a stream being
/// consumed through another.  State is only locked between suspension points,
/// never across a network call.
pub struct SessionController<B: ChatBackend> {
    backend: Arc<B>,
    config: Arc<SessionConfig>,
    state: Arc<Mutex<SessionState>>,
    cancel: Arc<watch::Sender<u64>>,
}

impl<B: ChatBackend> Clone for SessionController<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: Arc::clone(&self.config),
            state: Arc::clone(&self.state),
            cancel: Arc::clone(&self.cancel),
        }
    }
}

impl<B: ChatBackend> SessionController<B> {
    /// Creates a controller.  Call [`open`](Self::open) to load the intro and
    /// the first usage snapshot.
    pub fn new(backend: B, config: SessionConfig) -> Self {
        let state = SessionState {
            universe: config.universe,
            ..SessionState::default()
        };
        let (cancel, _) = watch::channel(0);
        Self {
            backend: Arc::new(backend),
            config: Arc::new(config),
            state: Arc::new(Mutex::new(state)),
            cancel: Arc::new(cancel),
        }
    }

    /// Starts the session: seeds the intro for the configured universe and
    /// fetches usage.  Failures of either fetch are logged, not returned.
    pub async fn open(&self) {
        let universe = self.state.lock().await.universe;
        self.reseed(universe).await;
        self.refresh_usage().await;
    }

    /// Sends `text` and consumes the reply stream to its end.
    ///
    /// Blank input is ignored and input during an active cycle is rejected;
    /// neither changes the log.  Otherwise a leading intro is dropped, the
    /// user message and an empty assistant placeholder are appended, and
    /// token events are appended to that placeholder in arrival order.
    pub async fn submit(&self, text: &str, renderer: &mut dyn Renderer) -> TurnOutcome {
        let text = text.trim();
        if text.is_empty() {
            return TurnOutcome::Ignored;
        }

        let (ticket, request) = {
            let mut state = self.state.lock().await;
            if state.phase.is_active() {
                SESSION_REJECTED.click();
                return TurnOutcome::Busy;
            }
            state.log.drop_leading_intro();
            state.intro_loading = false;
            let request = ChatRequest::new(
                state.universe,
                text,
                state.log.messages(),
                self.config.history_limit,
            );
            state.log.push(Message::user(text));
            let assistant = state.log.push(Message::assistant(""));
            state.error = None;
            state.phase = SessionPhase::Submitting;
            let ticket = Ticket {
                generation: state.generation,
                assistant,
            };
            (ticket, request)
        };

        SESSION_SUBMITS.click();
        let start = Instant::now();
        let outcome = self.run_turn(ticket, request, renderer).await;
        SESSION_TURN_DURATION.add(start.elapsed().as_secs_f64());
        outcome
    }

    async fn run_turn(
        &self,
        ticket: Ticket,
        request: ChatRequest,
        renderer: &mut dyn Renderer,
    ) -> TurnOutcome {
        let mut cancelled = self.cancel.subscribe();

        let stream = match self.backend.open_stream(request).await {
            Ok(stream) => stream,
            Err(err) => return self.fail(ticket, err, renderer).await,
        };
        if !self.set_phase(ticket, SessionPhase::Streaming).await {
            return TurnOutcome::Superseded;
        }

        let mut stream = stream;
        let mut done_received = false;
        let mut usage_refreshed = false;
        let mut interrupt_poll = time::interval(INTERRUPT_POLL);
        interrupt_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            if renderer.should_interrupt() {
                renderer.print_interrupted();
                return self.complete(ticket, usage_refreshed, TurnOutcome::Interrupted).await;
            }
            let item = tokio::select! {
                item = stream.next() => item,
                _ = cancelled.changed() => {
                    tracing::debug!(generation = ticket.generation, "stream superseded");
                    return TurnOutcome::Superseded;
                }
                _ = interrupt_poll.tick() => continue,
            };
            let Some(item) = item else {
                break;
            };
            let event = match item {
                Ok(event) => event,
                Err(err) => return self.fail(ticket, err, renderer).await,
            };
            if !self.apply_event(ticket, &event, renderer).await {
                return TurnOutcome::Superseded;
            }
            if event == StreamEvent::Done {
                done_received = true;
                if !usage_refreshed {
                    usage_refreshed = true;
                    self.refresh_usage().await;
                }
            }
        }

        renderer.finish_response();
        self.complete(ticket, usage_refreshed, TurnOutcome::Completed { done_received })
            .await
    }

    /// Applies one event to the cycle's assistant message or to the error
    /// state.  Returns false, without touching anything, if the cycle is stale.
    async fn apply_event(
        &self,
        ticket: Ticket,
        event: &StreamEvent,
        renderer: &mut dyn Renderer,
    ) -> bool {
        let mut state = self.state.lock().await;
        if state.generation != ticket.generation {
            SESSION_STALE_EVENTS.click();
            tracing::debug!(
                stream_generation = ticket.generation,
                current_generation = state.generation,
                "discarding event from superseded stream"
            );
            return false;
        }
        match event {
            StreamEvent::Token { content } => {
                if state.log.append_to(ticket.assistant, content) {
                    renderer.print_text(content);
                }
            }
            StreamEvent::Done => {}
            StreamEvent::Error { message } => {
                tracing::warn!(error = %message, "coach reported an error mid-reply");
                state.error = Some(message.clone());
                renderer.print_error(message);
            }
        }
        true
    }

    /// Finishes a cycle that ended without a transport failure.  The usage
    /// refresh runs exactly once per cycle.
    async fn complete(
        &self,
        ticket: Ticket,
        usage_refreshed: bool,
        outcome: TurnOutcome,
    ) -> TurnOutcome {
        if !self.set_phase(ticket, SessionPhase::Completed).await {
            return TurnOutcome::Superseded;
        }
        if !usage_refreshed {
            self.refresh_usage().await;
        }
        // A new cycle may have started while usage was refreshing.
        self.release(ticket, SessionPhase::Completed).await;
        outcome
    }

    async fn fail(&self, ticket: Ticket, err: Error, renderer: &mut dyn Renderer) -> TurnOutcome {
        {
            let mut state = self.state.lock().await;
            if state.generation != ticket.generation {
                return TurnOutcome::Superseded;
            }
            state.error = Some(err.to_string());
            state.phase = SessionPhase::Failed;
        }
        SESSION_FAILED.click();
        tracing::warn!(error = %err, "chat exchange failed");
        renderer.print_error(&err.to_string());
        self.release(ticket, SessionPhase::Failed).await;
        TurnOutcome::Failed(err)
    }

    async fn set_phase(&self, ticket: Ticket, phase: SessionPhase) -> bool {
        let mut state = self.state.lock().await;
        if state.generation != ticket.generation {
            return false;
        }
        state.phase = phase;
        true
    }

    /// Returns to `Idle` only if the cycle still holds the terminal phase it
    /// set; a cycle submitted in the meantime keeps its phase.
    async fn release(&self, ticket: Ticket, terminal: SessionPhase) {
        let mut state = self.state.lock().await;
        if state.generation == ticket.generation && state.phase == terminal {
            state.phase = SessionPhase::Idle;
        }
    }

    /// Switches to `universe`, abandoning any reply still streaming.
    ///
    /// The log is replaced by a pending intro placeholder straight away and by
    /// the fetched intro once it arrives.  An intro that fails to load leaves
    /// an empty intro in place.
    pub async fn switch_universe(&self, universe: Universe) {
        SESSION_UNIVERSE_SWITCHES.click();
        tracing::info!(%universe, "switching universe");
        self.reseed(universe).await;
    }

    async fn reseed(&self, universe: Universe) {
        let generation = {
            let mut state = self.state.lock().await;
            state.generation += 1;
            state.universe = universe;
            state.log.seed_intro(String::new());
            state.intro_loading = true;
            state.error = None;
            state.phase = SessionPhase::Idle;
            state.generation
        };
        self.cancel.send_replace(generation);

        let intro = match self.backend.fetch_intro(universe).await {
            Ok(intro) => intro,
            Err(err) => {
                INTRO_FETCH_ERRORS.click();
                tracing::warn!(%universe, error = %err, "failed to load intro");
                String::new()
            }
        };

        let mut state = self.state.lock().await;
        if state.generation == generation && state.intro_loading {
            state.log.seed_intro(intro);
            state.intro_loading = false;
        }
    }

    /// Fetches a fresh usage snapshot.  On failure the previous snapshot is
    /// kept and the error is logged.
    pub async fn refresh_usage(&self) {
        match self.backend.fetch_usage().await {
            Ok(usage) => {
                USAGE_REFRESHES.click();
                self.state.lock().await.usage = Some(usage);
            }
            Err(err) => {
                USAGE_REFRESH_ERRORS.click();
                tracing::warn!(error = %err, "failed to refresh usage");
            }
        }
    }

    /// Clears the inline error.
    pub async fn dismiss_error(&self) {
        self.state.lock().await.error = None;
    }

    /// Returns a copy of the whole session state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            universe: state.universe,
            messages: state.log.messages().to_vec(),
            error: state.error.clone(),
            usage: state.usage,
            phase: state.phase,
            intro_loading: state.intro_loading,
            generation: state.generation,
        }
    }

    /// Returns a copy of the conversation log.
    pub async fn messages(&self) -> Vec<Message> {
        self.state.lock().await.log.messages().to_vec()
    }

    /// Returns the active universe.
    pub async fn universe(&self) -> Universe {
        self.state.lock().await.universe
    }

    /// Returns the inline error, if any.
    pub async fn error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    /// Returns the last usage snapshot, if any.
    pub async fn usage(&self) -> Option<UsageSnapshot> {
        self.state.lock().await.usage
    }

    /// Returns the phase of the current cycle.
    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase
    }

    /// Returns true while a cycle owns the input.
    pub async fn is_busy(&self) -> bool {
        self.phase().await.is_active()
    }

    /// The configuration this session was created with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The backend this session talks to.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}
