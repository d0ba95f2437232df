use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("coach_chat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("coach_chat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("coach_chat.client.request_duration_seconds");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("coach_chat.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("coach_chat.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("coach_chat.stream.bytes");
pub(crate) static STREAM_MALFORMED: Counter = Counter::new("coach_chat.stream.malformed");

pub(crate) static SESSION_SUBMITS: Counter = Counter::new("coach_chat.session.submits");
pub(crate) static SESSION_REJECTED: Counter = Counter::new("coach_chat.session.rejected");
pub(crate) static SESSION_FAILED: Counter = Counter::new("coach_chat.session.failed");
pub(crate) static SESSION_STALE_EVENTS: Counter =
    Counter::new("coach_chat.session.stale_events");
pub(crate) static SESSION_UNIVERSE_SWITCHES: Counter =
    Counter::new("coach_chat.session.universe_switches");
pub(crate) static SESSION_TURN_DURATION: Moments =
    Moments::new("coach_chat.session.turn_duration_seconds");

pub(crate) static USAGE_REFRESHES: Counter = Counter::new("coach_chat.usage.refreshes");
pub(crate) static USAGE_REFRESH_ERRORS: Counter = Counter::new("coach_chat.usage.errors");
pub(crate) static INTRO_FETCH_ERRORS: Counter = Counter::new("coach_chat.intro.errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_MALFORMED);

    collector.register_counter(&SESSION_SUBMITS);
    collector.register_counter(&SESSION_REJECTED);
    collector.register_counter(&SESSION_FAILED);
    collector.register_counter(&SESSION_STALE_EVENTS);
    collector.register_counter(&SESSION_UNIVERSE_SWITCHES);
    collector.register_moments(&SESSION_TURN_DURATION);

    collector.register_counter(&USAGE_REFRESHES);
    collector.register_counter(&USAGE_REFRESH_ERRORS);
    collector.register_counter(&INTRO_FETCH_ERRORS);
}
