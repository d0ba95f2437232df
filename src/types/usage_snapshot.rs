use serde::{Deserialize, Serialize};

/// Quota accounting for message exchanges in the current period.
///
/// A snapshot is always replaced whole; it is stale between refreshes.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageSnapshot {
    /// Messages sent so far in this period.
    pub messages_used: u32,

    /// Messages still available in this period.
    pub messages_remaining: u32,

    /// Share of the quota consumed, 0 to 100.
    pub percentage_used: f64,
}

impl UsageSnapshot {
    /// Create a new `UsageSnapshot`.
    pub fn new(messages_used: u32, messages_remaining: u32, percentage_used: f64) -> Self {
        Self {
            messages_used,
            messages_remaining,
            percentage_used,
        }
    }

    /// Returns true when no messages remain.
    pub fn is_exhausted(&self) -> bool {
        self.messages_remaining == 0
    }
}
