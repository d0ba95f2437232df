use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Server-side conversational context selector.
///
/// Exactly one universe is active per session.  Changing it reseeds the
/// conversation with a fresh intro.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Universe {
    /// Post-mortem of a completed workout.
    Autopsy,

    /// The athlete's training plan.
    TrainingPlan,

    /// The workout scheduled for today.
    TodaysWorkout,

    /// Long-term progress.
    Progress,

    /// General coaching questions.
    #[default]
    General,
}

impl Universe {
    /// Every universe, in menu order.
    pub const ALL: [Universe; 5] = [
        Universe::Autopsy,
        Universe::TrainingPlan,
        Universe::TodaysWorkout,
        Universe::Progress,
        Universe::General,
    ];

    /// The wire name used in request bodies and URL paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Universe::Autopsy => "autopsy",
            Universe::TrainingPlan => "training_plan",
            Universe::TodaysWorkout => "todays_workout",
            Universe::Progress => "progress",
            Universe::General => "general",
        }
    }
}

impl fmt::Display for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Universe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Universe::ALL
            .into_iter()
            .find(|universe| universe.as_str() == normalized)
            .ok_or_else(|| {
                Error::validation(
                    format!("unknown universe '{s}'"),
                    Some("universe".to_string()),
                )
            })
    }
}
