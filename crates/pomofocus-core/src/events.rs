use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::TaskId;
use crate::timer::IntervalMode;

/// Everything the engine tells the outside world about.
/// Notifiers react to these; the CLI renders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// An interval ran down to zero. Always fired before any auto-switch,
    /// so `mode` is the mode that just finished.
    IntervalCompleted {
        mode: IntervalMode,
        /// Task credited with the interval, if it was a work interval.
        credited_task: Option<TaskId>,
        at: DateTime<Utc>,
    },
    /// Auto-switch moved from work into a break.
    BreakStarted {
        mode: IntervalMode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// Auto-switch moved from a break back into work.
    BreakEnded {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short human-readable description, used for notices.
    pub fn message(&self) -> String {
        match self {
            Event::IntervalCompleted { mode, .. } => format!("{} completed!", mode.label()),
            Event::BreakStarted { mode, duration_secs, .. } => {
                format!("{} started ({} min)", mode.label(), duration_secs / 60)
            }
            Event::BreakEnded { duration_secs, .. } => {
                format!("Break over, back to work ({} min)", duration_secs / 60)
            }
        }
    }
}
