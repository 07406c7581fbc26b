//! Tasks and the queue that feeds them work intervals.

mod queue;

pub use queue::TaskQueue;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest interval target a task can have.
pub const MIN_REQUIRED_INTERVALS: u32 = 1;
/// Largest interval target a task can have.
pub const MAX_REQUIRED_INTERVALS: u32 = 99;

/// Task identifier: creation time in epoch milliseconds, bumped when two
/// tasks are created within the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TaskId)
    }
}

/// A unit of work that needs a number of completed focus intervals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    required_intervals: u32,
    completed_intervals: u32,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub(crate) fn new(id: TaskId, name: String, required: u32, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            required_intervals: clamp_required(required),
            completed_intervals: 0,
            created_at,
        }
    }

    pub fn required_intervals(&self) -> u32 {
        self.required_intervals
    }

    pub fn completed_intervals(&self) -> u32 {
        self.completed_intervals
    }

    pub fn remaining_intervals(&self) -> u32 {
        self.required_intervals - self.completed_intervals
    }

    pub fn is_complete(&self) -> bool {
        self.completed_intervals >= self.required_intervals
    }

    /// Add one completed interval, never exceeding the target.
    pub(crate) fn credit(&mut self) {
        self.completed_intervals = (self.completed_intervals + 1).min(self.required_intervals);
    }

    /// Manual click: count one more interval, or start over once full.
    pub(crate) fn toggle(&mut self) {
        if self.completed_intervals < self.required_intervals {
            self.completed_intervals += 1;
        } else {
            self.completed_intervals = 0;
        }
    }

    pub(crate) fn set_required(&mut self, required: u32) {
        self.required_intervals = clamp_required(required);
        self.completed_intervals = self.completed_intervals.min(self.required_intervals);
    }
}

pub(crate) fn clamp_required(required: u32) -> u32 {
    required.clamp(MIN_REQUIRED_INTERVALS, MAX_REQUIRED_INTERVALS)
}
