//! Completion-time projection.
//!
//! Stateless: every call recomputes from the queue, the catalog and `now`.
//! Remaining work counts the current task's unfinished intervals plus every
//! task after it. Short breaks sit between work intervals, never after the
//! last one.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::task::{Task, TaskQueue};
use crate::timer::{IntervalMode, ModeCatalog};

/// How often a running session refreshes its projection.
pub const REFRESH_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Projection {
    AllComplete,
    Pending {
        remaining_intervals: u32,
        total_secs: u64,
        finish_at: DateTime<Utc>,
    },
}

impl Projection {
    pub fn finish_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Projection::AllComplete => None,
            Projection::Pending { finish_at, .. } => Some(*finish_at),
        }
    }

    pub fn remaining_intervals(&self) -> u32 {
        match self {
            Projection::AllComplete => 0,
            Projection::Pending { remaining_intervals, .. } => *remaining_intervals,
        }
    }
}

/// Work intervals still owed from the current task onward.
pub fn remaining_work_intervals(queue: &TaskQueue) -> u32 {
    queue.pending().iter().map(Task::remaining_intervals).sum()
}

/// Seconds needed for `intervals` work intervals with breaks in between.
pub fn workload_secs(intervals: u32, catalog: &ModeCatalog) -> u64 {
    let n = u64::from(intervals);
    n * catalog.duration(IntervalMode::Work)
        + n.saturating_sub(1) * catalog.duration(IntervalMode::ShortBreak)
}

pub fn project(queue: &TaskQueue, catalog: &ModeCatalog, now: DateTime<Utc>) -> Projection {
    project_intervals(remaining_work_intervals(queue), catalog, now)
}

/// Projection for a bare interval count.
pub fn project_intervals(intervals: u32, catalog: &ModeCatalog, now: DateTime<Utc>) -> Projection {
    if intervals == 0 {
        return Projection::AllComplete;
    }
    let total_secs = workload_secs(intervals, catalog);
    let finish_at = i64::try_from(total_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    Projection::Pending {
        remaining_intervals: intervals,
        total_secs,
        finish_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ten_oclock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn pomodoro_catalog() -> ModeCatalog {
        ModeCatalog::from_minutes(25, 5, 15)
    }

    #[test]
    fn interleaves_breaks_between_intervals() {
        let mut q = TaskQueue::new();
        q.enqueue("a", 2, ten_oclock());
        q.enqueue("b", 1, ten_oclock());

        let p = project(&q, &pomodoro_catalog(), ten_oclock());
        assert_eq!(p.remaining_intervals(), 3);
        assert_eq!(
            p.finish_at(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 11, 25, 0).unwrap())
        );
    }

    #[test]
    fn single_interval_has_no_trailing_break() {
        let p = project_intervals(1, &pomodoro_catalog(), ten_oclock());
        assert_eq!(p.finish_at(), Some(ten_oclock() + Duration::minutes(25)));
    }

    #[test]
    fn empty_queue_is_complete() {
        let q = TaskQueue::new();
        assert_eq!(project(&q, &pomodoro_catalog(), ten_oclock()), Projection::AllComplete);
    }

    #[test]
    fn finished_tasks_report_complete() {
        let mut q = TaskQueue::new();
        let id = q.enqueue("a", 1, ten_oclock()).unwrap();
        q.toggle_manual(id);
        assert_eq!(project(&q, &pomodoro_catalog(), ten_oclock()), Projection::AllComplete);
    }

    #[test]
    fn counts_only_from_current_task() {
        let mut q = TaskQueue::new();
        q.enqueue("a", 1, ten_oclock());
        q.enqueue("b", 2, ten_oclock());
        q.credit_current();
        let b = q.current().unwrap().id;
        q.toggle_manual(b);
        assert_eq!(remaining_work_intervals(&q), 1);
    }

    #[test]
    fn follows_catalog_changes() {
        let mut q = TaskQueue::new();
        q.enqueue("a", 2, ten_oclock());
        let mut catalog = pomodoro_catalog();
        catalog.set_duration(IntervalMode::Work, 50);
        let p = project(&q, &catalog, ten_oclock());
        assert_eq!(p.finish_at(), Some(ten_oclock() + Duration::minutes(105)));
    }
}
