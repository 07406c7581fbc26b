//! Timer engine implementation.
//!
//! The engine is a tick-driven state machine. It does not use internal
//! threads or timers: the caller (normally [`crate::session`]) invokes
//! `tick()` once per elapsed second while the engine is running.
//!
//! ## State Transitions
//!
//! ```text
//!          start            pause
//!   Idle ---------> Running -------> Paused
//!    ^  <---------     |  <---------   |
//!    |     stop        |    start      |
//!    |                 | tick to 0     |
//!    +-----------------+---------------+
//!         (complete / stop)
//! ```
//!
//! Mode is an independent axis and can only change while `Idle`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(&settings).with_notifier(Box::new(LogNotifier));
//! engine.start()?;
//! // once per second:
//! let events = engine.tick();
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::mode::{IntervalMode, ModeCatalog};
use crate::error::TransitionError;
use crate::events::Event;
use crate::notify::{Notifier, NullNotifier};
use crate::projection::{self, Projection};
use crate::storage::{Policy, Settings};
use crate::task::{Task, TaskId, TaskQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Paused => "paused",
        })
    }
}

/// Runtime countdown state.
///
/// `total_secs` is frozen for the interval in progress; `remaining_secs`
/// never exceeds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: IntervalMode,
    pub phase: Phase,
    pub remaining_secs: u64,
    pub total_secs: u64,
}

/// Serializable view of the whole engine for front ends.
#[derive(Debug, Clone, Serialize)]
pub struct TimerSnapshot {
    pub mode: IntervalMode,
    pub label: &'static str,
    pub phase: Phase,
    pub remaining_secs: u64,
    pub total_secs: u64,
    pub progress: f64,
    pub policy: Policy,
    pub current_task: Option<Task>,
    pub current_index: usize,
    pub tasks: Vec<Task>,
    pub intervals_completed: u32,
    pub intervals_required: u32,
    pub projection: Projection,
    pub at: DateTime<Utc>,
}

/// Core timer engine.
///
/// Owns the mode catalog, the policy flags and the task queue; every
/// mutation goes through `&mut self`, so a single owner serializes them.
pub struct TimerEngine {
    state: TimerState,
    catalog: ModeCatalog,
    policy: Policy,
    queue: TaskQueue,
    notifier: Box<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .field("catalog", &self.catalog)
            .field("policy", &self.policy)
            .field("queue", &self.queue)
            .field("notifier", &self.notifier.name())
            .finish_non_exhaustive()
    }
}

impl TimerEngine {
    /// Create an idle engine in work mode from a settings snapshot.
    pub fn new(settings: &Settings) -> Self {
        let catalog = settings.catalog();
        let total = catalog.duration(IntervalMode::Work);
        Self {
            state: TimerState {
                mode: IntervalMode::Work,
                phase: Phase::Idle,
                remaining_secs: total,
                total_secs: total,
            },
            catalog,
            policy: settings.policy,
            queue: TaskQueue::new(),
            notifier: Box::new(NullNotifier),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn mode(&self) -> IntervalMode {
        self.state.mode
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.remaining_secs
    }

    pub fn total_secs(&self) -> u64 {
        self.state.total_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.phase == Phase::Running
    }

    /// 0.0 .. 1.0 progress within the current interval.
    pub fn progress(&self) -> f64 {
        if self.state.total_secs == 0 {
            return 0.0;
        }
        1.0 - (self.state.remaining_secs as f64 / self.state.total_secs as f64)
    }

    pub fn catalog(&self) -> &ModeCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current durations and policy, ready to hand to a settings store.
    pub fn settings(&self) -> Settings {
        Settings::from_parts(&self.catalog, self.policy)
    }

    pub fn projection(&self) -> Projection {
        projection::project(&self.queue, &self.catalog, self.clock.now())
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let now = self.clock.now();
        TimerSnapshot {
            mode: self.state.mode,
            label: self.state.mode.label(),
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            total_secs: self.state.total_secs,
            progress: self.progress(),
            policy: self.policy,
            current_task: self.queue.current().cloned(),
            current_index: self.queue.current_index(),
            tasks: self.queue.tasks().to_vec(),
            intervals_completed: self.queue.total_completed(),
            intervals_required: self.queue.total_required(),
            projection: projection::project(&self.queue, &self.catalog, now),
            at: now,
        }
    }

    // ── Timer commands ───────────────────────────────────────────────

    /// Start from idle or resume from paused.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        match self.state.phase {
            Phase::Idle => {
                self.state.total_secs = self.state.remaining_secs;
                self.state.phase = Phase::Running;
                tracing::debug!(mode = %self.state.mode, secs = self.state.total_secs, "timer started");
                Ok(())
            }
            Phase::Paused => {
                self.state.phase = Phase::Running;
                tracing::debug!(remaining = self.state.remaining_secs, "timer resumed");
                Ok(())
            }
            Phase::Running => Err(TransitionError::AlreadyRunning),
        }
    }

    pub fn pause(&mut self) -> Result<(), TransitionError> {
        match self.state.phase {
            Phase::Running => {
                self.state.phase = Phase::Paused;
                tracing::debug!(remaining = self.state.remaining_secs, "timer paused");
                Ok(())
            }
            Phase::Idle | Phase::Paused => Err(TransitionError::NotRunning),
        }
    }

    /// Single start/pause button: pause when running, start otherwise.
    /// Returns the resulting phase.
    pub fn toggle(&mut self) -> Phase {
        let result = if self.is_running() {
            self.pause()
        } else {
            self.start()
        };
        debug_assert!(result.is_ok());
        self.state.phase
    }

    /// Abandon the current interval. Always legal.
    pub fn stop(&mut self) {
        if self.state.phase != Phase::Idle {
            tracing::debug!(mode = %self.state.mode, "timer stopped");
        }
        self.reset_to_idle();
    }

    pub fn switch_mode(&mut self, target: IntervalMode) -> Result<(), TransitionError> {
        if self.state.phase != Phase::Idle {
            tracing::debug!(%target, phase = %self.state.phase, "mode switch refused");
            return Err(TransitionError::ModeLockedWhileRunning {
                target,
                phase: self.state.phase,
            });
        }
        self.enter_mode(target);
        Ok(())
    }

    /// Advance the countdown by one second.
    ///
    /// Ignored unless running. When the interval reaches zero the engine
    /// goes idle, reports the completion, credits the current task for a
    /// work interval and, with auto-switch on, moves to the complementary
    /// mode. Events are handed to the notifier and returned in order.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.state.phase != Phase::Running {
            return Vec::new();
        }
        self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
        if self.state.remaining_secs > 0 {
            return Vec::new();
        }
        self.complete()
    }

    // ── Settings commands ────────────────────────────────────────────

    /// Set a mode's duration (minutes, clamped to 1..=120).
    ///
    /// An idle engine showing that mode picks the new value up at once;
    /// a running or paused interval keeps its frozen length.
    pub fn set_duration(&mut self, mode: IntervalMode, minutes: u32) -> u64 {
        let secs = self.catalog.set_duration(mode, minutes);
        self.resync_if_idle(mode);
        secs
    }

    /// Step a mode's duration by `delta_minutes`, staying in bounds.
    pub fn adjust_duration(&mut self, mode: IntervalMode, delta_minutes: i32) -> u64 {
        let secs = self.catalog.adjust_duration(mode, delta_minutes);
        self.resync_if_idle(mode);
        secs
    }

    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy;
    }

    // ── Task commands ────────────────────────────────────────────────

    pub fn add_task(&mut self, name: &str, required: u32) -> Option<TaskId> {
        let now = self.clock.now();
        self.queue.enqueue(name, required, now)
    }

    pub fn toggle_task(&mut self, id: TaskId) -> bool {
        self.queue.toggle_manual(id)
    }

    pub fn set_task_required(&mut self, id: TaskId, required: u32) -> bool {
        self.queue.set_required(id, required)
    }

    pub fn remove_task(&mut self, id: TaskId) -> Option<Task> {
        self.queue.remove(id)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Vec<Event> {
        let finished = self.state.mode;
        self.reset_to_idle();

        let credited_task = if finished == IntervalMode::Work {
            self.queue.credit_current()
        } else {
            None
        };
        tracing::info!(mode = %finished, credited = ?credited_task, "interval completed");

        let mut events = Vec::with_capacity(2);
        let at = self.clock.now();
        self.emit(
            Event::IntervalCompleted {
                mode: finished,
                credited_task,
                at,
            },
            &mut events,
        );

        if self.policy.auto_switch {
            let next = finished.complement();
            self.enter_mode(next);
            let duration_secs = self.state.total_secs;
            let event = if next.is_break() {
                Event::BreakStarted {
                    mode: next,
                    duration_secs,
                    at,
                }
            } else {
                Event::BreakEnded { duration_secs, at }
            };
            self.emit(event, &mut events);
        }
        events
    }

    fn emit(&mut self, event: Event, out: &mut Vec<Event>) {
        if let Err(e) = self.notifier.notify(&event, &self.policy) {
            tracing::warn!(notifier = self.notifier.name(), error = %e, "notification failed");
        }
        out.push(event);
    }

    fn enter_mode(&mut self, mode: IntervalMode) {
        self.state.mode = mode;
        self.reset_to_idle();
        tracing::info!(%mode, secs = self.state.total_secs, "mode switched");
    }

    fn reset_to_idle(&mut self) {
        let total = self.catalog.duration(self.state.mode);
        self.state.phase = Phase::Idle;
        self.state.total_secs = total;
        self.state.remaining_secs = total;
    }

    fn resync_if_idle(&mut self, mode: IntervalMode) {
        if self.state.mode == mode && self.state.phase == Phase::Idle {
            self.reset_to_idle();
        }
    }
}
