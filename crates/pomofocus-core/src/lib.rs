//! # Pomofocus Core Library
//!
//! Core logic for the Pomofocus focus timer: a countdown state machine that
//! alternates work and break intervals, a queue of tasks that each need a
//! number of finished work intervals, and a projection of when the remaining
//! work will be done. Front ends (the `pomofocus` CLI) are thin layers over
//! this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: tick-driven state machine; the caller invokes `tick()`
//!   once per second while running
//! - **Task Queue**: ordered tasks with interval targets and a cursor that
//!   advances (cyclically) as tasks fill up
//! - **Projection**: stateless estimate of the finish time
//! - **Session**: tokio actor that owns an engine and drives its ticks
//! - **Storage**: TOML-based settings
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TaskQueue`]: Task ownership and advancement
//! - [`Session`]: Single-writer async driver
//! - [`Notifier`]: Trait for reacting to engine events
//! - [`SettingsStore`]: Trait for persisting durations and policy flags

pub mod error;
pub mod events;
pub mod notify;
pub mod projection;
pub mod session;
pub mod storage;
pub mod task;
pub mod timer;

pub use error::{ConfigError, CoreError, NotifyError, TransitionError};
pub use events::Event;
pub use notify::{FanoutNotifier, LogNotifier, Notifier, NullNotifier, RecordingNotifier};
pub use projection::Projection;
pub use session::{Command, Outcome, Reply, Session, SessionHandle};
pub use storage::{MemorySettingsStore, Policy, Settings, SettingsStore, TomlSettingsStore};
pub use task::{Task, TaskId, TaskQueue};
pub use timer::{
    Clock, IntervalMode, ManualClock, ModeCatalog, Phase, SystemClock, TimerEngine, TimerSnapshot,
    TimerState,
};
