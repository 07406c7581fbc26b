mod clock;
mod engine;
mod mode;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Phase, TimerEngine, TimerSnapshot, TimerState};
pub use mode::{
    clamp_minutes, IntervalMode, ModeCatalog, DURATION_STEP_MIN, MAX_DURATION_MIN,
    MIN_DURATION_MIN,
};
