use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lower bound for any interval, in minutes.
pub const MIN_DURATION_MIN: u32 = 1;
/// Upper bound for any interval, in minutes.
pub const MAX_DURATION_MIN: u32 = 120;
/// Step used by the +/- duration controls.
pub const DURATION_STEP_MIN: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalMode {
    Work,
    ShortBreak,
    LongBreak,
}

impl IntervalMode {
    pub const ALL: [IntervalMode; 3] = [
        IntervalMode::Work,
        IntervalMode::ShortBreak,
        IntervalMode::LongBreak,
    ];

    pub fn label(self) -> &'static str {
        match self {
            IntervalMode::Work => "Pomodoro",
            IntervalMode::ShortBreak => "Short Break",
            IntervalMode::LongBreak => "Long Break",
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, IntervalMode::Work)
    }

    /// The mode auto-switch moves to after this one completes.
    pub fn complement(self) -> IntervalMode {
        match self {
            IntervalMode::Work => IntervalMode::ShortBreak,
            IntervalMode::ShortBreak | IntervalMode::LongBreak => IntervalMode::Work,
        }
    }

    pub fn default_minutes(self) -> u32 {
        match self {
            IntervalMode::Work => 45,
            IntervalMode::ShortBreak => 15,
            IntervalMode::LongBreak => 30,
        }
    }
}

impl fmt::Display for IntervalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IntervalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "work" | "pomodoro" | "focus" => Ok(IntervalMode::Work),
            "short_break" | "short" => Ok(IntervalMode::ShortBreak),
            "long_break" | "long" => Ok(IntervalMode::LongBreak),
            other => Err(format!("unknown mode '{other}' (expected work, short or long)")),
        }
    }
}

/// Clamp a requested duration into the supported minute range.
pub fn clamp_minutes(minutes: i64) -> u32 {
    minutes.clamp(MIN_DURATION_MIN as i64, MAX_DURATION_MIN as i64) as u32
}

/// Configured duration for each interval kind.
///
/// Durations are stored in seconds and are always at least one minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeCatalog {
    work_secs: u64,
    short_break_secs: u64,
    long_break_secs: u64,
}

impl ModeCatalog {
    /// Build a catalog from minute values, clamping each one.
    pub fn from_minutes(work: u32, short_break: u32, long_break: u32) -> Self {
        let mut catalog = Self::default();
        catalog.set_duration(IntervalMode::Work, work);
        catalog.set_duration(IntervalMode::ShortBreak, short_break);
        catalog.set_duration(IntervalMode::LongBreak, long_break);
        catalog
    }

    /// Duration of `mode` in seconds.
    pub fn duration(&self, mode: IntervalMode) -> u64 {
        match mode {
            IntervalMode::Work => self.work_secs,
            IntervalMode::ShortBreak => self.short_break_secs,
            IntervalMode::LongBreak => self.long_break_secs,
        }
    }

    /// Duration of `mode` in whole minutes.
    pub fn minutes(&self, mode: IntervalMode) -> u32 {
        (self.duration(mode) / 60) as u32
    }

    /// Store a new duration for `mode`, clamped to 1..=120 minutes.
    ///
    /// Returns the stored value in seconds.
    pub fn set_duration(&mut self, mode: IntervalMode, minutes: u32) -> u64 {
        let secs = u64::from(clamp_minutes(i64::from(minutes))) * 60;
        match mode {
            IntervalMode::Work => self.work_secs = secs,
            IntervalMode::ShortBreak => self.short_break_secs = secs,
            IntervalMode::LongBreak => self.long_break_secs = secs,
        }
        secs
    }

    /// Move the duration of `mode` by `delta_minutes`, staying inside the bounds.
    pub fn adjust_duration(&mut self, mode: IntervalMode, delta_minutes: i32) -> u64 {
        let next = clamp_minutes(i64::from(self.minutes(mode)) + i64::from(delta_minutes));
        self.set_duration(mode, next)
    }
}

impl Default for ModeCatalog {
    fn default() -> Self {
        Self {
            work_secs: u64::from(IntervalMode::Work.default_minutes()) * 60,
            short_break_secs: u64::from(IntervalMode::ShortBreak.default_minutes()) * 60,
            long_break_secs: u64::from(IntervalMode::LongBreak.default_minutes()) * 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults_match_widget() {
        let c = ModeCatalog::default();
        assert_eq!(c.duration(IntervalMode::Work), 45 * 60);
        assert_eq!(c.duration(IntervalMode::ShortBreak), 15 * 60);
        assert_eq!(c.duration(IntervalMode::LongBreak), 30 * 60);
    }

    #[test]
    fn set_duration_clamps_both_ends() {
        let mut c = ModeCatalog::default();
        assert_eq!(c.set_duration(IntervalMode::Work, 0), 60);
        assert_eq!(c.set_duration(IntervalMode::Work, 500), 120 * 60);
    }

    #[test]
    fn adjust_steps_and_stops_at_bounds() {
        let mut c = ModeCatalog::from_minutes(5, 5, 118);
        c.adjust_duration(IntervalMode::Work, -DURATION_STEP_MIN);
        assert_eq!(c.minutes(IntervalMode::Work), 1);
        c.adjust_duration(IntervalMode::LongBreak, DURATION_STEP_MIN);
        assert_eq!(c.minutes(IntervalMode::LongBreak), 120);
        c.adjust_duration(IntervalMode::ShortBreak, DURATION_STEP_MIN);
        assert_eq!(c.minutes(IntervalMode::ShortBreak), 10);
    }

    #[test]
    fn complement_pairs_work_with_breaks() {
        assert_eq!(IntervalMode::Work.complement(), IntervalMode::ShortBreak);
        assert_eq!(IntervalMode::ShortBreak.complement(), IntervalMode::Work);
        assert_eq!(IntervalMode::LongBreak.complement(), IntervalMode::Work);
    }

    #[test]
    fn parses_cli_spellings() {
        assert_eq!("pomodoro".parse::<IntervalMode>(), Ok(IntervalMode::Work));
        assert_eq!("short-break".parse::<IntervalMode>(), Ok(IntervalMode::ShortBreak));
        assert_eq!("LONG".parse::<IntervalMode>(), Ok(IntervalMode::LongBreak));
        assert!("nap".parse::<IntervalMode>().is_err());
    }

    fn any_mode() -> impl Strategy<Value = IntervalMode> {
        prop_oneof![
            Just(IntervalMode::Work),
            Just(IntervalMode::ShortBreak),
            Just(IntervalMode::LongBreak),
        ]
    }

    proptest! {
        #[test]
        fn set_then_get_returns_clamped_value(mode in any_mode(), minutes in 0u32..1000) {
            let mut c = ModeCatalog::default();
            c.set_duration(mode, minutes);
            let expected = u64::from(minutes.clamp(1, 120)) * 60;
            prop_assert_eq!(c.duration(mode), expected);
            // Re-applying the stored value changes nothing.
            c.set_duration(mode, c.minutes(mode));
            prop_assert_eq!(c.duration(mode), expected);
            prop_assert!(c.duration(mode) >= 60);
        }
    }
}
