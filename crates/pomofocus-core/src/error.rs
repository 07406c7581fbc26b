//! Core error types for pomofocus-core.
//!
//! Nothing in the engine is fatal: these errors describe collaborator
//! failures (settings store, notifier) and rejected transitions, which the
//! caller may log or surface as a soft warning.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::{IntervalMode, Phase};

/// Core error type for pomofocus-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rejected state machine transitions
    #[error("Transition rejected: {0}")]
    Transition(#[from] TransitionError),

    /// The session driver has shut down and no longer accepts commands
    #[error("Session closed")]
    SessionClosed,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Home/config directory could not be determined or created
    #[error("Configuration directory unavailable: {0}")]
    DirUnavailable(String),
}

/// Failure raised by a notifier implementation.
///
/// The engine never propagates these; they are logged and dropped.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Output device (terminal, audio) is not available
    #[error("Notification output unavailable: {0}")]
    Unavailable(String),

    /// Writing the notification failed
    #[error("Failed to deliver notification: {0}")]
    Delivery(#[from] std::io::Error),
}

/// A command that is not legal in the engine's current phase.
///
/// Returned instead of mutating state; the engine is left untouched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// Mode switches are only allowed while idle
    #[error("cannot switch to {target} while the timer is {phase}")]
    ModeLockedWhileRunning { target: IntervalMode, phase: Phase },

    /// `start` issued while a countdown is already running
    #[error("timer is already running")]
    AlreadyRunning,

    /// `pause` issued while no countdown is running
    #[error("timer is not running")]
    NotRunning,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_error_names_target_and_phase() {
        let err = TransitionError::ModeLockedWhileRunning {
            target: IntervalMode::ShortBreak,
            phase: Phase::Running,
        };
        assert_eq!(
            err.to_string(),
            "cannot switch to Short Break while the timer is running"
        );
    }

    #[test]
    fn config_error_wraps_into_core_error() {
        let err: CoreError = ConfigError::UnknownKey("durations.nap".into()).into();
        assert!(matches!(err, CoreError::Config(ConfigError::UnknownKey(_))));
        assert!(err.to_string().contains("durations.nap"));
    }
}
