//! Notifier interface.
//!
//! The engine hands every [`Event`] to a notifier. Notifiers decide how to
//! present it (sound, terminal bell, log line); their failures are logged by
//! the engine and never reach timer or task state.

use std::sync::{Arc, Mutex};

use crate::error::NotifyError;
use crate::events::Event;
use crate::storage::Policy;

pub trait Notifier: Send {
    /// Identifier used in log lines.
    fn name(&self) -> &str;

    /// Present `event`. `policy` carries the user's sound/animation flags.
    fn notify(&mut self, event: &Event, policy: &Policy) -> Result<(), NotifyError>;
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn name(&self) -> &str {
        "null"
    }

    fn notify(&mut self, _event: &Event, _policy: &Policy) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Writes events as `tracing` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn notify(&mut self, event: &Event, policy: &Policy) -> Result<(), NotifyError> {
        tracing::info!(sound = policy.sound_enabled, "{}", event.message());
        Ok(())
    }
}

/// Keeps every event in a shared buffer. Clones share the buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    fn notify(&mut self, event: &Event, _policy: &Policy) -> Result<(), NotifyError> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        Ok(())
    }
}

/// Forwards each event to several notifiers; one failing does not stop the rest.
#[derive(Default)]
pub struct FanoutNotifier {
    targets: Vec<Box<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, notifier: impl Notifier + 'static) -> Self {
        self.targets.push(Box::new(notifier));
        self
    }
}

impl Notifier for FanoutNotifier {
    fn name(&self) -> &str {
        "fanout"
    }

    fn notify(&mut self, event: &Event, policy: &Policy) -> Result<(), NotifyError> {
        let mut first_err = None;
        for target in &mut self.targets {
            if let Err(e) = target.notify(event, policy) {
                tracing::warn!(notifier = target.name(), error = %e, "notifier failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
