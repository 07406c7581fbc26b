//! Terminal presentation: the notifier used by `run` and status formatting.

use std::io::Write;

use chrono::{DateTime, Local, Utc};
use pomofocus_core::{Event, Notifier, NotifyError, Phase, Policy, Projection, TimerSnapshot};

/// Prints event notices to stderr and rings the bell when sound is on.
pub struct TerminalNotifier<W: Write + Send> {
    out: W,
}

impl TerminalNotifier<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self {
            out: std::io::stderr(),
        }
    }
}

impl<W: Write + Send> TerminalNotifier<W> {
    #[cfg(test)]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Notifier for TerminalNotifier<W> {
    fn name(&self) -> &str {
        "terminal"
    }

    fn notify(&mut self, event: &Event, policy: &Policy) -> Result<(), NotifyError> {
        let bell = if policy.sound_enabled { "\x07" } else { "" };
        writeln!(self.out, "{bell}>> {}", event.message())?;
        self.out.flush()?;
        Ok(())
    }
}

/// `MM:SS` countdown.
pub fn clock_face(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn local_hhmm(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

pub fn projection_text(projection: &Projection) -> String {
    match projection {
        Projection::AllComplete => "All tasks completed!".to_string(),
        Projection::Pending {
            remaining_intervals,
            finish_at,
            ..
        } => format!(
            "{remaining_intervals} left, done by {}",
            local_hhmm(*finish_at)
        ),
    }
}

/// One-line summary of a snapshot.
pub fn status_line(snap: &TimerSnapshot) -> String {
    let phase = match snap.phase {
        Phase::Idle => "ready",
        Phase::Running => "running",
        Phase::Paused => "paused",
    };
    let task = match &snap.current_task {
        Some(t) => format!(
            "#{} {} {}/{}",
            snap.current_index + 1,
            t.name,
            t.completed_intervals(),
            t.required_intervals()
        ),
        None => "#1 Add your first task".to_string(),
    };
    format!(
        "[{}] {} {} | {} | {}",
        snap.label,
        clock_face(snap.remaining_secs),
        phase,
        task,
        projection_text(&snap.projection)
    )
}

/// Task table, one line per task, marking the current one.
pub fn task_lines(snap: &TimerSnapshot) -> Vec<String> {
    snap.tasks
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let cursor = if i == snap.current_index { '>' } else { ' ' };
            let done = if t.is_complete() { 'x' } else { ' ' };
            format!(
                "{cursor} [{done}] {:>3}/{:<3} {}  (id {})",
                t.completed_intervals(),
                t.required_intervals(),
                t.name,
                t.id
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomofocus_core::{IntervalMode, Settings, TimerEngine};

    #[test]
    fn clock_face_pads() {
        assert_eq!(clock_face(45 * 60), "45:00");
        assert_eq!(clock_face(65), "01:05");
        assert_eq!(clock_face(0), "00:00");
    }

    #[test]
    fn notifier_rings_only_with_sound() {
        let event = Event::IntervalCompleted {
            mode: IntervalMode::Work,
            credited_task: None,
            at: Utc::now(),
        };
        let mut n = TerminalNotifier::new(Vec::new());
        n.notify(&event, &Policy::default()).unwrap();
        let quiet = Policy {
            sound_enabled: false,
            ..Policy::default()
        };
        n.notify(&event, &quiet).unwrap();
        let out = String::from_utf8(n.into_inner()).unwrap();
        assert_eq!(out, "\x07>> Pomodoro completed!\n>> Pomodoro completed!\n");
    }

    #[test]
    fn status_line_without_tasks() {
        let engine = TimerEngine::new(&Settings::default());
        let line = status_line(&engine.snapshot());
        assert!(line.starts_with("[Pomodoro] 45:00 ready"));
        assert!(line.contains("Add your first task"));
        assert!(line.ends_with("All tasks completed!"));
    }

    #[test]
    fn task_lines_mark_current() {
        let mut engine = TimerEngine::new(&Settings::default());
        engine.add_task("one", 1);
        engine.add_task("two", 2);
        let lines = task_lines(&engine.snapshot());
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("> [ ]"));
        assert!(lines[1].starts_with("  [ ]"));
        assert!(lines[1].contains("two"));
    }
}
