//! Async session driver.
//!
//! A [`Session`] is a tokio task that exclusively owns a [`TimerEngine`].
//! User commands arrive over an mpsc channel and are answered on a oneshot;
//! the one-second countdown interval and the sixty-second projection refresh
//! exist only while the engine is running. Everything runs inside a single
//! `select!` loop, so commands and ticks are applied strictly one at a time
//! and in arrival order.
//!
//! `pause` and `stop` drop the countdown interval before their reply is
//! sent, so no tick can reach the engine after the caller observes the
//! reply. The interval skips missed ticks rather than bursting to catch up.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::error::{CoreError, Result, TransitionError};
use crate::projection::{Projection, REFRESH_INTERVAL_SECS};
use crate::storage::{Policy, SettingsStore};
use crate::task::TaskId;
use crate::timer::{IntervalMode, TimerEngine, TimerSnapshot};

const TICK: Duration = Duration::from_secs(1);
const COMMAND_BUFFER: usize = 32;

/// Everything a front end can ask of a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Toggle,
    Stop,
    SwitchMode(IntervalMode),
    SetDuration { mode: IntervalMode, minutes: u32 },
    AdjustDuration { mode: IntervalMode, delta_minutes: i32 },
    SetPolicy(Policy),
    AddTask { name: String, required: u32 },
    ToggleTask(TaskId),
    SetTaskRequired { id: TaskId, required: u32 },
    RemoveTask(TaskId),
    Snapshot,
}

/// What happened to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    TaskAdded(TaskId),
    /// Validation failure or unknown task id; nothing changed.
    Ignored,
    /// Not legal in the current phase; nothing changed.
    Refused(TransitionError),
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub outcome: Outcome,
    pub snapshot: TimerSnapshot,
}

impl Reply {
    /// The snapshot, or the transition error if the command was refused.
    pub fn applied(self) -> Result<TimerSnapshot> {
        match self.outcome {
            Outcome::Refused(e) => Err(e.into()),
            _ => Ok(self.snapshot),
        }
    }
}

struct Request {
    command: Command,
    reply: oneshot::Sender<Reply>,
}

/// Cheap-to-clone handle for talking to a session task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Request>,
    snapshots: watch::Receiver<TimerSnapshot>,
    projection: watch::Receiver<Projection>,
}

impl SessionHandle {
    /// Send a command and wait for the session to apply it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SessionClosed`] if the session task has exited.
    pub async fn send(&self, command: Command) -> Result<Reply> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request { command, reply })
            .await
            .map_err(|_| CoreError::SessionClosed)?;
        rx.await.map_err(|_| CoreError::SessionClosed)
    }

    pub async fn start(&self) -> Result<Reply> {
        self.send(Command::Start).await
    }

    pub async fn pause(&self) -> Result<Reply> {
        self.send(Command::Pause).await
    }

    pub async fn stop(&self) -> Result<Reply> {
        self.send(Command::Stop).await
    }

    pub async fn snapshot(&self) -> Result<TimerSnapshot> {
        Ok(self.send(Command::Snapshot).await?.snapshot)
    }

    /// Receiver updated after every command and every tick.
    pub fn snapshots(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshots.clone()
    }

    /// Receiver updated when the projection inputs change, and once a
    /// minute while running.
    pub fn projection(&self) -> watch::Receiver<Projection> {
        self.projection.clone()
    }
}

/// The session actor. Construct with [`Session::spawn`].
pub struct Session {
    engine: TimerEngine,
    store: Box<dyn SettingsStore>,
    rx: mpsc::Receiver<Request>,
    snapshots: watch::Sender<TimerSnapshot>,
    projection: watch::Sender<Projection>,
    ticker: Option<Interval>,
    refresher: Option<Interval>,
}

impl Session {
    /// Spawn the session on the current tokio runtime.
    ///
    /// The task ends when every [`SessionHandle`] has been dropped; the
    /// current settings are saved to `store` on the way out.
    pub fn spawn(
        engine: TimerEngine,
        store: Box<dyn SettingsStore>,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshots, snapshot_rx) = watch::channel(engine.snapshot());
        let (projection, projection_rx) = watch::channel(engine.projection());

        let session = Session {
            engine,
            store,
            rx,
            snapshots,
            projection,
            ticker: None,
            refresher: None,
        };
        let join = tokio::spawn(session.run());

        let handle = SessionHandle {
            tx,
            snapshots: snapshot_rx,
            projection: projection_rx,
        };
        (handle, join)
    }

    async fn run(mut self) {
        tracing::debug!("session started");
        loop {
            tokio::select! {
                biased;
                request = self.rx.recv() => match request {
                    Some(request) => self.handle(request),
                    None => break,
                },
                _ = next_tick(&mut self.ticker) => self.on_tick(),
                _ = next_tick(&mut self.refresher) => self.publish_projection(),
            }
        }
        self.store.save_or_log(&self.engine.settings());
        tracing::debug!("session closed");
    }

    fn handle(&mut self, Request { command, reply }: Request) {
        let outcome = self.apply(command);
        self.sync_timers();
        self.publish_snapshot();
        self.publish_projection();
        let _ = reply.send(Reply {
            outcome,
            snapshot: self.engine.snapshot(),
        });
    }

    fn apply(&mut self, command: Command) -> Outcome {
        let engine = &mut self.engine;
        match command {
            Command::Start => refused_or_applied(engine.start()),
            Command::Pause => refused_or_applied(engine.pause()),
            Command::Toggle => {
                engine.toggle();
                Outcome::Applied
            }
            Command::Stop => {
                engine.stop();
                Outcome::Applied
            }
            Command::SwitchMode(mode) => refused_or_applied(engine.switch_mode(mode)),
            Command::SetDuration { mode, minutes } => {
                engine.set_duration(mode, minutes);
                self.store.save_or_log(&engine.settings());
                Outcome::Applied
            }
            Command::AdjustDuration { mode, delta_minutes } => {
                engine.adjust_duration(mode, delta_minutes);
                self.store.save_or_log(&engine.settings());
                Outcome::Applied
            }
            Command::SetPolicy(policy) => {
                engine.set_policy(policy);
                self.store.save_or_log(&engine.settings());
                Outcome::Applied
            }
            Command::AddTask { name, required } => match engine.add_task(&name, required) {
                Some(id) => Outcome::TaskAdded(id),
                None => Outcome::Ignored,
            },
            Command::ToggleTask(id) => applied_if(engine.toggle_task(id)),
            Command::SetTaskRequired { id, required } => {
                applied_if(engine.set_task_required(id, required))
            }
            Command::RemoveTask(id) => applied_if(engine.remove_task(id).is_some()),
            Command::Snapshot => Outcome::Applied,
        }
    }

    fn on_tick(&mut self) {
        let events = self.engine.tick();
        if !events.is_empty() {
            self.sync_timers();
            self.publish_projection();
        }
        self.publish_snapshot();
    }

    /// Arm the intervals while running, tear them down otherwise.
    fn sync_timers(&mut self) {
        if self.engine.is_running() {
            if self.ticker.is_none() {
                self.ticker = Some(interval_starting_after(TICK));
                self.refresher = Some(interval_starting_after(Duration::from_secs(
                    REFRESH_INTERVAL_SECS,
                )));
            }
        } else {
            self.ticker = None;
            self.refresher = None;
        }
    }

    fn publish_snapshot(&self) {
        self.snapshots.send_replace(self.engine.snapshot());
    }

    fn publish_projection(&self) {
        self.projection.send_replace(self.engine.projection());
    }
}

fn interval_starting_after(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn refused_or_applied(result: std::result::Result<(), TransitionError>) -> Outcome {
    match result {
        Ok(()) => Outcome::Applied,
        Err(e) => Outcome::Refused(e),
    }
}

fn applied_if(changed: bool) -> Outcome {
    if changed {
        Outcome::Applied
    } else {
        Outcome::Ignored
    }
}
