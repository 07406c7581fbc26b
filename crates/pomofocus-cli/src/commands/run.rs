use clap::Args;
use pomofocus_core::timer::DURATION_STEP_MIN;
use pomofocus_core::{
    Command, FanoutNotifier, IntervalMode, LogNotifier, MemorySettingsStore, Outcome, Phase,
    Policy, Session, SessionHandle, SettingsStore, TaskId, TimerEngine, TimerSnapshot,
    TomlSettingsStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::terminal::{status_line, task_lines, TerminalNotifier};

const HELP: &str = "\
commands:
  start | pause | toggle | stop     control the countdown
  mode <work|short|long>            switch mode (idle only)
  duration <mode> <minutes>         set a mode's length
  longer <mode> | shorter <mode>    adjust a mode's length by 5 minutes
  add <pomodoros> <name>            queue a task
  toggle-task <id>                  toggle one pomodoro on a task
  required <id> <pomodoros>         change a task's target
  remove <id>                       delete a task
  tasks | status                    show the queue or the timer
  auto|sound|animations on|off      policy flags
  help | quit";

#[derive(Args)]
pub struct RunArgs {
    /// Queue a task as NAME or NAME:POMODOROS (repeatable)
    #[arg(long = "task", value_name = "NAME[:N]")]
    tasks: Vec<String>,
    /// Mode to begin in
    #[arg(long)]
    mode: Option<IntervalMode>,
    /// Start the countdown right away
    #[arg(long)]
    start: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    Auto,
    Sound,
    Animations,
}

/// One parsed line of interactive input.
#[derive(Debug, PartialEq)]
enum Input {
    Send(Command),
    SetFlag(Flag, bool),
    Tasks,
    Status,
    Help,
    Quit,
    Empty,
}

fn parse_on_off(value: Option<&str>) -> Result<bool, String> {
    match value {
        Some("on") => Ok(true),
        Some("off") => Ok(false),
        _ => Err("expected 'on' or 'off'".to_string()),
    }
}

fn parse_arg<T: std::str::FromStr>(value: Option<&str>, what: &str) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("missing {what}"))?;
    value.parse().map_err(|_| format!("invalid {what} '{value}'"))
}

fn parse_mode(value: Option<&str>) -> Result<IntervalMode, String> {
    value.ok_or_else(|| "missing mode".to_string())?.parse()
}

fn parse_line(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Input::Empty);
    };
    let input = match verb {
        "start" => Input::Send(Command::Start),
        "pause" => Input::Send(Command::Pause),
        "toggle" | "t" => Input::Send(Command::Toggle),
        "stop" => Input::Send(Command::Stop),
        "mode" => Input::Send(Command::SwitchMode(parse_mode(words.next())?)),
        "duration" => {
            let mode = parse_mode(words.next())?;
            let minutes = parse_arg(words.next(), "minutes")?;
            Input::Send(Command::SetDuration { mode, minutes })
        }
        "longer" | "shorter" => {
            let mode = parse_mode(words.next())?;
            let step = if verb == "longer" {
                DURATION_STEP_MIN
            } else {
                -DURATION_STEP_MIN
            };
            Input::Send(Command::AdjustDuration {
                mode,
                delta_minutes: step,
            })
        }
        "add" => {
            let required = parse_arg(words.next(), "pomodoro count")?;
            let name = words.collect::<Vec<_>>().join(" ");
            if name.is_empty() {
                return Err("missing task name".to_string());
            }
            Input::Send(Command::AddTask { name, required })
        }
        "toggle-task" | "done" => Input::Send(Command::ToggleTask(parse_arg::<TaskId>(
            words.next(),
            "task id",
        )?)),
        "required" => {
            let id = parse_arg(words.next(), "task id")?;
            let required = parse_arg(words.next(), "pomodoro count")?;
            Input::Send(Command::SetTaskRequired { id, required })
        }
        "remove" | "rm" => Input::Send(Command::RemoveTask(parse_arg(words.next(), "task id")?)),
        "auto" => Input::SetFlag(Flag::Auto, parse_on_off(words.next())?),
        "sound" => Input::SetFlag(Flag::Sound, parse_on_off(words.next())?),
        "animations" => Input::SetFlag(Flag::Animations, parse_on_off(words.next())?),
        "tasks" | "ls" => Input::Tasks,
        "status" | "s" => Input::Status,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(input)
}

/// `NAME` or `NAME:N`; a missing or unparsable count means one pomodoro.
fn parse_task_arg(arg: &str) -> (&str, u32) {
    match arg.rsplit_once(':') {
        Some((name, n)) => match n.trim().parse() {
            Ok(n) => (name, n),
            Err(_) => (arg, 1),
        },
        None => (arg, 1),
    }
}

fn with_flag(mut policy: Policy, flag: Flag, on: bool) -> Policy {
    match flag {
        Flag::Auto => policy.auto_switch = on,
        Flag::Sound => policy.sound_enabled = on,
        Flag::Animations => policy.animations_enabled = on,
    }
    policy
}

/// Repaint on mode or phase changes and on each whole minute while running.
fn should_render(prev: &TimerSnapshot, next: &TimerSnapshot) -> bool {
    next.mode != prev.mode
        || next.phase != prev.phase
        || (next.phase == Phase::Running
            && next.remaining_secs != prev.remaining_secs
            && next.remaining_secs % 60 == 0)
}

fn open_store() -> Box<dyn SettingsStore> {
    match TomlSettingsStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!(error = %e, "settings will not be persisted");
            Box::new(MemorySettingsStore::new())
        }
    }
}

/// Why the session ignored `command`.
fn ignored_reason(command: &Command) -> &'static str {
    match command {
        Command::SetTaskRequired { required: 0, .. } => "pomodoro count must be at least 1",
        Command::AddTask { .. } => "task name is empty",
        _ => "no such task",
    }
}

fn report(outcome: &Outcome, snapshot: &TimerSnapshot, reason: &str) {
    match outcome {
        Outcome::Applied => println!("{}", status_line(snapshot)),
        Outcome::TaskAdded(id) => {
            println!("added task {id}");
            println!("{}", status_line(snapshot));
        }
        Outcome::Ignored => eprintln!("warning: ignored, {reason}"),
        Outcome::Refused(e) => eprintln!("warning: {e}"),
    }
}

/// Apply one input. Returns the fresh snapshot when the session was asked.
async fn execute(
    handle: &SessionHandle,
    input: Input,
    last: &TimerSnapshot,
) -> Result<Option<TimerSnapshot>, Box<dyn std::error::Error>> {
    let command = match input {
        Input::Send(command) => command,
        Input::SetFlag(flag, on) => Command::SetPolicy(with_flag(last.policy, flag, on)),
        Input::Tasks => {
            if last.tasks.is_empty() {
                println!("no tasks");
            }
            for line in task_lines(last) {
                println!("{line}");
            }
            return Ok(None);
        }
        Input::Status => {
            println!("{}", status_line(last));
            return Ok(None);
        }
        Input::Help => {
            println!("{HELP}");
            return Ok(None);
        }
        Input::Quit | Input::Empty => return Ok(None),
    };
    let reason = ignored_reason(&command);
    let reply = handle.send(command).await?;
    report(&reply.outcome, &reply.snapshot, reason);
    Ok(Some(reply.snapshot))
}

async fn interactive(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store();
    let settings = store.load_or_default();
    let notifier = FanoutNotifier::new()
        .with(TerminalNotifier::stderr())
        .with(LogNotifier);
    let mut engine = TimerEngine::new(&settings).with_notifier(Box::new(notifier));
    for arg in &args.tasks {
        let (name, required) = parse_task_arg(arg);
        if engine.add_task(name, required).is_none() {
            eprintln!("warning: skipped task with empty name");
        }
    }
    if let Some(mode) = args.mode {
        engine.switch_mode(mode)?;
    }

    let (handle, join) = Session::spawn(engine, store);
    let mut snapshots = handle.snapshots();
    let mut last = snapshots.borrow_and_update().clone();
    if args.start {
        last = handle.start().await?.applied()?;
    }
    println!("{}", status_line(&last));
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line) {
                    Ok(Input::Quit) => break,
                    Ok(input) => {
                        if let Some(snapshot) = execute(&handle, input, &last).await? {
                            last = snapshot;
                        }
                    }
                    Err(msg) => eprintln!("{msg}"),
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if should_render(&last, &snapshot) {
                    println!("{}", status_line(&snapshot));
                }
                last = snapshot;
            }
        }
    }

    // Dropping the last handle ends the session, which saves settings.
    drop(snapshots);
    drop(handle);
    join.await?;
    Ok(())
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(interactive(args))
}
