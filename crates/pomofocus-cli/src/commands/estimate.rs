use chrono::{DateTime, Local, NaiveTime, Utc};
use clap::Args;
use pomofocus_core::projection::{self, Projection};
use pomofocus_core::{IntervalMode, SettingsStore, TaskQueue, TomlSettingsStore};

use crate::terminal::{clock_face, local_hhmm};

#[derive(Args)]
pub struct EstimateArgs {
    /// Pomodoros required by each task, in queue order
    #[arg(long = "task", value_name = "N", required = true)]
    tasks: Vec<u32>,
    /// Start time (HH:MM, local); defaults to now
    #[arg(long)]
    at: Option<String>,
    /// Work interval length in minutes (defaults to config)
    #[arg(long)]
    work: Option<u32>,
    /// Short break length in minutes (defaults to config)
    #[arg(long)]
    short_break: Option<u32>,
    /// Print the projection as JSON
    #[arg(long)]
    json: bool,
}

fn parse_start(at: &str) -> Result<DateTime<Utc>, String> {
    let time = NaiveTime::parse_from_str(at.trim(), "%H:%M")
        .map_err(|_| format!("invalid time '{at}', expected HH:MM"))?;
    Local::now()
        .date_naive()
        .and_time(time)
        .and_local_timezone(Local)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| format!("'{at}' does not exist in the local timezone today"))
}

fn build_queue(counts: &[u32], now: DateTime<Utc>) -> TaskQueue {
    let mut queue = TaskQueue::new();
    for (i, &n) in counts.iter().enumerate() {
        queue.enqueue(&format!("task {}", i + 1), n, now);
    }
    queue
}

pub fn run(args: EstimateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = TomlSettingsStore::open_default()?.load_or_default();
    let mut catalog = settings.catalog();
    if let Some(minutes) = args.work {
        catalog.set_duration(IntervalMode::Work, minutes);
    }
    if let Some(minutes) = args.short_break {
        catalog.set_duration(IntervalMode::ShortBreak, minutes);
    }

    let start = match args.at.as_deref() {
        Some(at) => parse_start(at)?,
        None => Utc::now(),
    };
    let queue = build_queue(&args.tasks, start);
    let projection = projection::project(&queue, &catalog, start);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&projection)?);
        return Ok(());
    }
    match projection {
        Projection::AllComplete => println!("All tasks completed!"),
        Projection::Pending {
            remaining_intervals,
            total_secs,
            finish_at,
        } => {
            println!(
                "{remaining_intervals} pomodoros ({}m work, {}m breaks)",
                catalog.minutes(IntervalMode::Work),
                catalog.minutes(IntervalMode::ShortBreak)
            );
            println!("total {}", clock_face(total_secs));
            println!("finish at {}", local_hhmm(finish_at));
        }
    }
    Ok(())
}
