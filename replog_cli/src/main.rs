use clap::{Parser, Subcommand};
use replog_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "replog")]
#[command(about = "Workout session logger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new workout session
    Start {
        /// Workout name, e.g. "Leg day"
        name: String,
    },

    /// Add a set to an exercise in the open session
    Add {
        exercise: String,
        weight: f64,
        reps: u32,

        /// Rest target in seconds after this set
        #[arg(long)]
        rest: Option<u32>,

        /// Record the set as already completed
        #[arg(long)]
        completed: bool,
    },

    /// Mark a set completed and start its rest countdown
    Done {
        exercise: String,

        /// Set number (1-based)
        set: usize,

        /// Stay in the foreground and tick the rest countdown
        #[arg(long)]
        wait: bool,
    },

    /// Remove a set from the open session
    Remove {
        exercise: String,

        /// Set number (1-based)
        set: usize,
    },

    /// Run a rest countdown in the foreground
    Rest {
        /// Target seconds (defaults to the configured rest target)
        seconds: Option<u32>,
    },

    /// Show the open or recoverable session
    Status,

    /// Finish the open session and save it
    Finish,

    /// Retry a failed save from the first step that did not succeed
    Retry,

    /// Resume a recoverable session
    Resume,

    /// Discard a recoverable session
    Discard,

    /// List recently saved workouts
    History {
        /// Window in days
        #[arg(long, default_value_t = 30)]
        days: i64,
    },

    /// Export saved workouts to CSV and archive the log
    Export,
}

fn main() -> Result<()> {
    // Initialize logging
    replog_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Start { name } => cmd_start(data_dir, &config, &name),
        Commands::Add {
            exercise,
            weight,
            reps,
            rest,
            completed,
        } => cmd_add(data_dir, &config, &exercise, weight, reps, rest, completed),
        Commands::Done {
            exercise,
            set,
            wait,
        } => cmd_done(data_dir, &config, &exercise, set, wait),
        Commands::Remove { exercise, set } => cmd_remove(data_dir, &config, &exercise, set),
        Commands::Rest { seconds } => cmd_rest(data_dir, &config, seconds),
        Commands::Status => cmd_status(data_dir),
        Commands::Finish => cmd_finish(data_dir, &config),
        Commands::Retry => cmd_retry(data_dir, &config),
        Commands::Resume => cmd_resume(data_dir, &config),
        Commands::Discard => cmd_discard(data_dir, &config),
        Commands::History { days } => cmd_history(data_dir, days),
        Commands::Export => cmd_export(data_dir),
    }
}

fn snapshot_path(data_dir: &Path) -> PathBuf {
    data_dir.join("session.json")
}

fn build_tracker(data_dir: &Path, config: &Config) -> Result<SessionTracker<JsonlStore>> {
    std::fs::create_dir_all(data_dir)?;
    let store = JsonlStore::new(data_dir.join("store"));
    SessionTracker::new(
        store,
        config,
        snapshot_path(data_dir),
        Arc::new(SystemClock),
    )
}

/// Pick up the session persisted by a previous invocation, if one is open.
fn continue_open(tracker: &mut SessionTracker<JsonlStore>) -> Result<()> {
    if !tracker.continue_open()? && tracker.recoverable().is_some() {
        return Err(Error::State(
            "a previous session needs attention; run `replog status`, then \
             `replog retry`, `replog resume` or `replog discard`"
                .into(),
        ));
    }
    Ok(())
}

fn cmd_start(data_dir: PathBuf, config: &Config, name: &str) -> Result<()> {
    let mut tracker = build_tracker(&data_dir, config)?;
    if tracker.recoverable().is_some() {
        println!("A previous session was left unfinished:");
        if let Some(session) = tracker.recoverable() {
            print_session(session);
        }
        println!("Run `replog resume` to pick it up or `replog discard` to drop it.");
        return Ok(());
    }

    tracker.start_session(name)?;
    println!("Session '{}' started. Log sets with `replog add`.", name);
    Ok(())
}

fn cmd_add(
    data_dir: PathBuf,
    config: &Config,
    exercise: &str,
    weight: f64,
    reps: u32,
    rest: Option<u32>,
    completed: bool,
) -> Result<()> {
    let mut tracker = build_tracker(&data_dir, config)?;
    continue_open(&mut tracker)?;

    // A known exercise contributes its suggested rest target
    let rest_target = rest.or_else(|| default_rest_for(exercise));
    let set = Set {
        weight,
        reps,
        rest_target_seconds: rest_target,
        completed,
        editing: false,
    };
    tracker.add_set(exercise, set)?;

    let count = tracker
        .session()
        .exercise(exercise)
        .map(|e| e.sets.len())
        .unwrap_or(0);
    println!(
        "Added set {} to {}: {} x {}{}",
        count,
        exercise,
        weight,
        reps,
        if completed { " (completed)" } else { "" }
    );
    Ok(())
}

fn cmd_done(
    data_dir: PathBuf,
    config: &Config,
    exercise: &str,
    set: usize,
    wait: bool,
) -> Result<()> {
    if set == 0 {
        return Err(Error::State("set numbers are 1-based".into()));
    }
    let mut tracker = build_tracker(&data_dir, config)?;
    continue_open(&mut tracker)?;

    let tick = tracker.complete_set(exercise, set - 1)?;
    println!(
        "Set {} of {} done. Rest target: {}s",
        set, exercise, tick.remaining_seconds
    );

    if wait {
        run_rest_countdown(&mut tracker)?;
    }
    Ok(())
}

fn cmd_remove(data_dir: PathBuf, config: &Config, exercise: &str, set: usize) -> Result<()> {
    if set == 0 {
        return Err(Error::State("set numbers are 1-based".into()));
    }
    let mut tracker = build_tracker(&data_dir, config)?;
    continue_open(&mut tracker)?;

    tracker.remove_set(exercise, set - 1)?;
    println!("Removed set {} of {}.", set, exercise);
    Ok(())
}

fn cmd_rest(data_dir: PathBuf, config: &Config, seconds: Option<u32>) -> Result<()> {
    let mut tracker = build_tracker(&data_dir, config)?;
    continue_open(&mut tracker)?;

    let tick = tracker.start_rest(seconds)?;
    println!("Resting for {}s...", tick.remaining_seconds);
    run_rest_countdown(&mut tracker)
}

/// Tick the rest timer in the foreground until the target is reached.
fn run_rest_countdown(tracker: &mut SessionTracker<JsonlStore>) -> Result<()> {
    loop {
        std::thread::sleep(std::time::Duration::from_millis(250));
        let outcome = tracker.tick();
        if let Some(tick) = outcome.rest {
            if tick.just_completed {
                println!();
                println!("Rest complete.");
                tracker.stop_rest(false);
                return Ok(());
            }
            print!("\r  {:>4}s remaining", tick.remaining_seconds);
            io::stdout().flush()?;
        }
    }
}

fn cmd_status(data_dir: PathBuf) -> Result<()> {
    match Session::load_snapshot(&snapshot_path(&data_dir))? {
        Some(session) => {
            print_session(&session);
            match session.status {
                WorkoutStatus::Active => {
                    println!("Log sets with `replog add`, then `replog finish`.")
                }
                WorkoutStatus::Partial | WorkoutStatus::Failed => {
                    println!("Save did not complete; run `replog retry`.")
                }
                _ => println!("Run `replog resume` or `replog discard`."),
            }
        }
        None => println!("No session in progress."),
    }
    Ok(())
}

fn cmd_finish(data_dir: PathBuf, config: &Config) -> Result<()> {
    let mut tracker = build_tracker(&data_dir, config)?;
    continue_open(&mut tracker)?;

    let outcome = tracker.finish()?;
    report_save_outcome(&outcome);
    Ok(())
}

fn cmd_retry(data_dir: PathBuf, config: &Config) -> Result<()> {
    let mut tracker = build_tracker(&data_dir, config)?;
    let outcome = tracker.retry()?;
    report_save_outcome(&outcome);
    Ok(())
}

fn cmd_resume(data_dir: PathBuf, config: &Config) -> Result<()> {
    let mut tracker = build_tracker(&data_dir, config)?;
    tracker.resume_recovered()?;
    let session = tracker.session();
    println!(
        "Resumed '{}' at {} elapsed ({} sets).",
        session.name,
        fmt_duration(session.elapsed_seconds),
        session.total_sets()
    );
    Ok(())
}

fn cmd_discard(data_dir: PathBuf, config: &Config) -> Result<()> {
    let mut tracker = build_tracker(&data_dir, config)?;
    tracker.discard_recovered()?;
    println!("Discarded the unfinished session.");
    Ok(())
}

fn cmd_history(data_dir: PathBuf, days: i64) -> Result<()> {
    let store = JsonlStore::new(data_dir.join("store"));
    let workouts = load_recent_workouts(&store.headers_path(), days)?;

    if workouts.is_empty() {
        println!("No workouts saved in the last {} days.", days);
        return Ok(());
    }

    println!("Workouts from the last {} days:", days);
    for workout in &workouts {
        println!(
            "  {}  {}  {:>9}  {} exercises  [{}]",
            workout.performed_at.format("%Y-%m-%d %H:%M"),
            workout.name,
            fmt_duration(workout.duration_seconds),
            workout.exercise_count,
            &workout.id.to_string()[..8]
        );
    }
    Ok(())
}

fn cmd_export(data_dir: PathBuf) -> Result<()> {
    let store = JsonlStore::new(data_dir.join("store"));
    let csv_path = data_dir.join("workouts.csv");
    let count = headers_to_csv_and_archive(&store.headers_path(), &csv_path)?;

    if count == 0 {
        println!("Nothing to export.");
    } else {
        println!("Exported {} workouts to {:?}.", count, csv_path);
    }
    Ok(())
}

fn report_save_outcome(outcome: &Session) {
    match outcome.status {
        WorkoutStatus::Saved => {
            println!(
                "Workout '{}' saved: {} sets, volume {:.1}, duration {}.",
                outcome.name,
                outcome.completed_sets(),
                outcome.total_volume(),
                fmt_duration(outcome.elapsed_seconds)
            );
        }
        status => {
            println!("Save did not complete (status: {:?}).", status);
            if let Some(progress) = &outcome.save_progress {
                println!(
                    "  {}/{} steps done, stopped at {:?}.",
                    progress.completed, progress.total, progress.step
                );
                for error in &progress.errors {
                    println!(
                        "  error [{:?}{}]: {}{}",
                        error.kind,
                        if error.recoverable { ", recoverable" } else { "" },
                        error.message,
                        error
                            .details
                            .as_deref()
                            .map(|d| format!(" ({})", d))
                            .unwrap_or_default()
                    );
                }
            }
            println!("Your sets are kept; run `replog retry` when ready.");
        }
    }
}

fn print_session(session: &Session) {
    println!(
        "Session '{}' ({:?}) - elapsed {}, started {}",
        session.name,
        session.status,
        fmt_duration(session.elapsed_seconds),
        session.started_at.format("%Y-%m-%d %H:%M")
    );
    for exercise in &session.exercises {
        println!("  {}", exercise.name);
        for (i, set) in exercise.sets.iter().enumerate() {
            println!(
                "    {}. {} x {} {}{}",
                i + 1,
                set.weight,
                set.reps,
                if set.completed { "[done]" } else { "[open]" },
                set.rest_target_seconds
                    .map(|r| format!("  rest {}s", r))
                    .unwrap_or_default()
            );
        }
    }
    if session.total_sets() > 0 {
        println!(
            "  total volume (completed): {:.1}",
            session.total_volume()
        );
    }
}

fn fmt_duration(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}
