//! pomodoro - Focus timer with work/break intervals
//!
//! Usage:
//!   pomodoro run                 Start the interactive timer
//!   pomodoro status              Show settings and today's progress
//!   pomodoro stats               Show focus statistics
//!   pomodoro config set --work 50
//!   pomodoro sound preview chime
//!   pomodoro notify              Check notification permission
//!   pomodoro clear --yes         Delete all recorded sessions

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use pomodoro::display::{self, color, BOLD, CYAN, GREEN, MAGENTA};
use pomodoro::runner::{self, RunOptions};
use pomodoro::{open_engine, Paths};
use pomodoro_core::{Engine, Mode, SoundOption};

/// Pomodoro - focus timer with work/break intervals
#[derive(Parser)]
#[command(name = "pomodoro")]
#[command(about = "Focus timer alternating work and break intervals")]
#[command(version)]
#[command(after_help = r#"INTERVALS:
    Focus         25 min (default)
    Short break    5 min after each focus session
    Long break    15 min after every 4th focus session

EXAMPLES:
    pomodoro run                    # Interactive timer, press enter to start
    pomodoro run --autostart        # Start counting immediately
    pomodoro run --mode short       # Begin with a short break
    pomodoro config set --work 50   # 50-minute focus sessions
    pomodoro stats                  # Today, this week and all time
    pomodoro sound set chime        # Pick the completion sound

ALIASES:
    pomodoro r     # run
    pomodoro st    # status
"#)]
struct Cli {
    /// Data directory (default: platform data dir, or $POMODORO_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive timer
    #[command(alias = "r")]
    Run {
        /// Mode to begin in: work, short or long
        #[arg(long, value_parser = parse_mode)]
        mode: Option<Mode>,

        /// Start the countdown immediately
        #[arg(long)]
        autostart: bool,
    },

    /// Show settings and today's progress
    #[command(alias = "st")]
    Status {
        /// Output the full engine state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show focus statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change durations
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// List, select or preview completion sounds
    Sound {
        #[command(subcommand)]
        action: Option<SoundAction>,
    },

    /// Check whether desktop notifications can be shown
    Notify,

    /// Delete all recorded sessions
    Clear {
        /// Skip the confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current settings
    Show,

    /// Change one or more settings
    Set {
        /// Focus duration in minutes
        #[arg(long)]
        work: Option<u32>,

        /// Short break duration in minutes
        #[arg(long)]
        short: Option<u32>,

        /// Long break duration in minutes
        #[arg(long)]
        long: Option<u32>,

        /// Focus sessions between long breaks
        #[arg(long)]
        interval: Option<u32>,
    },

    /// Restore default durations
    Reset,
}

#[derive(Subcommand)]
enum SoundAction {
    /// List available sounds
    List,

    /// Select the completion sound
    Set {
        #[arg(value_parser = parse_sound)]
        sound: SoundOption,
    },

    /// Play a sound without selecting it
    Preview {
        #[arg(value_parser = parse_sound)]
        sound: SoundOption,
    },
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    Mode::from_str(s).ok_or_else(|| format!("unknown mode '{}' (expected work, short or long)", s))
}

fn parse_sound(s: &str) -> Result<SoundOption, String> {
    SoundOption::from_str(s).ok_or_else(|| {
        let ids: Vec<&str> = SoundOption::ALL.iter().map(|s| s.id()).collect();
        format!("unknown sound '{}' (expected one of: {})", s, ids.join(", "))
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = match &cli.data_dir {
        Some(dir) => Paths::with_data_dir(dir),
        None => Paths::new(),
    };
    let mut engine = open_engine(&paths)?;

    match cli.command {
        Some(Commands::Run { mode, autostart }) => cmd_run(&mut engine, mode, autostart),
        Some(Commands::Status { json }) => cmd_status(&engine, json),
        None => cmd_status(&engine, false),
        Some(Commands::Stats { json }) => cmd_stats(&engine, json),
        Some(Commands::Config { action }) => cmd_config(&mut engine, action),
        Some(Commands::Sound { action }) => cmd_sound(&mut engine, action),
        Some(Commands::Notify) => cmd_notify(&mut engine),
        Some(Commands::Clear { yes }) => cmd_clear(&mut engine, yes),
    }
}

/// Run the interactive timer
fn cmd_run(engine: &mut Engine, mode: Option<Mode>, autostart: bool) -> Result<()> {
    let options = RunOptions { mode, autostart };
    let rt = tokio::runtime::Runtime::new()?;
    let mut stdout = io::stdout();

    println!("{}", color(&format!("{}{}", BOLD, MAGENTA), "POMODORO"));
    let lines = runner::spawn_line_reader(io::BufReader::new(io::stdin()));
    let result = rt.block_on(runner::run(
        engine,
        options,
        lines,
        runner::ctrl_c(),
        &mut stdout,
    ));
    rt.shutdown_background();
    result?;

    engine.cancel_notifications();
    println!(
        "{} {} focus sessions today",
        color(GREEN, "[ok]"),
        engine.today_count()
    );
    Ok(())
}

/// Show settings and today's progress
fn cmd_status(engine: &Engine, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&engine.snapshot()).context("Failed to serialize status")?
        );
        return Ok(());
    }

    let mut out = io::stdout().lock();
    display::render_settings(&mut out, engine.settings())?;
    writeln!(out)?;
    writeln!(
        out,
        "  {}         {} focus sessions",
        color(CYAN, "Today:"),
        engine.today_count()
    )?;
    writeln!(
        out,
        "  {}    {}",
        color(CYAN, "Focus time:"),
        engine.total_focus_time_string()
    )?;
    Ok(())
}

/// Show focus statistics
fn cmd_stats(engine: &Engine, json: bool) -> Result<()> {
    let stats = engine.stats();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialize statistics")?
        );
        return Ok(());
    }

    let mut out = io::stdout().lock();
    display::render_stats(&mut out, &stats)?;
    Ok(())
}

/// Show or change settings
fn cmd_config(engine: &mut Engine, action: Option<ConfigAction>) -> Result<()> {
    match action {
        None | Some(ConfigAction::Show) => {}
        Some(ConfigAction::Set {
            work,
            short,
            long,
            interval,
        }) => {
            let change = ConfigChange {
                work,
                short,
                long,
                interval,
            };
            if change.is_empty() {
                bail!("Nothing to change. Pass --work, --short, --long or --interval.");
            }
            apply_config(engine, &change)?;
            println!("{} Settings updated", color(GREEN, "[ok]"));
            println!();
        }
        Some(ConfigAction::Reset) => {
            engine.reset_to_defaults();
            println!("{} Settings restored to defaults", color(GREEN, "[ok]"));
            println!();
        }
    }

    let mut out = io::stdout().lock();
    display::render_settings(&mut out, engine.settings())?;
    Ok(())
}

/// Values passed to `config set`
#[derive(Debug, Default)]
struct ConfigChange {
    work: Option<u32>,
    short: Option<u32>,
    long: Option<u32>,
    interval: Option<u32>,
}

impl ConfigChange {
    fn is_empty(&self) -> bool {
        self.work.is_none() && self.short.is_none() && self.long.is_none() && self.interval.is_none()
    }
}

/// Validate every value against a staged copy of the settings, then apply.
/// Nothing is written unless all values are valid.
fn apply_config(engine: &mut Engine, change: &ConfigChange) -> Result<()> {
    let mut staged = *engine.settings();
    let minutes = [
        (Mode::Work, change.work),
        (Mode::ShortBreak, change.short),
        (Mode::LongBreak, change.long),
    ];
    for (mode, value) in minutes {
        if let Some(value) = value {
            staged.set_minutes(mode, value)?;
        }
    }
    if let Some(interval) = change.interval {
        staged.set_long_break_interval(interval)?;
    }

    for (mode, value) in minutes {
        if let Some(value) = value {
            engine.set_minutes(mode, value)?;
        }
    }
    if let Some(interval) = change.interval {
        engine.set_long_break_interval(interval)?;
    }
    Ok(())
}

/// List, select or preview sounds
fn cmd_sound(engine: &mut Engine, action: Option<SoundAction>) -> Result<()> {
    match action {
        None | Some(SoundAction::List) => {
            let mut out = io::stdout().lock();
            display::render_sounds(&mut out, engine.selected_sound())?;
        }
        Some(SoundAction::Set { sound }) => {
            engine.set_selected_sound(sound);
            println!("{} Completion sound: {}", color(GREEN, "[ok]"), sound);
        }
        Some(SoundAction::Preview { sound }) => {
            engine.preview_sound(sound);
            println!("Playing {}", sound);
            // Give the detached player a moment before the process exits
            std::thread::sleep(Duration::from_millis(1500));
        }
    }
    Ok(())
}

/// Request notification permission and report the answer
fn cmd_notify(engine: &mut Engine) -> Result<()> {
    engine.request_notification_permission();

    let deadline = Instant::now() + Duration::from_secs(5);
    while engine.permission_pending() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
        engine.pump();
    }

    if engine.notification_permission_granted() {
        println!("{} Desktop notifications enabled", color(GREEN, "[ok]"));
    } else {
        println!(
            "{} No desktop notification backend found; completions are shown in the terminal",
            color(CYAN, "[info]")
        );
    }
    Ok(())
}

/// Delete all recorded sessions
fn cmd_clear(engine: &mut Engine, yes: bool) -> Result<()> {
    let count = engine.sessions().len();
    if count == 0 {
        println!("{} No sessions recorded", color(CYAN, "[info]"));
        return Ok(());
    }

    if !yes {
        print!("Delete {} recorded sessions? [y/N] ", count);
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin()
            .read_line(&mut answer)
            .context("Failed to read confirmation")?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Cancelled");
            return Ok(());
        }
    }

    engine.clear_all_sessions();
    println!("{} Cleared {} sessions", color(GREEN, "[ok]"), count);
    Ok(())
}
