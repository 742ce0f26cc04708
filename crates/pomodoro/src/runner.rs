//! Interactive timer loop
//!
//! One task owns the engine. It waits on three sources: a one-second
//! interval (only while the timer runs), command lines forwarded from a
//! reader thread, and a cancel signal (Ctrl-C in the binary). Each event is
//! handled to completion, including any completion cascade, before the next
//! one is taken.

use anyhow::Result;
use pomodoro_core::{Completion, Engine, EngineEvent, Mode};
use std::cell::RefCell;
use std::future::Future;
use std::io::{BufRead, Write};
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::display;

/// How the interactive loop starts
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Switch to this mode before starting
    pub mode: Option<Mode>,
    /// Start the countdown immediately
    pub autostart: bool,
}

/// A command typed into the running timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartPause,
    Reset,
    Switch(Mode),
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "" | "p" | "pause" | "start" | "space" => Some(Command::StartPause),
            "r" | "reset" => Some(Command::Reset),
            "w" | "work" | "focus" => Some(Command::Switch(Mode::Work)),
            "s" | "short" => Some(Command::Switch(Mode::ShortBreak)),
            "l" | "long" => Some(Command::Switch(Mode::LongBreak)),
            "h" | "help" | "?" => Some(Command::Help),
            "q" | "quit" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Whether the loop keeps going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Apply one command to the engine
pub fn apply(engine: &mut Engine, command: Command) -> Flow {
    match command {
        Command::StartPause => engine.start_pause(),
        Command::Reset => engine.reset(),
        Command::Switch(mode) => engine.switch_mode(mode),
        Command::Help => {}
        Command::Quit => return Flow::Stop,
    }
    Flow::Continue
}

/// Read lines from `input` on a dedicated thread and forward them.
///
/// The thread is never joined; a read blocked on a terminal must not keep
/// the runtime alive after the loop ends.
pub fn spawn_line_reader<R>(input: R) -> UnboundedReceiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in input.lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Resolves on the first Ctrl-C. If the handler cannot be installed it never
/// resolves, so the loop can still end through `q` or closed input.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Run the timer until the user quits, input closes while idle, or `cancel`
/// resolves
pub async fn run<C, W>(
    engine: &mut Engine,
    options: RunOptions,
    mut lines: UnboundedReceiver<String>,
    cancel: C,
    out: &mut W,
) -> Result<()>
where
    C: Future<Output = ()>,
    W: Write,
{
    let completions: Rc<RefCell<Vec<Completion>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = completions.clone();
    engine.subscribe(move |event| {
        if let EngineEvent::SessionCompleted(completion) = event {
            sink.borrow_mut().push(*completion);
        }
    });

    if let Some(mode) = options.mode {
        engine.switch_mode(mode);
    }
    if options.autostart {
        engine.start();
    }

    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.reset();

    let mut input_open = true;
    tokio::pin!(cancel);

    writeln!(out, "{}", display::HELP_LINE)?;
    display::render_status(out, engine)?;

    loop {
        let was_running = engine.is_running();

        tokio::select! {
            _ = ticker.tick(), if was_running => {
                engine.tick();
            }
            line = lines.recv(), if input_open => {
                match line {
                    Some(line) => match Command::parse(&line) {
                        Some(Command::Help) => {
                            writeln!(out)?;
                            writeln!(out, "{}", display::HELP_LINE)?;
                        }
                        Some(command) => {
                            if apply(engine, command) == Flow::Stop {
                                break;
                            }
                        }
                        None => {
                            writeln!(out)?;
                            writeln!(out, "Unknown command: {}", line.trim())?;
                        }
                    },
                    None => {
                        debug!("Input closed");
                        input_open = false;
                    }
                }
            }
            _ = &mut cancel => {
                debug!("Cancelled");
                break;
            }
        }

        engine.pump();

        if !was_running && engine.is_running() {
            ticker.reset();
        }

        for completion in completions.borrow_mut().drain(..) {
            writeln!(out)?;
            display::render_completion(out, &completion)?;
        }
        display::render_status(out, engine)?;

        if !input_open && !engine.is_running() {
            break;
        }
    }

    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomodoro_core::ports::{FixedClock, MemoryStore, RecordingNotifier, RecordingSound};

    fn engine() -> Engine {
        Engine::new(
            MemoryStore::new(),
            FixedClock::new(chrono::Utc::now()),
            RecordingNotifier::new(false),
            RecordingSound::new(),
        )
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("p"), Some(Command::StartPause));
        assert_eq!(Command::parse(""), Some(Command::StartPause));
        assert_eq!(Command::parse(" R "), Some(Command::Reset));
        assert_eq!(Command::parse("long"), Some(Command::Switch(Mode::LongBreak)));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
        assert_eq!(Command::parse("dance"), None);
    }

    #[test]
    fn test_apply_commands() {
        let mut engine = engine();
        assert_eq!(apply(&mut engine, Command::StartPause), Flow::Continue);
        assert!(engine.is_running());
        apply(&mut engine, Command::Switch(Mode::ShortBreak));
        assert_eq!(engine.current_mode(), Mode::ShortBreak);
        assert!(!engine.is_running());
        assert_eq!(apply(&mut engine, Command::Quit), Flow::Stop);
    }

    /// Queue `input` as already-read lines and close the input afterwards
    fn closed_input(input: &[&str]) -> UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        for line in input {
            tx.send(line.to_string()).unwrap();
        }
        rx
    }

    #[tokio::test]
    async fn test_run_applies_input_then_quits() {
        let mut engine = engine();
        let mut out = Vec::new();
        let lines = closed_input(&["s", "p", "q"]);
        run(&mut engine, RunOptions::default(), lines, std::future::pending(), &mut out)
            .await
            .unwrap();

        assert_eq!(engine.current_mode(), Mode::ShortBreak);
        assert!(engine.is_running());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Short Break"));
    }

    #[tokio::test]
    async fn test_run_stops_when_input_closes_idle() {
        let mut engine = engine();
        let mut out = Vec::new();
        let options = RunOptions {
            mode: Some(Mode::ShortBreak),
            autostart: false,
        };
        let lines = closed_input(&["long"]);
        run(&mut engine, options, lines, std::future::pending(), &mut out)
            .await
            .unwrap();
        assert_eq!(engine.current_mode(), Mode::LongBreak);
        assert_eq!(engine.time_string(), "15:00");
    }

    #[tokio::test]
    async fn test_cancel_ends_loop_while_input_stays_open() {
        let mut engine = engine();
        let mut out = Vec::new();
        let (tx, lines) = mpsc::unbounded_channel();
        tx.send("start".to_string()).unwrap();

        let cancel = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
        };
        run(&mut engine, RunOptions::default(), lines, cancel, &mut out)
            .await
            .unwrap();

        assert!(engine.is_running());
        drop(tx);
    }

    #[tokio::test]
    async fn test_line_reader_forwards_until_eof() {
        let input = std::io::Cursor::new(b"p\nlong\n".to_vec());
        let mut lines = spawn_line_reader(input);
        assert_eq!(lines.recv().await.as_deref(), Some("p"));
        assert_eq!(lines.recv().await.as_deref(), Some("long"));
        assert_eq!(lines.recv().await, None);
    }

    #[tokio::test]
    async fn test_unknown_command_is_reported() {
        let mut engine = engine();
        let mut out = Vec::new();
        let lines = closed_input(&["dance", "q"]);
        run(&mut engine, RunOptions::default(), lines, std::future::pending(), &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Unknown command: dance"));
    }
}
