//! Terminal rendering for the timer and statistics

use chrono::Local;
use pomodoro_core::{Completion, Engine, FocusStats, Mode, Settings, SoundOption};
use std::io::{self, Write};

// ANSI color codes
pub const GREEN: &str = "\x1b[0;32m";
pub const CYAN: &str = "\x1b[0;36m";
pub const MAGENTA: &str = "\x1b[0;35m";
pub const YELLOW: &str = "\x1b[0;33m";
pub const BOLD: &str = "\x1b[1m";
pub const NC: &str = "\x1b[0m";

pub const HELP_LINE: &str =
    "Commands: [enter]/p start-pause  r reset  w/s/l focus/short/long  q quit";

const BAR_WIDTH: usize = 30;

/// Check if stdout is a TTY and colors should be used
pub fn use_colors() -> bool {
    io::IsTerminal::is_terminal(&io::stdout())
}

/// Conditionally apply color
pub fn color(code: &str, text: &str) -> String {
    if use_colors() {
        format!("{}{}{}", code, text, NC)
    } else {
        text.to_string()
    }
}

fn mode_color(mode: Mode) -> &'static str {
    match mode {
        Mode::Work => MAGENTA,
        Mode::ShortBreak => GREEN,
        Mode::LongBreak => CYAN,
    }
}

/// Progress bar for a fraction between 0 and 1
pub fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!(
        "{}{}",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(width - filled)
    )
}

/// Redraw the single status line
pub fn render_status<W: Write>(out: &mut W, engine: &Engine) -> io::Result<()> {
    let mode = engine.current_mode();
    let state = if engine.is_running() { "running" } else { "paused " };
    write!(
        out,
        "\r\x1b[2K{} {}  [{}] {:>3}%  {}  done: {}",
        color(mode_color(mode), &format!("{:<11}", mode.label())),
        color(BOLD, &engine.time_string()),
        progress_bar(engine.progress(), BAR_WIDTH),
        (engine.progress() * 100.0).round() as u32,
        state,
        engine.completed_work_count()
    )?;
    out.flush()
}

pub fn render_completion<W: Write>(out: &mut W, completion: &Completion) -> io::Result<()> {
    let (title, body) = completion.completed.completion_message();
    writeln!(out, "{} {}", color(GREEN, "[done]"), color(BOLD, title))?;
    writeln!(out, "       {}", body)?;
    writeln!(
        out,
        "       Next: {} (press enter to start)",
        completion.next.label()
    )
}

pub fn render_settings<W: Write>(out: &mut W, settings: &Settings) -> io::Result<()> {
    writeln!(out, "{}", color(BOLD, "Settings"))?;
    writeln!(out)?;
    writeln!(out, "  {}         {} min", color(CYAN, "Focus:"), settings.work_minutes)?;
    writeln!(
        out,
        "  {}   {} min",
        color(CYAN, "Short break:"),
        settings.short_break_minutes
    )?;
    writeln!(
        out,
        "  {}    {} min",
        color(CYAN, "Long break:"),
        settings.long_break_minutes
    )?;
    writeln!(
        out,
        "  {}  every {} focus sessions",
        color(CYAN, "Long breaks:"),
        settings.long_break_interval
    )?;
    writeln!(out, "  {}         {}", color(CYAN, "Sound:"), settings.selected_sound)
}

pub fn render_stats<W: Write>(out: &mut W, stats: &FocusStats) -> io::Result<()> {
    writeln!(out, "{}", color(BOLD, "Focus Statistics"))?;
    writeln!(out)?;
    writeln!(out, "  {}        {}", color(CYAN, "Today:"), stats.today)?;
    writeln!(out, "  {}  {}", color(CYAN, "Last 7 days:"), stats.week)?;
    writeln!(out, "  {}        {}", color(CYAN, "Total:"), stats.total)?;
    writeln!(
        out,
        "  {}   {}",
        color(CYAN, "Focus time:"),
        stats.total_focus_time_string()
    )?;
    writeln!(out)?;

    let max = stats.weekly.iter().map(|d| d.count).max().unwrap_or(0).max(1);
    for day in &stats.weekly {
        let width = (day.count as usize * 20) / max as usize;
        writeln!(
            out,
            "  {}  {} {}",
            day.day_label(&Local),
            color(YELLOW, &"\u{2588}".repeat(width)),
            day.count
        )?;
    }
    Ok(())
}

pub fn render_sounds<W: Write>(out: &mut W, selected: SoundOption) -> io::Result<()> {
    for sound in SoundOption::ALL {
        let marker = if sound == selected { "*" } else { " " };
        writeln!(out, "  {} {}", marker, sound)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0.0, 4), "\u{2591}".repeat(4));
        assert_eq!(progress_bar(1.0, 4), "\u{2588}".repeat(4));
        assert_eq!(progress_bar(1.5, 4), "\u{2588}".repeat(4));
        assert_eq!(progress_bar(0.5, 4).chars().count(), 4);
    }

    #[test]
    fn test_color_keeps_text() {
        let result = color(GREEN, "test");
        assert!(result.contains("test"));
    }

    #[test]
    fn test_render_completion() {
        let mut out = Vec::new();
        let completion = Completion {
            completed: Mode::Work,
            next: Mode::ShortBreak,
            completed_work_count: 1,
        };
        render_completion(&mut out, &completion).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Focus Session Complete!"));
        assert!(text.contains("Next: Short Break"));
    }

    #[test]
    fn test_render_sounds_marks_selection() {
        let mut out = Vec::new();
        render_sounds(&mut out, SoundOption::Bell).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("* Bell"));
        assert!(text.contains("  Chime"));
    }
}
