//! Countdown and mode state machine
//!
//! The timer is either idle or running in one of the three modes. `tick` is
//! the only operation that moves time forward; it is meant to be called once
//! per elapsed second while the timer runs. A tick that finds the countdown
//! already at zero completes the interval: the timer pauses, reports the
//! completed mode to the caller, and switches to the next mode without
//! starting it.
//!
//! Durations are never stored here. Every operation that needs one takes
//! the current [`Settings`] and looks it up.

use serde::Serialize;

use crate::mode::Mode;
use crate::settings::Settings;

/// Result of a completed interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// The mode whose interval finished
    pub completed: Mode,
    /// The mode the timer switched to
    pub next: Mode,
    /// Work sessions completed so far, after this completion
    pub completed_work_count: u32,
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// One second was taken off the countdown
    Counted { remaining: u64 },
    /// The countdown was already at zero and the interval completed
    Completed(Completion),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timer {
    mode: Mode,
    /// Seconds left in the current interval
    remaining: u64,
    running: bool,
    completed_work_count: u32,
}

impl Timer {
    /// Idle in work mode with a full work interval
    pub fn new(settings: &Settings) -> Self {
        Self {
            mode: Mode::Work,
            remaining: settings.duration_for(Mode::Work),
            running: false,
            completed_work_count: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn completed_work_count(&self) -> u32 {
        self.completed_work_count
    }

    /// Returns true if the timer was idle
    pub fn start(&mut self) -> bool {
        let was_idle = !self.running;
        self.running = true;
        was_idle
    }

    /// Returns true if the timer was running
    pub fn pause(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        was_running
    }

    /// Stop and reload the full duration of the current mode
    pub fn reset(&mut self, settings: &Settings) {
        self.pause();
        self.remaining = settings.duration_for(self.mode);
    }

    /// Stop and move to `target` with its full duration. Progress in the
    /// previous mode is discarded, even when `target` is the current mode.
    pub fn switch_mode(&mut self, target: Mode, settings: &Settings) {
        self.pause();
        self.mode = target;
        self.remaining = settings.duration_for(target);
    }

    /// Reload the countdown after `mode`'s duration changed. Only applies
    /// when `mode` is current and the timer is idle; returns whether it did.
    pub fn reload(&mut self, mode: Mode, settings: &Settings) -> bool {
        if self.mode != mode || self.running {
            return false;
        }
        self.remaining = settings.duration_for(mode);
        true
    }

    /// Advance by one second, or complete the interval if already at zero.
    ///
    /// `on_complete` runs after the timer pauses and before it switches
    /// mode, with the mode that just finished. A long-break interval of zero
    /// never schedules a long break.
    pub fn tick<F>(&mut self, settings: &Settings, on_complete: F) -> Tick
    where
        F: FnOnce(Mode),
    {
        if self.remaining > 0 {
            self.remaining -= 1;
            return Tick::Counted {
                remaining: self.remaining,
            };
        }

        let completed = self.mode;
        self.pause();
        on_complete(completed);

        let next = match completed {
            Mode::Work => {
                self.completed_work_count += 1;
                let interval = settings.long_break_interval;
                if self.completed_work_count.checked_rem(interval) == Some(0) {
                    Mode::LongBreak
                } else {
                    Mode::ShortBreak
                }
            }
            Mode::ShortBreak | Mode::LongBreak => Mode::Work,
        };
        self.switch_mode(next, settings);

        Tick::Completed(Completion {
            completed,
            next,
            completed_work_count: self.completed_work_count,
        })
    }

    /// Fraction of the current interval elapsed, 0.0 at start and 1.0 at zero
    pub fn progress(&self, settings: &Settings) -> f64 {
        let total = settings.duration_for(self.mode);
        if total == 0 {
            return 1.0;
        }
        let remaining = self.remaining.min(total);
        1.0 - (remaining as f64 / total as f64)
    }

    /// Remaining time as zero-padded MM:SS
    pub fn time_string(&self) -> String {
        format_clock(self.remaining)
    }

    pub fn set_completed_work_count(&mut self, count: u32) {
        self.completed_work_count = count;
    }

    #[cfg(test)]
    pub(crate) fn set_remaining(&mut self, remaining: u64, settings: &Settings) {
        self.remaining = remaining.min(settings.duration_for(self.mode));
    }
}

/// Format seconds as MM:SS. Minutes are not wrapped into hours.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
