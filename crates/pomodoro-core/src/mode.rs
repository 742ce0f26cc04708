//! Timer modes
//!
//! The three interval kinds the timer cycles through, with the attributes
//! that do not depend on the presentation layer: storage tag, display label,
//! the settings key holding its duration, and its completion message.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::settings::keys;

/// Interval kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Mode {
    /// Focused work interval
    #[default]
    #[serde(rename = "work")]
    Work,
    /// Break taken after most work intervals
    #[serde(rename = "shortBreak")]
    ShortBreak,
    /// Break taken every `long_break_interval` work intervals
    #[serde(rename = "longBreak")]
    LongBreak,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Work, Mode::ShortBreak, Mode::LongBreak];

    /// Stable tag used in the persisted session log
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Work => "work",
            Mode::ShortBreak => "shortBreak",
            Mode::LongBreak => "longBreak",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Work => "Focus",
            Mode::ShortBreak => "Short Break",
            Mode::LongBreak => "Long Break",
        }
    }

    /// Key/value store key holding this mode's duration in minutes
    pub fn settings_key(&self) -> &'static str {
        match self {
            Mode::Work => keys::WORK_DURATION,
            Mode::ShortBreak => keys::SHORT_BREAK_DURATION,
            Mode::LongBreak => keys::LONG_BREAK_DURATION,
        }
    }

    /// Notification (title, body) sent when an interval of this mode completes
    pub fn completion_message(&self) -> (&'static str, &'static str) {
        match self {
            Mode::Work => ("Focus Session Complete!", "Great work! Time for a break."),
            Mode::ShortBreak => ("Break Over", "Ready to focus again?"),
            Mode::LongBreak => (
                "Long Break Over",
                "Feeling refreshed? Let's get back to work!",
            ),
        }
    }

    /// Parse a mode from its tag or a common short form
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "work" | "focus" | "w" => Some(Mode::Work),
            "shortbreak" | "short" | "s" => Some(Mode::ShortBreak),
            "longbreak" | "long" | "l" => Some(Mode::LongBreak),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_tag_roundtrip() {
        for mode in Mode::ALL {
            assert_eq!(Mode::from_str(mode.as_str()), Some(mode));
        }
    }

    #[test]
    fn test_mode_short_forms() {
        assert_eq!(Mode::from_str("short-break"), Some(Mode::ShortBreak));
        assert_eq!(Mode::from_str("LONG"), Some(Mode::LongBreak));
        assert_eq!(Mode::from_str("focus"), Some(Mode::Work));
        assert_eq!(Mode::from_str("nap"), None);
    }

    #[test]
    fn test_serde_uses_storage_tag() {
        let json = serde_json::to_string(&Mode::ShortBreak).unwrap();
        assert_eq!(json, "\"shortBreak\"");
        let parsed: Mode = serde_json::from_str("\"longBreak\"").unwrap();
        assert_eq!(parsed, Mode::LongBreak);
    }

    #[test]
    fn test_completion_messages() {
        assert_eq!(Mode::Work.completion_message().0, "Focus Session Complete!");
        assert_eq!(Mode::ShortBreak.completion_message().1, "Ready to focus again?");
        assert_eq!(Mode::LongBreak.completion_message().0, "Long Break Over");
    }
}
