//! Timer settings
//!
//! Durations are whole minutes. Every field is stored under its own key in
//! the key/value store; absent or out-of-range values fall back to the
//! defaults below.

use serde::Serialize;
use tracing::warn;

use crate::error::{SettingsError, StoreError};
use crate::mode::Mode;
use crate::ports::KeyValueStore;
use crate::sound::SoundOption;

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;
pub const DEFAULT_LONG_BREAK_INTERVAL: u32 = 4;

/// Smallest allowed long-break interval
pub const MIN_LONG_BREAK_INTERVAL: u32 = 2;

/// Key/value store keys
pub mod keys {
    pub const WORK_DURATION: &str = "workDuration";
    pub const SHORT_BREAK_DURATION: &str = "shortBreakDuration";
    pub const LONG_BREAK_DURATION: &str = "longBreakDuration";
    pub const LONG_BREAK_INTERVAL: &str = "longBreakInterval";
    pub const SESSIONS: &str = "pomodoroSessions";
    pub const SELECTED_SOUND: &str = "selectedSound";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    /// Completed work sessions between long breaks
    pub long_break_interval: u32,
    pub selected_sound: SoundOption,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            short_break_minutes: DEFAULT_SHORT_BREAK_MINUTES,
            long_break_minutes: DEFAULT_LONG_BREAK_MINUTES,
            long_break_interval: DEFAULT_LONG_BREAK_INTERVAL,
            selected_sound: SoundOption::default(),
        }
    }
}

impl Settings {
    /// Load settings, falling back per field to the defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Self::default();

        let selected_sound = store
            .get_blob(keys::SELECTED_SOUND)
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .and_then(|id| SoundOption::from_str(&id))
            .unwrap_or(defaults.selected_sound);

        Self {
            work_minutes: load_field(store, keys::WORK_DURATION, 1, defaults.work_minutes),
            short_break_minutes: load_field(
                store,
                keys::SHORT_BREAK_DURATION,
                1,
                defaults.short_break_minutes,
            ),
            long_break_minutes: load_field(
                store,
                keys::LONG_BREAK_DURATION,
                1,
                defaults.long_break_minutes,
            ),
            long_break_interval: load_field(
                store,
                keys::LONG_BREAK_INTERVAL,
                MIN_LONG_BREAK_INTERVAL,
                defaults.long_break_interval,
            ),
            selected_sound,
        }
    }

    /// Configured length of `mode` in minutes
    pub fn minutes_for(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Work => self.work_minutes,
            Mode::ShortBreak => self.short_break_minutes,
            Mode::LongBreak => self.long_break_minutes,
        }
    }

    /// Configured length of `mode` in seconds
    pub fn duration_for(&self, mode: Mode) -> u64 {
        u64::from(self.minutes_for(mode)) * 60
    }

    /// Set the duration of `mode` after validating it
    pub fn set_minutes(&mut self, mode: Mode, minutes: u32) -> Result<(), SettingsError> {
        let minutes = validate_minutes(mode, minutes)?;
        match mode {
            Mode::Work => self.work_minutes = minutes,
            Mode::ShortBreak => self.short_break_minutes = minutes,
            Mode::LongBreak => self.long_break_minutes = minutes,
        }
        Ok(())
    }

    pub fn set_long_break_interval(&mut self, interval: u32) -> Result<(), SettingsError> {
        if interval < MIN_LONG_BREAK_INTERVAL {
            return Err(SettingsError::InvalidInterval(interval));
        }
        self.long_break_interval = interval;
        Ok(())
    }

    /// Restore the numeric fields, keeping the selected sound
    pub fn restore_defaults(&mut self) {
        *self = Self {
            selected_sound: self.selected_sound,
            ..Self::default()
        };
    }

    /// Write one mode's duration through to the store
    pub fn save_minutes(&self, store: &mut dyn KeyValueStore, mode: Mode) -> Result<(), StoreError> {
        store.set_int(mode.settings_key(), i64::from(self.minutes_for(mode)))
    }

    pub fn save_interval(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        store.set_int(keys::LONG_BREAK_INTERVAL, i64::from(self.long_break_interval))
    }

    pub fn save_sound(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        store.set_blob(keys::SELECTED_SOUND, self.selected_sound.id().as_bytes())
    }

    /// Write every numeric field through to the store
    pub fn save_durations(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        for mode in Mode::ALL {
            self.save_minutes(store, mode)?;
        }
        self.save_interval(store)
    }
}

fn validate_minutes(mode: Mode, minutes: u32) -> Result<u32, SettingsError> {
    if minutes == 0 {
        return Err(SettingsError::InvalidDuration {
            field: mode.settings_key(),
            value: minutes,
        });
    }
    Ok(minutes)
}

fn load_field(store: &dyn KeyValueStore, key: &str, min: u32, default: u32) -> u32 {
    match store.get_int(key) {
        None => default,
        Some(value) => match u32::try_from(value) {
            Ok(v) if v >= min => v,
            _ => {
                warn!(key, value, default, "Stored setting out of range, using default");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MemoryStore;

    #[test]
    fn test_defaults_when_store_empty() {
        let store = MemoryStore::new();
        let settings = Settings::load(&store);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.work_minutes, 25);
        assert_eq!(settings.short_break_minutes, 5);
        assert_eq!(settings.long_break_minutes, 15);
        assert_eq!(settings.long_break_interval, 4);
        assert_eq!(settings.selected_sound, SoundOption::TriTone);
    }

    #[test]
    fn test_load_stored_values() {
        let mut store = MemoryStore::new();
        store.set_int(keys::WORK_DURATION, 30).unwrap();
        store.set_int(keys::SHORT_BREAK_DURATION, 10).unwrap();
        store.set_int(keys::LONG_BREAK_DURATION, 20).unwrap();
        store.set_int(keys::LONG_BREAK_INTERVAL, 6).unwrap();
        store.set_blob(keys::SELECTED_SOUND, b"Chime").unwrap();

        let settings = Settings::load(&store);
        assert_eq!(settings.work_minutes, 30);
        assert_eq!(settings.short_break_minutes, 10);
        assert_eq!(settings.long_break_minutes, 20);
        assert_eq!(settings.long_break_interval, 6);
        assert_eq!(settings.selected_sound, SoundOption::Chime);
    }

    #[test]
    fn test_out_of_range_values_fall_back() {
        let mut store = MemoryStore::new();
        store.set_int(keys::WORK_DURATION, 0).unwrap();
        store.set_int(keys::SHORT_BREAK_DURATION, -5).unwrap();
        store.set_int(keys::LONG_BREAK_INTERVAL, 1).unwrap();
        store.set_blob(keys::SELECTED_SOUND, b"Gong").unwrap();

        let settings = Settings::load(&store);
        assert_eq!(settings.work_minutes, DEFAULT_WORK_MINUTES);
        assert_eq!(settings.short_break_minutes, DEFAULT_SHORT_BREAK_MINUTES);
        assert_eq!(settings.long_break_interval, DEFAULT_LONG_BREAK_INTERVAL);
        assert_eq!(settings.selected_sound, SoundOption::TriTone);
    }

    #[test]
    fn test_duration_for_is_seconds() {
        let mut settings = Settings::default();
        settings.set_minutes(Mode::Work, 30).unwrap();
        settings.set_minutes(Mode::ShortBreak, 10).unwrap();
        settings.set_minutes(Mode::LongBreak, 20).unwrap();
        assert_eq!(settings.duration_for(Mode::Work), 30 * 60);
        assert_eq!(settings.duration_for(Mode::ShortBreak), 10 * 60);
        assert_eq!(settings.duration_for(Mode::LongBreak), 20 * 60);
    }

    #[test]
    fn test_setters_reject_invalid_values() {
        let mut settings = Settings::default();
        assert_eq!(
            settings.set_minutes(Mode::Work, 0),
            Err(SettingsError::InvalidDuration {
                field: keys::WORK_DURATION,
                value: 0
            })
        );
        assert_eq!(
            settings.set_long_break_interval(1),
            Err(SettingsError::InvalidInterval(1))
        );
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_restore_defaults_keeps_sound() {
        let mut settings = Settings {
            work_minutes: 50,
            selected_sound: SoundOption::Bell,
            ..Settings::default()
        };
        settings.restore_defaults();
        assert_eq!(settings.work_minutes, 25);
        assert_eq!(settings.selected_sound, SoundOption::Bell);
    }

    #[test]
    fn test_save_durations_writes_every_key() {
        let store = MemoryStore::new();
        let mut handle = store.clone();
        Settings::default().save_durations(&mut handle).unwrap();
        for key in [
            keys::WORK_DURATION,
            keys::SHORT_BREAK_DURATION,
            keys::LONG_BREAK_DURATION,
            keys::LONG_BREAK_INTERVAL,
        ] {
            assert!(store.contains(key), "missing {}", key);
        }
    }
}
