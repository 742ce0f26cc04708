//! Completion sound playback through the platform's sound player
//!
//! macOS plays one of the bundled system sounds with `afplay`; Linux plays a
//! freedesktop theme sound with `paplay` or `canberra-gtk-play`. When no
//! player is available the terminal bell is rung instead.

use pomodoro_core::{SinkError, SoundOption, SoundSink};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

const MACOS_SOUNDS: &str = "/System/Library/Sounds";
const FREEDESKTOP_SOUNDS: &str = "/usr/share/sounds/freedesktop/stereo";

/// macOS system sound for an option
fn macos_sound(sound: SoundOption) -> Option<&'static str> {
    match sound {
        SoundOption::TriTone => Some("Glass"),
        SoundOption::Chime => Some("Hero"),
        SoundOption::Bell => Some("Ping"),
        SoundOption::Digital => Some("Morse"),
        SoundOption::Gentle => Some("Tink"),
        SoundOption::Silent => None,
    }
}

/// freedesktop sound theme event for an option
fn freedesktop_sound(sound: SoundOption) -> Option<&'static str> {
    match sound {
        SoundOption::TriTone => Some("message-new-instant"),
        SoundOption::Chime => Some("complete"),
        SoundOption::Bell => Some("bell"),
        SoundOption::Digital => Some("alarm-clock-elapsed"),
        SoundOption::Gentle => Some("dialog-information"),
        SoundOption::Silent => None,
    }
}

/// Sound sink that shells out to the platform player
#[derive(Debug, Clone, Default)]
pub struct SystemSound {
    selected: SoundOption,
}

impl SystemSound {
    pub fn new() -> Self {
        Self::default()
    }

    fn player_command(sound: SoundOption) -> Option<Command> {
        if cfg!(target_os = "macos") {
            let name = macos_sound(sound)?;
            let path = PathBuf::from(MACOS_SOUNDS).join(format!("{}.aiff", name));
            let mut cmd = Command::new("afplay");
            cmd.arg(path);
            return Some(cmd);
        }

        let event = freedesktop_sound(sound)?;
        let file = PathBuf::from(FREEDESKTOP_SOUNDS).join(format!("{}.oga", event));
        if file.exists() {
            let mut cmd = Command::new("paplay");
            cmd.arg(file);
            Some(cmd)
        } else {
            let mut cmd = Command::new("canberra-gtk-play");
            cmd.args(["--id", event]);
            Some(cmd)
        }
    }

    fn play(&self, sound: SoundOption) -> Result<(), SinkError> {
        if !sound.is_audible() {
            return Ok(());
        }

        let Some(mut cmd) = Self::player_command(sound) else {
            return ring_bell();
        };

        match cmd.stdout(Stdio::null()).stderr(Stdio::null()).spawn() {
            Ok(mut child) => {
                std::thread::spawn(move || {
                    let _ = child.wait();
                });
                Ok(())
            }
            Err(e) => {
                debug!(sound = sound.id(), "Sound player unavailable ({}), using bell", e);
                ring_bell()
            }
        }
    }
}

fn ring_bell() -> Result<(), SinkError> {
    let mut stdout = std::io::stdout();
    stdout
        .write_all(b"\x07")
        .and_then(|_| stdout.flush())
        .map_err(|e| SinkError::Sound(e.to_string()))
}

impl SoundSink for SystemSound {
    fn selected_sound(&self) -> SoundOption {
        self.selected
    }

    fn set_selected_sound(&mut self, sound: SoundOption) {
        self.selected = sound;
    }

    fn play_completion(&self) -> Result<(), SinkError> {
        self.play(self.selected)
    }

    fn play_preview(&self, sound: SoundOption) -> Result<(), SinkError> {
        self.play(sound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_audible_option_has_a_sound() {
        for sound in SoundOption::ALL {
            assert_eq!(macos_sound(sound).is_some(), sound.is_audible());
            assert_eq!(freedesktop_sound(sound).is_some(), sound.is_audible());
        }
    }

    #[test]
    fn test_silent_plays_nothing() {
        let mut sink = SystemSound::new();
        sink.set_selected_sound(SoundOption::Silent);
        assert!(sink.play_completion().is_ok());
        assert!(SystemSound::player_command(SoundOption::Silent).is_none());
    }

    #[test]
    fn test_selected_sound() {
        let mut sink = SystemSound::new();
        assert_eq!(sink.selected_sound(), SoundOption::TriTone);
        sink.set_selected_sound(SoundOption::Bell);
        assert_eq!(sink.selected_sound(), SoundOption::Bell);
    }
}
