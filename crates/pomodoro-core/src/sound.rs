//! Completion sound selection

use serde::{Deserialize, Serialize};
use std::fmt;

/// A completion sound the user can pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SoundOption {
    #[default]
    #[serde(rename = "Tri-tone")]
    TriTone,
    #[serde(rename = "Chime")]
    Chime,
    #[serde(rename = "Bell")]
    Bell,
    #[serde(rename = "Digital")]
    Digital,
    #[serde(rename = "Gentle")]
    Gentle,
    /// Plays nothing
    #[serde(rename = "None")]
    Silent,
}

impl SoundOption {
    pub const ALL: [SoundOption; 6] = [
        SoundOption::TriTone,
        SoundOption::Chime,
        SoundOption::Bell,
        SoundOption::Digital,
        SoundOption::Gentle,
        SoundOption::Silent,
    ];

    /// Identifier persisted in the key/value store
    pub fn id(&self) -> &'static str {
        match self {
            SoundOption::TriTone => "Tri-tone",
            SoundOption::Chime => "Chime",
            SoundOption::Bell => "Bell",
            SoundOption::Digital => "Digital",
            SoundOption::Gentle => "Gentle",
            SoundOption::Silent => "None",
        }
    }

    pub fn is_audible(&self) -> bool {
        !matches!(self, SoundOption::Silent)
    }

    /// Parse an identifier, ignoring case and separators
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "tritone" => Some(SoundOption::TriTone),
            "chime" => Some(SoundOption::Chime),
            "bell" => Some(SoundOption::Bell),
            "digital" => Some(SoundOption::Digital),
            "gentle" => Some(SoundOption::Gentle),
            "none" | "silent" => Some(SoundOption::Silent),
            _ => None,
        }
    }
}

impl fmt::Display for SoundOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_id_roundtrip() {
        for sound in SoundOption::ALL {
            assert_eq!(SoundOption::from_str(sound.id()), Some(sound));
        }
    }

    #[test]
    fn test_sound_parse_is_lenient() {
        assert_eq!(SoundOption::from_str("tritone"), Some(SoundOption::TriTone));
        assert_eq!(SoundOption::from_str("TRI_TONE"), Some(SoundOption::TriTone));
        assert_eq!(SoundOption::from_str("silent"), Some(SoundOption::Silent));
        assert_eq!(SoundOption::from_str("gong"), None);
    }

    #[test]
    fn test_default_is_tri_tone() {
        assert_eq!(SoundOption::default(), SoundOption::TriTone);
        assert!(!SoundOption::Silent.is_audible());
    }
}
