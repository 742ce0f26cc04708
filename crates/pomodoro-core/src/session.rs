//! Completed session log
//!
//! Every interval that runs to completion is appended here with the time it
//! completed. The whole log is serialized as one JSON blob on every write;
//! insertion order is preserved across the round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::StoreError;
use crate::mode::Mode;
use crate::ports::KeyValueStore;
use crate::settings::keys;

/// A completed interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    /// When the interval completed
    pub timestamp: DateTime<Utc>,
    pub mode: Mode,
}

impl Session {
    pub fn new(mode: Mode, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            mode,
        }
    }

    pub fn is_work(&self) -> bool {
        self.mode == Mode::Work
    }
}

/// Append-only, ordered record of completed sessions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionLog {
    sessions: Vec<Session>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the log from the store. Absent or corrupt data yields an empty log.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get_blob(keys::SESSIONS) {
            Some(bytes) => Self::from_bytes(&bytes).unwrap_or_else(|e| {
                warn!("Discarding unreadable session log: {}", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let sessions: Vec<Session> = serde_json::from_slice(bytes)?;
        Ok(Self { sessions })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.sessions)
    }

    /// Write the whole log to the store
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        let bytes = self.to_bytes()?;
        store.set_blob(keys::SESSIONS, &bytes)
    }

    /// Append a session completed at `timestamp`
    pub fn record(&mut self, mode: Mode, timestamp: DateTime<Utc>) -> &Session {
        self.sessions.push(Session::new(mode, timestamp));
        &self.sessions[self.sessions.len() - 1]
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn work_sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter().filter(|s| s.is_work())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_record_appends_in_order() {
        let mut log = SessionLog::new();
        log.record(Mode::Work, at(9));
        log.record(Mode::ShortBreak, at(10));
        log.record(Mode::Work, at(11));

        let modes: Vec<Mode> = log.iter().map(|s| s.mode).collect();
        assert_eq!(modes, vec![Mode::Work, Mode::ShortBreak, Mode::Work]);
        assert_eq!(log.work_sessions().count(), 2);
    }

    #[test]
    fn test_sessions_get_unique_ids() {
        let mut log = SessionLog::new();
        let first = log.record(Mode::Work, at(9)).id;
        let second = log.record(Mode::Work, at(9)).id;
        assert_ne!(first, second);
    }

    #[test]
    fn test_store_roundtrip_preserves_sequence() {
        let mut store = MemoryStore::new();
        let mut log = SessionLog::new();
        log.record(Mode::Work, at(9));
        log.record(Mode::LongBreak, at(9) + Duration::milliseconds(1500));
        log.record(Mode::ShortBreak, at(12));
        log.save(&mut store).unwrap();

        let loaded = SessionLog::load(&store);
        assert_eq!(loaded, log);
    }

    #[test]
    fn test_blob_uses_mode_tags() {
        let mut log = SessionLog::new();
        log.record(Mode::ShortBreak, at(9));
        let json = String::from_utf8(log.to_bytes().unwrap()).unwrap();
        assert!(json.contains("\"mode\":\"shortBreak\""));
        assert!(json.contains("\"timestamp\""));
    }

    #[test]
    fn test_corrupt_blob_loads_empty() {
        let mut store = MemoryStore::new();
        store.set_blob(keys::SESSIONS, b"{not json").unwrap();
        assert!(SessionLog::load(&store).is_empty());

        store.set_blob(keys::SESSIONS, br#"[{"id":"x","mode":"work"}]"#).unwrap();
        assert!(SessionLog::load(&store).is_empty());
    }

    #[test]
    fn test_missing_blob_loads_empty() {
        let store = MemoryStore::new();
        assert!(SessionLog::load(&store).is_empty());
    }
}
