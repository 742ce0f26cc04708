//! File-backed key/value store
//!
//! Everything lives in one JSON document:
//! - `ints`: setting name -> integer
//! - `blobs`: key -> base64 encoded bytes (the session log, the sound id)
//!
//! Every write rewrites the document through a temporary file and a rename,
//! so a crash mid-write leaves the previous version intact.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pomodoro_core::{KeyValueStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    ints: BTreeMap<String, i64>,
    #[serde(default)]
    blobs: BTreeMap<String, String>,
}

/// Key/value store persisted as a JSON document
pub struct FileStore {
    path: PathBuf,
    doc: StoreDocument,
}

impl FileStore {
    /// Open the store at `path`, creating its directory. A missing file
    /// starts empty; an unreadable one is logged and also starts empty.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create pomodoro data directory: {}", parent.display())
            })?;
        }

        let doc = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read store: {}", path.display()))?;
            if content.trim().is_empty() {
                StoreDocument::default()
            } else {
                serde_json::from_str(&content).unwrap_or_else(|e| {
                    warn!("Ignoring unparsable store {}: {}", path.display(), e);
                    StoreDocument::default()
                })
            }
        } else {
            StoreDocument::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(&self.doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.doc.ints.get(key).copied()
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), StoreError> {
        self.doc.ints.insert(key.to_string(), value);
        self.flush()
    }

    fn get_blob(&self, key: &str) -> Option<Vec<u8>> {
        let encoded = self.doc.blobs.get(key)?;
        match STANDARD.decode(encoded) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(key, "Ignoring undecodable blob: {}", e);
                None
            }
        }
    }

    fn set_blob(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.doc.blobs.insert(key.to_string(), STANDARD.encode(value));
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let had_int = self.doc.ints.remove(key).is_some();
        let had_blob = self.doc.blobs.remove(key).is_some();
        if had_int || had_blob {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomodoro_core::settings::keys;
    use pomodoro_core::{Mode, SessionLog};
    use tempfile::TempDir;

    fn temp_store() -> (FileStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(&dir.path().join("nested").join("store.json")).unwrap();
        (store, dir)
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let (store, _dir) = temp_store();
        assert_eq!(store.get_int(keys::WORK_DURATION), None);
        assert_eq!(store.get_blob(keys::SESSIONS), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let (mut store, _dir) = temp_store();
        store.set_int(keys::WORK_DURATION, 30).unwrap();
        store.set_blob(keys::SELECTED_SOUND, b"Chime").unwrap();

        let reopened = FileStore::open(store.path()).unwrap();
        assert_eq!(reopened.get_int(keys::WORK_DURATION), Some(30));
        assert_eq!(
            reopened.get_blob(keys::SELECTED_SOUND).as_deref(),
            Some(&b"Chime"[..])
        );
    }

    #[test]
    fn test_remove() {
        let (mut store, _dir) = temp_store();
        store.set_int(keys::WORK_DURATION, 30).unwrap();
        store.remove(keys::WORK_DURATION).unwrap();
        store.remove("never-set").unwrap();

        let reopened = FileStore::open(store.path()).unwrap();
        assert_eq!(reopened.get_int(keys::WORK_DURATION), None);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ this is not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get_int(keys::WORK_DURATION), None);
    }

    #[test]
    fn test_session_log_roundtrip_through_file() {
        let (mut store, _dir) = temp_store();
        let mut log = SessionLog::new();
        log.record(Mode::Work, chrono::Utc::now());
        log.record(Mode::ShortBreak, chrono::Utc::now());
        log.save(&mut store).unwrap();

        let reopened = FileStore::open(store.path()).unwrap();
        assert_eq!(SessionLog::load(&reopened), log);
    }
}
