//! Standard paths used by the pomodoro tool

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "POMODORO_DATA_DIR";

/// Standard pomodoro paths
pub struct Paths {
    /// Data directory (~/.local/share/pomodoro)
    pub data: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    /// Resolve from `POMODORO_DATA_DIR`, falling back to the platform data dir
    pub fn new() -> Self {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
            return Self::with_data_dir(Path::new(&dir));
        }

        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("pomodoro");

        Self { data }
    }

    pub fn with_data_dir(dir: &Path) -> Self {
        Self {
            data: dir.to_path_buf(),
        }
    }

    /// Key/value store document
    pub fn store_file(&self) -> PathBuf {
        self.data.join("store.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_file_under_data_dir() {
        let paths = Paths::with_data_dir(Path::new("/tmp/pomodoro-test"));
        assert_eq!(paths.store_file(), PathBuf::from("/tmp/pomodoro-test/store.json"));
    }
}
