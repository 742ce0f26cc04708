//! pomodoro - Focus timer with work/break intervals
//!
//! Wires the engine from `pomodoro-core` to real collaborators:
//! - Settings and sessions: ~/.local/share/pomodoro/store.json
//! - Notifications: the detected desktop backend
//! - Sounds: the platform sound player
//!
//! Commands:
//! - run: interactive timer
//! - status: current settings and today's progress
//! - stats: focus statistics
//! - config: show, change or reset durations
//! - sound: list, select or preview completion sounds
//! - notify: check notification permission
//! - clear: delete recorded sessions

pub mod audio;
pub mod clock;
pub mod display;
pub mod notify;
pub mod paths;
pub mod runner;
pub mod store;

pub use audio::SystemSound;
pub use clock::SystemClock;
pub use notify::DesktopNotifier;
pub use paths::Paths;
pub use store::FileStore;

use anyhow::Result;
use pomodoro_core::Engine;

/// Build an engine over the production collaborators
pub fn open_engine(paths: &Paths) -> Result<Engine> {
    let store = FileStore::open(&paths.store_file())?;
    Ok(Engine::new(
        store,
        SystemClock::new(),
        DesktopNotifier::new(),
        SystemSound::new(),
    ))
}
