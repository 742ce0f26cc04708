//! pomodoro-core - The focus timer engine
//!
//! Alternates fixed-length work and break intervals, records completed
//! sessions and derives statistics from them. Everything with a side effect
//! (time, persistence, sound, notifications) sits behind the traits in
//! [`ports`], so the engine itself is deterministic and testable.
//!
//! Components, leaves first:
//! - [`Settings`]: durations, long-break cadence and selected sound
//! - [`SessionLog`]: append-only record of completed intervals
//! - [`stats`]: pure aggregations over the log
//! - [`Timer`]: countdown and mode state machine
//! - [`Engine`]: façade that composes the above and drives side effects

pub mod engine;
pub mod error;
pub mod mode;
pub mod ports;
pub mod session;
pub mod settings;
pub mod sound;
pub mod stats;
pub mod timer;

pub use engine::{Engine, EngineEvent, Snapshot};
pub use error::{SettingsError, SinkError, StoreError};
pub use mode::Mode;
pub use ports::{Clock, KeyValueStore, NotificationSink, PermissionCallback, SoundSink};
pub use session::{Session, SessionLog};
pub use settings::Settings;
pub use sound::SoundOption;
pub use stats::{DailyStat, FocusStats};
pub use timer::{Completion, Tick, Timer};
