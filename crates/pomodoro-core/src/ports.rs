//! Collaborator interfaces
//!
//! The engine never touches the system directly. Time, persistence, sound
//! and notifications all arrive through these traits; production
//! implementations live in the `pomodoro` crate. The in-memory
//! implementations at the bottom of this module back embedding and tests.

use chrono::{DateTime, Duration, DurationRound, Utc};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{SinkError, StoreError};
use crate::sound::SoundOption;

/// Source of the current instant and of calendar day boundaries
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// First instant of the calendar day containing `instant`
    fn start_of_day(&self, instant: DateTime<Utc>) -> DateTime<Utc>;

    /// Move `instant` by `days` calendar days (negative goes back)
    fn add_days(&self, instant: DateTime<Utc>, days: i64) -> DateTime<Utc>;

    fn is_same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.start_of_day(a) == self.start_of_day(b)
    }
}

/// Durable scalar and blob storage
pub trait KeyValueStore {
    fn get_int(&self, key: &str) -> Option<i64>;
    fn set_int(&mut self, key: &str, value: i64) -> Result<(), StoreError>;
    fn get_blob(&self, key: &str) -> Option<Vec<u8>>;
    fn set_blob(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Reply to a permission check or request. May be invoked from any thread.
pub type PermissionCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Notification delivery
pub trait NotificationSink {
    fn request_permission(&self, reply: PermissionCallback);
    fn check_permission(&self, reply: PermissionCallback);
    fn send(&self, title: &str, body: &str) -> Result<(), SinkError>;
    fn cancel_all(&self);
}

/// Completion sound playback
pub trait SoundSink {
    fn selected_sound(&self) -> SoundOption;
    fn set_selected_sound(&mut self, sound: SoundOption);
    fn play_completion(&self) -> Result<(), SinkError>;
    fn play_preview(&self, sound: SoundOption) -> Result<(), SinkError>;
}

/// Clock pinned to a settable instant, using UTC day boundaries
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn start_of_day(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        instant
            .duration_trunc(Duration::days(1))
            .unwrap_or(instant)
    }

    fn add_days(&self, instant: DateTime<Utc>, days: i64) -> DateTime<Utc> {
        instant + Duration::days(days)
    }
}

/// Volatile key/value store. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    ints: Rc<RefCell<HashMap<String, i64>>>,
    blobs: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.ints.borrow().contains_key(key) || self.blobs.borrow().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.ints.borrow().get(key).copied()
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), StoreError> {
        self.ints.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }

    fn get_blob(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.borrow().get(key).cloned()
    }

    fn set_blob(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.blobs.borrow_mut().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.ints.borrow_mut().remove(key);
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }
}

#[derive(Default)]
struct NotifierState {
    granted: bool,
    defer_replies: bool,
    pending: Vec<PermissionCallback>,
    sent: Vec<(String, String)>,
    permission_requests: u32,
    cancelled: u32,
    fail_sends: bool,
}

/// Notification sink that records what it was asked to do.
/// Clones share the same record.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    state: Rc<RefCell<NotifierState>>,
}

impl RecordingNotifier {
    pub fn new(granted: bool) -> Self {
        let notifier = Self::default();
        notifier.state.borrow_mut().granted = granted;
        notifier
    }

    /// Hold permission replies until [`RecordingNotifier::answer_pending`]
    pub fn deferred(granted: bool) -> Self {
        let notifier = Self::new(granted);
        notifier.state.borrow_mut().defer_replies = true;
        notifier
    }

    pub fn set_granted(&self, granted: bool) {
        self.state.borrow_mut().granted = granted;
    }

    pub fn fail_sends(&self, fail: bool) {
        self.state.borrow_mut().fail_sends = fail;
    }

    /// Deliver every held reply with the current grant value
    pub fn answer_pending(&self) -> usize {
        let (granted, pending) = {
            let mut state = self.state.borrow_mut();
            (state.granted, std::mem::take(&mut state.pending))
        };
        let count = pending.len();
        for reply in pending {
            reply(granted);
        }
        count
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.state.borrow().sent.clone()
    }

    pub fn permission_requests(&self) -> u32 {
        self.state.borrow().permission_requests
    }

    pub fn cancelled(&self) -> u32 {
        self.state.borrow().cancelled
    }

    fn reply(&self, reply: PermissionCallback) {
        let mut state = self.state.borrow_mut();
        if state.defer_replies {
            state.pending.push(reply);
        } else {
            let granted = state.granted;
            drop(state);
            reply(granted);
        }
    }
}

impl NotificationSink for RecordingNotifier {
    fn request_permission(&self, reply: PermissionCallback) {
        self.state.borrow_mut().permission_requests += 1;
        self.reply(reply);
    }

    fn check_permission(&self, reply: PermissionCallback) {
        self.reply(reply);
    }

    fn send(&self, title: &str, body: &str) -> Result<(), SinkError> {
        let mut state = self.state.borrow_mut();
        if state.fail_sends {
            return Err(SinkError::Notification("delivery refused".to_string()));
        }
        state.sent.push((title.to_string(), body.to_string()));
        Ok(())
    }

    fn cancel_all(&self) {
        self.state.borrow_mut().cancelled += 1;
    }
}

#[derive(Default)]
struct SoundState {
    selected: SoundOption,
    completions: u32,
    previews: Vec<SoundOption>,
    fail: bool,
}

/// Sound sink that records playback requests. Clones share the same record.
#[derive(Clone, Default)]
pub struct RecordingSound {
    state: Rc<RefCell<SoundState>>,
}

impl RecordingSound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_playback(&self, fail: bool) {
        self.state.borrow_mut().fail = fail;
    }

    pub fn completions(&self) -> u32 {
        self.state.borrow().completions
    }

    pub fn previews(&self) -> Vec<SoundOption> {
        self.state.borrow().previews.clone()
    }
}

impl SoundSink for RecordingSound {
    fn selected_sound(&self) -> SoundOption {
        self.state.borrow().selected
    }

    fn set_selected_sound(&mut self, sound: SoundOption) {
        self.state.borrow_mut().selected = sound;
    }

    fn play_completion(&self) -> Result<(), SinkError> {
        let mut state = self.state.borrow_mut();
        if state.fail {
            return Err(SinkError::Sound("no audio device".to_string()));
        }
        state.completions += 1;
        Ok(())
    }

    fn play_preview(&self, sound: SoundOption) -> Result<(), SinkError> {
        let mut state = self.state.borrow_mut();
        if state.fail {
            return Err(SinkError::Sound("no audio device".to_string()));
        }
        state.previews.push(sound);
        Ok(())
    }
}
