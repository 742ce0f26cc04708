//! Engine façade
//!
//! Owns the settings, the session log and the timer, and is the only thing
//! that mutates them. Every public operation runs to completion before the
//! next one starts; callers drive it from a single task or thread.
//!
//! Notification permission replies may arrive on any thread. They are sent
//! over a channel and only applied by [`Engine::pump`], which every public
//! mutating operation calls first, so a reply never races a tick.

use std::sync::mpsc::{self, Receiver, Sender};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::SettingsError;
use crate::mode::Mode;
use crate::ports::{Clock, KeyValueStore, NotificationSink, PermissionCallback, SoundSink};
use crate::session::{Session, SessionLog};
use crate::settings::Settings;
use crate::sound::SoundOption;
use crate::stats::{self, DailyStat, FocusStats};
use crate::timer::{Completion, Tick, Timer};

/// Change notification delivered to subscribers after an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Countdown, running flag or mode changed
    StateChanged,
    /// A settings field changed
    SettingsChanged,
    /// An interval completed and the timer moved to the next mode
    SessionCompleted(Completion),
    /// A session was appended to the log
    SessionRecorded(Mode),
    /// The session log and work counter were cleared
    SessionsCleared,
    /// The cached notification permission changed
    PermissionChanged(bool),
}

type Listener = Box<dyn FnMut(&EngineEvent)>;

/// Every observable value at one point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub remaining: u64,
    pub is_running: bool,
    pub progress: f64,
    pub time_string: String,
    pub completed_work_count: u32,
    pub settings: Settings,
    pub notification_permission_granted: bool,
    pub stats: FocusStats,
    pub total_focus_time: String,
}

pub struct Engine {
    settings: Settings,
    timer: Timer,
    log: SessionLog,
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    notifier: Box<dyn NotificationSink>,
    sound: Box<dyn SoundSink>,
    permission_granted: bool,
    /// Permission checks or requests not yet answered
    permission_pending: usize,
    permission_tx: Sender<bool>,
    permission_rx: Receiver<bool>,
    listeners: Vec<Listener>,
}

impl Engine {
    /// Build an engine over the given collaborators, loading settings and
    /// sessions from the store and starting a permission check.
    pub fn new<S, C, N, A>(store: S, clock: C, notifier: N, sound: A) -> Self
    where
        S: KeyValueStore + 'static,
        C: Clock + 'static,
        N: NotificationSink + 'static,
        A: SoundSink + 'static,
    {
        let settings = Settings::load(&store);
        let log = SessionLog::load(&store);
        let mut sound = sound;
        sound.set_selected_sound(settings.selected_sound);

        let (permission_tx, permission_rx) = mpsc::channel();
        let mut engine = Self {
            timer: Timer::new(&settings),
            settings,
            log,
            store: Box::new(store),
            clock: Box::new(clock),
            notifier: Box::new(notifier),
            sound: Box::new(sound),
            permission_granted: false,
            permission_pending: 0,
            permission_tx,
            permission_rx,
            listeners: Vec::new(),
        };

        debug!(
            sessions = engine.log.len(),
            work_minutes = engine.settings.work_minutes,
            "Engine loaded"
        );

        let reply = engine.permission_reply();
        engine.notifier.check_permission(reply);
        engine.pump();
        engine
    }

    /// Register a callback run after every change
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Apply any notification permission replies that have arrived.
    /// Returns true if the cached permission changed.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(granted) = self.permission_rx.try_recv() {
            self.permission_pending = self.permission_pending.saturating_sub(1);
            if granted != self.permission_granted {
                self.permission_granted = granted;
                changed = true;
                debug!(granted, "Notification permission updated");
                self.emit(EngineEvent::PermissionChanged(granted));
            }
        }
        changed
    }

    // Timer controls

    pub fn start(&mut self) {
        self.pump();
        if self.timer.start() {
            debug!(mode = %self.timer.mode(), "Timer started");
            self.emit(EngineEvent::StateChanged);
        }
    }

    pub fn pause(&mut self) {
        self.pump();
        if self.timer.pause() {
            debug!(mode = %self.timer.mode(), remaining = self.timer.remaining(), "Timer paused");
            self.emit(EngineEvent::StateChanged);
        }
    }

    pub fn start_pause(&mut self) {
        if self.timer.is_running() {
            self.pause();
        } else {
            self.start();
        }
    }

    pub fn reset(&mut self) {
        self.pump();
        self.timer.reset(&self.settings);
        self.emit(EngineEvent::StateChanged);
    }

    pub fn switch_mode(&mut self, mode: Mode) {
        self.pump();
        self.timer.switch_mode(mode, &self.settings);
        debug!(%mode, "Switched mode");
        self.emit(EngineEvent::StateChanged);
    }

    /// Advance the countdown by one second, completing the interval if it
    /// was already at zero.
    pub fn tick(&mut self) -> Tick {
        self.pump();

        let Engine {
            settings,
            timer,
            log,
            store,
            clock,
            notifier,
            sound,
            permission_granted,
            ..
        } = self;

        let outcome = timer.tick(settings, |mode| {
            log.record(mode, clock.now());
            if let Err(e) = log.save(&mut **store) {
                warn!("Failed to persist session log: {}", e);
            }
            announce(mode, &**sound, &**notifier, *permission_granted);
        });

        if let Tick::Completed(completion) = outcome {
            info!(
                completed = %completion.completed,
                next = %completion.next,
                work_sessions = completion.completed_work_count,
                "Interval complete"
            );
            self.emit(EngineEvent::SessionRecorded(completion.completed));
            self.emit(EngineEvent::SessionCompleted(completion));
        }
        self.emit(EngineEvent::StateChanged);
        outcome
    }

    // Sessions

    /// Append a session for `mode` at the current time and persist the log
    pub fn record_session(&mut self, mode: Mode) -> Session {
        self.pump();
        let session = self.log.record(mode, self.clock.now()).clone();
        self.persist_log();
        self.emit(EngineEvent::SessionRecorded(mode));
        session
    }

    /// Empty the log and reset the long-break cadence
    pub fn clear_all_sessions(&mut self) {
        self.pump();
        self.log.clear();
        self.timer.set_completed_work_count(0);
        self.persist_log();
        info!("Cleared all sessions");
        self.emit(EngineEvent::SessionsCleared);
    }

    /// Seed the long-break cadence counter
    pub fn set_completed_work_count(&mut self, count: u32) {
        self.pump();
        self.timer.set_completed_work_count(count);
        self.emit(EngineEvent::StateChanged);
    }

    // Settings

    pub fn set_work_minutes(&mut self, minutes: u32) -> Result<(), SettingsError> {
        self.set_minutes(Mode::Work, minutes)
    }

    pub fn set_short_break_minutes(&mut self, minutes: u32) -> Result<(), SettingsError> {
        self.set_minutes(Mode::ShortBreak, minutes)
    }

    pub fn set_long_break_minutes(&mut self, minutes: u32) -> Result<(), SettingsError> {
        self.set_minutes(Mode::LongBreak, minutes)
    }

    /// Set `mode`'s duration, persist it, and reload the countdown if that
    /// mode is current and idle
    pub fn set_minutes(&mut self, mode: Mode, minutes: u32) -> Result<(), SettingsError> {
        self.pump();
        self.settings.set_minutes(mode, minutes)?;
        if let Err(e) = self.settings.save_minutes(self.store.as_mut(), mode) {
            warn!(key = mode.settings_key(), "Failed to persist setting: {}", e);
        }
        debug!(%mode, minutes, "Duration updated");
        self.emit(EngineEvent::SettingsChanged);
        if self.timer.reload(mode, &self.settings) {
            self.emit(EngineEvent::StateChanged);
        }
        Ok(())
    }

    pub fn set_long_break_interval(&mut self, interval: u32) -> Result<(), SettingsError> {
        self.pump();
        self.settings.set_long_break_interval(interval)?;
        if let Err(e) = self.settings.save_interval(self.store.as_mut()) {
            warn!("Failed to persist long break interval: {}", e);
        }
        debug!(interval, "Long break interval updated");
        self.emit(EngineEvent::SettingsChanged);
        Ok(())
    }

    pub fn set_selected_sound(&mut self, sound: SoundOption) {
        self.pump();
        self.settings.selected_sound = sound;
        self.sound.set_selected_sound(sound);
        if let Err(e) = self.settings.save_sound(self.store.as_mut()) {
            warn!("Failed to persist selected sound: {}", e);
        }
        self.emit(EngineEvent::SettingsChanged);
    }

    /// Set the selected sound from its identifier
    pub fn set_selected_sound_id(&mut self, id: &str) -> Result<(), SettingsError> {
        let sound =
            SoundOption::from_str(id).ok_or_else(|| SettingsError::UnknownSound(id.to_string()))?;
        self.set_selected_sound(sound);
        Ok(())
    }

    /// Restore default durations and interval, then reset the countdown
    pub fn reset_to_defaults(&mut self) {
        self.pump();
        self.settings.restore_defaults();
        if let Err(e) = self.settings.save_durations(self.store.as_mut()) {
            warn!("Failed to persist default settings: {}", e);
        }
        self.timer.reset(&self.settings);
        info!("Settings restored to defaults");
        self.emit(EngineEvent::SettingsChanged);
        self.emit(EngineEvent::StateChanged);
    }

    // Side effects

    /// Ask the notification sink for permission. The answer is applied by a
    /// later [`Engine::pump`].
    pub fn request_notification_permission(&mut self) {
        self.pump();
        let reply = self.permission_reply();
        self.notifier.request_permission(reply);
        self.pump();
    }

    pub fn preview_sound(&mut self, sound: SoundOption) {
        self.pump();
        if let Err(e) = self.sound.play_preview(sound) {
            warn!(sound = sound.id(), "Sound preview failed: {}", e);
        }
    }

    pub fn cancel_notifications(&mut self) {
        self.pump();
        self.notifier.cancel_all();
    }

    // Accessors

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sessions(&self) -> &[Session] {
        self.log.sessions()
    }

    pub fn current_mode(&self) -> Mode {
        self.timer.mode()
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.timer.remaining()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn completed_work_count(&self) -> u32 {
        self.timer.completed_work_count()
    }

    pub fn duration_for(&self, mode: Mode) -> u64 {
        self.settings.duration_for(mode)
    }

    pub fn progress(&self) -> f64 {
        self.timer.progress(&self.settings)
    }

    pub fn time_string(&self) -> String {
        self.timer.time_string()
    }

    pub fn selected_sound(&self) -> SoundOption {
        self.sound.selected_sound()
    }

    pub fn notification_permission_granted(&self) -> bool {
        self.permission_granted
    }

    /// Whether a permission check or request is still unanswered
    pub fn permission_pending(&self) -> bool {
        self.permission_pending > 0
    }

    pub fn today_count(&self) -> u32 {
        stats::today_count(&self.log, self.clock.as_ref())
    }

    pub fn week_count(&self) -> u32 {
        stats::week_count(&self.log, self.clock.as_ref())
    }

    pub fn total_count(&self) -> u32 {
        stats::total_count(&self.log)
    }

    pub fn weekly_stats(&self) -> Vec<DailyStat> {
        stats::weekly_stats(&self.log, self.clock.as_ref())
    }

    pub fn total_focus_time_string(&self) -> String {
        let minutes = u64::from(self.total_count()) * u64::from(self.settings.work_minutes);
        stats::format_focus_time(minutes)
    }

    pub fn stats(&self) -> FocusStats {
        FocusStats::compute(&self.log, self.clock.as_ref(), self.settings.work_minutes)
    }

    pub fn snapshot(&self) -> Snapshot {
        let stats = self.stats();
        Snapshot {
            mode: self.current_mode(),
            remaining: self.remaining_seconds(),
            is_running: self.is_running(),
            progress: self.progress(),
            time_string: self.time_string(),
            completed_work_count: self.completed_work_count(),
            settings: self.settings,
            notification_permission_granted: self.permission_granted,
            total_focus_time: stats.total_focus_time_string(),
            stats,
        }
    }

    fn permission_reply(&mut self) -> PermissionCallback {
        self.permission_pending += 1;
        let tx = self.permission_tx.clone();
        Box::new(move |granted| {
            let _ = tx.send(granted);
        })
    }

    fn persist_log(&mut self) {
        if let Err(e) = self.log.save(self.store.as_mut()) {
            warn!("Failed to persist session log: {}", e);
        }
    }

    fn emit(&mut self, event: EngineEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    #[cfg(test)]
    pub(crate) fn set_remaining(&mut self, remaining: u64) {
        self.timer.set_remaining(remaining, &self.settings);
    }
}

/// Play the completion sound and, if permitted, post the completion
/// notification. Failures are logged and otherwise ignored.
fn announce(mode: Mode, sound: &dyn SoundSink, notifier: &dyn NotificationSink, permitted: bool) {
    if let Err(e) = sound.play_completion() {
        warn!("Completion sound failed: {}", e);
    }
    if !permitted {
        return;
    }
    let (title, body) = mode.completion_message();
    if let Err(e) = notifier.send(title, body) {
        warn!("Completion notification failed: {}", e);
    }
}
