//! Desktop notification backends
//!
//! Works on macOS (terminal-notifier/osascript), Linux (notify-send/kdialog)
//! and WSL. Delivery spawns the backend command and never waits for it on
//! the caller's thread.

use pomodoro_core::{NotificationSink, PermissionCallback, SinkError};
use std::process::{Command, Stdio};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Application name shown by backends that support grouping
pub const APP_NAME: &str = "Pomodoro";

/// Available notification backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// macOS terminal-notifier
    TerminalNotifier,
    /// macOS osascript
    Osascript,
    /// Linux notify-send
    NotifySend,
    /// KDE kdialog
    Kdialog,
    /// WSL PowerShell
    Wsl,
    /// Print to stderr
    Echo,
}

impl Backend {
    /// Detect the best available backend for the current platform
    pub fn detect() -> Self {
        #[cfg(target_os = "macos")]
        {
            if Self::command_exists("terminal-notifier") {
                return Self::TerminalNotifier;
            }
            return Self::Osascript;
        }

        #[cfg(target_os = "linux")]
        {
            if std::env::var("WSL_DISTRO_NAME").is_ok() {
                return Self::Wsl;
            }
            if Self::command_exists("notify-send") {
                return Self::NotifySend;
            }
            if Self::command_exists("kdialog") {
                return Self::Kdialog;
            }
            return Self::Echo;
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            Self::Echo
        }
    }

    fn command_exists(cmd: &str) -> bool {
        Command::new("which")
            .arg(cmd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TerminalNotifier => "terminal-notifier",
            Self::Osascript => "osascript",
            Self::NotifySend => "notify-send",
            Self::Kdialog => "kdialog",
            Self::Wsl => "wsl",
            Self::Echo => "echo",
        }
    }

    /// Whether this backend reaches the desktop rather than the terminal
    pub fn is_desktop(&self) -> bool {
        !matches!(self, Self::Echo)
    }

    /// Build the command that displays a notification
    fn command(&self, title: &str, body: &str) -> Option<Command> {
        let cmd = match self {
            Self::TerminalNotifier => {
                let mut cmd = Command::new("terminal-notifier");
                cmd.args(["-title", title, "-message", body, "-group", "pomodoro"]);
                cmd
            }
            Self::Osascript => {
                let script = format!(
                    r#"display notification "{}" with title "{}""#,
                    body.replace('"', r#"\""#),
                    title.replace('"', r#"\""#)
                );
                let mut cmd = Command::new("osascript");
                cmd.args(["-e", &script]);
                cmd
            }
            Self::NotifySend => {
                let mut cmd = Command::new("notify-send");
                cmd.args(["--app-name", APP_NAME, title, body]);
                cmd
            }
            Self::Kdialog => {
                let mut cmd = Command::new("kdialog");
                cmd.args(["--passivepopup", body, "5", "--title", title]);
                cmd
            }
            Self::Wsl => {
                let ps_script = format!(
                    r#"[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] | Out-Null; $template = [Windows.UI.Notifications.ToastNotificationManager]::GetTemplateContent([Windows.UI.Notifications.ToastTemplateType]::ToastText02); $template.GetElementsByTagName('text')[0].AppendChild($template.CreateTextNode('{}')) | Out-Null; $template.GetElementsByTagName('text')[1].AppendChild($template.CreateTextNode('{}')) | Out-Null; [Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier('{}').Show([Windows.UI.Notifications.ToastNotification]::new($template))"#,
                    title.replace('\'', "''"),
                    body.replace('\'', "''"),
                    APP_NAME
                );
                let mut cmd = Command::new("powershell.exe");
                cmd.args(["-Command", &ps_script]);
                cmd
            }
            Self::Echo => return None,
        };
        Some(cmd)
    }

    /// Display a notification without waiting for the backend to finish
    pub fn send(&self, title: &str, body: &str) -> Result<(), SinkError> {
        let Some(mut cmd) = self.command(title, body) else {
            eprintln!("[{}] {}", title, body);
            return Ok(());
        };

        let mut child = cmd
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SinkError::Notification(format!("{}: {}", self.name(), e)))?;

        let backend = self.name();
        std::thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => {
                warn!("{} exited with status: {}", backend, status);
            }
            Err(e) => warn!("Failed to wait for {}: {}", backend, e),
            _ => {}
        });
        Ok(())
    }
}

/// Notification sink backed by the detected desktop backend.
///
/// Desktop notifications have no permission model here, so "permission" is
/// granted when a desktop backend is available.
#[derive(Clone, Default)]
pub struct DesktopNotifier {
    backend: Arc<OnceLock<Backend>>,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed backend instead of detecting one
    pub fn with_backend(backend: Backend) -> Self {
        let notifier = Self::default();
        let _ = notifier.backend.set(backend);
        notifier
    }

    pub fn backend(&self) -> Backend {
        *self.backend.get_or_init(Backend::detect)
    }

    /// Detect on a background thread and reply with availability
    fn resolve(&self, reply: PermissionCallback) {
        let backend = self.backend.clone();
        std::thread::spawn(move || {
            let detected = *backend.get_or_init(Backend::detect);
            debug!(backend = detected.name(), "Notification backend resolved");
            reply(detected.is_desktop());
        });
    }
}

impl NotificationSink for DesktopNotifier {
    fn request_permission(&self, reply: PermissionCallback) {
        self.resolve(reply);
    }

    fn check_permission(&self, reply: PermissionCallback) {
        self.resolve(reply);
    }

    fn send(&self, title: &str, body: &str) -> Result<(), SinkError> {
        self.backend().send(title, body)
    }

    fn cancel_all(&self) {
        debug!(
            backend = self.backend().name(),
            "Backend cannot retract delivered notifications"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_echo_backend_denies_permission() {
        let notifier = DesktopNotifier::with_backend(Backend::Echo);
        let (tx, rx) = mpsc::channel();
        notifier.check_permission(Box::new(move |granted| {
            let _ = tx.send(granted);
        }));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(false));
    }

    #[test]
    fn test_echo_backend_sends() {
        let notifier = DesktopNotifier::with_backend(Backend::Echo);
        assert!(notifier.send("Break Over", "Ready to focus again?").is_ok());
    }

    #[test]
    fn test_osascript_escapes_quotes() {
        let cmd = Backend::Osascript
            .command("Say \"hi\"", "Body")
            .unwrap();
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args[1].contains(r#"with title "Say \"hi\"""#));
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(Backend::NotifySend.name(), "notify-send");
        assert!(Backend::NotifySend.is_desktop());
        assert!(!Backend::Echo.is_desktop());
    }
}
