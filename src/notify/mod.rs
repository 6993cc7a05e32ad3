//! Desktop notification capability.
//!
//! Surfacing a native notification is a best-effort side channel: the store
//! injects an implementation of [`DesktopNotifier`] and calls it after a
//! direct notification lands in the feed. Implementations must never block
//! the caller and never fail the in-app projection — a missing binary, a
//! denied permission, or a headless host all degrade to nothing.

use std::process::Command;
use std::thread;

use crate::store::Severity;

pub trait DesktopNotifier: Send + Sync {
    /// Show a native notification. Must not block the caller.
    fn notify(&self, title: &str, message: &str, severity: Severity);
}

/// Default capability: does nothing. Used in tests and headless deployments.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl DesktopNotifier for NoopNotifier {
    fn notify(&self, _title: &str, _message: &str, _severity: Severity) {}
}

/// Shells out to `notify-send` (or a compatible program) on a detached
/// thread, so a slow desktop session never stalls the feed.
pub struct CommandNotifier {
    program: String,
}

impl CommandNotifier {
    pub fn new() -> Self {
        Self::with_program("notify-send")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CommandNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopNotifier for CommandNotifier {
    fn notify(&self, title: &str, message: &str, severity: Severity) {
        let program = self.program.clone();
        let title = title.to_string();
        let message = message.to_string();
        let urgency = match severity {
            Severity::Error => "critical",
            Severity::Warning => "normal",
            Severity::Info | Severity::Success => "low",
        };
        thread::spawn(move || {
            let result = Command::new(&program)
                .arg("--urgency")
                .arg(urgency)
                .arg(&title)
                .arg(&message)
                .status();
            if let Err(e) = result {
                tracing::debug!(program = %program, "desktop notification skipped: {e}");
            }
        });
    }
}
