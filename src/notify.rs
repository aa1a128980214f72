//! Best-effort event emission on attendance state changes.
//!
//! Notifications are strictly observational: the engine logs a failed
//! dispatch and moves on. A notifier can never roll back or fail the
//! transition that triggered it.

use std::process::Command;

use jiff::Timestamp;
use serde::Serialize;
use uuid::Uuid;

use crate::model::{BreakKind, ReportKind};

/// An attendance state change worth telling the outside world about.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ShiftEvent {
    CheckedIn {
        assignment_id: Uuid,
        guard_id: Uuid,
        at: Timestamp,
    },
    CheckedOut {
        assignment_id: Uuid,
        guard_id: Uuid,
        at: Timestamp,
    },
    BreakStarted {
        assignment_id: Uuid,
        break_id: Uuid,
        break_kind: BreakKind,
    },
    BreakEnded {
        assignment_id: Uuid,
        break_id: Uuid,
    },
    ReportFiled {
        assignment_id: Uuid,
        report_id: Uuid,
        report_kind: ReportKind,
    },
    ShiftMissed {
        assignment_id: Uuid,
    },
}

/// Errors from a notification dispatch.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("notify hook failed: {0}")]
    Hook(String),
}

/// Delivers shift events somewhere outside the engine.
pub trait Notify {
    fn notify(&self, event: &ShiftEvent) -> Result<(), NotifyError>;
}

/// Logs each event through `tracing` and does nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notify for LogNotifier {
    fn notify(&self, event: &ShiftEvent) -> Result<(), NotifyError> {
        tracing::info!(?event, "shift event");
        Ok(())
    }
}

/// Runs a configured command with the event JSON as its single argument.
///
/// The command is expected to exit zero; anything else is a dispatch failure
/// for the engine to log.
#[derive(Debug, Clone)]
pub struct HookNotifier {
    command: String,
}

impl HookNotifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Notify for HookNotifier {
    fn notify(&self, event: &ShiftEvent) -> Result<(), NotifyError> {
        let json = serde_json::to_string(event)?;
        let output = Command::new(&self.command)
            .arg(&json)
            .output()
            .map_err(|e| NotifyError::Hook(format!("failed to run {}: {e}", self.command)))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(NotifyError::Hook(format!(
                "{} exited with {}: {stderr}",
                self.command, output.status
            )))
        }
    }
}
