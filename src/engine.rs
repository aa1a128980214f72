//! The attendance engine: guarded lifecycle transitions over an injected store.
//!
//! The engine holds no state between calls. Every transition is a conditional
//! write against the store, so concurrent callers racing on the same record
//! resolve to exactly one applied transition; a losing caller re-reads the
//! record and lands on either the idempotent success path or a state error.
//! Notifications are dispatched after the write and never affect its outcome.

mod breaks;
mod lifecycle;
mod reports;
mod sweep;

pub use sweep::SweepOutcome;

use jiff::{SignedDuration, Timestamp};
use tracing::warn;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::model::{AssignmentStatus, Break, ShiftAssignment};
use crate::notify::{LogNotifier, Notify, ShiftEvent};
use crate::store::{AssignmentStore, StoreError};

/// Errors surfaced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("assignment not found: {0}")]
    AssignmentNotFound(Uuid),

    #[error("break not found: {0}")]
    BreakNotFound(Uuid),

    #[error("report not found: {0}")]
    ReportNotFound(Uuid),

    #[error("guard {guard_id} is not assigned to assignment {assignment_id}")]
    PermissionDenied {
        assignment_id: Uuid,
        guard_id: Uuid,
    },

    #[error("{operation} is not allowed while the assignment is {status}")]
    InvalidState {
        operation: &'static str,
        status: AssignmentStatus,
    },

    #[error("check-in at {now} is outside the allowed window [{earliest}, {latest}]")]
    OutOfWindow {
        now: Timestamp,
        earliest: Timestamp,
        latest: Timestamp,
    },

    #[error("assignment {0} already has an open break")]
    BreakAlreadyOpen(Uuid),

    #[error("break {0} is already closed")]
    BreakAlreadyClosed(Uuid),

    #[error("cannot check out of assignment {0} while a break is open")]
    BreakStillOpen(Uuid),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = core::result::Result<T, EngineError>;

/// The time band around scheduled start during which check-in is accepted.
#[derive(Debug, Clone, Copy)]
pub struct CheckInWindow {
    /// How early before scheduled start a guard may check in.
    pub early: SignedDuration,

    /// How late after scheduled start a check-in is still accepted.
    /// Past this, the assignment becomes eligible for the missed sweep.
    pub late: SignedDuration,
}

impl Default for CheckInWindow {
    fn default() -> Self {
        Self {
            early: SignedDuration::from_mins(30),
            late: SignedDuration::from_mins(120),
        }
    }
}

impl CheckInWindow {
    /// Earliest accepted check-in instant for a shift starting at `start`.
    fn earliest(self, start: Timestamp) -> Timestamp {
        start - self.early
    }

    /// Latest accepted check-in instant; also the missed-shift deadline.
    fn latest(self, start: Timestamp) -> Timestamp {
        start + self.late
    }
}

/// Attendance operations over one store.
pub struct Engine<S> {
    store: S,
    clock: Box<dyn Clock>,
    notifier: Box<dyn Notify>,
    window: CheckInWindow,
}

impl<S: AssignmentStore> Engine<S> {
    /// Creates an engine with the wall clock, log-only notifications, and the
    /// default check-in window.
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Box::new(SystemClock),
            notifier: Box::new(LogNotifier),
            window: CheckInWindow::default(),
        }
    }

    /// Replaces the clock so tests can pin the current instant.
    #[cfg(test)]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replaces the notifier.
    pub fn with_notifier(mut self, notifier: impl Notify + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Replaces the check-in window.
    pub fn with_window(mut self, window: CheckInWindow) -> Self {
        self.window = window;
        self
    }

    /// Loads an assignment, mapping the store's not-found to the engine's.
    fn fetch(&self, id: Uuid) -> Result<ShiftAssignment> {
        match self.store.assignment(id) {
            Ok(assignment) => Ok(assignment),
            Err(StoreError::AssignmentNotFound(id)) => Err(EngineError::AssignmentNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads a break, mapping the store's not-found to the engine's.
    fn fetch_break(&self, id: Uuid) -> Result<Break> {
        match self.store.break_record(id) {
            Ok(record) => Ok(record),
            Err(StoreError::BreakNotFound(id)) => Err(EngineError::BreakNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Requires that `guard_id` is the assignment's guard.
    ///
    /// The caller layer resolves whatever identity it holds to a guard id
    /// before invoking the engine; there is no fallback between id spaces.
    fn authorize(assignment: &ShiftAssignment, guard_id: Uuid) -> Result<()> {
        if assignment.guard_id == guard_id {
            Ok(())
        } else {
            Err(EngineError::PermissionDenied {
                assignment_id: assignment.id,
                guard_id,
            })
        }
    }

    /// Fire-and-forget notification: failures are logged, never propagated.
    fn emit(&self, event: &ShiftEvent) {
        if let Err(e) = self.notifier.notify(event) {
            warn!(error = %e, "notification failed");
        }
    }
}
