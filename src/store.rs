//! Persistence boundary for assignments, breaks, and reports.
//!
//! Every lifecycle transition goes through a conditional write: the store
//! applies the mutation only if the record still satisfies the stated
//! precondition, and reports whether it did. That compare-and-set is the only
//! concurrency control in the system — callers racing on the same record get
//! exactly one `true`, and a loser re-reads to decide what the loss means.

#[cfg(test)]
mod memory;
mod sqlite;

#[cfg(test)]
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{AssignmentReport, Break, GeoSample, GeoStamp, ShiftAssignment};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("assignment not found: {0}")]
    AssignmentNotFound(Uuid),

    #[error("break not found: {0}")]
    BreakNotFound(Uuid),

    #[error("report not found: {0}")]
    ReportNotFound(Uuid),

    #[error("assignment already exists: {0}")]
    AssignmentAlreadyExists(Uuid),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type Result<T> = core::result::Result<T, StoreError>;

/// Storage operations the engine needs.
///
/// Conditional writes return `Ok(true)` when the mutation applied and
/// `Ok(false)` when no record matched the precondition any more — a lost
/// race, not an error. Implementations must make each conditional write
/// atomic: the precondition check and the mutation are one indivisible step.
pub trait AssignmentStore {
    // ── Assignments ──

    fn create_assignment(&self, assignment: &ShiftAssignment) -> Result<()>;

    fn assignment(&self, id: Uuid) -> Result<ShiftAssignment>;

    /// All assignments, ordered by scheduled start.
    fn assignments(&self) -> Result<Vec<ShiftAssignment>>;

    /// Assigned → InProgress, recording the check-in stamp.
    /// Conditional on the status still being Assigned.
    fn begin_shift(&self, id: Uuid, stamp: &GeoStamp) -> Result<bool>;

    /// InProgress → Completed, recording the check-out stamp and appending
    /// `notes` to any already present.
    /// Conditional on the status still being InProgress.
    fn complete_shift(&self, id: Uuid, stamp: &GeoStamp, notes: Option<&str>) -> Result<bool>;

    /// Assigned → Missed. Conditional on the status still being Assigned.
    fn mark_missed(&self, id: Uuid) -> Result<bool>;

    /// Ids of Assigned assignments whose scheduled start is strictly before
    /// `cutoff`, ordered by scheduled start.
    fn assigned_started_before(&self, cutoff: Timestamp) -> Result<Vec<Uuid>>;

    // ── Breaks ──

    /// Inserts `record`, conditional on its assignment having no open break.
    fn open_break(&self, record: &Break) -> Result<bool>;

    /// Records the end of a break, appending `notes` to any already present.
    /// Conditional on the break still being open.
    fn close_break(
        &self,
        id: Uuid,
        ended_at: Timestamp,
        end_geo: Option<&GeoSample>,
        notes: Option<&str>,
    ) -> Result<bool>;

    fn break_record(&self, id: Uuid) -> Result<Break>;

    /// The open break on an assignment, if any. At most one can exist.
    fn open_break_for(&self, assignment_id: Uuid) -> Result<Option<Break>>;

    /// All breaks on an assignment, ordered by start time.
    fn breaks_for(&self, assignment_id: Uuid) -> Result<Vec<Break>>;

    // ── Reports ──

    fn append_report(&self, report: &AssignmentReport) -> Result<()>;

    fn report(&self, id: Uuid) -> Result<AssignmentReport>;

    /// Submitted → Reviewed. Conditional on the status still being Submitted.
    fn review_report(&self, id: Uuid) -> Result<bool>;

    /// All reports on an assignment, ordered by submission time.
    fn reports_for(&self, assignment_id: Uuid) -> Result<Vec<AssignmentReport>>;
}
