//! SQLite-backed store.
//!
//! One database file holds the assignment, shift_break, and report tables.
//! Timestamps and UUIDs are stored as TEXT, geolocation samples as JSON TEXT.
//! Every conditional write is a single SQL statement whose WHERE clause
//! carries the precondition, so a transition either applies once or touches
//! zero rows — the partial index on open breaks backs the same rule at the
//! schema level.

mod assignment;
mod breaks;
mod reports;

use std::fs;
use std::path::PathBuf;

use jiff::Timestamp;
use rusqlite::Connection;
use uuid::Uuid;

use crate::model::{AssignmentReport, Break, GeoSample, GeoStamp, ShiftAssignment};

use super::{AssignmentStore, Result, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS assignment (
    id              TEXT PRIMARY KEY,
    guard_id        TEXT NOT NULL,
    site_id         TEXT NOT NULL,
    scheduled_start TEXT NOT NULL,
    scheduled_end   TEXT NOT NULL,
    status          TEXT NOT NULL,
    check_in_at     TEXT,
    check_in_geo    TEXT,
    check_out_at    TEXT,
    check_out_geo   TEXT,
    notes           TEXT
);

CREATE TABLE IF NOT EXISTS shift_break (
    id            TEXT PRIMARY KEY,
    assignment_id TEXT NOT NULL REFERENCES assignment(id),
    kind          TEXT NOT NULL,
    started_at    TEXT NOT NULL,
    ended_at      TEXT,
    start_geo     TEXT,
    end_geo       TEXT,
    notes         TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS shift_break_open
    ON shift_break(assignment_id) WHERE ended_at IS NULL;

CREATE TABLE IF NOT EXISTS report (
    id            TEXT PRIMARY KEY,
    assignment_id TEXT NOT NULL REFERENCES assignment(id),
    guard_id      TEXT NOT NULL,
    kind          TEXT NOT NULL,
    title         TEXT NOT NULL,
    description   TEXT NOT NULL,
    geo           TEXT,
    submitted_at  TEXT NOT NULL,
    status        TEXT NOT NULL
);
";

/// Store backed by a single `SQLite` file.
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Opens the database at `path`, creating the file and schema if needed.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let store = Self { path };
        store.conn()?.execute_batch(SCHEMA)?;
        Ok(store)
    }

    /// Returns the default database path: `~/.postwatch/postwatch.sqlite`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".postwatch").join("postwatch.sqlite"))
    }

    fn conn(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }
}

impl AssignmentStore for SqliteStore {
    fn create_assignment(&self, assignment: &ShiftAssignment) -> Result<()> {
        SqliteStore::create_assignment(self, assignment)
    }

    fn assignment(&self, id: Uuid) -> Result<ShiftAssignment> {
        SqliteStore::assignment(self, id)
    }

    fn assignments(&self) -> Result<Vec<ShiftAssignment>> {
        SqliteStore::assignments(self)
    }

    fn begin_shift(&self, id: Uuid, stamp: &GeoStamp) -> Result<bool> {
        SqliteStore::begin_shift(self, id, stamp)
    }

    fn complete_shift(&self, id: Uuid, stamp: &GeoStamp, notes: Option<&str>) -> Result<bool> {
        SqliteStore::complete_shift(self, id, stamp, notes)
    }

    fn mark_missed(&self, id: Uuid) -> Result<bool> {
        SqliteStore::mark_missed(self, id)
    }

    fn assigned_started_before(&self, cutoff: Timestamp) -> Result<Vec<Uuid>> {
        SqliteStore::assigned_started_before(self, cutoff)
    }

    fn open_break(&self, record: &Break) -> Result<bool> {
        SqliteStore::open_break(self, record)
    }

    fn close_break(
        &self,
        id: Uuid,
        ended_at: Timestamp,
        end_geo: Option<&GeoSample>,
        notes: Option<&str>,
    ) -> Result<bool> {
        SqliteStore::close_break(self, id, ended_at, end_geo, notes)
    }

    fn break_record(&self, id: Uuid) -> Result<Break> {
        SqliteStore::break_record(self, id)
    }

    fn open_break_for(&self, assignment_id: Uuid) -> Result<Option<Break>> {
        SqliteStore::open_break_for(self, assignment_id)
    }

    fn breaks_for(&self, assignment_id: Uuid) -> Result<Vec<Break>> {
        SqliteStore::breaks_for(self, assignment_id)
    }

    fn append_report(&self, report: &AssignmentReport) -> Result<()> {
        SqliteStore::append_report(self, report)
    }

    fn report(&self, id: Uuid) -> Result<AssignmentReport> {
        SqliteStore::report(self, id)
    }

    fn review_report(&self, id: Uuid) -> Result<bool> {
        SqliteStore::review_report(self, id)
    }

    fn reports_for(&self, assignment_id: Uuid) -> Result<Vec<AssignmentReport>> {
        SqliteStore::reports_for(self, assignment_id)
    }
}

// ── Column (de)serialization helpers shared by the table modules ──

fn parse_uuid(value: &str, column: &str) -> Result<Uuid> {
    value
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("invalid {column}: {e}")))
}

fn parse_timestamp(value: &str, column: &str) -> Result<Timestamp> {
    value
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("invalid {column}: {e}")))
}

fn geo_to_json(geo: &GeoSample) -> Result<String> {
    Ok(serde_json::to_string(geo)?)
}

fn geo_from_json(value: &str, column: &str) -> Result<GeoSample> {
    serde_json::from_str(value).map_err(|e| StoreError::Corrupt(format!("invalid {column}: {e}")))
}

/// Reassembles an optional timestamp/geo column pair into a `GeoStamp`.
///
/// The columns travel together: one set without the other is corrupt.
fn stamp_from_columns(
    at: Option<&str>,
    geo: Option<&str>,
    what: &str,
) -> Result<Option<GeoStamp>> {
    match (at, geo) {
        (None, None) => Ok(None),
        (Some(at), Some(geo)) => Ok(Some(GeoStamp {
            at: parse_timestamp(at, what)?,
            geo: geo_from_json(geo, what)?,
        })),
        _ => Err(StoreError::Corrupt(format!(
            "{what} timestamp and geo must be set together"
        ))),
    }
}
