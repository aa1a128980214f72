//! Assignment table: creation, lookup, and the lifecycle transitions.

use jiff::Timestamp;
use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use crate::model::{AssignmentStatus, GeoStamp, ShiftAssignment};

use super::{
    Result, SqliteStore, StoreError, geo_to_json, parse_timestamp, parse_uuid, stamp_from_columns,
};

const COLUMNS: &str = "id, guard_id, site_id, scheduled_start, scheduled_end, status, \
                       check_in_at, check_in_geo, check_out_at, check_out_geo, notes";

impl SqliteStore {
    pub(super) fn create_assignment(&self, assignment: &ShiftAssignment) -> Result<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "INSERT OR IGNORE INTO assignment
             (id, guard_id, site_id, scheduled_start, scheduled_end, status,
              check_in_at, check_in_geo, check_out_at, check_out_geo, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                assignment.id.to_string(),
                assignment.guard_id.to_string(),
                assignment.site_id.to_string(),
                assignment.scheduled_start.to_string(),
                assignment.scheduled_end.to_string(),
                serialize_status(assignment.status),
                assignment.check_in.as_ref().map(|s| s.at.to_string()),
                assignment
                    .check_in
                    .as_ref()
                    .map(|s| geo_to_json(&s.geo))
                    .transpose()?,
                assignment.check_out.as_ref().map(|s| s.at.to_string()),
                assignment
                    .check_out
                    .as_ref()
                    .map(|s| geo_to_json(&s.geo))
                    .transpose()?,
                assignment.notes.as_deref(),
            ],
        )?;
        if rows == 0 {
            return Err(StoreError::AssignmentAlreadyExists(assignment.id));
        }
        Ok(())
    }

    pub(super) fn assignment(&self, id: Uuid) -> Result<ShiftAssignment> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM assignment WHERE id = ?1"),
                params![id.to_string()],
                raw_assignment,
            )
            .optional()?;
        match raw {
            Some(raw) => assignment_from_raw(raw),
            None => Err(StoreError::AssignmentNotFound(id)),
        }
    }

    pub(super) fn assignments(&self) -> Result<Vec<ShiftAssignment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM assignment"))?;
        let mut all = Vec::new();
        for raw in stmt.query_map([], raw_assignment)? {
            all.push(assignment_from_raw(raw?)?);
        }
        all.sort_by(|a, b| a.scheduled_start.cmp(&b.scheduled_start));
        Ok(all)
    }

    pub(super) fn begin_shift(&self, id: Uuid, stamp: &GeoStamp) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE assignment
             SET status = 'in_progress', check_in_at = ?2, check_in_geo = ?3
             WHERE id = ?1 AND status = 'assigned'",
            params![
                id.to_string(),
                stamp.at.to_string(),
                geo_to_json(&stamp.geo)?
            ],
        )?;
        Ok(rows > 0)
    }

    pub(super) fn complete_shift(
        &self,
        id: Uuid,
        stamp: &GeoStamp,
        notes: Option<&str>,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE assignment
             SET status = 'completed', check_out_at = ?2, check_out_geo = ?3,
                 notes = CASE
                     WHEN ?4 IS NULL THEN notes
                     WHEN notes IS NULL THEN ?4
                     ELSE notes || char(10) || ?4
                 END
             WHERE id = ?1 AND status = 'in_progress'",
            params![
                id.to_string(),
                stamp.at.to_string(),
                geo_to_json(&stamp.geo)?,
                notes
            ],
        )?;
        Ok(rows > 0)
    }

    pub(super) fn mark_missed(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE assignment SET status = 'missed' WHERE id = ?1 AND status = 'assigned'",
            params![id.to_string()],
        )?;
        Ok(rows > 0)
    }

    pub(super) fn assigned_started_before(&self, cutoff: Timestamp) -> Result<Vec<Uuid>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, scheduled_start FROM assignment WHERE status = 'assigned'")?;
        // Timestamps are TEXT with variable-width fractional seconds, so the
        // comparison happens here on parsed values, not in SQL.
        let mut candidates = Vec::new();
        for row in stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })? {
            let (id, start) = row?;
            let start = parse_timestamp(&start, "scheduled_start")?;
            if start < cutoff {
                candidates.push((parse_uuid(&id, "assignment id")?, start));
            }
        }
        candidates.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(candidates.into_iter().map(|(id, _)| id).collect())
    }
}

type RawAssignment = (
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn raw_assignment(row: &Row<'_>) -> rusqlite::Result<RawAssignment> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
    ))
}

fn assignment_from_raw(raw: RawAssignment) -> Result<ShiftAssignment> {
    let (
        id,
        guard_id,
        site_id,
        scheduled_start,
        scheduled_end,
        status,
        check_in_at,
        check_in_geo,
        check_out_at,
        check_out_geo,
        notes,
    ) = raw;

    Ok(ShiftAssignment {
        id: parse_uuid(&id, "assignment id")?,
        guard_id: parse_uuid(&guard_id, "guard_id")?,
        site_id: parse_uuid(&site_id, "site_id")?,
        scheduled_start: parse_timestamp(&scheduled_start, "scheduled_start")?,
        scheduled_end: parse_timestamp(&scheduled_end, "scheduled_end")?,
        status: deserialize_status(&status)?,
        check_in: stamp_from_columns(check_in_at.as_deref(), check_in_geo.as_deref(), "check_in")?,
        check_out: stamp_from_columns(
            check_out_at.as_deref(),
            check_out_geo.as_deref(),
            "check_out",
        )?,
        notes,
    })
}

/// Converts an `AssignmentStatus` to its status column value.
fn serialize_status(status: AssignmentStatus) -> &'static str {
    match status {
        AssignmentStatus::Assigned => "assigned",
        AssignmentStatus::InProgress => "in_progress",
        AssignmentStatus::Completed => "completed",
        AssignmentStatus::Missed => "missed",
    }
}

/// Reconstructs an `AssignmentStatus` from its status column value.
fn deserialize_status(value: &str) -> Result<AssignmentStatus> {
    match value {
        "assigned" => Ok(AssignmentStatus::Assigned),
        "in_progress" => Ok(AssignmentStatus::InProgress),
        "completed" => Ok(AssignmentStatus::Completed),
        "missed" => Ok(AssignmentStatus::Missed),
        other => Err(StoreError::Corrupt(format!(
            "unknown assignment status: {other}"
        ))),
    }
}
