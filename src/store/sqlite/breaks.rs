//! Break table: open, close, and lookup.
//!
//! "At most one open break per assignment" is the table's core rule. The
//! conditional insert checks it in the same statement that writes the row,
//! and the partial unique index on open breaks enforces it again underneath.

use jiff::Timestamp;
use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use crate::model::{Break, BreakKind, GeoSample};

use super::{Result, SqliteStore, StoreError, geo_to_json, parse_timestamp, parse_uuid};

const COLUMNS: &str = "id, assignment_id, kind, started_at, ended_at, start_geo, end_geo, notes";

impl SqliteStore {
    pub(super) fn open_break(&self, record: &Break) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "INSERT INTO shift_break
             (id, assignment_id, kind, started_at, ended_at, start_geo, end_geo, notes)
             SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
             WHERE NOT EXISTS (
                 SELECT 1 FROM shift_break WHERE assignment_id = ?2 AND ended_at IS NULL
             )",
            params![
                record.id.to_string(),
                record.assignment_id.to_string(),
                serialize_kind(record.kind),
                record.started_at.to_string(),
                record.ended_at.map(|t| t.to_string()),
                record
                    .start_geo
                    .as_ref()
                    .map(geo_to_json)
                    .transpose()?,
                record.end_geo.as_ref().map(geo_to_json).transpose()?,
                record.notes.as_deref(),
            ],
        )?;
        Ok(rows > 0)
    }

    pub(super) fn close_break(
        &self,
        id: Uuid,
        ended_at: Timestamp,
        end_geo: Option<&GeoSample>,
        notes: Option<&str>,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE shift_break
             SET ended_at = ?2, end_geo = ?3,
                 notes = CASE
                     WHEN ?4 IS NULL THEN notes
                     WHEN notes IS NULL THEN ?4
                     ELSE notes || char(10) || ?4
                 END
             WHERE id = ?1 AND ended_at IS NULL",
            params![
                id.to_string(),
                ended_at.to_string(),
                end_geo.map(geo_to_json).transpose()?,
                notes
            ],
        )?;
        Ok(rows > 0)
    }

    pub(super) fn break_record(&self, id: Uuid) -> Result<Break> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM shift_break WHERE id = ?1"),
                params![id.to_string()],
                raw_break,
            )
            .optional()?;
        match raw {
            Some(raw) => break_from_raw(raw),
            None => Err(StoreError::BreakNotFound(id)),
        }
    }

    pub(super) fn open_break_for(&self, assignment_id: Uuid) -> Result<Option<Break>> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {COLUMNS} FROM shift_break
                     WHERE assignment_id = ?1 AND ended_at IS NULL"
                ),
                params![assignment_id.to_string()],
                raw_break,
            )
            .optional()?;
        raw.map(break_from_raw).transpose()
    }

    pub(super) fn breaks_for(&self, assignment_id: Uuid) -> Result<Vec<Break>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM shift_break WHERE assignment_id = ?1"
        ))?;
        let mut all = Vec::new();
        for raw in stmt.query_map(params![assignment_id.to_string()], raw_break)? {
            all.push(break_from_raw(raw?)?);
        }
        all.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(all)
    }
}

type RawBreak = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn raw_break(row: &Row<'_>) -> rusqlite::Result<RawBreak> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn break_from_raw(raw: RawBreak) -> Result<Break> {
    let (id, assignment_id, kind, started_at, ended_at, start_geo, end_geo, notes) = raw;

    Ok(Break {
        id: parse_uuid(&id, "break id")?,
        assignment_id: parse_uuid(&assignment_id, "assignment_id")?,
        kind: deserialize_kind(&kind)?,
        started_at: parse_timestamp(&started_at, "started_at")?,
        ended_at: ended_at
            .as_deref()
            .map(|v| parse_timestamp(v, "ended_at"))
            .transpose()?,
        start_geo: start_geo
            .as_deref()
            .map(|v| super::geo_from_json(v, "start_geo"))
            .transpose()?,
        end_geo: end_geo
            .as_deref()
            .map(|v| super::geo_from_json(v, "end_geo"))
            .transpose()?,
        notes,
    })
}

/// Converts a `BreakKind` to its kind column value.
fn serialize_kind(kind: BreakKind) -> &'static str {
    match kind {
        BreakKind::Regular => "regular",
        BreakKind::Lunch => "lunch",
        BreakKind::Emergency => "emergency",
        BreakKind::Unauthorized => "unauthorized",
    }
}

/// Reconstructs a `BreakKind` from its kind column value.
fn deserialize_kind(value: &str) -> Result<BreakKind> {
    match value {
        "regular" => Ok(BreakKind::Regular),
        "lunch" => Ok(BreakKind::Lunch),
        "emergency" => Ok(BreakKind::Emergency),
        "unauthorized" => Ok(BreakKind::Unauthorized),
        other => Err(StoreError::Corrupt(format!("unknown break kind: {other}"))),
    }
}
