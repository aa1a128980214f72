//! Report table: append-only records plus the reviewer status flip.

use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use crate::model::{AssignmentReport, ReportKind, ReportStatus};

use super::{Result, SqliteStore, StoreError, geo_from_json, geo_to_json, parse_timestamp, parse_uuid};

const COLUMNS: &str =
    "id, assignment_id, guard_id, kind, title, description, geo, submitted_at, status";

impl SqliteStore {
    pub(super) fn append_report(&self, report: &AssignmentReport) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO report
             (id, assignment_id, guard_id, kind, title, description, geo, submitted_at, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                report.id.to_string(),
                report.assignment_id.to_string(),
                report.guard_id.to_string(),
                serialize_kind(report.kind),
                &report.title,
                &report.description,
                report.geo.as_ref().map(geo_to_json).transpose()?,
                report.submitted_at.to_string(),
                serialize_status(report.status),
            ],
        )?;
        Ok(())
    }

    pub(super) fn report(&self, id: Uuid) -> Result<AssignmentReport> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM report WHERE id = ?1"),
                params![id.to_string()],
                raw_report,
            )
            .optional()?;
        match raw {
            Some(raw) => report_from_raw(raw),
            None => Err(StoreError::ReportNotFound(id)),
        }
    }

    pub(super) fn review_report(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE report SET status = 'reviewed' WHERE id = ?1 AND status = 'submitted'",
            params![id.to_string()],
        )?;
        Ok(rows > 0)
    }

    pub(super) fn reports_for(&self, assignment_id: Uuid) -> Result<Vec<AssignmentReport>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM report WHERE assignment_id = ?1"
        ))?;
        let mut all = Vec::new();
        for raw in stmt.query_map(params![assignment_id.to_string()], raw_report)? {
            all.push(report_from_raw(raw?)?);
        }
        all.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(all)
    }
}

type RawReport = (
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    String,
);

fn raw_report(row: &Row<'_>) -> rusqlite::Result<RawReport> {
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
    ))
}

fn report_from_raw(raw: RawReport) -> Result<AssignmentReport> {
    let (id, assignment_id, guard_id, kind, title, description, geo, submitted_at, status) = raw;

    Ok(AssignmentReport {
        id: parse_uuid(&id, "report id")?,
        assignment_id: parse_uuid(&assignment_id, "assignment_id")?,
        guard_id: parse_uuid(&guard_id, "guard_id")?,
        kind: deserialize_kind(&kind)?,
        title,
        description,
        geo: geo
            .as_deref()
            .map(|v| geo_from_json(v, "geo"))
            .transpose()?,
        submitted_at: parse_timestamp(&submitted_at, "submitted_at")?,
        status: deserialize_status(&status)?,
    })
}

/// Converts a `ReportKind` to its kind column value.
fn serialize_kind(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::Incident => "incident",
        ReportKind::Maintenance => "maintenance",
        ReportKind::SecurityBreach => "security_breach",
        ReportKind::MedicalEmergency => "medical_emergency",
        ReportKind::General => "general",
    }
}

/// Reconstructs a `ReportKind` from its kind column value.
fn deserialize_kind(value: &str) -> Result<ReportKind> {
    match value {
        "incident" => Ok(ReportKind::Incident),
        "maintenance" => Ok(ReportKind::Maintenance),
        "security_breach" => Ok(ReportKind::SecurityBreach),
        "medical_emergency" => Ok(ReportKind::MedicalEmergency),
        "general" => Ok(ReportKind::General),
        other => Err(StoreError::Corrupt(format!("unknown report kind: {other}"))),
    }
}

/// Converts a `ReportStatus` to its status column value.
fn serialize_status(status: ReportStatus) -> &'static str {
    match status {
        ReportStatus::Submitted => "submitted",
        ReportStatus::Reviewed => "reviewed",
    }
}

/// Reconstructs a `ReportStatus` from its status column value.
fn deserialize_status(value: &str) -> Result<ReportStatus> {
    match value {
        "submitted" => Ok(ReportStatus::Submitted),
        "reviewed" => Ok(ReportStatus::Reviewed),
        other => Err(StoreError::Corrupt(format!(
            "unknown report status: {other}"
        ))),
    }
}
