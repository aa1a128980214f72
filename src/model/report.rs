//! Assignment report: an immutable record filed by a guard on shift.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geo::GeoSample;

/// A report filed against an assignment.
///
/// Immutable once created, except for the reviewer-driven status flip from
/// [`ReportStatus::Submitted`] to [`ReportStatus::Reviewed`]. Reports can only
/// be filed while the owning assignment is in progress or completed — a guard
/// cannot report before arriving on site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentReport {
    pub id: Uuid,
    pub assignment_id: Uuid,

    /// The guard who filed the report.
    pub guard_id: Uuid,

    pub kind: ReportKind,
    pub title: String,
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoSample>,

    pub submitted_at: Timestamp,
    pub status: ReportStatus,
}

/// What the report is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportKind {
    Incident,
    Maintenance,
    SecurityBreach,
    MedicalEmergency,
    General,
}

/// Review state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportStatus {
    /// Filed by the guard, awaiting review.
    Submitted,

    /// A reviewer has seen it.
    Reviewed,
}
