//! Break: a temporary, audited pause within an active assignment.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geo::GeoSample;

/// One break taken during an assignment.
///
/// Breaks reference their assignment by id — the assignment stays the single
/// source of truth for lifecycle state. They are audit records only and never
/// pause or extend the scheduled window. At most one break per assignment may
/// be open (`ended_at` unset) at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Break {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub kind: BreakKind,
    pub started_at: Timestamp,

    /// Unset while the break is still open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<Timestamp>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_geo: Option<GeoSample>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_geo: Option<GeoSample>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Break {
    /// Whether the break has not been ended yet.
    pub const fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// What kind of break this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreakKind {
    /// A routine short break.
    Regular,

    /// A meal break.
    Lunch,

    /// Left post for an emergency.
    Emergency,

    /// Left post without authorization — recorded for review.
    Unauthorized,
}
