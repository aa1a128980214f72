//! Shift assignment: a guard's commitment to work one scheduled shift at one site.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geo::GeoSample;

/// One guard bound to one scheduled shift at one site.
///
/// Created when a shift is scheduled, mutated only through engine transitions,
/// and never deleted — completed and missed assignments are the attendance
/// history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftAssignment {
    pub id: Uuid,
    pub guard_id: Uuid,
    pub site_id: Uuid,
    pub scheduled_start: Timestamp,
    pub scheduled_end: Timestamp,
    pub status: AssignmentStatus,

    /// When and where the guard checked in. Set exactly once, by check-in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in: Option<GeoStamp>,

    /// When and where the guard checked out. Set exactly once, by check-out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out: Option<GeoStamp>,

    /// Freeform notes, appended at check-out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Where an assignment stands in its lifecycle.
///
/// The only legal paths are Assigned → InProgress → Completed and
/// Assigned → Missed. Nothing leaves a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssignmentStatus {
    /// Scheduled; nobody has checked in yet.
    Assigned,

    /// The guard checked in and is on site.
    InProgress,

    /// The guard checked out — terminal.
    Completed,

    /// Nobody checked in before the deadline — terminal.
    Missed,
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Assigned => "assigned",
            Self::InProgress => "in progress",
            Self::Completed => "completed",
            Self::Missed => "missed",
        };
        f.write_str(name)
    }
}

/// A timestamped location: when and where an attendance event happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoStamp {
    pub at: Timestamp,
    pub geo: GeoSample,
}
