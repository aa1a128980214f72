//! Report filing and review.

use uuid::Uuid;

use crate::model::{AssignmentReport, AssignmentStatus, GeoSample, ReportKind, ReportStatus};
use crate::notify::ShiftEvent;
use crate::store::{AssignmentStore, StoreError};

use super::{Engine, EngineError, Result};

impl<S: AssignmentStore> Engine<S> {
    /// Files an immutable report against an assignment.
    ///
    /// Only the assigned guard may file, and only once on site: an assignment
    /// that is still Assigned (or was Missed) takes no reports.
    pub fn file_report(
        &self,
        assignment_id: Uuid,
        guard_id: Uuid,
        kind: ReportKind,
        title: &str,
        description: &str,
        geo: Option<GeoSample>,
    ) -> Result<AssignmentReport> {
        if title.trim().is_empty() {
            return Err(EngineError::Validation("report title cannot be empty".into()));
        }
        if description.trim().is_empty() {
            return Err(EngineError::Validation(
                "report description cannot be empty".into(),
            ));
        }
        if let Some(geo) = &geo {
            geo.validate().map_err(EngineError::Validation)?;
        }

        let assignment = self.fetch(assignment_id)?;
        Self::authorize(&assignment, guard_id)?;
        if !matches!(
            assignment.status,
            AssignmentStatus::InProgress | AssignmentStatus::Completed
        ) {
            return Err(EngineError::InvalidState {
                operation: "file-report",
                status: assignment.status,
            });
        }

        let report = AssignmentReport {
            id: Uuid::new_v4(),
            assignment_id,
            guard_id,
            kind,
            title: title.to_owned(),
            description: description.to_owned(),
            geo,
            submitted_at: self.clock.now(),
            status: ReportStatus::Submitted,
        };
        self.store.append_report(&report)?;

        self.emit(&ShiftEvent::ReportFiled {
            assignment_id,
            report_id: report.id,
            report_kind: kind,
        });
        Ok(report)
    }

    /// Marks a report Reviewed. Reviewer-only; no guard actor.
    ///
    /// Returns whether the flip applied: an already-reviewed report is a
    /// silent no-op, matching the conditional-write discipline everywhere
    /// else.
    pub fn review_report(&self, report_id: Uuid) -> Result<bool> {
        match self.store.report(report_id) {
            Ok(_) => {}
            Err(StoreError::ReportNotFound(id)) => return Err(EngineError::ReportNotFound(id)),
            Err(e) => return Err(e.into()),
        }
        Ok(self.store.review_report(report_id)?)
    }

    /// Lists all reports on an assignment, ordered by submission time.
    pub fn reports_for(&self, assignment_id: Uuid) -> Result<Vec<AssignmentReport>> {
        self.fetch(assignment_id)?;
        Ok(self.store.reports_for(assignment_id)?)
    }
}
