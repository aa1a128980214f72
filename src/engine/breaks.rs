//! Break tracking within an in-progress assignment.
//!
//! Breaks are audit records: they never pause or extend the scheduled
//! window. Any number may run sequentially; only one may be open at a time,
//! and check-out refuses to complete while one is.

use uuid::Uuid;

use crate::model::{AssignmentStatus, Break, BreakKind, GeoSample};
use crate::notify::ShiftEvent;
use crate::store::AssignmentStore;

use super::{Engine, EngineError, Result};

impl<S: AssignmentStore> Engine<S> {
    /// Opens a break on an in-progress assignment.
    pub fn start_break(
        &self,
        assignment_id: Uuid,
        guard_id: Uuid,
        kind: BreakKind,
        geo: Option<GeoSample>,
        notes: Option<&str>,
    ) -> Result<Break> {
        if let Some(geo) = &geo {
            geo.validate().map_err(EngineError::Validation)?;
        }
        let assignment = self.fetch(assignment_id)?;
        Self::authorize(&assignment, guard_id)?;
        if assignment.status != AssignmentStatus::InProgress {
            return Err(EngineError::InvalidState {
                operation: "start-break",
                status: assignment.status,
            });
        }
        if self.store.open_break_for(assignment_id)?.is_some() {
            return Err(EngineError::BreakAlreadyOpen(assignment_id));
        }

        let record = Break {
            id: Uuid::new_v4(),
            assignment_id,
            kind,
            started_at: self.clock.now(),
            ended_at: None,
            start_geo: geo,
            end_geo: None,
            notes: notes.map(str::to_owned),
        };
        // The insert re-checks "no open break" atomically; a concurrent
        // opener can still beat us between the read above and here.
        if !self.store.open_break(&record)? {
            return Err(EngineError::BreakAlreadyOpen(assignment_id));
        }

        self.emit(&ShiftEvent::BreakStarted {
            assignment_id,
            break_id: record.id,
            break_kind: kind,
        });
        Ok(record)
    }

    /// Closes an open break.
    pub fn end_break(
        &self,
        assignment_id: Uuid,
        guard_id: Uuid,
        break_id: Uuid,
        geo: Option<GeoSample>,
        notes: Option<&str>,
    ) -> Result<Break> {
        if let Some(geo) = &geo {
            geo.validate().map_err(EngineError::Validation)?;
        }
        let assignment = self.fetch(assignment_id)?;
        Self::authorize(&assignment, guard_id)?;

        let record = self.fetch_break(break_id)?;
        if record.assignment_id != assignment_id {
            return Err(EngineError::BreakNotFound(break_id));
        }
        if !record.is_open() {
            return Err(EngineError::BreakAlreadyClosed(break_id));
        }

        let ended_at = self.clock.now();
        if !self
            .store
            .close_break(break_id, ended_at, geo.as_ref(), notes)?
        {
            return Err(EngineError::BreakAlreadyClosed(break_id));
        }

        self.emit(&ShiftEvent::BreakEnded {
            assignment_id,
            break_id,
        });
        self.fetch_break(break_id)
    }

    /// Lists all breaks on an assignment, ordered by start time.
    pub fn breaks_for(&self, assignment_id: Uuid) -> Result<Vec<Break>> {
        self.fetch(assignment_id)?;
        Ok(self.store.breaks_for(assignment_id)?)
    }
}
