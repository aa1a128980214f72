//! Assignment lifecycle: creation, check-in, check-out, and the missed mark.
//!
//! Check-in and check-out carry the idempotency contract for flaky mobile
//! connectivity: a duplicate submission after a client timeout observes the
//! already-applied transition and returns the record instead of erroring.

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{AssignmentStatus, GeoSample, GeoStamp, ShiftAssignment};
use crate::notify::ShiftEvent;
use crate::store::AssignmentStore;

use super::{Engine, EngineError, Result};

impl<S: AssignmentStore> Engine<S> {
    /// Creates a new assignment binding `guard_id` to a scheduled shift.
    pub fn create_assignment(
        &self,
        guard_id: Uuid,
        site_id: Uuid,
        scheduled_start: Timestamp,
        scheduled_end: Timestamp,
    ) -> Result<ShiftAssignment> {
        if scheduled_end <= scheduled_start {
            return Err(EngineError::Validation(
                "scheduled end must be after scheduled start".into(),
            ));
        }
        let assignment = ShiftAssignment {
            id: Uuid::new_v4(),
            guard_id,
            site_id,
            scheduled_start,
            scheduled_end,
            status: AssignmentStatus::Assigned,
            check_in: None,
            check_out: None,
            notes: None,
        };
        self.store.create_assignment(&assignment)?;
        Ok(assignment)
    }

    /// Loads one assignment.
    pub fn assignment(&self, id: Uuid) -> Result<ShiftAssignment> {
        self.fetch(id)
    }

    /// Lists all assignments, ordered by scheduled start.
    pub fn assignments(&self) -> Result<Vec<ShiftAssignment>> {
        Ok(self.store.assignments()?)
    }

    /// Checks the guard in, moving the assignment to InProgress.
    ///
    /// Accepted from 30 minutes before scheduled start (by default) until the
    /// late deadline. A duplicate submission on an already-checked-in
    /// assignment returns the existing record unchanged.
    pub fn check_in(
        &self,
        assignment_id: Uuid,
        guard_id: Uuid,
        geo: GeoSample,
    ) -> Result<ShiftAssignment> {
        geo.validate().map_err(EngineError::Validation)?;
        let assignment = self.fetch(assignment_id)?;
        Self::authorize(&assignment, guard_id)?;

        if assignment.status == AssignmentStatus::InProgress && assignment.check_in.is_some() {
            return Ok(assignment);
        }
        if assignment.status != AssignmentStatus::Assigned {
            return Err(EngineError::InvalidState {
                operation: "check-in",
                status: assignment.status,
            });
        }

        let now = self.clock.now();
        let earliest = self.window.earliest(assignment.scheduled_start);
        let latest = self.window.latest(assignment.scheduled_start);
        if now < earliest || now > latest {
            return Err(EngineError::OutOfWindow {
                now,
                earliest,
                latest,
            });
        }

        let stamp = GeoStamp { at: now, geo };
        if !self.store.begin_shift(assignment_id, &stamp)? {
            // Lost the race; whoever won decides what this call means.
            let current = self.fetch(assignment_id)?;
            if current.status == AssignmentStatus::InProgress && current.check_in.is_some() {
                return Ok(current);
            }
            return Err(EngineError::InvalidState {
                operation: "check-in",
                status: current.status,
            });
        }

        self.emit(&ShiftEvent::CheckedIn {
            assignment_id,
            guard_id,
            at: now,
        });
        self.fetch(assignment_id)
    }

    /// Checks the guard out, moving the assignment to Completed.
    ///
    /// Refused while a break is still open. `notes` append to any notes
    /// already on the record. Same idempotency contract as check-in once the
    /// assignment is Completed.
    pub fn check_out(
        &self,
        assignment_id: Uuid,
        guard_id: Uuid,
        geo: GeoSample,
        notes: Option<&str>,
    ) -> Result<ShiftAssignment> {
        geo.validate().map_err(EngineError::Validation)?;
        let assignment = self.fetch(assignment_id)?;
        Self::authorize(&assignment, guard_id)?;

        if assignment.status == AssignmentStatus::Completed && assignment.check_out.is_some() {
            return Ok(assignment);
        }
        if assignment.status != AssignmentStatus::InProgress {
            return Err(EngineError::InvalidState {
                operation: "check-out",
                status: assignment.status,
            });
        }
        if self.store.open_break_for(assignment_id)?.is_some() {
            return Err(EngineError::BreakStillOpen(assignment_id));
        }

        let now = self.clock.now();
        let stamp = GeoStamp { at: now, geo };
        if !self.store.complete_shift(assignment_id, &stamp, notes)? {
            let current = self.fetch(assignment_id)?;
            if current.status == AssignmentStatus::Completed && current.check_out.is_some() {
                return Ok(current);
            }
            return Err(EngineError::InvalidState {
                operation: "check-out",
                status: current.status,
            });
        }

        self.emit(&ShiftEvent::CheckedOut {
            assignment_id,
            guard_id,
            at: now,
        });
        self.fetch(assignment_id)
    }

    /// Marks an unattended assignment as Missed.
    ///
    /// System-only: there is no guard actor. Returns whether the transition
    /// applied. Any other current status, or a deadline still in the future,
    /// is a silent no-op — the sweep may race a manual check-in, and losing
    /// that race is not an error.
    pub fn mark_missed(&self, assignment_id: Uuid) -> Result<bool> {
        let assignment = self.fetch(assignment_id)?;
        if assignment.status != AssignmentStatus::Assigned {
            return Ok(false);
        }
        if self.clock.now() <= self.window.latest(assignment.scheduled_start) {
            return Ok(false);
        }
        let applied = self.store.mark_missed(assignment_id)?;
        if applied {
            self.emit(&ShiftEvent::ShiftMissed { assignment_id });
        }
        Ok(applied)
    }
}
