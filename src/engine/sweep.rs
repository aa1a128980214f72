//! Missed-shift sweep: finalizes assignments nobody checked into.

use tracing::debug;

use crate::store::AssignmentStore;

use super::{Engine, Result};

/// Result of one missed-shift sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Assignments whose check-in deadline had passed when selected.
    pub examined: usize,

    /// Assignments this pass actually transitioned to Missed.
    pub marked: usize,
}

impl<S: AssignmentStore> Engine<S> {
    /// Finds Assigned assignments past the check-in deadline and marks each
    /// Missed.
    ///
    /// Safe to run from any number of concurrent sweepers without
    /// coordination: every transition is conditional on the status still
    /// being Assigned, so a lost race — against another sweeper or against a
    /// last-moment check-in — is a no-op, never a failure.
    pub fn sweep_missed(&self) -> Result<SweepOutcome> {
        let cutoff = self.clock.now() - self.window.late;
        let candidates = self.store.assigned_started_before(cutoff)?;

        let mut marked = 0;
        for id in &candidates {
            if self.mark_missed(*id)? {
                marked += 1;
            }
        }

        debug!(examined = candidates.len(), marked, "missed-shift sweep finished");
        Ok(SweepOutcome {
            examined: candidates.len(),
            marked,
        })
    }
}
