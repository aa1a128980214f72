//! In-memory store: maps behind one mutex.
//!
//! Every operation takes the lock once, so each conditional write is
//! trivially atomic. Backs the engine tests, including the deterministic
//! race interleavings.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{AssignmentReport, AssignmentStatus, Break, GeoSample, GeoStamp, ReportStatus, ShiftAssignment};

use super::{AssignmentStore, Result, StoreError};

/// Shared in-memory store.
///
/// Cloning shares the underlying data: a test can hand one handle to the
/// engine and keep another for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    assignments: HashMap<Uuid, ShiftAssignment>,
    breaks: HashMap<Uuid, Break>,
    reports: HashMap<Uuid, AssignmentReport>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Corrupt("store mutex poisoned".into()))
    }
}

/// Appends `extra` to `notes`, separating with a newline when both exist.
fn append_notes(notes: &mut Option<String>, extra: Option<&str>) {
    let Some(extra) = extra else { return };
    match notes {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(extra);
        }
        None => *notes = Some(extra.to_string()),
    }
}

impl AssignmentStore for MemoryStore {
    // ── Assignments ──

    fn create_assignment(&self, assignment: &ShiftAssignment) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.assignments.contains_key(&assignment.id) {
            return Err(StoreError::AssignmentAlreadyExists(assignment.id));
        }
        inner.assignments.insert(assignment.id, assignment.clone());
        Ok(())
    }

    fn assignment(&self, id: Uuid) -> Result<ShiftAssignment> {
        self.lock()?
            .assignments
            .get(&id)
            .cloned()
            .ok_or(StoreError::AssignmentNotFound(id))
    }

    fn assignments(&self) -> Result<Vec<ShiftAssignment>> {
        let inner = self.lock()?;
        let mut all: Vec<ShiftAssignment> = inner.assignments.values().cloned().collect();
        all.sort_by(|a, b| a.scheduled_start.cmp(&b.scheduled_start));
        Ok(all)
    }

    fn begin_shift(&self, id: Uuid, stamp: &GeoStamp) -> Result<bool> {
        let mut inner = self.lock()?;
        let Some(assignment) = inner.assignments.get_mut(&id) else {
            return Ok(false);
        };
        if assignment.status != AssignmentStatus::Assigned {
            return Ok(false);
        }
        assignment.status = AssignmentStatus::InProgress;
        assignment.check_in = Some(stamp.clone());
        Ok(true)
    }

    fn complete_shift(&self, id: Uuid, stamp: &GeoStamp, notes: Option<&str>) -> Result<bool> {
        let mut inner = self.lock()?;
        let Some(assignment) = inner.assignments.get_mut(&id) else {
            return Ok(false);
        };
        if assignment.status != AssignmentStatus::InProgress {
            return Ok(false);
        }
        assignment.status = AssignmentStatus::Completed;
        assignment.check_out = Some(stamp.clone());
        append_notes(&mut assignment.notes, notes);
        Ok(true)
    }

    fn mark_missed(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.lock()?;
        let Some(assignment) = inner.assignments.get_mut(&id) else {
            return Ok(false);
        };
        if assignment.status != AssignmentStatus::Assigned {
            return Ok(false);
        }
        assignment.status = AssignmentStatus::Missed;
        Ok(true)
    }

    fn assigned_started_before(&self, cutoff: Timestamp) -> Result<Vec<Uuid>> {
        let inner = self.lock()?;
        let mut candidates: Vec<&ShiftAssignment> = inner
            .assignments
            .values()
            .filter(|a| a.status == AssignmentStatus::Assigned && a.scheduled_start < cutoff)
            .collect();
        candidates.sort_by(|a, b| a.scheduled_start.cmp(&b.scheduled_start));
        Ok(candidates.iter().map(|a| a.id).collect())
    }

    // ── Breaks ──

    fn open_break(&self, record: &Break) -> Result<bool> {
        let mut inner = self.lock()?;
        let already_open = inner
            .breaks
            .values()
            .any(|b| b.assignment_id == record.assignment_id && b.is_open());
        if already_open {
            return Ok(false);
        }
        inner.breaks.insert(record.id, record.clone());
        Ok(true)
    }

    fn close_break(
        &self,
        id: Uuid,
        ended_at: Timestamp,
        end_geo: Option<&GeoSample>,
        notes: Option<&str>,
    ) -> Result<bool> {
        let mut inner = self.lock()?;
        let Some(record) = inner.breaks.get_mut(&id) else {
            return Ok(false);
        };
        if !record.is_open() {
            return Ok(false);
        }
        record.ended_at = Some(ended_at);
        record.end_geo = end_geo.cloned();
        append_notes(&mut record.notes, notes);
        Ok(true)
    }

    fn break_record(&self, id: Uuid) -> Result<Break> {
        self.lock()?
            .breaks
            .get(&id)
            .cloned()
            .ok_or(StoreError::BreakNotFound(id))
    }

    fn open_break_for(&self, assignment_id: Uuid) -> Result<Option<Break>> {
        let inner = self.lock()?;
        Ok(inner
            .breaks
            .values()
            .find(|b| b.assignment_id == assignment_id && b.is_open())
            .cloned())
    }

    fn breaks_for(&self, assignment_id: Uuid) -> Result<Vec<Break>> {
        let inner = self.lock()?;
        let mut all: Vec<Break> = inner
            .breaks
            .values()
            .filter(|b| b.assignment_id == assignment_id)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(all)
    }

    // ── Reports ──

    fn append_report(&self, report: &AssignmentReport) -> Result<()> {
        let mut inner = self.lock()?;
        inner.reports.insert(report.id, report.clone());
        Ok(())
    }

    fn report(&self, id: Uuid) -> Result<AssignmentReport> {
        self.lock()?
            .reports
            .get(&id)
            .cloned()
            .ok_or(StoreError::ReportNotFound(id))
    }

    fn review_report(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.lock()?;
        let Some(report) = inner.reports.get_mut(&id) else {
            return Ok(false);
        };
        if report.status != ReportStatus::Submitted {
            return Ok(false);
        }
        report.status = ReportStatus::Reviewed;
        Ok(true)
    }

    fn reports_for(&self, assignment_id: Uuid) -> Result<Vec<AssignmentReport>> {
        let inner = self.lock()?;
        let mut all: Vec<AssignmentReport> = inner
            .reports
            .values()
            .filter(|r| r.assignment_id == assignment_id)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{BreakKind, GeoSample, ReportKind};

    fn t(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn sample_geo() -> GeoSample {
        GeoSample {
            latitude: 51.5074,
            longitude: -0.1278,
            accuracy_meters: 10.0,
            address: None,
        }
    }

    fn sample_assignment() -> ShiftAssignment {
        ShiftAssignment {
            id: Uuid::new_v4(),
            guard_id: Uuid::new_v4(),
            site_id: Uuid::new_v4(),
            scheduled_start: t("2026-03-02T09:00:00Z"),
            scheduled_end: t("2026-03-02T17:00:00Z"),
            status: AssignmentStatus::Assigned,
            check_in: None,
            check_out: None,
            notes: None,
        }
    }

    fn sample_break(assignment_id: Uuid) -> Break {
        Break {
            id: Uuid::new_v4(),
            assignment_id,
            kind: BreakKind::Regular,
            started_at: t("2026-03-02T12:00:00Z"),
            ended_at: None,
            start_geo: None,
            end_geo: None,
            notes: None,
        }
    }

    fn sample_report(assignment_id: Uuid, guard_id: Uuid) -> AssignmentReport {
        AssignmentReport {
            id: Uuid::new_v4(),
            assignment_id,
            guard_id,
            kind: ReportKind::Incident,
            title: "Broken gate".into(),
            description: "The east gate latch is broken.".into(),
            geo: None,
            submitted_at: t("2026-03-02T10:00:00Z"),
            status: ReportStatus::Submitted,
        }
    }

    #[test]
    fn create_and_load_assignment() {
        let store = MemoryStore::new();
        let assignment = sample_assignment();

        store.create_assignment(&assignment).unwrap();
        let loaded = store.assignment(assignment.id).unwrap();

        assert_eq!(loaded, assignment);
    }

    #[test]
    fn create_duplicate_assignment_fails() {
        let store = MemoryStore::new();
        let assignment = sample_assignment();

        store.create_assignment(&assignment).unwrap();
        let err = store.create_assignment(&assignment).unwrap_err();

        assert!(matches!(err, StoreError::AssignmentAlreadyExists(_)));
    }

    #[test]
    fn load_nonexistent_assignment_fails() {
        let store = MemoryStore::new();
        let err = store.assignment(Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, StoreError::AssignmentNotFound(_)));
    }

    #[test]
    fn begin_shift_applies_exactly_once() {
        let store = MemoryStore::new();
        let assignment = sample_assignment();
        store.create_assignment(&assignment).unwrap();

        let stamp = GeoStamp {
            at: t("2026-03-02T08:55:00Z"),
            geo: sample_geo(),
        };

        assert!(store.begin_shift(assignment.id, &stamp).unwrap());
        // Second writer loses: the status is no longer Assigned.
        assert!(!store.begin_shift(assignment.id, &stamp).unwrap());

        let loaded = store.assignment(assignment.id).unwrap();
        assert_eq!(loaded.status, AssignmentStatus::InProgress);
        assert_eq!(loaded.check_in.unwrap().at, stamp.at);
    }

    #[test]
    fn begin_shift_on_missing_assignment_is_false() {
        let store = MemoryStore::new();
        let stamp = GeoStamp {
            at: t("2026-03-02T08:55:00Z"),
            geo: sample_geo(),
        };
        assert!(!store.begin_shift(Uuid::new_v4(), &stamp).unwrap());
    }

    #[test]
    fn complete_shift_requires_in_progress() {
        let store = MemoryStore::new();
        let assignment = sample_assignment();
        store.create_assignment(&assignment).unwrap();

        let stamp = GeoStamp {
            at: t("2026-03-02T17:02:00Z"),
            geo: sample_geo(),
        };

        // Still Assigned: the precondition fails.
        assert!(!store.complete_shift(assignment.id, &stamp, None).unwrap());

        let check_in = GeoStamp {
            at: t("2026-03-02T08:55:00Z"),
            geo: sample_geo(),
        };
        store.begin_shift(assignment.id, &check_in).unwrap();

        assert!(store
            .complete_shift(assignment.id, &stamp, Some("Quiet night."))
            .unwrap());
        assert!(!store.complete_shift(assignment.id, &stamp, None).unwrap());

        let loaded = store.assignment(assignment.id).unwrap();
        assert_eq!(loaded.status, AssignmentStatus::Completed);
        assert_eq!(loaded.notes.as_deref(), Some("Quiet night."));
    }

    #[test]
    fn complete_shift_appends_notes() {
        let store = MemoryStore::new();
        let mut assignment = sample_assignment();
        assignment.notes = Some("Radio handed over.".into());
        store.create_assignment(&assignment).unwrap();

        let check_in = GeoStamp {
            at: t("2026-03-02T08:55:00Z"),
            geo: sample_geo(),
        };
        store.begin_shift(assignment.id, &check_in).unwrap();
        let check_out = GeoStamp {
            at: t("2026-03-02T17:02:00Z"),
            geo: sample_geo(),
        };
        store
            .complete_shift(assignment.id, &check_out, Some("Quiet night."))
            .unwrap();

        let loaded = store.assignment(assignment.id).unwrap();
        assert_eq!(
            loaded.notes.as_deref(),
            Some("Radio handed over.\nQuiet night.")
        );
    }

    #[test]
    fn mark_missed_only_from_assigned() {
        let store = MemoryStore::new();
        let assignment = sample_assignment();
        store.create_assignment(&assignment).unwrap();

        assert!(store.mark_missed(assignment.id).unwrap());
        assert!(!store.mark_missed(assignment.id).unwrap());

        let loaded = store.assignment(assignment.id).unwrap();
        assert_eq!(loaded.status, AssignmentStatus::Missed);
    }

    #[test]
    fn assigned_started_before_filters_by_status_and_start() {
        let store = MemoryStore::new();

        let mut early = sample_assignment();
        early.scheduled_start = t("2026-03-02T06:00:00Z");
        let mut late = sample_assignment();
        late.scheduled_start = t("2026-03-02T12:00:00Z");
        let mut checked_in = sample_assignment();
        checked_in.scheduled_start = t("2026-03-02T06:00:00Z");

        store.create_assignment(&early).unwrap();
        store.create_assignment(&late).unwrap();
        store.create_assignment(&checked_in).unwrap();
        let stamp = GeoStamp {
            at: t("2026-03-02T06:05:00Z"),
            geo: sample_geo(),
        };
        store.begin_shift(checked_in.id, &stamp).unwrap();

        let candidates = store
            .assigned_started_before(t("2026-03-02T09:00:00Z"))
            .unwrap();
        assert_eq!(candidates, vec![early.id]);
    }

    #[test]
    fn open_break_rejects_second_open_break() {
        let store = MemoryStore::new();
        let assignment = sample_assignment();
        store.create_assignment(&assignment).unwrap();

        let first = sample_break(assignment.id);
        let second = sample_break(assignment.id);

        assert!(store.open_break(&first).unwrap());
        assert!(!store.open_break(&second).unwrap());

        // Closing the first frees the slot.
        store
            .close_break(first.id, t("2026-03-02T12:25:00Z"), None, None)
            .unwrap();
        assert!(store.open_break(&second).unwrap());
    }

    #[test]
    fn close_break_applies_exactly_once() {
        let store = MemoryStore::new();
        let assignment = sample_assignment();
        store.create_assignment(&assignment).unwrap();

        let record = sample_break(assignment.id);
        store.open_break(&record).unwrap();

        let ended_at = t("2026-03-02T12:25:00Z");
        assert!(store
            .close_break(record.id, ended_at, Some(&sample_geo()), Some("Back on post."))
            .unwrap());
        assert!(!store.close_break(record.id, ended_at, None, None).unwrap());

        let loaded = store.break_record(record.id).unwrap();
        assert_eq!(loaded.ended_at, Some(ended_at));
        assert_eq!(loaded.notes.as_deref(), Some("Back on post."));
    }

    #[test]
    fn open_break_for_finds_only_open_breaks() {
        let store = MemoryStore::new();
        let assignment = sample_assignment();
        store.create_assignment(&assignment).unwrap();

        assert!(store.open_break_for(assignment.id).unwrap().is_none());

        let record = sample_break(assignment.id);
        store.open_break(&record).unwrap();
        assert_eq!(
            store.open_break_for(assignment.id).unwrap().unwrap().id,
            record.id
        );

        store
            .close_break(record.id, t("2026-03-02T12:25:00Z"), None, None)
            .unwrap();
        assert!(store.open_break_for(assignment.id).unwrap().is_none());
    }

    #[test]
    fn breaks_for_returns_all_sorted_by_start() {
        let store = MemoryStore::new();
        let assignment = sample_assignment();
        store.create_assignment(&assignment).unwrap();

        let mut first = sample_break(assignment.id);
        first.started_at = t("2026-03-02T10:00:00Z");
        store.open_break(&first).unwrap();
        store
            .close_break(first.id, t("2026-03-02T10:15:00Z"), None, None)
            .unwrap();

        let mut second = sample_break(assignment.id);
        second.started_at = t("2026-03-02T12:00:00Z");
        store.open_break(&second).unwrap();

        let all = store.breaks_for(assignment.id).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[1].id, second.id);
    }

    #[test]
    fn review_report_applies_exactly_once() {
        let store = MemoryStore::new();
        let assignment = sample_assignment();
        store.create_assignment(&assignment).unwrap();

        let report = sample_report(assignment.id, assignment.guard_id);
        store.append_report(&report).unwrap();

        assert!(store.review_report(report.id).unwrap());
        assert!(!store.review_report(report.id).unwrap());

        let loaded = store.report(report.id).unwrap();
        assert_eq!(loaded.status, ReportStatus::Reviewed);
    }

    #[test]
    fn reports_for_returns_all_sorted_by_submission() {
        let store = MemoryStore::new();
        let assignment = sample_assignment();
        store.create_assignment(&assignment).unwrap();

        let mut second = sample_report(assignment.id, assignment.guard_id);
        second.submitted_at = t("2026-03-02T14:00:00Z");
        let mut first = sample_report(assignment.id, assignment.guard_id);
        first.submitted_at = t("2026-03-02T10:30:00Z");

        store.append_report(&second).unwrap();
        store.append_report(&first).unwrap();

        let all = store.reports_for(assignment.id).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[1].id, second.id);
    }
}
