//! # Lifecycle Module
//!
//! The complaint status state machine.
//!
//! The workflow is permissive: any non-terminal status may move to any other
//! status. `Closed` and `Rejected` end the workflow; re-applying the same
//! terminal status is an idempotent no-op, anything else is rejected.
//! The allowed set lives in an explicit [`TransitionTable`] so it can be
//! enumerated and audited.

use crate::complaint::{
    Category, Complaint, ComplaintStatus, IdentityVerification, NewComplaint, ReporterType,
    StatusEntry, ValidatedFields,
};
use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};

const STATUS_COUNT: usize = ComplaintStatus::ALL.len();

/// Explicit allowed-transition table.
///
/// `allowed[from][to]` is true when `from -> to` is a legal state change.
/// Same-status steps are never listed; the idempotent terminal case is
/// handled by the engine, not the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    allowed: [[bool; STATUS_COUNT]; STATUS_COUNT],
}

impl TransitionTable {
    /// Any non-terminal status may move to any other status
    pub fn permissive() -> Self {
        let mut allowed = [[false; STATUS_COUNT]; STATUS_COUNT];
        for from in ComplaintStatus::ALL {
            if from.is_terminal() {
                continue;
            }
            for to in ComplaintStatus::ALL {
                if from != to {
                    allowed[from.index()][to.index()] = true;
                }
            }
        }
        Self { allowed }
    }

    /// Permissive table that also lets `closed`/`rejected` reopen to `in_progress`
    pub fn with_terminal_reopen() -> Self {
        let mut table = Self::permissive();
        table.allow(ComplaintStatus::Closed, ComplaintStatus::InProgress);
        table.allow(ComplaintStatus::Rejected, ComplaintStatus::InProgress);
        table
    }

    fn allow(&mut self, from: ComplaintStatus, to: ComplaintStatus) {
        self.allowed[from.index()][to.index()] = true;
    }

    pub fn allows(&self, from: ComplaintStatus, to: ComplaintStatus) -> bool {
        self.allowed[from.index()][to.index()]
    }

    /// Legal next statuses from `from`, in declaration order
    pub fn targets(&self, from: ComplaintStatus) -> Vec<ComplaintStatus> {
        ComplaintStatus::ALL
            .into_iter()
            .filter(|to| self.allows(from, *to))
            .collect()
    }

    /// Every legal `(from, to)` pair
    pub fn pairs(&self) -> Vec<(ComplaintStatus, ComplaintStatus)> {
        ComplaintStatus::ALL
            .into_iter()
            .flat_map(|from| self.targets(from).into_iter().map(move |to| (from, to)))
            .collect()
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::permissive()
    }
}

/// Outcome of a transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A new history entry was appended
    Applied {
        from: ComplaintStatus,
        to: ComplaintStatus,
    },
    /// Same terminal status re-applied; nothing changed
    Unchanged(ComplaintStatus),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied { .. })
    }
}

/// Owns the complaint state machine
#[derive(Debug, Clone, Default)]
pub struct LifecycleEngine {
    table: TransitionTable,
}

impl LifecycleEngine {
    pub fn new(table: TransitionTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Open a complaint in `submitted` with a single history entry
    pub fn create(
        &self,
        id: &str,
        fields: NewComplaint,
        actor: Option<&str>,
    ) -> CoreResult<Complaint> {
        self.create_at(id, fields, actor, Utc::now())
    }

    pub fn create_at(
        &self,
        id: &str,
        fields: NewComplaint,
        actor: Option<&str>,
        at: DateTime<Utc>,
    ) -> CoreResult<Complaint> {
        if id.trim().is_empty() {
            return Err(CoreError::validation("complaint id is required"));
        }
        let (validated, identity) = validate_submission(fields, at)?;

        let entry = StatusEntry {
            status: ComplaintStatus::Submitted,
            note: Some("submitted".to_string()),
            actor: actor.map(str::to_string),
            recorded_at: at,
        };

        Ok(Complaint::opened(id.to_string(), validated, identity, entry))
    }

    /// Check submission fields without opening a complaint.
    ///
    /// Runs the same checks as [`LifecycleEngine::create`], so a caller can
    /// reject bad input before reserving an identifier.
    pub fn check_submission(&self, fields: &NewComplaint) -> CoreResult<()> {
        validate_submission(fields.clone(), Utc::now()).map(|_| ())
    }

    /// Move a complaint to `new_status`, appending one audit entry
    pub fn transition(
        &self,
        complaint: &mut Complaint,
        new_status: ComplaintStatus,
        note: Option<&str>,
        actor: Option<&str>,
    ) -> CoreResult<Transition> {
        self.transition_at(complaint, new_status, note, actor, Utc::now())
    }

    pub fn transition_at(
        &self,
        complaint: &mut Complaint,
        new_status: ComplaintStatus,
        note: Option<&str>,
        actor: Option<&str>,
        at: DateTime<Utc>,
    ) -> CoreResult<Transition> {
        let from = complaint.status();

        if from.is_terminal() && from == new_status {
            return Ok(Transition::Unchanged(from));
        }
        if !self.table.allows(from, new_status) {
            return Err(CoreError::InvalidTransition {
                from,
                to: new_status,
            });
        }

        // Entries stay in call order even if the wall clock steps back
        let recorded_at = at.max(complaint.updated_at());
        complaint.push_entry(StatusEntry {
            status: new_status,
            note: note.map(str::to_string),
            actor: actor.map(str::to_string),
            recorded_at,
        });

        Ok(Transition::Applied {
            from,
            to: new_status,
        })
    }
}

fn required(value: String, field: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn validate_submission(
    fields: NewComplaint,
    at: DateTime<Utc>,
) -> CoreResult<(ValidatedFields, Option<IdentityVerification>)> {
    let title = required(fields.title, "title")?;
    let description = required(fields.description, "description")?;
    let category = Category::from_str(&fields.category).ok_or_else(|| {
        CoreError::validation(format!("unknown category: {}", fields.category.trim()))
    })?;
    let reporter_type = fields.reporter_type.unwrap_or(ReporterType::Anonymous);

    let identity = match (reporter_type, fields.identity) {
        (ReporterType::Verified, Some(claim)) => Some(
            IdentityVerification::verify(claim, at)
                .ok_or_else(|| CoreError::validation("national ID failed checksum"))?,
        ),
        (ReporterType::Verified, None) => {
            return Err(CoreError::validation("verified reporter requires a national ID"))
        }
        (other, Some(_)) => {
            return Err(CoreError::validation(format!(
                "{} reporter cannot carry a national ID",
                other
            )))
        }
        (_, None) => None,
    };

    let reporter_id = match reporter_type {
        ReporterType::Anonymous => None,
        _ => fields.reporter_id.filter(|r| !r.trim().is_empty()),
    };

    Ok((
        ValidatedFields {
            title,
            category,
            description,
            priority: fields.priority.unwrap_or_default(),
            reporter_type,
            reporter_id,
            location: fields.location,
            handler_id: fields.handler_id,
            department_id: fields.department_id,
        },
        identity,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complaint::{ComplaintParts, IdentityClaim, Priority};
    use chrono::Duration;

    fn noise() -> NewComplaint {
        NewComplaint::new(
            "Loud music after midnight",
            "Noise",
            "Every night since Friday",
        )
    }

    fn parts_of(c: &Complaint) -> ComplaintParts {
        ComplaintParts {
            id: c.id().to_string(),
            title: c.title.clone(),
            category: c.category,
            description: c.description.clone(),
            priority: c.priority,
            status: c.status(),
            reporter_type: c.reporter_type,
            reporter_id: c.reporter_id.clone(),
            identity_verification: None,
            status_history: c.status_history().to_vec(),
            location: None,
            handler_id: None,
            department_id: None,
            created_at: c.created_at,
            updated_at: c.updated_at(),
            resolved_at: c.resolved_at(),
        }
    }

    fn open(engine: &LifecycleEngine) -> Complaint {
        engine.create("CMP-1", noise(), Some("citizen-7")).unwrap()
    }

    fn assert_history_consistent(c: &Complaint, table: &TransitionTable) {
        assert!(!c.status_history().is_empty());
        assert_eq!(c.last_entry().status, c.status());
        for pair in c.status_history().windows(2) {
            assert!(table.allows(pair[0].status, pair[1].status));
        }
    }

    #[test]
    fn test_create_sets_initial_state() {
        let engine = LifecycleEngine::default();
        let c = open(&engine);

        assert_eq!(c.id(), "CMP-1");
        assert_eq!(c.status(), ComplaintStatus::Submitted);
        assert_eq!(c.category, Category::Noise);
        assert_eq!(c.priority, Priority::Medium);
        assert_eq!(c.reporter_type, ReporterType::Anonymous);
        assert_eq!(c.status_history().len(), 1);
        assert_eq!(c.last_entry().actor.as_deref(), Some("citizen-7"));
        assert_eq!(c.created_at, c.updated_at());
        assert!(c.resolved_at().is_none());
    }

    #[test]
    fn test_create_rejects_missing_fields() {
        let engine = LifecycleEngine::default();

        let err = engine
            .create("CMP-1", NewComplaint::new("  ", "Noise", "x"), None)
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("title"));

        let err = engine
            .create("CMP-1", NewComplaint::new("t", "Noise", ""), None)
            .unwrap_err();
        assert!(err.to_string().contains("description"));

        let err = engine.create("", noise(), None).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_create_rejects_unknown_category() {
        let engine = LifecycleEngine::default();
        let err = engine
            .create("CMP-1", NewComplaint::new("t", "Potholes", "d"), None)
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Potholes"));
    }

    #[test]
    fn test_check_submission_matches_create() {
        let engine = LifecycleEngine::default();
        assert!(engine.check_submission(&noise()).is_ok());

        let claim = IdentityClaim::new("123456789011");
        let bad_id = NewComplaint::new("t", "Roads", "d").verified("u-1", claim);
        let err = engine.check_submission(&bad_id).unwrap_err();
        assert!(err.is_validation());
        assert!(engine.create("CMP-1", bad_id, None).is_err());
    }

    #[test]
    fn test_create_verified_reporter() {
        let engine = LifecycleEngine::default();
        let claim = IdentityClaim::new("123456789010").with_holder("A. Rao");
        let fields = noise().verified("user-1", claim);
        let c = engine.create("CMP-1", fields, Some("user-1")).unwrap();

        assert_eq!(c.reporter_type, ReporterType::Verified);
        let identity = c.identity_verification().unwrap();
        assert_eq!(identity.national_id(), "123456789010");
        assert_eq!(identity.holder_name.as_deref(), Some("A. Rao"));
    }

    #[test]
    fn test_create_identity_rules() {
        let engine = LifecycleEngine::default();

        let bad_checksum = noise().verified("user-1", IdentityClaim::new("123456789012"));
        let err = engine.create("CMP-1", bad_checksum, None).unwrap_err();
        assert!(err.to_string().contains("checksum"));

        let mut missing = noise();
        missing.reporter_type = Some(ReporterType::Verified);
        let err = engine.create("CMP-1", missing, None).unwrap_err();
        assert!(err.is_validation());

        let mut stray = noise().pseudonymous("nick");
        stray.identity = Some(IdentityClaim::new("123456789010"));
        let err = engine.create("CMP-1", stray, None).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_anonymous_drops_reporter_id() {
        let engine = LifecycleEngine::default();
        let mut fields = noise();
        fields.reporter_id = Some("leaked".to_string());
        let c = engine.create("CMP-1", fields, None).unwrap();
        assert!(c.reporter_id.is_none());
    }

    #[test]
    fn test_transition_appends_history() {
        let engine = LifecycleEngine::default();
        let mut c = open(&engine);

        let outcome = engine
            .transition(
                &mut c,
                ComplaintStatus::Acknowledged,
                Some("reviewed"),
                Some("mod-1"),
            )
            .unwrap();
        assert_eq!(
            outcome,
            Transition::Applied {
                from: ComplaintStatus::Submitted,
                to: ComplaintStatus::Acknowledged
            }
        );
        assert_eq!(c.status(), ComplaintStatus::Acknowledged);
        assert_eq!(c.status_history().len(), 2);
        assert_eq!(c.last_entry().note.as_deref(), Some("reviewed"));
        assert_eq!(c.last_entry().actor.as_deref(), Some("mod-1"));
        assert_history_consistent(&c, engine.table());
    }

    #[test]
    fn test_resolved_records_timestamp() {
        let engine = LifecycleEngine::default();
        let mut c = open(&engine);
        let at = c.created_at + Duration::minutes(5);

        engine
            .transition_at(&mut c, ComplaintStatus::Resolved, None, None, at)
            .unwrap();
        assert_eq!(c.resolved_at(), Some(at));
        assert_eq!(c.updated_at(), at);
    }

    #[test]
    fn test_resolved_can_reopen() {
        let engine = LifecycleEngine::default();
        let mut c = open(&engine);
        engine
            .transition(&mut c, ComplaintStatus::Resolved, None, None)
            .unwrap();
        engine
            .transition(&mut c, ComplaintStatus::InProgress, Some("reopened"), None)
            .unwrap();
        assert_eq!(c.status(), ComplaintStatus::InProgress);
        assert_history_consistent(&c, engine.table());
    }

    #[test]
    fn test_same_non_terminal_status_rejected() {
        let engine = LifecycleEngine::default();
        let mut c = open(&engine);
        let err = engine
            .transition(&mut c, ComplaintStatus::Submitted, None, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
        assert_eq!(c.status_history().len(), 1);
    }

    #[test]
    fn test_terminal_idempotence() {
        let engine = LifecycleEngine::default();
        for terminal in [ComplaintStatus::Closed, ComplaintStatus::Rejected] {
            let mut c = open(&engine);
            engine.transition(&mut c, terminal, None, None).unwrap();
            let len = c.status_history().len();

            let outcome = engine
                .transition(&mut c, terminal, Some("again"), None)
                .unwrap();
            assert_eq!(outcome, Transition::Unchanged(terminal));
            assert!(!outcome.is_applied());
            assert_eq!(c.status_history().len(), len);
        }
    }

    #[test]
    fn test_terminal_rejects_other_status() {
        let engine = LifecycleEngine::default();
        let mut c = open(&engine);
        engine
            .transition(&mut c, ComplaintStatus::Closed, None, None)
            .unwrap();

        for target in ComplaintStatus::ALL {
            if target == ComplaintStatus::Closed {
                continue;
            }
            let err = engine.transition(&mut c, target, None, None).unwrap_err();
            assert!(matches!(
                err,
                CoreError::InvalidTransition { from: ComplaintStatus::Closed, .. }
            ));
        }
        assert_eq!(c.status(), ComplaintStatus::Closed);
        assert_eq!(c.status_history().len(), 2);
    }

    #[test]
    fn test_reopen_policy() {
        let engine = LifecycleEngine::new(TransitionTable::with_terminal_reopen());
        let mut c = open(&engine);
        engine
            .transition(&mut c, ComplaintStatus::Rejected, None, None)
            .unwrap();

        assert!(engine
            .transition(&mut c, ComplaintStatus::Resolved, None, None)
            .is_err());
        engine
            .transition(
                &mut c,
                ComplaintStatus::InProgress,
                Some("appeal upheld"),
                None,
            )
            .unwrap();
        assert_eq!(c.status(), ComplaintStatus::InProgress);
    }

    #[test]
    fn test_history_matches_applied_sequence() {
        let engine = LifecycleEngine::default();
        let mut c = open(&engine);
        let steps = [
            ComplaintStatus::Acknowledged,
            ComplaintStatus::InProgress,
            ComplaintStatus::Resolved,
            ComplaintStatus::InProgress,
            ComplaintStatus::Resolved,
            ComplaintStatus::Closed,
        ];
        for (i, step) in steps.iter().enumerate() {
            let note = format!("step-{}", i);
            engine.transition(&mut c, *step, Some(&note), None).unwrap();
        }

        let recorded: Vec<ComplaintStatus> = c
            .status_history()
            .iter()
            .skip(1)
            .map(|e| e.status)
            .collect();
        assert_eq!(recorded, steps);
        let notes: Vec<String> = c
            .status_history()
            .iter()
            .skip(1)
            .filter_map(|e| e.note.clone())
            .collect();
        let expected: Vec<String> = (0..steps.len()).map(|i| format!("step-{}", i)).collect();
        assert_eq!(notes, expected);
    }

    #[test]
    fn test_timestamps_never_go_backwards() {
        let engine = LifecycleEngine::default();
        let mut c = open(&engine);
        let earlier = c.created_at - Duration::hours(1);
        engine
            .transition_at(&mut c, ComplaintStatus::Acknowledged, None, None, earlier)
            .unwrap();
        assert_eq!(c.last_entry().recorded_at, c.created_at);
    }

    #[test]
    fn test_permissive_table_shape() {
        let table = TransitionTable::permissive();
        for from in ComplaintStatus::ALL {
            let targets = table.targets(from);
            if from.is_terminal() {
                assert!(targets.is_empty());
            } else {
                assert_eq!(targets.len(), ComplaintStatus::ALL.len() - 1);
                assert!(!targets.contains(&from));
            }
        }
        assert_eq!(table.pairs().len(), 4 * 5);
    }

    #[test]
    fn test_restore_round_trip() {
        let engine = LifecycleEngine::default();
        let mut c = open(&engine);
        engine
            .transition(&mut c, ComplaintStatus::Resolved, None, None)
            .unwrap();

        let parts = parts_of(&c);
        let restored = Complaint::restore(parts.clone()).unwrap();
        assert_eq!(restored, c);

        let mut mismatched = parts.clone();
        mismatched.status = ComplaintStatus::Closed;
        assert!(Complaint::restore(mismatched).is_err());

        let mut empty = parts.clone();
        empty.status_history.clear();
        assert!(Complaint::restore(empty).is_err());

        let mut illegal = parts;
        illegal.status_history[1].status = ComplaintStatus::Submitted;
        illegal.status = ComplaintStatus::Submitted;
        assert!(Complaint::restore(illegal).is_err());
    }

    #[test]
    fn test_restore_accepts_reopened_history_under_default_policy() {
        let reopen = LifecycleEngine::new(TransitionTable::with_terminal_reopen());
        let mut c = open(&reopen);
        reopen
            .transition(&mut c, ComplaintStatus::Rejected, None, None)
            .unwrap();
        reopen
            .transition(&mut c, ComplaintStatus::InProgress, Some("appeal"), None)
            .unwrap();

        let mut restored = Complaint::restore(parts_of(&c)).unwrap();
        assert_eq!(restored.status(), ComplaintStatus::InProgress);

        // The default engine still governs what happens next
        let engine = LifecycleEngine::default();
        engine
            .transition(&mut restored, ComplaintStatus::Closed, None, None)
            .unwrap();
        let err = engine
            .transition(&mut restored, ComplaintStatus::InProgress, None, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }
}
