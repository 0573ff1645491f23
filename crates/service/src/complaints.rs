//! Complaint operations - submit, transition, lookup
//!
//! ComplaintService ties the lifecycle engine to storage: ids come from the
//! database sequence, transitions on one complaint are serialized, and every
//! accepted write lands in the audit feed.

use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use anyhow::Context;
use chrono::{DateTime, Utc};
use civicdesk_core::{Complaint, ComplaintEvent, ComplaintStatus, NewComplaint, Transition};
use civicdesk_persistence::{AuditFilter, ComplaintRepo, SequenceRepo};
use tracing::{debug, info, warn};

/// Name of the counter row backing complaint ids
pub const COMPLAINT_SEQUENCE: &str = "complaint";

/// Outcome of an accepted submission
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub complaint: Complaint,
    pub event_id: String,
    /// 1 unless an id collision forced a retry
    pub attempts: u32,
}

/// Outcome of a transition request
#[derive(Debug, Clone)]
pub struct TransitionResult {
    pub complaint: Complaint,
    pub transition: Transition,
    /// None for an idempotent no-op
    pub event_id: Option<String>,
}

/// Complaint Service - submission and status changes
pub struct ComplaintService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ComplaintService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Validate and store a new complaint
    pub async fn submit(
        &self,
        fields: NewComplaint,
        actor: Option<&str>,
    ) -> ServiceResult<SubmissionResult> {
        self.submit_at(fields, actor, Utc::now()).await
    }

    /// Same as [`ComplaintService::submit`] with an explicit clock reading
    pub async fn submit_at(
        &self,
        fields: NewComplaint,
        actor: Option<&str>,
        at: DateTime<Utc>,
    ) -> ServiceResult<SubmissionResult> {
        let pool = self.ctx.pool();
        let max_attempts = self.ctx.config().max_id_retries + 1;

        // Bad input must not consume a sequence value
        self.ctx
            .engine()
            .check_submission(&fields)
            .map_err(ServiceError::from)?;

        for attempt in 1..=max_attempts {
            let sequence = SequenceRepo::next_value(pool, COMPLAINT_SEQUENCE)
                .await
                .map_err(ServiceError::from)
                .context("Failed to reserve complaint sequence")?;
            let id = self.ctx.generator().next(sequence, at);

            let complaint = self
                .ctx
                .engine()
                .create_at(&id, fields.clone(), actor, at)
                .map_err(ServiceError::from)?;

            match ComplaintRepo::insert(pool, &complaint).await {
                Ok(()) => {
                    let event_id = self.ctx.next_event_id();
                    let event = ComplaintEvent::submitted(&event_id, &complaint);
                    self.ctx.record(&event);

                    let identity = complaint
                        .identity_verification()
                        .map(|i| i.masked_id())
                        .unwrap_or_default();
                    info!(
                        complaint_id = %complaint.id(),
                        sequence,
                        attempt,
                        category = %complaint.category,
                        reporter_type = %complaint.reporter_type,
                        identity = %identity,
                        "Complaint submitted"
                    );

                    return Ok(SubmissionResult {
                        complaint,
                        event_id,
                        attempts: attempt,
                    });
                }
                Err(e) if e.is_unique_violation() => {
                    warn!(
                        complaint_id = %id,
                        sequence,
                        attempt,
                        "Complaint id collision, retrying"
                    );
                }
                Err(e) => {
                    return Err(ServiceError::from(e)).context("Failed to store complaint");
                }
            }
        }

        Err(ServiceError::UniquenessConflict {
            attempts: max_attempts,
        }
        .into())
    }

    /// Move a complaint to `new_status`.
    ///
    /// Load, transition and save run under the complaint's lock, so concurrent
    /// callers are applied one after another and each sees the previous result.
    pub async fn transition(
        &self,
        id: &str,
        new_status: ComplaintStatus,
        note: Option<&str>,
        actor: Option<&str>,
    ) -> ServiceResult<TransitionResult> {
        let _guard = self.ctx.locks().acquire(id).await;

        let mut complaint = self.load(id).await?;
        let transition = self
            .ctx
            .engine()
            .transition(&mut complaint, new_status, note, actor)
            .map_err(ServiceError::from)?;

        let Transition::Applied { from, to } = transition else {
            debug!(complaint_id = %id, status = %new_status, "Transition is a no-op");
            return Ok(TransitionResult {
                complaint,
                transition,
                event_id: None,
            });
        };

        ComplaintRepo::append_transition(self.ctx.pool(), &complaint)
            .await
            .map_err(|e| {
                let err = ServiceError::from(e);
                if err.is_conflict() {
                    warn!(complaint_id = %id, status = %to, "Concurrent modification detected");
                }
                err
            })?;

        let event_id = self.ctx.next_event_id();
        if let Some(event) = ComplaintEvent::status_changed(&event_id, &complaint, transition) {
            self.ctx.record(&event);
        }

        info!(
            complaint_id = %id,
            from = %from,
            status = %to,
            actor = actor.unwrap_or("-"),
            "Complaint transitioned"
        );

        Ok(TransitionResult {
            complaint,
            transition,
            event_id: Some(event_id),
        })
    }

    /// Load a complaint by id
    pub async fn get(&self, id: &str) -> ServiceResult<Complaint> {
        self.load(id).await
    }

    /// Every stored complaint, oldest first
    pub async fn list(&self) -> ServiceResult<Vec<Complaint>> {
        let complaints = ComplaintRepo::get_all(self.ctx.pool())
            .await
            .map_err(ServiceError::from)
            .context("Failed to list complaints")?;
        Ok(complaints)
    }

    /// Number of stored complaints
    pub async fn count(&self) -> ServiceResult<i64> {
        let count = ComplaintRepo::count(self.ctx.pool())
            .await
            .map_err(ServiceError::from)
            .context("Failed to count complaints")?;
        Ok(count)
    }

    /// Audit feed entries for one complaint, in write order
    pub fn audit_trail(&self, id: &str) -> ServiceResult<Vec<ComplaintEvent>> {
        let events = self
            .ctx
            .audit_reader()
            .query(&AuditFilter::new().complaint(id))
            .map_err(ServiceError::from)
            .context("Failed to read audit feed")?;
        Ok(events)
    }

    async fn load(&self, id: &str) -> ServiceResult<Complaint> {
        let complaint = ComplaintRepo::get_by_id(self.ctx.pool(), id)
            .await
            .map_err(ServiceError::from)?;
        Ok(complaint)
    }
}
