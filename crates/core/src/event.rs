//! # Event Module
//!
//! Complaint events for the append-only audit feed. One event is emitted per
//! accepted submission or transition; idempotent no-ops emit nothing.

use crate::complaint::{Complaint, ComplaintStatus};
use crate::lifecycle::Transition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of complaint event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintEventKind {
    Submitted,
    StatusChanged,
}

impl ComplaintEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintEventKind::Submitted => "submitted",
            ComplaintEventKind::StatusChanged => "status_changed",
        }
    }
}

impl fmt::Display for ComplaintEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit feed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintEvent {
    /// EVT_000001, EVT_000002, ...
    pub event_id: String,
    pub complaint_id: String,
    pub kind: ComplaintEventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ComplaintStatus>,
    pub to: ComplaintStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ComplaintEvent {
    /// Event for a newly opened complaint
    pub fn submitted(event_id: &str, complaint: &Complaint) -> Self {
        let entry = complaint.last_entry();
        Self {
            event_id: event_id.to_string(),
            complaint_id: complaint.id().to_string(),
            kind: ComplaintEventKind::Submitted,
            from: None,
            to: entry.status,
            actor: entry.actor.clone(),
            note: entry.note.clone(),
            timestamp: entry.recorded_at,
        }
    }

    /// Event for an applied transition; None for an idempotent no-op
    pub fn status_changed(
        event_id: &str,
        complaint: &Complaint,
        transition: Transition,
    ) -> Option<Self> {
        let Transition::Applied { from, to } = transition else {
            return None;
        };
        let entry = complaint.last_entry();
        Some(Self {
            event_id: event_id.to_string(),
            complaint_id: complaint.id().to_string(),
            kind: ComplaintEventKind::StatusChanged,
            from: Some(from),
            to,
            actor: entry.actor.clone(),
            note: entry.note.clone(),
            timestamp: entry.recorded_at,
        })
    }
}
