//! Database schema definitions
//!
//! Row types for sqlx mapping from SQLite tables.
//! Schema is defined in migrations/20261019000000_init.sql

use crate::error::{PersistenceError, PersistenceResult};
use chrono::{DateTime, Utc};
use civicdesk_core::{
    Category, Complaint, ComplaintParts, ComplaintStatus, CoreError, IdentityClaim,
    IdentityVerification, Priority, ReporterType, StatusEntry,
};
use serde::{Deserialize, Serialize};

/// Row type for table `complaints`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ComplaintRow {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub reporter_type: String,
    pub reporter_id: Option<String>,
    pub national_id: Option<String>,
    pub identity_holder: Option<String>,
    pub identity_region: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub handler_id: Option<String>,
    pub department_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Row type for table `complaint_status_history`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct StatusHistoryRow {
    pub complaint_id: String,
    pub seq: i64,
    pub status: String,
    pub note: Option<String>,
    pub actor: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

// === Conversion implementations ===

impl From<&Complaint> for ComplaintRow {
    fn from(c: &Complaint) -> Self {
        let identity = c.identity_verification();
        Self {
            id: c.id().to_string(),
            title: c.title.clone(),
            category: c.category.as_str().to_string(),
            description: c.description.clone(),
            priority: c.priority.as_str().to_string(),
            status: c.status().as_str().to_string(),
            reporter_type: c.reporter_type.as_str().to_string(),
            reporter_id: c.reporter_id.clone(),
            national_id: identity.map(|i| i.national_id().to_string()),
            identity_holder: identity.and_then(|i| i.holder_name.clone()),
            identity_region: identity.and_then(|i| i.region.clone()),
            verified_at: identity.map(|i| i.verified_at),
            location: c.location.clone(),
            handler_id: c.handler_id.clone(),
            department_id: c.department_id.clone(),
            created_at: c.created_at,
            updated_at: c.updated_at(),
            resolved_at: c.resolved_at(),
        }
    }
}

impl StatusHistoryRow {
    pub fn from_entry(complaint_id: &str, seq: usize, entry: &StatusEntry) -> Self {
        Self {
            complaint_id: complaint_id.to_string(),
            seq: seq as i64,
            status: entry.status.as_str().to_string(),
            note: entry.note.clone(),
            actor: entry.actor.clone(),
            recorded_at: entry.recorded_at,
        }
    }

    pub fn into_entry(self) -> PersistenceResult<StatusEntry> {
        Ok(StatusEntry {
            status: parse_status(&self.status)?,
            note: self.note,
            actor: self.actor,
            recorded_at: self.recorded_at,
        })
    }
}

impl ComplaintRow {
    /// Combine with history rows (ordered by seq) into core parts
    pub fn into_parts(self, history: Vec<StatusHistoryRow>) -> PersistenceResult<ComplaintParts> {
        let category = Category::from_str(&self.category)
            .ok_or_else(|| PersistenceError::invalid_enum("category", &self.category))?;
        let priority = Priority::from_str(&self.priority)
            .ok_or_else(|| PersistenceError::invalid_enum("priority", &self.priority))?;
        let reporter_type = ReporterType::from_str(&self.reporter_type)
            .ok_or_else(|| PersistenceError::invalid_enum("reporter_type", &self.reporter_type))?;
        let status = parse_status(&self.status)?;

        let identity_verification = match (self.national_id, self.verified_at) {
            (Some(national_id), Some(verified_at)) => {
                let claim = IdentityClaim {
                    national_id,
                    holder_name: self.identity_holder,
                    region: self.identity_region,
                };
                let verified = IdentityVerification::verify(claim, verified_at).ok_or_else(|| {
                    CoreError::corrupt_history(&self.id, "stored national ID fails checksum")
                })?;
                Some(verified)
            }
            _ => None,
        };

        let status_history = history
            .into_iter()
            .map(StatusHistoryRow::into_entry)
            .collect::<PersistenceResult<Vec<_>>>()?;

        Ok(ComplaintParts {
            id: self.id,
            title: self.title,
            category,
            description: self.description,
            priority,
            status,
            reporter_type,
            reporter_id: self.reporter_id,
            identity_verification,
            status_history,
            location: self.location,
            handler_id: self.handler_id,
            department_id: self.department_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            resolved_at: self.resolved_at,
        })
    }
}

fn parse_status(value: &str) -> PersistenceResult<ComplaintStatus> {
    ComplaintStatus::from_str(value).ok_or_else(|| PersistenceError::invalid_enum("status", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use civicdesk_core::{LifecycleEngine, NewComplaint};

    #[test]
    fn test_row_round_trip() {
        let engine = LifecycleEngine::default();
        let claim = IdentityClaim::new("345678901238").with_region("MH");
        let mut c = engine
            .create(
                "CMP-1",
                NewComplaint::new("Streetlight out", "Street Lighting", "Dark since Monday")
                    .verified("u-1", claim)
                    .with_department("EB"),
                Some("u-1"),
            )
            .unwrap();
        engine
            .transition(
                &mut c,
                ComplaintStatus::Acknowledged,
                Some("seen"),
                Some("mod"),
            )
            .unwrap();

        let row = ComplaintRow::from(&c);
        assert_eq!(row.category, "street_lighting");
        assert_eq!(row.status, "acknowledged");
        assert_eq!(row.national_id.as_deref(), Some("345678901238"));

        let history: Vec<StatusHistoryRow> = c
            .status_history()
            .iter()
            .enumerate()
            .map(|(i, e)| StatusHistoryRow::from_entry(c.id(), i, e))
            .collect();
        let parts = row.into_parts(history).unwrap();
        let restored = Complaint::restore(parts).unwrap();
        assert_eq!(restored, c);
    }

    #[test]
    fn test_invalid_enum_rejected() {
        let engine = LifecycleEngine::default();
        let c = engine
            .create("CMP-1", NewComplaint::new("t", "Noise", "d"), None)
            .unwrap();
        let mut row = ComplaintRow::from(&c);
        row.priority = "critical".to_string();

        let err = row.into_parts(Vec::new()).unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidEnumValue { .. }));
    }
}
