//! # Complaint Module
//!
//! The Complaint entity and its enumerations: Category, Priority,
//! ComplaintStatus, ReporterType, plus the identity and history records.
//!
//! Lifecycle fields (`id`, `status`, `status_history`, `resolved_at`,
//! `identity_verification`) are private. They change only through
//! [`crate::LifecycleEngine`] and are rehydrated only through
//! [`Complaint::restore`], which re-checks every invariant.

use crate::error::{CoreError, CoreResult};
use crate::lifecycle::TransitionTable;
use crate::verhoeff;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Complaint category (fixed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Noise,
    Sanitation,
    Roads,
    WaterSupply,
    Electricity,
    StreetLighting,
    PublicSafety,
    Encroachment,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Noise,
        Category::Sanitation,
        Category::Roads,
        Category::WaterSupply,
        Category::Electricity,
        Category::StreetLighting,
        Category::PublicSafety,
        Category::Encroachment,
        Category::Other,
    ];

    /// Code string for storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Noise => "noise",
            Category::Sanitation => "sanitation",
            Category::Roads => "roads",
            Category::WaterSupply => "water_supply",
            Category::Electricity => "electricity",
            Category::StreetLighting => "street_lighting",
            Category::PublicSafety => "public_safety",
            Category::Encroachment => "encroachment",
            Category::Other => "other",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Category::Noise => "Noise",
            Category::Sanitation => "Sanitation",
            Category::Roads => "Roads",
            Category::WaterSupply => "Water Supply",
            Category::Electricity => "Electricity",
            Category::StreetLighting => "Street Lighting",
            Category::PublicSafety => "Public Safety",
            Category::Encroachment => "Encroachment",
            Category::Other => "Other",
        }
    }

    /// Parse from either the code or the label, ignoring case
    pub fn from_str(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        Category::ALL.into_iter().find(|c| c.as_str() == key)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Complaint priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Workflow status of a complaint.
///
/// `Closed` and `Rejected` are terminal. `Resolved` is not: a resolved
/// complaint may still be reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Submitted,
    Acknowledged,
    InProgress,
    Resolved,
    Closed,
    Rejected,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 6] = [
        ComplaintStatus::Submitted,
        ComplaintStatus::Acknowledged,
        ComplaintStatus::InProgress,
        ComplaintStatus::Resolved,
        ComplaintStatus::Closed,
        ComplaintStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Submitted => "submitted",
            ComplaintStatus::Acknowledged => "acknowledged",
            ComplaintStatus::InProgress => "in_progress",
            ComplaintStatus::Resolved => "resolved",
            ComplaintStatus::Closed => "closed",
            ComplaintStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "submitted" => Some(ComplaintStatus::Submitted),
            "acknowledged" => Some(ComplaintStatus::Acknowledged),
            "in_progress" => Some(ComplaintStatus::InProgress),
            "resolved" => Some(ComplaintStatus::Resolved),
            "closed" => Some(ComplaintStatus::Closed),
            "rejected" => Some(ComplaintStatus::Rejected),
            _ => None,
        }
    }

    /// Terminal states end the workflow
    pub fn is_terminal(&self) -> bool {
        matches!(self, ComplaintStatus::Closed | ComplaintStatus::Rejected)
    }

    /// Position in [`ComplaintStatus::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the reporter chose to identify themselves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReporterType {
    Anonymous,
    Pseudonymous,
    Verified,
}

impl ReporterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReporterType::Anonymous => "anonymous",
            ReporterType::Pseudonymous => "pseudonymous",
            ReporterType::Verified => "verified",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "anonymous" => Some(ReporterType::Anonymous),
            "pseudonymous" => Some(ReporterType::Pseudonymous),
            "verified" => Some(ReporterType::Verified),
            _ => None,
        }
    }
}

impl fmt::Display for ReporterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity claim supplied by the request layer for a verified reporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    /// 12-digit national ID, already normalised by the caller
    pub national_id: String,
    pub holder_name: Option<String>,
    pub region: Option<String>,
}

impl IdentityClaim {
    pub fn new(national_id: &str) -> Self {
        Self {
            national_id: national_id.to_string(),
            holder_name: None,
            region: None,
        }
    }

    pub fn with_holder(mut self, name: &str) -> Self {
        self.holder_name = Some(name.to_string());
        self
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }
}

/// A national ID that passed the checksum, with its derived metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityVerification {
    /// Serialized masked; the full number stays in storage
    #[serde(serialize_with = "serialize_masked")]
    national_id: String,
    pub holder_name: Option<String>,
    pub region: Option<String>,
    pub verified_at: DateTime<Utc>,
}

impl IdentityVerification {
    /// Verify a claim. Returns None when the number fails the checksum.
    pub fn verify(claim: IdentityClaim, verified_at: DateTime<Utc>) -> Option<Self> {
        if !verhoeff::validate(&claim.national_id) {
            return None;
        }
        Some(Self {
            national_id: claim.national_id,
            holder_name: claim.holder_name,
            region: claim.region,
            verified_at,
        })
    }

    pub fn national_id(&self) -> &str {
        &self.national_id
    }

    /// Masked form safe for logs and reports
    pub fn masked_id(&self) -> String {
        verhoeff::mask(&self.national_id)
    }
}

fn serialize_masked<S: serde::Serializer>(id: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&verhoeff::mask(id))
}

/// One entry of the append-only audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: ComplaintStatus,
    pub note: Option<String>,
    /// Actor reference recorded verbatim (None for anonymous/system)
    pub actor: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Fields required to open a complaint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewComplaint {
    pub title: String,
    /// Raw category as submitted; validated against [`Category`]
    pub category: String,
    pub description: String,
    pub priority: Option<Priority>,
    pub reporter_type: Option<ReporterType>,
    pub reporter_id: Option<String>,
    pub identity: Option<IdentityClaim>,
    pub location: Option<String>,
    pub handler_id: Option<String>,
    pub department_id: Option<String>,
}

impl NewComplaint {
    pub fn new(title: &str, category: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn pseudonymous(mut self, reporter_id: &str) -> Self {
        self.reporter_type = Some(ReporterType::Pseudonymous);
        self.reporter_id = Some(reporter_id.to_string());
        self
    }

    pub fn verified(mut self, reporter_id: &str, identity: IdentityClaim) -> Self {
        self.reporter_type = Some(ReporterType::Verified);
        self.reporter_id = Some(reporter_id.to_string());
        self.identity = Some(identity);
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_department(mut self, department_id: &str) -> Self {
        self.department_id = Some(department_id.to_string());
        self
    }

    pub fn with_handler(mut self, handler_id: &str) -> Self {
        self.handler_id = Some(handler_id.to_string());
        self
    }
}

/// A civic complaint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Complaint {
    id: String,
    pub title: String,
    pub category: Category,
    pub description: String,
    pub priority: Priority,
    status: ComplaintStatus,
    pub reporter_type: ReporterType,
    pub reporter_id: Option<String>,
    identity_verification: Option<IdentityVerification>,
    status_history: Vec<StatusEntry>,
    pub location: Option<String>,
    pub handler_id: Option<String>,
    pub department_id: Option<String>,
    pub created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

/// Stored parts of a complaint, used to rehydrate it from storage
#[derive(Debug, Clone)]
pub struct ComplaintParts {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub description: String,
    pub priority: Priority,
    pub status: ComplaintStatus,
    pub reporter_type: ReporterType,
    pub reporter_id: Option<String>,
    pub identity_verification: Option<IdentityVerification>,
    pub status_history: Vec<StatusEntry>,
    pub location: Option<String>,
    pub handler_id: Option<String>,
    pub department_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Complaint {
    /// Assemble a freshly created complaint. Only the lifecycle engine calls this.
    pub(crate) fn opened(
        id: String,
        fields: ValidatedFields,
        identity_verification: Option<IdentityVerification>,
        first_entry: StatusEntry,
    ) -> Self {
        let at = first_entry.recorded_at;
        Self {
            id,
            title: fields.title,
            category: fields.category,
            description: fields.description,
            priority: fields.priority,
            status: first_entry.status,
            reporter_type: fields.reporter_type,
            reporter_id: fields.reporter_id,
            identity_verification,
            status_history: vec![first_entry],
            location: fields.location,
            handler_id: fields.handler_id,
            department_id: fields.department_id,
            created_at: at,
            updated_at: at,
            resolved_at: None,
        }
    }

    /// Rehydrate a complaint from storage.
    ///
    /// Rejects histories that are empty, disagree with `status`, start
    /// anywhere but `submitted`, or contain a step no policy allows. Steps are
    /// checked against the reopen table, since a record may have been written
    /// while reopening was enabled; the current policy only gates new
    /// transitions.
    pub fn restore(parts: ComplaintParts) -> CoreResult<Self> {
        let id = parts.id.as_str();
        let table = TransitionTable::with_terminal_reopen();
        let first = parts
            .status_history
            .first()
            .ok_or_else(|| CoreError::corrupt_history(id, "empty history"))?;
        if first.status != ComplaintStatus::Submitted {
            return Err(CoreError::corrupt_history(
                id,
                format!("history starts at {}", first.status),
            ));
        }
        for pair in parts.status_history.windows(2) {
            if !table.allows(pair[0].status, pair[1].status) {
                return Err(CoreError::corrupt_history(
                    id,
                    format!("illegal step {} -> {}", pair[0].status, pair[1].status),
                ));
            }
        }
        let last = parts.status_history.last().map(|e| e.status);
        if last != Some(parts.status) {
            return Err(CoreError::corrupt_history(
                id,
                format!("status {} does not match history", parts.status),
            ));
        }
        if let Some(identity) = &parts.identity_verification {
            if parts.reporter_type != ReporterType::Verified
                || !verhoeff::validate(identity.national_id())
            {
                return Err(CoreError::corrupt_history(id, "invalid identity verification"));
            }
        }

        Ok(Self {
            id: parts.id,
            title: parts.title,
            category: parts.category,
            description: parts.description,
            priority: parts.priority,
            status: parts.status,
            reporter_type: parts.reporter_type,
            reporter_id: parts.reporter_id,
            identity_verification: parts.identity_verification,
            status_history: parts.status_history,
            location: parts.location,
            handler_id: parts.handler_id,
            department_id: parts.department_id,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
            resolved_at: parts.resolved_at,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> ComplaintStatus {
        self.status
    }

    pub fn status_history(&self) -> &[StatusEntry] {
        &self.status_history
    }

    /// Most recent audit entry; always matches `status()`
    pub fn last_entry(&self) -> &StatusEntry {
        // History is non-empty for every constructed complaint
        &self.status_history[self.status_history.len() - 1]
    }

    pub fn identity_verification(&self) -> Option<&IdentityVerification> {
        self.identity_verification.as_ref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Append an entry and move to its status. Only the lifecycle engine calls this.
    pub(crate) fn push_entry(&mut self, entry: StatusEntry) {
        if entry.status == ComplaintStatus::Resolved {
            self.resolved_at = Some(entry.recorded_at);
        }
        self.status = entry.status;
        self.updated_at = entry.recorded_at;
        self.status_history.push(entry);
    }
}

impl fmt::Display for Complaint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} ({}, {})",
            self.id, self.status, self.title, self.category, self.priority
        )
    }
}

/// Submission fields after validation
#[derive(Debug, Clone)]
pub(crate) struct ValidatedFields {
    pub title: String,
    pub category: Category,
    pub description: String,
    pub priority: Priority,
    pub reporter_type: ReporterType,
    pub reporter_id: Option<String>,
    pub location: Option<String>,
    pub handler_id: Option<String>,
    pub department_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing() {
        assert_eq!(Category::from_str("Noise"), Some(Category::Noise));
        assert_eq!(Category::from_str("noise"), Some(Category::Noise));
        assert_eq!(
            Category::from_str("Water Supply"),
            Some(Category::WaterSupply)
        );
        assert_eq!(
            Category::from_str("street_lighting"),
            Some(Category::StreetLighting)
        );
        assert_eq!(
            Category::from_str("public-safety"),
            Some(Category::PublicSafety)
        );
        assert_eq!(Category::from_str("Potholes"), None);
        assert_eq!(Category::from_str(""), None);
    }

    #[test]
    fn test_category_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()), Some(category));
            assert_eq!(Category::from_str(category.label()), Some(category));
        }
    }

    #[test]
    fn test_status_str() {
        assert_eq!(ComplaintStatus::InProgress.as_str(), "in_progress");
        assert_eq!(
            ComplaintStatus::from_str("IN_PROGRESS"),
            Some(ComplaintStatus::InProgress)
        );
        assert_eq!(
            ComplaintStatus::from_str("in-progress"),
            Some(ComplaintStatus::InProgress)
        );
        assert_eq!(ComplaintStatus::from_str("open"), None);
    }

    #[test]
    fn test_status_terminal() {
        assert!(ComplaintStatus::Closed.is_terminal());
        assert!(ComplaintStatus::Rejected.is_terminal());
        assert!(!ComplaintStatus::Resolved.is_terminal());
        assert!(!ComplaintStatus::Submitted.is_terminal());
    }

    #[test]
    fn test_status_index_matches_all() {
        for (i, status) in ComplaintStatus::ALL.iter().enumerate() {
            assert_eq!(status.index(), i);
        }
    }

    #[test]
    fn test_priority_default() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Priority::from_str("URGENT"), Some(Priority::Urgent));
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&ComplaintStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let parsed: ComplaintStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(parsed, ComplaintStatus::Rejected);
    }

    #[test]
    fn test_identity_verification() {
        let now = Utc::now();
        let verified = IdentityVerification::verify(
            IdentityClaim::new("784568755807").with_region("KA"),
            now,
        )
        .unwrap();
        assert_eq!(verified.national_id(), "784568755807");
        assert_eq!(verified.masked_id(), "XXXX XXXX 5807");
        assert_eq!(verified.region.as_deref(), Some("KA"));

        assert!(IdentityVerification::verify(IdentityClaim::new("784568755808"), now).is_none());
        assert!(IdentityVerification::verify(IdentityClaim::new("7845 6875 5807"), now).is_none());
    }

    #[test]
    fn test_identity_serializes_masked() {
        let verified =
            IdentityVerification::verify(IdentityClaim::new("123456789010"), Utc::now()).unwrap();
        let json = serde_json::to_string(&verified).unwrap();
        assert!(json.contains("XXXX XXXX 9010"));
        assert!(!json.contains("123456789010"));
    }
}
