//! Complaint reports
//!
//! Report data built from core types. National IDs only ever appear masked.

use crate::exporters::ReportData;
use chrono::{DateTime, SecondsFormat, Utc};
use civicdesk_core::{Complaint, ComplaintStatus, Priority, StatsSummary};

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ============================================================================
// Stats Report
// ============================================================================

/// Per-status counts for one scope
#[derive(Debug, Clone)]
pub struct StatsReport {
    pub title: String,
    pub summary: StatsSummary,
    pub generated_at: DateTime<Utc>,
}

impl StatsReport {
    pub fn new(summary: &StatsSummary) -> Self {
        Self {
            title: format!("Complaint Statistics ({})", summary.scope),
            summary: summary.clone(),
            generated_at: Utc::now(),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    fn share(&self, count: u64) -> String {
        if self.summary.total == 0 {
            return "0.0%".to_string();
        }
        format!("{:.1}%", count as f64 * 100.0 / self.summary.total as f64)
    }
}

impl ReportData for StatsReport {
    fn title(&self) -> &str {
        &self.title
    }

    fn headers(&self) -> Vec<String> {
        vec![
            "Status".to_string(),
            "Count".to_string(),
            "Share".to_string(),
        ]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        ComplaintStatus::ALL
            .into_iter()
            .map(|status| {
                let count = self.summary.count(status);
                vec![status.to_string(), count.to_string(), self.share(count)]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        let mut summary = vec![
            ("Scope".to_string(), self.summary.scope.to_string()),
            ("Total".to_string(), self.summary.total.to_string()),
            ("Open".to_string(), self.summary.open().to_string()),
            (
                "Resolution Rate".to_string(),
                format!("{:.1}%", self.summary.resolution_rate() * 100.0),
            ),
        ];
        for priority in Priority::ALL {
            summary.push((
                format!("Priority {}", priority),
                self.summary.priority_count(priority).to_string(),
            ));
        }
        summary.push(("Generated At".to_string(), timestamp(self.generated_at)));
        summary
    }
}

// ============================================================================
// History Report
// ============================================================================

/// The status trail of one complaint
#[derive(Debug, Clone)]
pub struct HistoryReport {
    pub title: String,
    pub complaint: Complaint,
}

impl HistoryReport {
    pub fn new(complaint: &Complaint) -> Self {
        Self {
            title: format!("Status History {}", complaint.id()),
            complaint: complaint.clone(),
        }
    }
}

impl ReportData for HistoryReport {
    fn title(&self) -> &str {
        &self.title
    }

    fn headers(&self) -> Vec<String> {
        vec![
            "#".to_string(),
            "Recorded At".to_string(),
            "Status".to_string(),
            "Actor".to_string(),
            "Note".to_string(),
        ]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.complaint
            .status_history()
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                vec![
                    (i + 1).to_string(),
                    timestamp(entry.recorded_at),
                    entry.status.to_string(),
                    entry.actor.clone().unwrap_or_default(),
                    entry.note.clone().unwrap_or_default(),
                ]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        let c = &self.complaint;
        let mut summary = vec![
            ("Complaint".to_string(), c.id().to_string()),
            ("Title".to_string(), c.title.clone()),
            ("Category".to_string(), c.category.label().to_string()),
            ("Priority".to_string(), c.priority.to_string()),
            ("Status".to_string(), c.status().to_string()),
            ("Reporter".to_string(), c.reporter_type.to_string()),
        ];
        if let Some(identity) = c.identity_verification() {
            summary.push(("Identity".to_string(), identity.masked_id()));
        }
        if let Some(department) = &c.department_id {
            summary.push(("Department".to_string(), department.clone()));
        }
        summary.push(("Created At".to_string(), timestamp(c.created_at)));
        if let Some(resolved_at) = c.resolved_at() {
            summary.push(("Resolved At".to_string(), timestamp(resolved_at)));
        }
        summary
    }
}

// ============================================================================
// Complaint List Report
// ============================================================================

/// One row per complaint
#[derive(Debug, Clone)]
pub struct ComplaintListReport {
    pub title: String,
    pub complaints: Vec<Complaint>,
}

impl ComplaintListReport {
    pub fn new(title: &str, complaints: Vec<Complaint>) -> Self {
        Self {
            title: title.to_string(),
            complaints,
        }
    }
}

impl ReportData for ComplaintListReport {
    fn title(&self) -> &str {
        &self.title
    }

    fn headers(&self) -> Vec<String> {
        [
            "ID",
            "Created At",
            "Category",
            "Priority",
            "Status",
            "Department",
            "Title",
        ]
        .into_iter()
        .map(str::to_string)
        .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.complaints
            .iter()
            .map(|c| {
                vec![
                    c.id().to_string(),
                    timestamp(c.created_at),
                    c.category.to_string(),
                    c.priority.to_string(),
                    c.status().to_string(),
                    c.department_id.clone().unwrap_or_default(),
                    c.title.clone(),
                ]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        let open = self.complaints.iter().filter(|c| !c.is_terminal()).count();
        vec![
            ("Complaints".to_string(), self.complaints.len().to_string()),
            ("Open".to_string(), open.to_string()),
        ]
    }
}
