//! # Stats Module
//!
//! Summary counts over a read-only snapshot of complaints. Every status and
//! every priority appears in the output, zero-filled when nothing matches.

use crate::complaint::{Complaint, ComplaintStatus, Priority, ReporterType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which records a summary covers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StatsScope {
    Global,
    /// Complaints submitted by one reporter
    Reporter(String),
    /// Complaints routed to one department
    Department(String),
    ReporterType(ReporterType),
}

impl StatsScope {
    pub fn matches(&self, complaint: &Complaint) -> bool {
        match self {
            StatsScope::Global => true,
            StatsScope::Reporter(id) => complaint.reporter_id.as_deref() == Some(id.as_str()),
            StatsScope::Department(id) => {
                complaint.department_id.as_deref() == Some(id.as_str())
            }
            StatsScope::ReporterType(kind) => complaint.reporter_type == *kind,
        }
    }
}

impl fmt::Display for StatsScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsScope::Global => write!(f, "global"),
            StatsScope::Reporter(id) => write!(f, "reporter:{}", id),
            StatsScope::Department(id) => write!(f, "department:{}", id),
            StatsScope::ReporterType(kind) => write!(f, "reporter_type:{}", kind),
        }
    }
}

/// Aggregated complaint counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub scope: StatsScope,
    pub total: u64,
    pub by_status: BTreeMap<ComplaintStatus, u64>,
    pub by_priority: BTreeMap<Priority, u64>,
}

impl StatsSummary {
    /// Summary with every bucket present and zero
    pub fn empty(scope: StatsScope) -> Self {
        Self {
            scope,
            total: 0,
            by_status: ComplaintStatus::ALL.into_iter().map(|s| (s, 0)).collect(),
            by_priority: Priority::ALL.into_iter().map(|p| (p, 0)).collect(),
        }
    }

    pub fn count(&self, status: ComplaintStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn priority_count(&self, priority: Priority) -> u64 {
        self.by_priority.get(&priority).copied().unwrap_or(0)
    }

    /// Complaints not yet in a terminal status
    pub fn open(&self) -> u64 {
        self.by_status
            .iter()
            .filter(|(status, _)| !status.is_terminal())
            .map(|(_, n)| n)
            .sum()
    }

    /// Share of complaints that reached `resolved` or `closed`
    pub fn resolution_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let done = self.count(ComplaintStatus::Resolved) + self.count(ComplaintStatus::Closed);
        done as f64 / self.total as f64
    }

    fn record(&mut self, complaint: &Complaint) {
        self.total += 1;
        *self.by_status.entry(complaint.status()).or_insert(0) += 1;
        *self.by_priority.entry(complaint.priority).or_insert(0) += 1;
    }
}

/// Computes [`StatsSummary`] values
pub struct StatsAggregator;

impl StatsAggregator {
    /// Single pass over `records`; records outside `scope` are skipped
    pub fn aggregate<'a, I>(records: I, scope: &StatsScope) -> StatsSummary
    where
        I: IntoIterator<Item = &'a Complaint>,
    {
        records
            .into_iter()
            .filter(|c| scope.matches(c))
            .fold(StatsSummary::empty(scope.clone()), |mut summary, c| {
                summary.record(c);
                summary
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complaint::{IdentityClaim, NewComplaint};
    use crate::lifecycle::LifecycleEngine;

    fn complaint(engine: &LifecycleEngine, n: usize, fields: NewComplaint) -> Complaint {
        engine.create(&format!("CMP-{}", n), fields, None).unwrap()
    }

    fn sample() -> Vec<Complaint> {
        let engine = LifecycleEngine::default();
        let mut records = Vec::new();

        records.push(complaint(&engine, 1, NewComplaint::new("a", "Noise", "d")));

        let mut c = complaint(
            &engine,
            2,
            NewComplaint::new("b", "Roads", "d")
                .pseudonymous("nick")
                .with_department("PWD")
                .with_priority(Priority::High),
        );
        engine
            .transition(&mut c, ComplaintStatus::Resolved, None, None)
            .unwrap();
        records.push(c);

        let mut c = complaint(
            &engine,
            3,
            NewComplaint::new("c", "Water Supply", "d")
                .verified("u-1", IdentityClaim::new("784568755807"))
                .with_department("PWD"),
        );
        engine
            .transition(&mut c, ComplaintStatus::Rejected, None, None)
            .unwrap();
        records.push(c);

        let mut c = complaint(
            &engine,
            4,
            NewComplaint::new("d", "Sanitation", "d").pseudonymous("nick"),
        );
        engine
            .transition(&mut c, ComplaintStatus::InProgress, None, None)
            .unwrap();
        records.push(c);

        records
    }

    fn assert_sums(summary: &StatsSummary) {
        assert_eq!(summary.by_status.len(), ComplaintStatus::ALL.len());
        assert_eq!(summary.by_priority.len(), Priority::ALL.len());
        assert_eq!(summary.by_status.values().sum::<u64>(), summary.total);
        assert_eq!(summary.by_priority.values().sum::<u64>(), summary.total);
    }

    #[test]
    fn test_empty_set_is_zero_filled() {
        let summary = StatsAggregator::aggregate(&Vec::<Complaint>::new(), &StatsScope::Global);
        assert_eq!(summary.total, 0);
        for status in ComplaintStatus::ALL {
            assert_eq!(summary.by_status.get(&status), Some(&0));
        }
        assert_eq!(summary.open(), 0);
        assert_eq!(summary.resolution_rate(), 0.0);
        assert_sums(&summary);
    }

    #[test]
    fn test_global_counts() {
        let records = sample();
        let summary = StatsAggregator::aggregate(&records, &StatsScope::Global);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.count(ComplaintStatus::Submitted), 1);
        assert_eq!(summary.count(ComplaintStatus::Resolved), 1);
        assert_eq!(summary.count(ComplaintStatus::Rejected), 1);
        assert_eq!(summary.count(ComplaintStatus::InProgress), 1);
        assert_eq!(summary.count(ComplaintStatus::Closed), 0);
        assert_eq!(summary.priority_count(Priority::High), 1);
        assert_eq!(summary.priority_count(Priority::Medium), 3);
        assert_eq!(summary.open(), 3);
        assert_eq!(summary.resolution_rate(), 0.25);
        assert_sums(&summary);
    }

    #[test]
    fn test_scoped_counts() {
        let records = sample();

        let scope = StatsScope::Reporter("nick".into());
        let by_reporter = StatsAggregator::aggregate(&records, &scope);
        assert_eq!(by_reporter.total, 2);
        assert_sums(&by_reporter);

        let by_department =
            StatsAggregator::aggregate(&records, &StatsScope::Department("PWD".into()));
        assert_eq!(by_department.total, 2);
        assert_eq!(by_department.count(ComplaintStatus::Rejected), 1);
        assert_sums(&by_department);

        let scope = StatsScope::ReporterType(ReporterType::Verified);
        let verified = StatsAggregator::aggregate(&records, &scope);
        assert_eq!(verified.total, 1);

        let nobody = StatsAggregator::aggregate(&records, &StatsScope::Department("EB".into()));
        assert_eq!(nobody.total, 0);
        assert_sums(&nobody);
    }

    #[test]
    fn test_aggregate_does_not_mutate_input() {
        let records = sample();
        let before = records.clone();
        let _ = StatsAggregator::aggregate(&records, &StatsScope::Global);
        assert_eq!(records, before);
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(StatsScope::Global.to_string(), "global");
        assert_eq!(
            StatsScope::Department("PWD".into()).to_string(),
            "department:PWD"
        );
        assert_eq!(
            StatsScope::ReporterType(ReporterType::Verified).to_string(),
            "reporter_type:verified"
        );
    }

    #[test]
    fn test_summary_serializes_every_status() {
        let summary = StatsSummary::empty(StatsScope::Global);
        let json = serde_json::to_string(&summary).unwrap();
        for status in ComplaintStatus::ALL {
            assert!(json.contains(status.as_str()));
        }
    }
}
