//! Audit replay - read events back from JSONL files

use crate::audit::store::jsonl_files;
use crate::error::PersistenceResult;
use civicdesk_core::{ComplaintEvent, ComplaintEventKind, ComplaintStatus};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Reads audit events from a directory of daily JSONL files
pub struct AuditReader {
    base_path: PathBuf,
}

impl AuditReader {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// All events in one file, in write order
    pub fn read_file(&self, file_path: &Path) -> PersistenceResult<Vec<ComplaintEvent>> {
        let reader = BufReader::new(File::open(file_path)?);
        let mut events = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }

        Ok(events)
    }

    /// Events for one day (`YYYY-MM-DD`); empty if no file exists
    pub fn read_date(&self, date: &str) -> PersistenceResult<Vec<ComplaintEvent>> {
        let path = self.base_path.join(format!("{}.jsonl", date));
        if path.exists() {
            self.read_file(&path)
        } else {
            Ok(Vec::new())
        }
    }

    /// Every event, oldest day first
    pub fn read_all(&self) -> PersistenceResult<Vec<ComplaintEvent>> {
        let mut all = Vec::new();
        for path in jsonl_files(&self.base_path)? {
            all.extend(self.read_file(&path)?);
        }
        Ok(all)
    }

    /// Every event matching `filter`
    pub fn query(&self, filter: &AuditFilter) -> PersistenceResult<Vec<ComplaintEvent>> {
        Ok(filter.apply(self.read_all()?))
    }
}

/// Builder-style filter over audit events
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub complaint_id: Option<String>,
    pub actor: Option<String>,
    pub kind: Option<ComplaintEventKind>,
    pub to_status: Option<ComplaintStatus>,
}

impl AuditFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn complaint(mut self, complaint_id: &str) -> Self {
        self.complaint_id = Some(complaint_id.to_string());
        self
    }

    pub fn actor(mut self, actor: &str) -> Self {
        self.actor = Some(actor.to_string());
        self
    }

    pub fn kind(mut self, kind: ComplaintEventKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn to_status(mut self, status: ComplaintStatus) -> Self {
        self.to_status = Some(status);
        self
    }

    pub fn matches(&self, event: &ComplaintEvent) -> bool {
        if let Some(ref id) = self.complaint_id {
            if &event.complaint_id != id {
                return false;
            }
        }
        if let Some(ref actor) = self.actor {
            if event.actor.as_ref() != Some(actor) {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if event.kind != kind {
                return false;
            }
        }
        if let Some(status) = self.to_status {
            if event.to != status {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, events: Vec<ComplaintEvent>) -> Vec<ComplaintEvent> {
        events.into_iter().filter(|e| self.matches(e)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;
    use chrono::{TimeZone, Utc};
    use civicdesk_core::{LifecycleEngine, NewComplaint};
    use tempfile::tempdir;

    fn write_sample(log: &AuditLog) {
        let engine = LifecycleEngine::default();
        let day_one = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        let day_two = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();

        let mut a = engine
            .create_at(
                "CMP-A",
                NewComplaint::new("t", "Noise", "d"),
                Some("u-1"),
                day_one,
            )
            .unwrap();
        let event = ComplaintEvent::submitted(&log.next_event_id(), &a);
        log.append(&event).unwrap();

        let b = engine
            .create_at("CMP-B", NewComplaint::new("t", "Roads", "d"), None, day_one)
            .unwrap();
        let event = ComplaintEvent::submitted(&log.next_event_id(), &b);
        log.append(&event).unwrap();

        let t = engine
            .transition_at(
                &mut a,
                ComplaintStatus::Resolved,
                None,
                Some("mod-1"),
                day_two,
            )
            .unwrap();
        let event = ComplaintEvent::status_changed(&log.next_event_id(), &a, t).unwrap();
        log.append(&event).unwrap();
    }

    #[test]
    fn test_read_all_and_by_date() {
        let dir = tempdir().unwrap();
        let log = AuditLog::new(dir.path()).unwrap();
        write_sample(&log);

        let reader = AuditReader::new(log.base_path());
        let all = reader.read_all().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].event_id, "EVT_000001");
        assert_eq!(all[2].event_id, "EVT_000003");

        assert_eq!(reader.read_date("2026-10-18").unwrap().len(), 2);
        assert_eq!(reader.read_date("2026-10-19").unwrap().len(), 1);
        assert!(reader.read_date("2026-01-01").unwrap().is_empty());
    }

    #[test]
    fn test_filter() {
        let dir = tempdir().unwrap();
        let log = AuditLog::new(dir.path()).unwrap();
        write_sample(&log);
        let reader = AuditReader::new(dir.path());

        let filter = AuditFilter::new().complaint("CMP-A");
        let for_a = reader.query(&filter).unwrap();
        assert_eq!(for_a.len(), 2);

        let changes = reader
            .query(&AuditFilter::new().kind(ComplaintEventKind::StatusChanged))
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].from, Some(ComplaintStatus::Submitted));

        let by_mod = reader.query(&AuditFilter::new().actor("mod-1")).unwrap();
        assert_eq!(by_mod.len(), 1);

        let resolved = reader
            .query(&AuditFilter::new().to_status(ComplaintStatus::Resolved))
            .unwrap();
        assert_eq!(resolved[0].complaint_id, "CMP-A");
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let reader = AuditReader::new(dir.path().join("absent"));
        assert!(reader.read_all().unwrap().is_empty());
    }
}
