//! JSONL audit log - append-only writer
//!
//! Files are grouped by the event's UTC day: `data/audit/2026-10-19.jsonl`.

use crate::error::PersistenceResult;
use civicdesk_core::ComplaintEvent;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

const EVENT_PREFIX: &str = "EVT_";

/// Audit log writer, safe to share between tasks
pub struct AuditLog {
    base_path: PathBuf,
    event_counter: AtomicU64,
    current_writer: Mutex<Option<DayWriter>>,
}

struct DayWriter {
    date: String,
    writer: BufWriter<File>,
}

impl AuditLog {
    /// Open (or create) the audit directory and resume event numbering
    pub fn new<P: AsRef<Path>>(base_path: P) -> PersistenceResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        let next = Self::load_event_counter(&base_path)?;
        debug!(path = %base_path.display(), next, "Opened audit log");

        Ok(Self {
            base_path,
            event_counter: AtomicU64::new(next),
            current_writer: Mutex::new(None),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Highest event number on disk plus one. Unreadable lines are skipped.
    fn load_event_counter(base_path: &Path) -> PersistenceResult<u64> {
        let mut max_id: u64 = 0;

        for path in jsonl_files(base_path)? {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines().map_while(Result::ok) {
                let Ok(event) = serde_json::from_str::<ComplaintEvent>(&line) else {
                    continue;
                };
                if let Some(num) = event
                    .event_id
                    .strip_prefix(EVENT_PREFIX)
                    .and_then(|n| n.parse::<u64>().ok())
                {
                    max_id = max_id.max(num);
                }
            }
        }

        Ok(max_id + 1)
    }

    fn file_path(&self, date: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", date))
    }

    /// Reserve the next event id
    pub fn next_event_id(&self) -> String {
        let id = self.event_counter.fetch_add(1, Ordering::SeqCst);
        format!("{}{:06}", EVENT_PREFIX, id)
    }

    /// Append one event and flush it to disk
    pub fn append(&self, event: &ComplaintEvent) -> PersistenceResult<()> {
        let date = event.timestamp.format("%Y-%m-%d").to_string();
        let json = serde_json::to_string(event)?;

        let mut guard = self
            .current_writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let needs_new_file = guard.as_ref().map_or(true, |w| w.date != date);
        if needs_new_file {
            if let Some(previous) = guard.as_mut() {
                previous.writer.flush()?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.file_path(&date))?;
            *guard = Some(DayWriter {
                date,
                writer: BufWriter::new(file),
            });
        }

        if let Some(w) = guard.as_mut() {
            writeln!(w.writer, "{}", json)?;
            w.writer.flush()?;
        }

        Ok(())
    }

    /// All audit files, oldest day first
    pub fn list_files(&self) -> PersistenceResult<Vec<PathBuf>> {
        jsonl_files(&self.base_path)
    }

    pub fn flush(&self) -> PersistenceResult<()> {
        let mut guard = self
            .current_writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(w) = guard.as_mut() {
            w.writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for AuditLog {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Sorted `*.jsonl` files in `dir`; a missing directory yields nothing
pub(crate) fn jsonl_files(dir: &Path) -> PersistenceResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "jsonl"))
        .collect();
    files.sort();
    Ok(files)
}
