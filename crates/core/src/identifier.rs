//! # Identifier Module
//!
//! Complaint identifiers: `{PREFIX}-{YYYYMMDDHHMMSS}-{SEQUENCE}`.
//!
//! The generator is a pure formatting function. Uniqueness comes from the
//! sequence source (an atomic counter, never a record count) together with
//! the storage-level unique constraint on the resulting id.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Formats complaint identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierGenerator {
    prefix: String,
    width: usize,
}

/// An identifier split back into its components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedId {
    pub prefix: String,
    pub issued_at: DateTime<Utc>,
    pub sequence: u64,
}

impl Default for IdentifierGenerator {
    fn default() -> Self {
        Self::new("CMP", 6)
    }
}

impl IdentifierGenerator {
    pub fn new(prefix: &str, width: usize) -> Self {
        Self {
            prefix: prefix.to_string(),
            width,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Build the identifier for `sequence` issued at `issued_at`
    pub fn next(&self, sequence: u64, issued_at: DateTime<Utc>) -> String {
        format!(
            "{}-{}-{:0width$}",
            self.prefix,
            issued_at.format(TIMESTAMP_FORMAT),
            sequence,
            width = self.width
        )
    }

    /// Split an identifier produced by this generator
    pub fn parse(&self, id: &str) -> Option<ParsedId> {
        let rest = id.strip_prefix(&self.prefix)?.strip_prefix('-')?;
        let (stamp, sequence) = rest.split_once('-')?;
        if sequence.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let naive = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;

        Some(ParsedId {
            prefix: self.prefix.clone(),
            issued_at: Utc.from_utc_datetime(&naive),
            sequence: sequence.parse().ok()?,
        })
    }
}

/// In-process monotonic sequence.
///
/// `next()` is an atomic increment-and-read, so concurrent callers never
/// observe the same value.
#[derive(Debug)]
pub struct AtomicSequence {
    counter: AtomicU64,
}

impl AtomicSequence {
    /// Start so the first `next()` returns `first`
    pub fn starting_at(first: u64) -> Self {
        Self {
            counter: AtomicU64::new(first),
        }
    }

    pub fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Value the next call will return
    pub fn peek(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl Default for AtomicSequence {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 5).unwrap()
    }

    #[test]
    fn test_format() {
        let generator = IdentifierGenerator::default();
        assert_eq!(
            generator.next(41, fixed_time()),
            "CMP-20261019083005-000041"
        );
    }

    #[test]
    fn test_consecutive_sequences_differ_only_in_sequence() {
        let generator = IdentifierGenerator::default();
        let t = fixed_time();
        let a = generator.next(41, t);
        let b = generator.next(42, t);

        assert_ne!(a, b);
        assert_eq!(a, generator.next(41, t));

        let pa = generator.parse(&a).unwrap();
        let pb = generator.parse(&b).unwrap();
        assert_eq!(pa.prefix, pb.prefix);
        assert_eq!(pa.issued_at, pb.issued_at);
        assert_eq!(pa.sequence, 41);
        assert_eq!(pb.sequence, 42);
        assert_eq!(a.rsplit_once('-').unwrap().0, b.rsplit_once('-').unwrap().0);
    }

    #[test]
    fn test_sortable_by_time() {
        let generator = IdentifierGenerator::default();
        let earlier = generator.next(900, fixed_time());
        let later = generator.next(1, fixed_time() + chrono::Duration::seconds(1));
        assert!(earlier < later);
    }

    #[test]
    fn test_sequence_wider_than_padding() {
        let generator = IdentifierGenerator::new("GRV", 3);
        let id = generator.next(12345, fixed_time());
        assert_eq!(id, "GRV-20261019083005-12345");
        assert_eq!(generator.parse(&id).unwrap().sequence, 12345);
    }

    #[test]
    fn test_parse_rejects_foreign_ids() {
        let generator = IdentifierGenerator::default();
        assert!(generator.parse("GRV-20261019083005-000001").is_none());
        assert!(generator.parse("CMP-2026-000001").is_none());
        assert!(generator.parse("CMP-20261019083005-").is_none());
        assert!(generator.parse("CMP-20261019083005-12a").is_none());
        assert!(generator.parse("CMP20261019083005-1").is_none());
    }

    #[test]
    fn test_atomic_sequence_is_unique_across_threads() {
        let sequence = Arc::new(AtomicSequence::default());
        let generator = IdentifierGenerator::default();
        let t = fixed_time();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sequence = Arc::clone(&sequence);
                let generator = generator.clone();
                thread::spawn(move || {
                    (0..250)
                        .map(|_| generator.next(sequence.next(), t))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id), "duplicate identifier");
            }
        }
        assert_eq!(ids.len(), 2000);
        assert_eq!(sequence.peek(), 2001);
    }
}
