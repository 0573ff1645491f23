//! Audit feed
//!
//! Append-only JSONL record of every accepted submission and transition.

pub mod reader;
pub mod store;

pub use reader::{AuditFilter, AuditReader};
pub use store::AuditLog;
