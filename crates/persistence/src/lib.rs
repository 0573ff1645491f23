//! # CivicDesk Persistence
//!
//! SQLite complaint store plus a JSONL audit feed.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Database                        │
//! │  ┌─────────────┐   ┌─────────────┐   ┌────────────┐  │
//! │  │   SQLite    │   │    JSONL    │   │   Repos    │  │
//! │  │ (complaints │   │   (audit)   │   │ (queries)  │  │
//! │  │  + history) │   │             │   │            │  │
//! │  └─────────────┘   └─────────────┘   └────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use civicdesk_persistence::{ComplaintRepo, Database};
//!
//! let db = Database::open("sqlite:data/civicdesk.db", "data/audit").await?;
//! let complaint = ComplaintRepo::get_by_id(db.pool(), "CMP-20261019083005-000041").await?;
//! ```

pub mod audit;
pub mod error;
pub mod sqlite;

pub use audit::{AuditFilter, AuditLog, AuditReader};
pub use error::{PersistenceError, PersistenceResult};
pub use sqlite::schema::{ComplaintRow, StatusHistoryRow};
pub use sqlite::{
    create_memory_pool, create_pool, init_database, run_migrations, ComplaintRepo, SequenceRepo,
};

use sqlx::SqlitePool;
use std::path::Path;

/// Database facade - SQLite pool plus audit log
pub struct Database {
    pool: SqlitePool,
    audit: AuditLog,
}

impl Database {
    /// Open a database file and audit directory, applying migrations
    ///
    /// # Arguments
    /// * `db_url` - SQLite URL (e.g. "sqlite:data/civicdesk.db")
    /// * `audit_path` - directory holding the daily JSONL files
    pub async fn open<Q: AsRef<Path>>(db_url: &str, audit_path: Q) -> PersistenceResult<Self> {
        let pool = init_database(db_url).await?;
        let audit = AuditLog::new(audit_path)?;
        Ok(Self { pool, audit })
    }

    /// Migrated in-memory database; the audit feed still goes to `audit_path`
    pub async fn in_memory<Q: AsRef<Path>>(audit_path: Q) -> PersistenceResult<Self> {
        let pool = create_memory_pool().await?;
        run_migrations(&pool).await?;
        let audit = AuditLog::new(audit_path)?;
        Ok(Self { pool, audit })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn audit_reader(&self) -> AuditReader {
        AuditReader::new(self.audit.base_path())
    }

    /// Split into parts for callers that share them separately
    pub fn into_parts(self) -> (SqlitePool, AuditLog) {
        (self.pool, self.audit)
    }
}
