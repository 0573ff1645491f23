//! Repository implementations for SQLite
//!
//! Complaint storage, the append-only status history, and named counters.

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::schema::{ComplaintRow, StatusHistoryRow};
use civicdesk_core::{Complaint, ComplaintStatus};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

// ============================================================================
// Complaint Repository
// ============================================================================

/// Repository for the complaints and complaint_status_history tables
pub struct ComplaintRepo;

impl ComplaintRepo {
    /// Insert a new complaint together with its history.
    ///
    /// A duplicate id surfaces as `UniqueViolation` so the caller can retry
    /// with a fresh identifier.
    pub async fn insert(pool: &SqlitePool, complaint: &Complaint) -> PersistenceResult<()> {
        let row = ComplaintRow::from(complaint);
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO complaints (
                id, title, category, description, priority, status, reporter_type,
                reporter_id, national_id, identity_holder, identity_region, verified_at,
                location, handler_id, department_id, created_at, updated_at, resolved_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.title)
        .bind(&row.category)
        .bind(&row.description)
        .bind(&row.priority)
        .bind(&row.status)
        .bind(&row.reporter_type)
        .bind(&row.reporter_id)
        .bind(&row.national_id)
        .bind(&row.identity_holder)
        .bind(&row.identity_region)
        .bind(row.verified_at)
        .bind(&row.location)
        .bind(&row.handler_id)
        .bind(&row.department_id)
        .bind(row.created_at)
        .bind(row.updated_at)
        .bind(row.resolved_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| PersistenceError::from_insert(e, &row.id))?;

        for (seq, entry) in complaint.status_history().iter().enumerate() {
            let history = StatusHistoryRow::from_entry(complaint.id(), seq, entry);
            insert_history(&mut tx, &history).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Persist the most recent transition of `complaint`.
    ///
    /// The new history row takes slot `len - 1` and the status update is
    /// conditional on the previous status, so a writer that lost a race
    /// gets `Conflict` and nothing is written.
    pub async fn append_transition(
        pool: &SqlitePool,
        complaint: &Complaint,
    ) -> PersistenceResult<()> {
        let history = complaint.status_history();
        let seq = history.len() - 1;
        if seq == 0 {
            return Err(PersistenceError::conflict("Complaint", complaint.id()));
        }
        let previous = history[seq - 1].status;
        let row = StatusHistoryRow::from_entry(complaint.id(), seq, &history[seq]);

        let mut tx = pool.begin().await?;

        insert_history(&mut tx, &row).await.map_err(|e| {
            if e.is_unique_violation() {
                PersistenceError::conflict("Complaint", complaint.id())
            } else {
                e
            }
        })?;

        let result = sqlx::query(
            r#"
            UPDATE complaints
            SET status = ?, updated_at = ?, resolved_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(complaint.status().as_str())
        .bind(complaint.updated_at())
        .bind(complaint.resolved_at())
        .bind(complaint.id())
        .bind(previous.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the history row
            return Err(PersistenceError::conflict("Complaint", complaint.id()));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Load a complaint by id, or None if it does not exist
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> PersistenceResult<Option<Complaint>> {
        let Some(row) = sqlx::query_as::<_, ComplaintRow>("SELECT * FROM complaints WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let history = sqlx::query_as::<_, StatusHistoryRow>(
            "SELECT * FROM complaint_status_history WHERE complaint_id = ? ORDER BY seq",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        let complaint = Complaint::restore(row.into_parts(history)?)?;
        Ok(Some(complaint))
    }

    /// Load a complaint by id
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> PersistenceResult<Complaint> {
        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Complaint", id))
    }

    /// Load every complaint, oldest first
    pub async fn get_all(pool: &SqlitePool) -> PersistenceResult<Vec<Complaint>> {
        let rows = sqlx::query_as::<_, ComplaintRow>(
            "SELECT * FROM complaints ORDER BY created_at, id",
        )
        .fetch_all(pool)
        .await?;

        let history_rows = sqlx::query_as::<_, StatusHistoryRow>(
            "SELECT * FROM complaint_status_history ORDER BY complaint_id, seq",
        )
        .fetch_all(pool)
        .await?;

        let mut histories: HashMap<String, Vec<StatusHistoryRow>> = HashMap::new();
        for h in history_rows {
            histories.entry(h.complaint_id.clone()).or_default().push(h);
        }

        let mut complaints = Vec::with_capacity(rows.len());
        for row in rows {
            let history = histories.remove(&row.id).unwrap_or_default();
            complaints.push(Complaint::restore(row.into_parts(history)?)?);
        }

        debug!(count = complaints.len(), "Loaded complaint snapshot");
        Ok(complaints)
    }

    /// Number of stored complaints
    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM complaints")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Number of stored complaints in `status`
    pub async fn count_by_status(
        pool: &SqlitePool,
        status: ComplaintStatus,
    ) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM complaints WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

async fn insert_history(
    tx: &mut Transaction<'_, Sqlite>,
    row: &StatusHistoryRow,
) -> PersistenceResult<()> {
    let key = format!("{}#{}", row.complaint_id, row.seq);
    sqlx::query(
        r#"
        INSERT INTO complaint_status_history (complaint_id, seq, status, note, actor, recorded_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&row.complaint_id)
    .bind(row.seq)
    .bind(&row.status)
    .bind(&row.note)
    .bind(&row.actor)
    .bind(row.recorded_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| PersistenceError::from_insert(e, &key))?;
    Ok(())
}

// ============================================================================
// Sequence Repository
// ============================================================================

/// Repository for named monotonic counters
pub struct SequenceRepo;

impl SequenceRepo {
    /// Atomically increment `name` and return the new value (first call returns 1)
    pub async fn next_value(pool: &SqlitePool, name: &str) -> PersistenceResult<u64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO sequences (name, value) VALUES (?, 1)
            ON CONFLICT(name) DO UPDATE SET value = value + 1
            RETURNING value
            "#,
        )
        .bind(name)
        .fetch_one(pool)
        .await?;
        Ok(row.0 as u64)
    }

    /// Last value handed out, if any
    pub async fn current(pool: &SqlitePool, name: &str) -> PersistenceResult<Option<u64>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT value FROM sequences WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|r| r.0 as u64))
    }
}

// ============================================================================
// Database initialization
// ============================================================================

/// Create a connection pool, creating the database file if missing
pub async fn create_pool(database_url: &str) -> PersistenceResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    Ok(pool)
}

/// Single-connection in-memory pool; the connection is never recycled
pub async fn create_memory_pool() -> PersistenceResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Apply migrations
pub async fn run_migrations(pool: &SqlitePool) -> PersistenceResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// Open a database and bring its schema up to date
pub async fn init_database(database_url: &str) -> PersistenceResult<SqlitePool> {
    let pool = create_pool(database_url).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
