//! Database initialization and status

use anyhow::{bail, Context, Result};
use civicdesk_core::ComplaintStatus;
use civicdesk_persistence::{AuditLog, ComplaintRepo, Database, SequenceRepo};
use civicdesk_service::{ServiceConfig, ServiceContext, COMPLAINT_SEQUENCE};
use std::path::Path;

fn db_url(db_path: &Path) -> String {
    format!("sqlite:{}", db_path.display())
}

/// Create (or recreate) the database and apply migrations
pub async fn init_database(db_path: &Path, audit_dir: &Path, force: bool) -> Result<()> {
    if force && db_path.exists() {
        std::fs::remove_file(db_path).context("Failed to remove existing database")?;
        println!("🗑️  Removed existing database");
    }

    println!("📦 Applying migrations...");
    let db = Database::open(&db_url(db_path), audit_dir)
        .await
        .context("Failed to initialize database")?;
    db.pool().close().await;
    Ok(())
}

/// Open an existing database as a service context
pub async fn open_context(
    db_path: &Path,
    audit_dir: &Path,
    config: ServiceConfig,
) -> Result<ServiceContext> {
    if !db_path.exists() {
        bail!(
            "Database not found at {:?}. Run 'civicdesk init' first.",
            db_path
        );
    }
    let db = Database::open(&db_url(db_path), audit_dir)
        .await
        .context("Failed to open database")?;
    Ok(ServiceContext::new(db, config))
}

/// Show database status
pub async fn show_status(db_path: &Path, audit_dir: &Path) -> Result<()> {
    if !db_path.exists() {
        println!("❌ Database not found at {:?}", db_path);
        println!("   Run 'civicdesk init' to create the database");
        return Ok(());
    }

    let db = Database::open(&db_url(db_path), audit_dir)
        .await
        .context("Failed to open database")?;
    let pool = db.pool();

    println!("📊 Database Status");
    println!("   Path:  {:?}", db_path);
    println!("   Audit: {:?}", audit_dir);
    println!();

    let total = ComplaintRepo::count(pool).await?;
    println!("   Complaints:   {}", total);
    for status in ComplaintStatus::ALL {
        let count = ComplaintRepo::count_by_status(pool, status).await?;
        println!("     {:<13} {}", status.as_str(), count);
    }

    let last = SequenceRepo::current(pool, COMPLAINT_SEQUENCE).await?;
    println!(
        "   Last sequence: {}",
        last.map_or_else(|| "-".to_string(), |v| v.to_string())
    );

    let audit_files = audit_file_count(db.audit())?;
    println!("   Audit files:  {}", audit_files);

    pool.close().await;
    Ok(())
}

fn audit_file_count(log: &AuditLog) -> Result<usize> {
    let files = log.list_files().context("Failed to list audit files")?;
    Ok(files.len())
}
