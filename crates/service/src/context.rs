//! Service context
//!
//! Shared state for every service: database pool, audit log, lifecycle
//! engine, id generator, per-complaint locks and the stats cache.

use crate::config::ServiceConfig;
use crate::locks::LockRegistry;
use crate::stats::StatsCache;
use civicdesk_core::{ComplaintEvent, IdentifierGenerator, LifecycleEngine};
use civicdesk_persistence::{AuditLog, AuditReader, Database};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::warn;

/// Context for complaint operations
pub struct ServiceContext {
    pool: SqlitePool,
    audit: Arc<AuditLog>,
    engine: LifecycleEngine,
    generator: IdentifierGenerator,
    config: ServiceConfig,
    locks: LockRegistry,
    stats: StatsCache,
}

impl ServiceContext {
    /// Build a context that owns the database
    pub fn new(db: Database, config: ServiceConfig) -> Self {
        let (pool, audit) = db.into_parts();
        Self::from_parts(pool, Arc::new(audit), config)
    }

    /// Build from a pool and audit log directly
    pub fn from_parts(pool: SqlitePool, audit: Arc<AuditLog>, config: ServiceConfig) -> Self {
        Self {
            pool,
            audit,
            engine: LifecycleEngine::new(config.transition_table()),
            generator: config.generator(),
            locks: LockRegistry::new(),
            stats: StatsCache::new(config.stats_ttl()),
            config,
        }
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

    pub fn engine(&self) -> &LifecycleEngine {
        &self.engine
    }

    pub fn generator(&self) -> &IdentifierGenerator {
        &self.generator
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    pub fn stats_cache(&self) -> &StatsCache {
        &self.stats
    }

    pub fn next_event_id(&self) -> String {
        self.audit.next_event_id()
    }

    /// Record an accepted write: append to the audit feed and drop cached stats.
    ///
    /// The database row is already committed at this point, so an audit failure
    /// is logged and the write still counts as accepted.
    pub fn record(&self, event: &ComplaintEvent) {
        self.stats.invalidate();
        if let Err(e) = self.audit.append(event) {
            warn!(
                complaint_id = %event.complaint_id,
                event_id = %event.event_id,
                error = %e,
                "Failed to append audit event"
            );
        }
    }
}
