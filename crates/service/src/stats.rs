//! Statistics - cached summaries over the complaint store
//!
//! [`StatsCache`] holds one summary per scope. An entry is served until it is
//! older than the configured TTL or until any accepted write invalidates the
//! cache. A refresh that races with an invalidation is discarded rather than
//! stored.

use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use anyhow::Context;
use civicdesk_core::{StatsAggregator, StatsScope, StatsSummary};
use civicdesk_persistence::ComplaintRepo;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct CachedSummary {
    summary: StatsSummary,
    computed_at: Instant,
    generation: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    generation: u64,
    entries: HashMap<StatsScope, CachedSummary>,
}

/// Process-wide summary cache
#[derive(Debug)]
pub struct StatsCache {
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl StatsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh cached summary for `scope`, if any
    pub fn get(&self, scope: &StatsScope) -> Option<StatsSummary> {
        let state = self.lock();
        state
            .entries
            .get(scope)
            .filter(|e| e.generation == state.generation && e.computed_at.elapsed() < self.ttl)
            .map(|e| e.summary.clone())
    }

    /// Current write generation; pass it back to [`StatsCache::store`]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Store a summary computed while the cache was at `generation`.
    /// Returns false if a write happened meanwhile and the summary was dropped.
    pub fn store(&self, generation: u64, summary: StatsSummary) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            return false;
        }
        state.entries.insert(
            summary.scope.clone(),
            CachedSummary {
                summary,
                computed_at: Instant::now(),
                generation,
            },
        );
        true
    }

    /// Drop every cached summary
    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.entries.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Stats Service - summary counts through the cache
pub struct StatsService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> StatsService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Cached summary for `scope`, recomputed when stale
    pub async fn summary(&self, scope: &StatsScope) -> ServiceResult<StatsSummary> {
        if let Some(summary) = self.ctx.stats_cache().get(scope) {
            debug!(%scope, "Stats cache hit");
            return Ok(summary);
        }
        self.refresh(scope).await
    }

    /// Recompute `scope` from storage and cache the result
    pub async fn refresh(&self, scope: &StatsScope) -> ServiceResult<StatsSummary> {
        let cache = self.ctx.stats_cache();
        let generation = cache.generation();

        let complaints = ComplaintRepo::get_all(self.ctx.pool())
            .await
            .map_err(ServiceError::from)
            .context("Failed to load complaints for statistics")?;
        let summary = StatsAggregator::aggregate(&complaints, scope);

        let stored = cache.store(generation, summary.clone());
        debug!(%scope, total = summary.total, stored, "Stats refreshed");
        Ok(summary)
    }
}
