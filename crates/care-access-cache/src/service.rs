// crates/care-access-cache/src/service.rs
// ============================================================================
// Module: Scoped Result Service
// Description: Cache-backed query results filtered per caller.
// Purpose: Combine the shared result cache with the row filter engine.
// Dependencies: care-access-config, care-access-core, crate::cache
// ============================================================================

//! ## Overview
//! [`ScopedResultService::fetch`] looks up unfiltered rows by query key,
//! loads and caches them on a miss, and always filters them with the
//! caller's context before returning. Filtering happens on every call,
//! including cache hits.
//!
//! Security posture: a [`SecurityViolation`] from the filter is passed
//! through unchanged; nothing is returned for a rejected context.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use care_access_config::CareAccessConfig;
use care_access_core::FilterAuditSink;
use care_access_core::RowFilterEngine;
use care_access_core::ScopedRow;
use care_access_core::SecurityContext;
use care_access_core::SecurityViolation;
use thiserror::Error;

use crate::cache::CacheError;
use crate::cache::CacheKey;
use crate::cache::InMemoryResultCache;
use crate::cache::ResultCache;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Rows returned to one caller.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome<R> {
    /// Rows visible to the caller, in cached order.
    pub rows: Vec<R>,
    /// True when the unfiltered rows came from the cache.
    pub cache_hit: bool,
}

/// Scoped fetch errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Cache or loader failure.
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// Context rejected by the integrity validator.
    #[error(transparent)]
    Security(#[from] SecurityViolation),
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Serves cached query results through the row filter.
pub struct ScopedResultService<R> {
    /// Shared cache of unfiltered rows.
    cache: Arc<dyn ResultCache<R>>,
    /// Filter applied to every response.
    engine: RowFilterEngine,
}

impl<R: ScopedRow + Clone + Send + Sync + 'static> ScopedResultService<R> {
    /// Creates a service with an in-memory cache and a filter engine built
    /// from `config`, reporting to `audit`.
    #[must_use]
    pub fn from_config(config: &CareAccessConfig, audit: Arc<dyn FilterAuditSink>) -> Self {
        let engine =
            RowFilterEngine::new(config.resource(), audit).with_policy(config.audit_policy());
        let cache: Arc<dyn ResultCache<R>> =
            Arc::new(InMemoryResultCache::<R>::from_config(&config.cache));
        Self::new(cache, engine)
    }
}

impl<R: ScopedRow + Clone> ScopedResultService<R> {
    /// Creates a service over `cache` and `engine`.
    #[must_use]
    pub fn new(cache: Arc<dyn ResultCache<R>>, engine: RowFilterEngine) -> Self {
        Self {
            cache,
            engine,
        }
    }

    /// Returns the row filter engine.
    #[must_use]
    pub const fn engine(&self) -> &RowFilterEngine {
        &self.engine
    }

    /// Returns rows for `key` visible to `context`.
    ///
    /// On a miss `loader` produces the unfiltered rows, which are cached
    /// before filtering.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Cache`] when the cache or loader fails and
    /// [`ServiceError::Security`] when the context is rejected.
    pub fn fetch<F, E>(
        &self,
        key: &CacheKey,
        context: &SecurityContext,
        loader: F,
    ) -> Result<FetchOutcome<R>, ServiceError>
    where
        F: FnOnce() -> Result<Vec<R>, E>,
        E: fmt::Display,
    {
        let (rows, cache_hit) = match self.cache.get(key)? {
            Some(rows) => (rows, true),
            None => {
                let loaded =
                    Arc::new(loader().map_err(|err| CacheError::Loader(err.to_string()))?);
                self.cache.set(key.clone(), Arc::clone(&loaded))?;
                (loaded, false)
            }
        };
        let rows = self.engine.filter(rows.as_slice(), context)?;
        Ok(FetchOutcome {
            rows,
            cache_hit,
        })
    }

    /// Drops the cached rows for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the cache backend fails.
    pub fn invalidate(&self, key: &CacheKey) -> Result<bool, CacheError> {
        self.cache.invalidate(key)
    }
}
