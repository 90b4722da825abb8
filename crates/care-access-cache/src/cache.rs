// crates/care-access-cache/src/cache.rs
// ============================================================================
// Module: Result Cache
// Description: Cache interface and an in-memory TTL implementation.
// Purpose: Store unfiltered query results for reuse across callers.
// Dependencies: care-access-config, thiserror
// ============================================================================

//! ## Overview
//! Cached values are `Arc<Vec<R>>` so every caller shares one copy of the
//! unfiltered rows. [`InMemoryResultCache`] expires entries after a fixed
//! lifetime and evicts the oldest entry when full.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use std::time::Instant;

use care_access_config::CacheConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Cache Key
// ============================================================================

/// Maximum cache key length in bytes.
pub const MAX_CACHE_KEY_LENGTH: usize = 512;

/// Query-derived cache key. Never includes caller identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Creates a cache key.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidKey`] when the key is empty or longer
    /// than [`MAX_CACHE_KEY_LENGTH`] bytes.
    pub fn new(key: impl Into<String>) -> Result<Self, CacheError> {
        let key = key.into();
        if key.is_empty() || key.len() > MAX_CACHE_KEY_LENGTH {
            return Err(CacheError::InvalidKey(format!(
                "cache key must be 1 to {MAX_CACHE_KEY_LENGTH} bytes"
            )));
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Result cache errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Cache key rejected.
    #[error("invalid cache key: {0}")]
    InvalidKey(String),
    /// Cache backend failure.
    #[error("cache backend error: {0}")]
    Backend(String),
    /// Loader failed to produce rows on a cache miss.
    #[error("result loader error: {0}")]
    Loader(String),
}

// ============================================================================
// SECTION: Interface
// ============================================================================

/// Shared store for unfiltered query results.
pub trait ResultCache<R>: Send + Sync {
    /// Returns the cached rows for `key`, if present and fresh.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] when the backend fails.
    fn get(&self, key: &CacheKey) -> Result<Option<Arc<Vec<R>>>, CacheError>;

    /// Stores rows under `key`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] when the backend fails.
    fn set(&self, key: CacheKey, rows: Arc<Vec<R>>) -> Result<(), CacheError>;

    /// Removes the entry for `key`. Returns true when an entry was removed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] when the backend fails.
    fn invalidate(&self, key: &CacheKey) -> Result<bool, CacheError>;

    /// Removes every entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] when the backend fails.
    fn invalidate_all(&self) -> Result<(), CacheError>;
}

// ============================================================================
// SECTION: In-Memory Cache
// ============================================================================

/// Cached rows with their insertion time.
struct CacheEntry<R> {
    /// Shared unfiltered rows.
    rows: Arc<Vec<R>>,
    /// Insertion instant.
    inserted_at: Instant,
}

/// In-memory result cache with entry lifetime and size limits.
///
/// # Invariants
/// - An entry older than `ttl` is never returned.
/// - At most `max_entries` entries are held; inserting into a full cache
///   first drops expired entries, then the oldest remaining entry.
pub struct InMemoryResultCache<R> {
    /// Entry lifetime.
    ttl: Duration,
    /// Maximum number of entries.
    max_entries: usize,
    /// Entries protected by a mutex.
    entries: Mutex<BTreeMap<CacheKey, CacheEntry<R>>>,
}

impl<R> InMemoryResultCache<R> {
    /// Creates a cache. A zero `max_entries` is raised to one.
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Creates a cache sized by the `[cache]` configuration section.
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl(), config.max_entries)
    }

    /// Returns the number of stored entries, including expired ones not yet
    /// purged.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] when the cache lock is poisoned.
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.lock()?.len())
    }

    /// Returns true when no entries are stored.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] when the cache lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.lock()?.is_empty())
    }

    /// Locks the entry map.
    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<CacheKey, CacheEntry<R>>>, CacheError> {
        self.entries.lock().map_err(|_| CacheError::Backend("result cache mutex poisoned".to_string()))
    }

    /// Returns true when an entry inserted at `inserted_at` has expired.
    fn expired(&self, inserted_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(inserted_at) >= self.ttl
    }
}

impl<R: Send + Sync> ResultCache<R> for InMemoryResultCache<R> {
    fn get(&self, key: &CacheKey) -> Result<Option<Arc<Vec<R>>>, CacheError> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        let fresh = entries
            .get(key)
            .map(|entry| (!self.expired(entry.inserted_at, now)).then(|| Arc::clone(&entry.rows)));
        match fresh {
            Some(Some(rows)) => Ok(Some(rows)),
            Some(None) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: CacheKey, rows: Arc<Vec<R>>) -> Result<(), CacheError> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            entries.retain(|_, entry| !self.expired(entry.inserted_at, now));
            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }
        entries.insert(
            key,
            CacheEntry {
                rows,
                inserted_at: now,
            },
        );
        Ok(())
    }

    fn invalidate(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.lock()?.remove(key).is_some())
    }

    fn invalidate_all(&self) -> Result<(), CacheError> {
        self.lock()?.clear();
        Ok(())
    }
}
