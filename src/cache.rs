//! Route match caching.
//!
//! This module provides [`MatchCache`], an LRU cache of regex match results
//! used by the [`Dispatcher`](crate::dispatch::Dispatcher). Every dispatch
//! tests the same context path against each middleware's matcher in turn;
//! the cache remembers the outcome per `(entry, path)` pair, including
//! misses, so repeat visits to a path skip the regex engine entirely. It is
//! gated behind the `cache` feature flag and uses the [`lru`] crate.
//!
//! [`CacheStats`] tracks hits, misses, and invalidations so you can monitor
//! cache effectiveness at runtime.
//!
//! # Examples
//!
//! ```
//! use review_router::cache::{MatchCache, MatchKey};
//! use review_router::RouteParams;
//!
//! let mut cache = MatchCache::new();
//! let key = MatchKey::new(3, "/admin/repos");
//! cache.insert(key.clone(), Some(RouteParams::new()));
//!
//! assert!(cache.get(&key).is_some());
//! assert_eq!(cache.stats().hits, 1);
//! ```

use crate::{debug_log, trace_log, RouteParams};
use lru::LruCache;
use std::num::NonZeroUsize;

/// Identifies one matcher run: which middleware entry, against which path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey {
    /// Stable id of the middleware entry within its dispatcher.
    pub entry: usize,
    /// Context path the matcher ran against.
    pub path: String,
}

impl MatchKey {
    /// Create a key for `entry` matching `path`.
    pub fn new(entry: usize, path: impl Into<String>) -> Self {
        Self {
            entry,
            path: path.into(),
        }
    }
}

/// Counters tracking cache hit/miss rates and invalidations.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of lookups answered from the cache.
    pub hits: usize,
    /// Number of lookups that had to run the matcher.
    pub misses: usize,
    /// Number of full cache invalidations (via [`MatchCache::clear`]).
    pub invalidations: usize,
}

impl CacheStats {
    /// Return the hit rate as a value in `0.0..=1.0`.
    ///
    /// Returns `0.0` if no lookups have been performed.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of matcher results.
///
/// A cached `None` records that the matcher rejected the path. Default
/// capacity is 1000 entries. The dispatcher clears the cache whenever its
/// middleware lists change.
#[derive(Debug)]
pub struct MatchCache {
    entries: LruCache<MatchKey, Option<RouteParams>>,
    stats: CacheStats,
}

impl MatchCache {
    /// Capacity used by [`MatchCache::new`].
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a cache holding at most `capacity` results. A zero capacity is
    /// bumped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(cap),
            stats: CacheStats::default(),
        }
    }

    /// Drop every cached result and increment the invalidation counter.
    pub fn clear(&mut self) {
        let len = self.entries.len();
        self.entries.clear();
        self.stats.invalidations += 1;
        debug_log!(
            "Match cache cleared: {} entries removed ({} total invalidations, hit rate: {:.1}%)",
            len,
            self.stats.invalidations,
            self.stats.hit_rate() * 100.0
        );
    }

    /// Look up a cached result. The outer `Option` is the cache hit, the
    /// inner one the match result.
    pub fn get(&mut self, key: &MatchKey) -> Option<Option<RouteParams>> {
        if let Some(result) = self.entries.get(key) {
            self.stats.hits += 1;
            trace_log!("Match cache hit for entry {} on '{}'", key.entry, key.path);
            Some(result.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("Match cache miss for entry {} on '{}'", key.entry, key.path);
            None
        }
    }

    /// Record a matcher result.
    pub fn insert(&mut self, key: MatchKey, result: Option<RouteParams>) {
        self.entries.push(key, result);
    }

    /// Return a reference to the current cache statistics.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Reset all counters in [`CacheStats`] to zero.
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MatchCache {
    fn default() -> Self {
        Self::new()
    }
}
