//! Bounded memoisation for layout and analysis results.
//!
//! Keys are canonical snapshots: ids plus bounds rounded to
//! [`KEY_DECIMALS`] decimals, so two inputs that describe the same geometry
//! always hit the same entry regardless of object identity, and any movement
//! beyond the rounding step produces a new key.

use lru::LruCache;
use rustc_hash::FxBuildHasher;
use serde::Serialize;
use std::num::NonZeroUsize;

use crate::bounds::BoundingBox;
use crate::precision::precise_round;

/// Default number of cached results per cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Decimal places kept when quantising coordinates into keys.
pub const KEY_DECIMALS: u32 = 3;

fn quantize(value: f64) -> i64 {
    (precise_round(value, KEY_DECIMALS) * 10f64.powi(KEY_DECIMALS as i32)).round() as i64
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct KeyEntry {
    id: String,
    rect: [i64; 4],
}

/// Canonical, hashable description of an input snapshot.
///
/// A key whose context could not be serialised is uncacheable: the cache
/// never stores or returns values for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    context: String,
    entries: Vec<KeyEntry>,
    links: Vec<(String, String)>,
    cacheable: bool,
}

impl SnapshotKey {
    pub fn builder(tag: impl Into<String>) -> SnapshotKeyBuilder {
        SnapshotKeyBuilder {
            context: tag.into(),
            entries: Vec::new(),
            links: Vec::new(),
            cacheable: true,
        }
    }

    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotKeyBuilder {
    context: String,
    entries: Vec<KeyEntry>,
    links: Vec<(String, String)>,
    cacheable: bool,
}

impl SnapshotKeyBuilder {
    /// Mix a serialisable value (typically the active configuration) into
    /// the key.
    pub fn context<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(json) => {
                self.context.push('|');
                self.context.push_str(&json);
            }
            Err(err) => {
                tracing::warn!(%err, "cache key context is not serialisable, caching disabled");
                self.cacheable = false;
            }
        }
        self
    }

    pub fn item(mut self, id: impl Into<String>, bounds: &BoundingBox) -> Self {
        self.entries.push(KeyEntry {
            id: id.into(),
            rect: [
                quantize(bounds.min.x),
                quantize(bounds.min.y),
                quantize(bounds.max.x),
                quantize(bounds.max.y),
            ],
        });
        self
    }

    pub fn link(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.links.push((source.into(), target.into()));
        self
    }

    /// Key that keeps item order significant (layouts place nodes in input
    /// order).
    pub fn build(self) -> SnapshotKey {
        SnapshotKey {
            context: self.context,
            entries: self.entries,
            links: self.links,
            cacheable: self.cacheable,
        }
    }

    /// Key that treats items and links as sets.
    pub fn build_unordered(mut self) -> SnapshotKey {
        self.entries.sort_by(|a, b| a.id.cmp(&b.id).then(a.rect.cmp(&b.rect)));
        self.links.sort();
        self.build()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Hit rate in `[0, 1]`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of computed results.
///
/// Not thread-safe; each engine owns its own instance.
#[derive(Debug)]
pub struct ResultCache<V> {
    cache: LruCache<SnapshotKey, V, FxBuildHasher>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<V: Clone> ResultCache<V> {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::with_hasher(capacity, FxBuildHasher),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Cached value for `key`, refreshing its recency.
    pub fn get(&mut self, key: &SnapshotKey) -> Option<V> {
        if !key.cacheable {
            self.misses += 1;
            return None;
        }
        match self.cache.get(key) {
            Some(value) => {
                self.hits += 1;
                Some(value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: SnapshotKey, value: V) {
        if !key.cacheable {
            return;
        }
        let existed = self.cache.contains(&key);
        if self.cache.push(key, value).is_some() && !existed {
            self.evictions += 1;
            tracing::trace!(capacity = self.cache.cap().get(), "result cache evicted an entry");
        }
    }

    pub fn get_or_compute<F>(&mut self, key: SnapshotKey, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    /// Like [`get_or_compute`](Self::get_or_compute); errors are not cached.
    pub fn get_or_try_compute<F, E>(&mut self, key: SnapshotKey, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn contains(&self, key: &SnapshotKey) -> bool {
        self.cache.contains(key)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            size: self.cache.len(),
            capacity: self.cache.cap().get(),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn key(tag: &str, x: f64) -> SnapshotKey {
        SnapshotKey::builder(tag)
            .item("a", &BoundingBox::from_rect(x, 0.0, 10.0, 10.0))
            .build()
    }

    #[test]
    fn test_rounding_makes_keys_stable() {
        assert_eq!(key("t", 0.1 + 0.2), key("t", 0.3));
        assert_eq!(key("t", 1.00001), key("t", 1.0));
        assert_ne!(key("t", 1.01), key("t", 1.0));
        assert_ne!(key("t", 1.0), key("u", 1.0));
    }

    #[test]
    fn test_unordered_keys() {
        let a = BoundingBox::from_rect(0.0, 0.0, 1.0, 1.0);
        let b = BoundingBox::from_rect(5.0, 5.0, 1.0, 1.0);
        let k1 = SnapshotKey::builder("s").item("a", &a).item("b", &b).build_unordered();
        let k2 = SnapshotKey::builder("s").item("b", &b).item("a", &a).build_unordered();
        assert_eq!(k1, k2);

        let o1 = SnapshotKey::builder("s").item("a", &a).item("b", &b).build();
        let o2 = SnapshotKey::builder("s").item("b", &b).item("a", &a).build();
        assert_ne!(o1, o2);
    }

    #[test]
    fn test_context_changes_key() {
        let a = SnapshotKey::builder("cfg").context(&vec![1, 2]).build();
        let b = SnapshotKey::builder("cfg").context(&vec![1, 3]).build();
        assert_ne!(a, b);
    }

    #[traced_test]
    #[test]
    fn test_unserialisable_context_is_never_cached() {
        use std::collections::BTreeMap;
        // json object keys must be strings
        let bad: BTreeMap<(u8, u8), u8> = BTreeMap::from([((1, 2), 3)]);
        let other: BTreeMap<(u8, u8), u8> = BTreeMap::from([((4, 5), 6)]);
        let k1 = SnapshotKey::builder("cfg").context(&bad).build();
        let k2 = SnapshotKey::builder("cfg").context(&other).build();
        assert!(!k1.is_cacheable());
        assert!(logs_contain("caching disabled"));

        let mut cache: ResultCache<u32> = ResultCache::new(4);
        assert_eq!(cache.get_or_compute(k1, || 1), 1);
        assert_eq!(cache.get_or_compute(k2, || 2), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_get_or_compute_counts() {
        let mut cache: ResultCache<u32> = ResultCache::new(4);
        let mut calls = 0;
        for _ in 0..3 {
            let v = cache.get_or_compute(key("t", 1.0), || {
                calls += 1;
                42
            });
            assert_eq!(v, 42);
        }
        assert_eq!(calls, 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache: ResultCache<u32> = ResultCache::new(2);
        cache.insert(key("t", 1.0), 1);
        cache.insert(key("t", 2.0), 2);
        // touch the first entry so the second becomes least recent
        assert_eq!(cache.get(&key("t", 1.0)), Some(1));
        cache.insert(key("t", 3.0), 3);

        assert!(cache.contains(&key("t", 1.0)));
        assert!(!cache.contains(&key("t", 2.0)));
        assert_eq!(cache.stats().evictions, 1);

        // replacing an existing key is not an eviction
        cache.insert(key("t", 3.0), 33);
        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut cache: ResultCache<u32> = ResultCache::new(2);
        let err: Result<u32, &str> = cache.get_or_try_compute(key("t", 1.0), || Err("boom"));
        assert!(err.is_err());
        assert!(cache.is_empty());
        let ok: Result<u32, &str> = cache.get_or_try_compute(key("t", 1.0), || Ok(7));
        assert_eq!(ok, Ok(7));
    }
}
