//! Time-to-live result cache keyed by an input fingerprint.
//!
//! Purpose
//! - Keep the most recent results of triangulation, pattern finding, bonus
//!   calculation and suggestion queries for a few seconds so repeated frames
//!   with an unchanged network are free.
//!
//! Model
//! - Caches are explicit objects owned by the caller (see `engine::EngineCaches`);
//!   there is no global state. Each cache is a `parking_lot::Mutex<HashMap>`.
//! - Eviction is by age only: lazily on `get`, and by a full sweep on `insert`
//!   once `cleanup_interval` has elapsed since the previous sweep. Memory is not
//!   bounded otherwise; hosts with many distinct inputs call `purge_expired`.
//! - Time comes from a `Clock` so tests can advance it by hand.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::model::{Node, Shape};

/// Source of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven clock for deterministic tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// 64-bit fingerprint of a query's inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(pub u64);

/// Feed a value's cache-relevant content into a hasher.
///
/// Floats are hashed by bit pattern, so `-0.0` and `0.0` are distinct keys.
pub trait Fingerprint {
    fn fingerprint<H: Hasher>(&self, h: &mut H);
}

impl Fingerprint for f64 {
    #[inline]
    fn fingerprint<H: Hasher>(&self, h: &mut H) {
        self.to_bits().hash(h);
    }
}

impl Fingerprint for Node {
    fn fingerprint<H: Hasher>(&self, h: &mut H) {
        self.id.hash(h);
        self.position.x.fingerprint(h);
        self.position.y.fingerprint(h);
        self.level.hash(h);
        self.kind.hash(h);
        self.connections.hash(h);
    }
}

impl Fingerprint for Shape {
    fn fingerprint<H: Hasher>(&self, h: &mut H) {
        self.id.hash(h);
        self.members.hash(h);
        self.base_bonus.fingerprint(h);
    }
}

impl<T: Fingerprint> Fingerprint for [T] {
    fn fingerprint<H: Hasher>(&self, h: &mut H) {
        self.len().hash(h);
        for item in self {
            item.fingerprint(h);
        }
    }
}

/// Incremental key builder: `KeyBuilder::new("bonus").add(nodes).add(&cfg).finish()`.
pub struct KeyBuilder {
    hasher: DefaultHasher,
}

impl KeyBuilder {
    pub fn new(namespace: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        namespace.hash(&mut hasher);
        Self { hasher }
    }

    pub fn add<T: Fingerprint + ?Sized>(mut self, value: &T) -> Self {
        value.fingerprint(&mut self.hasher);
        self
    }

    pub fn add_hash<T: Hash + ?Sized>(mut self, value: &T) -> Self {
        value.hash(&mut self.hasher);
        self
    }

    pub fn finish(self) -> CacheKey {
        CacheKey(self.hasher.finish())
    }
}

/// Cache timing parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheCfg {
    pub bonus_ttl: Duration,
    pub shapes_ttl: Duration,
    pub suggestions_ttl: Duration,
    pub neighbors_ttl: Duration,
    pub cleanup_interval: Duration,
}

impl Default for CacheCfg {
    fn default() -> Self {
        Self {
            bonus_ttl: Duration::from_secs(60),
            shapes_ttl: Duration::from_secs(30),
            suggestions_ttl: Duration::from_secs(30),
            neighbors_ttl: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(120),
        }
    }
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

struct Inner<V> {
    entries: HashMap<CacheKey, Entry<V>>,
    last_sweep: Instant,
}

/// Hit/miss counters, mostly for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Mutex-guarded TTL map. Values are cloned out on hit.
pub struct ResultCache<V> {
    inner: Mutex<Inner<V>>,
    ttl: Duration,
    cleanup_interval: Duration,
    clock: Arc<dyn Clock>,
    hits: Mutex<(u64, u64)>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(ttl: Duration, cleanup_interval: Duration) -> Self {
        Self::with_clock(ttl, cleanup_interval, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, cleanup_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                last_sweep: now,
            }),
            ttl,
            cleanup_interval,
            clock,
            hits: Mutex::new((0, 0)),
        }
    }

    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value for `key`, evicting it if expired.
    pub fn get(&self, key: CacheKey) -> Option<V> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let hit = match inner.entries.get(&key) {
            Some(e) if e.expires_at > now => Some(e.value.clone()),
            _ => None,
        };
        if hit.is_none() {
            inner.entries.remove(&key);
        }
        drop(inner);
        let mut counters = self.hits.lock();
        if hit.is_some() {
            counters.0 += 1;
        } else {
            counters.1 += 1;
        }
        hit
    }

    pub fn insert(&self, key: CacheKey, value: V) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        if now.duration_since(inner.last_sweep) >= self.cleanup_interval {
            inner.entries.retain(|_, e| e.expires_at > now);
            inner.last_sweep = now;
        }
        inner.entries.insert(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Cached value or `compute()` stored under `key`.
    ///
    /// The lock is not held while computing; two racing callers may both
    /// compute, and the later insert wins. Results are pure so either is fine.
    pub fn get_or_insert_with(&self, key: CacheKey, compute: impl FnOnce() -> V) -> V {
        if let Some(v) = self.get(key) {
            tracing::trace!(key = key.0, "cache hit");
            return v;
        }
        let v = compute();
        self.insert(key, v.clone());
        v
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, e| e.expires_at > now);
        inner.last_sweep = now;
        before - inner.entries.len()
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let (hits, misses) = *self.hits.lock();
        CacheStats {
            hits,
            misses,
            entries: self.len(),
        }
    }
}
