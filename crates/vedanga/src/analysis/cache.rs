//! Cache-aside memoization keyed by [`Fingerprint`].
//!
//! Values are stored as serialized JSON behind a [`CacheBackend`] so the
//! in-process [`MemoryBackend`] can be swapped for an external store. A
//! per-fingerprint lock guarantees at most one computation per key while
//! other keys proceed in parallel. Backend failures never fail a request:
//! the value is computed and returned without being cached.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::fingerprint::Fingerprint;
use crate::error::AnalysisError;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Byte store with per-entry TTL.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
    fn invalidate(&self, key: &str) -> Result<(), CacheError>;
}

struct StoredEntry {
    bytes: Vec<u8>,
    /// `None` when the TTL runs past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Bounded in-process backend: LRU eviction plus TTL expiry.
pub struct MemoryBackend {
    entries: Mutex<LruCache<String, StoredEntry>>,
}

impl MemoryBackend {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> CacheError {
    CacheError::Unavailable("memory backend lock poisoned".to_string())
}

impl CacheBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        let expired = match entries.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => {
                return Ok(Some(entry.bytes.clone()))
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.put(
            key.to_string(),
            StoredEntry {
                bytes: value,
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.pop(key);
        Ok(())
    }
}

/// Values that may opt out of caching, e.g. partially degraded results.
pub trait Cacheable {
    fn is_cacheable(&self) -> bool {
        true
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    skipped: AtomicU64,
    backend_errors: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    /// Computed values that were not cacheable.
    pub skipped: u64,
    pub backend_errors: u64,
}

type KeyLocks = Mutex<HashMap<Fingerprint, Arc<Mutex<()>>>>;

/// Holds a per-key lock; drops the map entry once nobody else waits on it.
struct KeyLease<'a> {
    locks: &'a KeyLocks,
    key: Fingerprint,
    lock: Arc<Mutex<()>>,
}

impl Drop for KeyLease<'_> {
    fn drop(&mut self) {
        if let Ok(mut locks) = self.locks.lock() {
            // the map and this lease hold the only two references
            if Arc::strong_count(&self.lock) == 2 {
                locks.remove(&self.key);
            }
        }
    }
}

/// Typed cache-aside wrapper over a [`CacheBackend`].
pub struct ComputeCache<V> {
    namespace: &'static str,
    backend: Option<Arc<dyn CacheBackend>>,
    ttl: Duration,
    locks: KeyLocks,
    counters: Counters,
    _value: PhantomData<fn() -> V>,
}

impl<V> ComputeCache<V>
where
    V: Serialize + DeserializeOwned + Cacheable,
{
    pub fn new(namespace: &'static str, backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            namespace,
            backend: Some(backend),
            ttl,
            locks: Mutex::new(HashMap::new()),
            counters: Counters::default(),
            _value: PhantomData,
        }
    }

    /// Always computes; still serializes concurrent computations per key.
    pub fn disabled(namespace: &'static str) -> Self {
        Self {
            namespace,
            backend: None,
            ttl: Duration::ZERO,
            locks: Mutex::new(HashMap::new()),
            counters: Counters::default(),
            _value: PhantomData,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            stores: self.counters.stores.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            backend_errors: self.counters.backend_errors.load(Ordering::Relaxed),
        }
    }

    /// Return the cached value for `key`, or run `compute` exactly once for
    /// all concurrent callers and cache its result if it is cacheable.
    /// Errors from `compute` are returned and never cached.
    pub fn get_or_compute<F>(&self, key: &Fingerprint, compute: F) -> Result<Arc<V>, AnalysisError>
    where
        F: FnOnce() -> Result<V, AnalysisError>,
    {
        let lease = self.lease(key);
        let _guard = lease
            .lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(value) = self.lookup(key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            log::debug!("{} cache hit {}", self.namespace, key);
            return Ok(Arc::new(value));
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("{} cache miss {}", self.namespace, key);

        let value = compute()?;
        if value.is_cacheable() {
            self.store(key, &value);
        } else {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            log::info!("{} result for {} not cached (degraded)", self.namespace, key);
        }
        Ok(Arc::new(value))
    }

    pub fn invalidate(&self, key: &Fingerprint) -> Result<(), AnalysisError> {
        if let Some(backend) = &self.backend {
            backend.invalidate(&self.storage_key(key))?;
        }
        Ok(())
    }

    fn lease(&self, key: &Fingerprint) -> KeyLease<'_> {
        let lock = match self.locks.lock() {
            Ok(mut locks) => locks.entry(key.clone()).or_default().clone(),
            // a panicked lease holder cannot corrupt the map; fall back to an
            // unshared lock so the request still completes
            Err(_) => Arc::new(Mutex::new(())),
        };
        KeyLease {
            locks: &self.locks,
            key: key.clone(),
            lock,
        }
    }

    fn storage_key(&self, key: &Fingerprint) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn lookup(&self, key: &Fingerprint) -> Option<V> {
        let backend = self.backend.as_ref()?;
        let bytes = match backend.get(&self.storage_key(key)) {
            Ok(bytes) => bytes?,
            Err(err) => {
                self.degrade("read", key, &err);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                let err = CacheError::Deserialization(err.to_string());
                self.degrade("decode", key, &err);
                // drop the unreadable entry so the fresh value replaces it
                if let Err(err) = backend.invalidate(&self.storage_key(key)) {
                    self.degrade("invalidate", key, &err);
                }
                None
            }
        }
    }

    fn store(&self, key: &Fingerprint, value: &V) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.degrade("encode", key, &CacheError::Serialization(err.to_string()));
                return;
            }
        };
        match backend.set(&self.storage_key(key), bytes, self.ttl) {
            Ok(()) => {
                self.counters.stores.fetch_add(1, Ordering::Relaxed);
                log::debug!("{} cache store {}", self.namespace, key);
            }
            Err(err) => self.degrade("write", key, &err),
        }
    }

    fn degrade(&self, operation: &str, key: &Fingerprint, err: &CacheError) {
        self.counters.backend_errors.fetch_add(1, Ordering::Relaxed);
        log::warn!(
            "{} cache {} failed for {}: {}; continuing without cache",
            self.namespace,
            operation,
            key,
            err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Value {
        n: u32,
        partial: bool,
    }

    impl Cacheable for Value {
        fn is_cacheable(&self) -> bool {
            !self.partial
        }
    }

    struct BrokenBackend;

    impl CacheBackend for BrokenBackend {
        fn get(&self, _: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }
        fn set(&self, _: &str, _: Vec<u8>, _: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }
        fn invalidate(&self, _: &str) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }
    }

    fn key(n: u8) -> Fingerprint {
        Fingerprint::compute(&format!("test-{n}"))
    }

    fn memory(capacity: usize) -> Arc<dyn CacheBackend> {
        Arc::new(MemoryBackend::new(NonZeroUsize::new(capacity).unwrap()))
    }

    #[test]
    fn test_hit_after_miss() {
        let cache = ComputeCache::<Value>::new("test", memory(4), Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Value { n: 7, partial: false })
        };
        let first = cache.get_or_compute(&key(1), compute).unwrap();
        let second = cache
            .get_or_compute(&key(1), || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Value { n: 8, partial: false })
            })
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_errors_and_partial_results_not_cached() {
        let cache = ComputeCache::<Value>::new("test", memory(4), Duration::from_secs(60));
        let err = cache
            .get_or_compute(&key(2), || Err(AnalysisError::invalid("x", "bad")))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");

        cache
            .get_or_compute(&key(2), || Ok(Value { n: 1, partial: true }))
            .unwrap();
        let fresh = cache
            .get_or_compute(&key(2), || Ok(Value { n: 2, partial: false }))
            .unwrap();
        assert_eq!(fresh.n, 2);
        assert_eq!(cache.stats().skipped, 1);
        assert_eq!(cache.stats().stores, 1);
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = ComputeCache::<Value>::new("test", memory(4), Duration::ZERO);
        cache
            .get_or_compute(&key(3), || Ok(Value { n: 1, partial: false }))
            .unwrap();
        let again = cache
            .get_or_compute(&key(3), || Ok(Value { n: 2, partial: false }))
            .unwrap();
        assert_eq!(again.n, 2);
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let cache = ComputeCache::<Value>::new("test", memory(4), Duration::MAX);
        cache
            .get_or_compute(&key(6), || Ok(Value { n: 1, partial: false }))
            .unwrap();
        let again = cache
            .get_or_compute(&key(6), || Ok(Value { n: 2, partial: false }))
            .unwrap();
        assert_eq!(again.n, 1);
        assert_eq!(cache.stats().backend_errors, 0);
    }

    #[test]
    fn test_lru_eviction() {
        let backend = MemoryBackend::new(NonZeroUsize::new(2).unwrap());
        let ttl = Duration::from_secs(60);
        backend.set("a", vec![1], ttl).unwrap();
        backend.set("b", vec![2], ttl).unwrap();
        assert!(backend.get("a").unwrap().is_some());
        backend.set("c", vec![3], ttl).unwrap();
        assert!(backend.get("b").unwrap().is_none());
        assert_eq!(backend.len(), 2);
    }

    #[test]
    fn test_broken_backend_degrades_to_compute() {
        let cache =
            ComputeCache::<Value>::new("test", Arc::new(BrokenBackend), Duration::from_secs(60));
        let value = cache
            .get_or_compute(&key(4), || Ok(Value { n: 3, partial: false }))
            .unwrap();
        assert_eq!(value.n, 3);
        assert_eq!(cache.stats().backend_errors, 2);
    }

    #[test]
    fn test_single_flight_under_contention() {
        let cache = ComputeCache::<Value>::new("test", memory(8), Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    cache
                        .get_or_compute(&key(5), || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(20));
                            Ok(Value { n: 9, partial: false })
                        })
                        .unwrap()
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.locks.lock().unwrap().is_empty());
    }
}
