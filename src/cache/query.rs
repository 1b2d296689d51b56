//! Query result cache with per-entry TTL, backed by Moka

use std::future::{self, Future};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::ops::compute::Op;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::keys::{derive_key_with_fields, normalize_fields, CacheKey};
use crate::validation::ValidationError;

pub const DEFAULT_MAX_CAPACITY: u64 = 1000;

/// A stored value together with the metadata needed to judge its freshness
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > self.ttl
    }
}

/// Cache for one query family.
///
/// Clones are handles to the same underlying store. Expiry is judged lazily on
/// read against the injected [`Clock`]; an expired entry is evicted the first
/// time it is read. Capacity is bounded by Moka.
#[derive(Clone)]
pub struct QueryCache<T> {
    namespace: Arc<str>,
    fields: Arc<[String]>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
    store: Cache<CacheKey, CacheEntry<T>>,
}

impl<T> std::fmt::Debug for QueryCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("namespace", &self.namespace)
            .field("fields", &self.fields)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

/// Builder for [`QueryCache`]
pub struct QueryCacheBuilder<T> {
    namespace: String,
    fields: Vec<String>,
    default_ttl: Duration,
    max_capacity: u64,
    clock: Arc<dyn Clock>,
    _value: PhantomData<fn() -> T>,
}

impl<T> QueryCacheBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Fields that always appear in this family's keys
    pub fn fields<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.fields = normalize_fields(fields);
        self
    }

    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> QueryCache<T> {
        let store = Cache::builder().max_capacity(self.max_capacity).build();

        QueryCache {
            namespace: self.namespace.into(),
            fields: self.fields.into(),
            default_ttl: self.default_ttl,
            clock: self.clock,
            store,
        }
    }
}

impl<T> QueryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a cache with the system clock and default capacity
    pub fn new(namespace: impl Into<String>, default_ttl: Duration) -> Self {
        Self::builder(namespace, default_ttl).build()
    }

    pub fn builder(namespace: impl Into<String>, default_ttl: Duration) -> QueryCacheBuilder<T> {
        QueryCacheBuilder {
            namespace: namespace.into(),
            fields: Vec::new(),
            default_ttl,
            max_capacity: DEFAULT_MAX_CAPACITY,
            clock: Arc::new(SystemClock),
            _value: PhantomData,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Derive a key in this cache's namespace
    pub fn key(&self, params: &Map<String, Value>) -> Result<CacheKey, ValidationError> {
        derive_key_with_fields(&self.namespace, &self.fields[..], params)
    }

    /// Get a fresh cached value
    pub async fn get(&self, key: &CacheKey) -> Option<T> {
        if !self.owns(key) {
            return None;
        }

        let Some(entry) = self.store.get(key).await else {
            debug!("Cache miss for key: {}", key);
            return None;
        };

        let now = self.clock.now();
        if !entry.is_expired(now) {
            debug!("Cache hit for key: {}", key);
            return Some(entry.value);
        }

        // Only remove the entry if it is still the expired one; a concurrent
        // `set` may already have replaced it.
        self.store
            .entry_by_ref(key)
            .and_compute_with(|current| {
                let op = match current {
                    Some(current) if current.value().is_expired(now) => Op::Remove,
                    _ => Op::Nop,
                };
                future::ready(op)
            })
            .await;
        debug!("Cache entry expired for key: {}", key);
        None
    }

    /// Store a value, replacing any existing entry
    pub async fn set(&self, key: CacheKey, value: T, ttl: Duration) {
        if !self.owns(&key) {
            warn!(
                "Refusing to store key {} in cache namespace {}",
                key, self.namespace
            );
            return;
        }

        let entry = CacheEntry {
            value,
            stored_at: self.clock.now(),
            ttl,
        };
        debug!("Cached value for key: {} with TTL: {:?}", key, ttl);
        self.store.insert(key, entry).await;
    }

    /// Store a value with the namespace's default TTL
    pub async fn insert(&self, key: CacheKey, value: T) {
        self.set(key, value, self.default_ttl).await;
    }

    pub async fn invalidate(&self, key: &CacheKey) {
        self.store.invalidate(key).await;
        debug!("Invalidated cache entry: {}", key);
    }

    /// Drop every entry in the namespace
    pub fn invalidate_all(&self) {
        self.store.invalidate_all();
        info!("Invalidated all cache entries for namespace: {}", self.namespace);
    }

    /// Return the cached value, or run `loader` and cache its result.
    ///
    /// Loader errors are returned unchanged and nothing is cached, so the next
    /// call loads again. Concurrent misses on the same key each run their own
    /// loader; the last successful write wins. A key this cache does not own
    /// (see [`key`](Self::key)) is never cached: every call loads.
    pub async fn get_or_load<F, Fut, E>(&self, key: &CacheKey, ttl: Duration, loader: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = loader().await?;
        self.set(key.clone(), value.clone(), ttl).await;
        Ok(value)
    }

    /// [`get_or_load`](Self::get_or_load) with the namespace's default TTL
    pub async fn load<F, Fut, E>(&self, key: &CacheKey, loader: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.get_or_load(key, self.default_ttl, loader).await
    }

    /// Number of stored entries, expired ones included until they are read
    pub async fn entry_count(&self) -> u64 {
        self.store.run_pending_tasks().await;
        self.store.entry_count()
    }

    /// Keys must come from this namespace and the same declared fields
    fn owns(&self, key: &CacheKey) -> bool {
        key.namespace() == &*self.namespace && key.fields() == &self.fields[..]
    }
}
