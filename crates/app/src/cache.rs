//! In-process cache provider with per-key expiry, backed by `moka`.
//!
//! Values are computed on first miss through a caller-supplied callback and
//! kept until their TTL passes or they are invalidated. Concurrent misses on
//! the same key share a single computation. Expired entries stop being served
//! immediately; their memory is reclaimed by moka's housekeeping, which a
//! sweeper task drives periodically until a shutdown signal.

use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::Expiry;
use moka::future::Cache;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Six hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Longest TTL or sweep period honoured; larger values are clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Tunables for [`CacheProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL applied when a caller does not pass one.
    pub default_ttl: Duration,
    /// Period of the background sweep.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            sweep_interval: DEFAULT_TTL,
        }
    }
}

#[derive(Clone)]
struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    ttl: Duration,
}

impl CacheEntry {
    fn new<T: Send + Sync + 'static>(value: T, ttl: Duration) -> Self {
        Self {
            value: Arc::new(value),
            ttl,
        }
    }

    fn downcast<T: Clone + 'static>(&self) -> Option<T> {
        self.value.downcast_ref::<T>().cloned()
    }
}

/// Expire each entry after the TTL it was stored with.
struct PerEntryTtl;

impl Expiry<String, CacheEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _updated_at: std::time::Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// String-keyed, type-erased, expiring value store.
pub struct CacheProvider {
    inner: Cache<String, CacheEntry>,
    config: CacheConfig,
}

impl Default for CacheProvider {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl CacheProvider {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Cache::builder().expire_after(PerEntryTtl).build(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> CacheConfig {
        self.config
    }

    fn ttl_or_default(&self, ttl: Option<Duration>) -> Duration {
        ttl.unwrap_or(self.config.default_ttl).min(MAX_TTL)
    }

    /// Return a clone of the live value under `key`, if any.
    ///
    /// An entry stored with a different type is treated as a miss.
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.inner.get(key).await?.downcast()
    }

    /// Store `value` under `key` for `ttl` (or the default TTL), replacing
    /// any previous entry.
    pub async fn insert<T>(&self, key: impl Into<String>, value: T, ttl: Option<Duration>)
    where
        T: Send + Sync + 'static,
    {
        let entry = CacheEntry::new(value, self.ttl_or_default(ttl));
        self.inner.insert(key.into(), entry).await;
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// When `compute` fails it is invoked a second time and that result is
    /// returned as-is; nothing is stored for a failed attempt.
    ///
    /// # Errors
    ///
    /// Returns the error of the second `compute` invocation, if it fails too.
    pub async fn get_or_insert_with<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Display + Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let ttl = self.ttl_or_default(ttl);
        let filled = self
            .inner
            .try_get_with(key.to_owned(), async {
                tracing::debug!(key, "cache miss");
                compute().await.map(|value| CacheEntry::new(value, ttl))
            })
            .await;

        match filled {
            Ok(entry) => {
                if let Some(value) = entry.downcast::<T>() {
                    return Ok(value);
                }
                tracing::warn!(key, "cached value has another type, replacing it");
                let value = compute().await?;
                self.insert(key, value.clone(), Some(ttl)).await;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "cache fill failed, retrying uncached");
                compute().await
            }
        }
    }

    /// Drop `key`. Missing keys are ignored.
    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
        tracing::debug!(key, "cache entry invalidated");
    }

    /// Drop every key in `keys`. Missing keys are ignored.
    pub async fn invalidate_many<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            self.inner.invalidate(key.as_ref()).await;
        }
    }

    /// Evict expired entries and apply pending writes.
    pub async fn sweep(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Number of stored entries as of the last [`Self::sweep`].
    #[must_use]
    pub fn len(&self) -> u64 {
        self.inner.entry_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run [`Self::sweep`] every `sweep_interval` until `shutdown` turns
    /// `true` or its sender is dropped.
    #[must_use]
    pub fn spawn_sweeper(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let period = self.config.sweep_interval.min(MAX_TTL);
        tokio::spawn(async move {
            let now = Instant::now();
            let start = now.checked_add(period).unwrap_or(now);
            let mut ticker = tokio::time::interval_at(start, period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        cache.sweep().await;
                        tracing::trace!(entries = cache.len(), "cache sweep done");
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("cache sweeper stopped");
        })
    }
}
