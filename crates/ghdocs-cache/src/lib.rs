//! Bounded in-memory cache with time-based expiry for ghdocs.
//!
//! [`TtlCache`] sits in front of a slow or rate-limited upstream. Values are
//! produced by a [`Fetcher`] on demand and kept until their TTL runs out or
//! the least-recently-used entry is evicted to make room.
//!
//! Three behaviors make it safe to put in front of a remote API:
//!
//! - **Single-flight**: concurrent calls for the same key share one
//!   [`Fetcher::fetch`] call.
//! - **Stale-on-error**: when a refresh fails and an expired value is still
//!   present, the expired value is returned instead of the error.
//! - **Absence is not cached**: `Ok(None)` goes back to the caller and evicts
//!   any previous value for the key.
//!
//! # Example
//!
//! ```
//! use std::convert::Infallible;
//! use std::num::NonZeroUsize;
//! use std::time::Duration;
//!
//! use ghdocs_cache::{CacheOptions, Fetcher, TtlCache};
//!
//! struct Upper;
//!
//! impl Fetcher for Upper {
//!     type Key = String;
//!     type Value = String;
//!     type Error = Infallible;
//!
//!     async fn fetch(&self, key: &String) -> Result<Option<String>, Infallible> {
//!         Ok(Some(key.to_uppercase()))
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let max = NonZeroUsize::new(10).unwrap();
//! let cache = TtlCache::new("upper", Upper, CacheOptions::new(max, Duration::from_secs(60)));
//! assert_eq!(cache.fetch(&"docs".to_owned()).await.unwrap(), Some("DOCS".to_owned()));
//! # });
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lru::LruCache;
use tokio::sync::OnceCell;
use tokio::time::Instant;

/// Produces cache values on a miss.
pub trait Fetcher: Send + Sync {
    /// Cache key. `Display` is used for log fields.
    type Key: Hash + Eq + Clone + fmt::Display + Send + Sync;
    /// Cached value, cloned out on every hit.
    type Value: Clone + Send + Sync;
    /// Upstream failure.
    type Error: std::error::Error + Send + Sync;

    /// Fetch the value for `key`.
    ///
    /// `Ok(None)` means the upstream has no value for the key. `Err` means
    /// the upstream could not be asked.
    fn fetch(
        &self,
        key: &Self::Key,
    ) -> impl Future<Output = Result<Option<Self::Value>, Self::Error>> + Send;

    /// TTL for `key`, overriding [`CacheOptions::ttl`].
    fn ttl(&self, _key: &Self::Key) -> Option<Duration> {
        None
    }
}

/// Tuning knobs for a [`TtlCache`].
#[derive(Clone, Copy, Debug)]
pub struct CacheOptions {
    /// Maximum number of entries before LRU eviction.
    pub max: NonZeroUsize,
    /// Default time-to-live of an entry.
    pub ttl: Duration,
    /// Return an expired value when its refresh fails.
    pub allow_stale: bool,
    /// Keep an expired value when its refresh fails.
    pub no_delete_on_fetch_rejection: bool,
    /// Treat every entry as expired (forces a fetch on every call).
    pub bypass: bool,
}

impl CacheOptions {
    /// Options with stale-on-error enabled.
    #[must_use]
    pub fn new(max: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            max,
            ttl,
            allow_stale: true,
            no_delete_on_fetch_rejection: true,
            bypass: false,
        }
    }

    /// Ignore stored values. Single-flight and stale-on-error still apply.
    #[must_use]
    pub fn bypass(mut self) -> Self {
        self.bypass = true;
        self
    }
}

struct Slot<V> {
    value: V,
    expires: Instant,
}

type Outcome<F> = Result<Option<<F as Fetcher>::Value>, Arc<<F as Fetcher>::Error>>;
type Flight<F> = Arc<OnceCell<Outcome<F>>>;

/// Bounded TTL cache backed by a [`Fetcher`].
pub struct TtlCache<F: Fetcher> {
    name: &'static str,
    fetcher: F,
    options: CacheOptions,
    entries: Mutex<LruCache<F::Key, Slot<F::Value>>>,
    in_flight: Mutex<HashMap<F::Key, Flight<F>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<F: Fetcher> TtlCache<F> {
    /// Create an empty cache. `name` labels log events.
    pub fn new(name: &'static str, fetcher: F, options: CacheOptions) -> Self {
        Self {
            name,
            fetcher,
            options,
            entries: Mutex::new(LruCache::new(options.max)),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Get the value for `key`, fetching it when missing or expired.
    ///
    /// Errors are shared between all callers of the same flight, hence the
    /// `Arc`.
    pub async fn fetch(&self, key: &F::Key) -> Result<Option<F::Value>, Arc<F::Error>> {
        if let Some(value) = self.fresh(key) {
            tracing::debug!(cache = self.name, %key, "Cache hit");
            return Ok(Some(value));
        }

        let flight = {
            let mut in_flight = lock(&self.in_flight);
            Arc::clone(in_flight.entry(key.clone()).or_default())
        };

        // A dropped initializer hands the work to the next waiter.
        let outcome = flight.get_or_init(|| self.load(key)).await.clone();

        let mut in_flight = lock(&self.in_flight);
        if in_flight
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, &flight))
        {
            in_flight.remove(key);
        }

        outcome
    }

    /// Drop every entry.
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Whether no entries are stored.
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    fn fresh(&self, key: &F::Key) -> Option<F::Value> {
        if self.options.bypass {
            return None;
        }
        let mut entries = lock(&self.entries);
        entries
            .get(key)
            .filter(|slot| slot.expires > Instant::now())
            .map(|slot| slot.value.clone())
    }

    /// Flight body. A flight that finished between the caller's first
    /// lookup and this one has already stored the value.
    async fn load(&self, key: &F::Key) -> Outcome<F> {
        if let Some(value) = self.fresh(key) {
            tracing::debug!(cache = self.name, %key, "Filled by previous flight");
            return Ok(Some(value));
        }
        self.refresh(key).await
    }

    async fn refresh(&self, key: &F::Key) -> Outcome<F> {
        tracing::debug!(cache = self.name, %key, "Cache miss");

        match self.fetcher.fetch(key).await {
            Ok(Some(value)) => {
                let ttl = self.fetcher.ttl(key).unwrap_or(self.options.ttl);
                let slot = Slot {
                    value: value.clone(),
                    expires: Instant::now() + ttl,
                };
                lock(&self.entries).put(key.clone(), slot);
                Ok(Some(value))
            }
            Ok(None) => {
                lock(&self.entries).pop(key);
                Ok(None)
            }
            Err(err) => {
                let mut entries = lock(&self.entries);
                let stale = if self.options.no_delete_on_fetch_rejection {
                    entries.get(key).map(|slot| slot.value.clone())
                } else {
                    entries.pop(key).map(|slot| slot.value)
                };

                match stale {
                    Some(value) if self.options.allow_stale => {
                        tracing::warn!(
                            cache = self.name,
                            %key,
                            error = %err,
                            "Refresh failed, serving stale value"
                        );
                        Ok(Some(value))
                    }
                    _ => Err(Arc::new(err)),
                }
            }
        }
    }
}
