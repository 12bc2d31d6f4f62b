//! Time-limited lookup cache.
//!
//! [`TtlCache`] wraps an injectable [`CacheStore`] and a [`Clock`], storing
//! each value in a JSON envelope together with its expiry time. Entries are
//! keyed `"{namespace}_{handle}"`.

pub mod store;

pub use store::{CacheStore, FileStore, MemoryStore};

use crate::errors::CacheError;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Default entry lifetime: one hour.
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

/// Upper bound on a configured TTL (ten years).
const MAX_TTL_SECONDS: i64 = 10 * 365 * 24 * 3600;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|_| Utc::now())
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

/// Typed TTL cache over a string store.
#[derive(Clone)]
pub struct TtlCache {
    store: Option<Arc<dyn CacheStore>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl TtlCache {
    pub fn new(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>, ttl_seconds: u64) -> Self {
        Self {
            store: Some(store),
            clock,
            ttl: Duration::seconds(
                i64::try_from(ttl_seconds)
                    .unwrap_or(MAX_TTL_SECONDS)
                    .min(MAX_TTL_SECONDS),
            ),
        }
    }

    /// In-memory cache on the system clock with the default TTL.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
            DEFAULT_TTL_SECONDS,
        )
    }

    /// A cache that never hits and never stores.
    pub fn disabled() -> Self {
        Self {
            store: None,
            clock: Arc::new(SystemClock),
            ttl: Duration::zero(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Build the store key for a namespace and handle.
    pub fn key(namespace: &str, handle: &str) -> String {
        format!("{}_{}", namespace, handle)
    }

    /// Fetch an unexpired value. Expired and undecodable entries are removed.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.store.as_ref()?;
        let raw = store.get(key)?;

        let envelope: Envelope<T> = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Dropping corrupt cache entry {}: {}", key, e);
                self.evict(store.as_ref(), key);
                return None;
            }
        };

        if envelope.expires_at <= self.clock.now() {
            debug!("Cache entry {} expired", key);
            self.evict(store.as_ref(), key);
            return None;
        }

        debug!("Cache hit: {}", key);
        Some(envelope.value)
    }

    /// Store a value with the configured TTL. Failures are logged, not returned.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let Some(store) = self.store.as_ref() else {
            return;
        };

        let envelope = Envelope {
            value,
            expires_at: self.clock.now() + self.ttl,
        };

        let result = serde_json::to_string(&envelope)
            .map_err(CacheError::from)
            .and_then(|raw| store.set(key, raw));

        if let Err(e) = result {
            warn!("Failed to write cache entry {}: {}", key, e);
        }
    }

    /// Remove every expired or undecodable entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let Some(store) = self.store.as_ref() else {
            return 0;
        };

        let now = self.clock.now();
        let mut removed = 0;
        for key in store.keys() {
            let expired = store
                .get(&key)
                .and_then(|raw| serde_json::from_str::<Envelope<serde_json::Value>>(&raw).ok())
                .map_or(true, |envelope| envelope.expires_at <= now);
            if expired {
                self.evict(store.as_ref(), &key);
                removed += 1;
            }
        }
        removed
    }

    /// Remove every entry.
    pub fn clear(&self) -> usize {
        let Some(store) = self.store.as_ref() else {
            return 0;
        };
        let keys = store.keys();
        for key in &keys {
            self.evict(store.as_ref(), key);
        }
        keys.len()
    }

    fn evict(&self, store: &dyn CacheStore, key: &str) {
        if let Err(e) = store.remove(key) {
            warn!("Failed to remove cache entry {}: {}", key, e);
        }
    }
}
