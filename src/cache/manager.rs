//! Weather cache with a freshness window
//!
//! Stores weather snapshots as JSON `{ "data": ..., "timestamp": <epoch ms> }`
//! under `weather_{location}` keys. Entries older than the freshness window
//! are removed lazily when read.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::store::{KeyValueStore, StoreError};
use crate::data::WeatherSnapshot;

/// Prefix of every weather cache key
pub const WEATHER_KEY_PREFIX: &str = "weather_";

/// Default freshness window (10 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Wrapper stored for each cached snapshot
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached snapshot
    pub data: WeatherSnapshot,
    /// When the snapshot was cached, in milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Time-stamped weather snapshots on top of a key-value store
pub struct WeatherCache {
    store: Box<dyn KeyValueStore>,
    ttl: Duration,
}

impl WeatherCache {
    pub fn new(store: Box<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Cache key for a location
    pub fn key_for(location: &str) -> String {
        format!("{}{}", WEATHER_KEY_PREFIX, location)
    }

    /// Returns the snapshot for `location` if it is still fresh
    pub fn get(&mut self, location: &str) -> Option<WeatherSnapshot> {
        self.get_at(location, now_ms())
    }

    /// Like [`get`](Self::get) with an explicit clock reading
    ///
    /// A stale or unreadable entry is removed from the store.
    pub fn get_at(&mut self, location: &str, now_ms: i64) -> Option<WeatherSnapshot> {
        let key = Self::key_for(location);
        let raw = self.store.get(&key)?;

        let entry = match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(%key, error = %e, "dropping unreadable cache entry");
                self.remove_key(&key);
                return None;
            }
        };

        if self.is_stale(entry.timestamp, now_ms) {
            debug!(%key, "cache entry expired");
            self.remove_key(&key);
            return None;
        }

        Some(entry.data)
    }

    /// Stores a snapshot stamped with the current time
    pub fn put(&mut self, location: &str, snapshot: &WeatherSnapshot) -> Result<(), StoreError> {
        self.put_at(location, snapshot, now_ms())
    }

    /// Stores a snapshot stamped with `timestamp` (epoch ms)
    pub fn put_at(
        &mut self,
        location: &str,
        snapshot: &WeatherSnapshot,
        timestamp: i64,
    ) -> Result<(), StoreError> {
        let entry = CacheEntry {
            data: snapshot.clone(),
            timestamp,
        };
        let json = serde_json::to_string(&entry)?;
        self.store.set(&Self::key_for(location), &json)
    }

    /// Removes every weather entry that is stale or unreadable
    ///
    /// Returns the number of entries removed.
    pub fn evict_expired(&mut self) -> usize {
        self.evict_expired_at(now_ms())
    }

    pub fn evict_expired_at(&mut self, now_ms: i64) -> usize {
        let mut removed = 0;
        for key in self.store.keys() {
            if !key.starts_with(WEATHER_KEY_PREFIX) {
                continue;
            }
            let keep = self
                .store
                .get(&key)
                .and_then(|raw| serde_json::from_str::<CacheEntry>(&raw).ok())
                .is_some_and(|entry| !self.is_stale(entry.timestamp, now_ms));
            if !keep {
                self.remove_key(&key);
                removed += 1;
            }
        }
        removed
    }

    fn is_stale(&self, timestamp: i64, now_ms: i64) -> bool {
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(timestamp) > ttl_ms
    }

    fn remove_key(&mut self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            warn!(%key, error = %e, "failed to remove cache entry");
        }
    }
}

/// Current time in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
