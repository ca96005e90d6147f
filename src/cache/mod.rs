//! Cache module for weather responses
//!
//! Weather snapshots are cached for a short freshness window so that
//! repeated lookups of the same location skip the network. The storage
//! backend is pluggable: on disk in the XDG cache directory, or in memory.

mod manager;
mod store;

pub use manager::{now_ms, CacheEntry, WeatherCache, DEFAULT_CACHE_TTL, WEATHER_KEY_PREFIX};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
