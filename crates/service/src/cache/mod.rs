//! In-memory caching primitives.
//!
//! - [`bounded_cache`] builds the capacity-bounded, TTL-aware value caches
//!   (`moka`). Entries expire a fixed time after their last write and may be
//!   evicted earlier under capacity pressure.
//! - [`LoadHandle`] is the single-flight cell stored in the coalescing cache.

mod single_flight;

use std::hash::Hash;
use std::time::Duration;

use moka::future::Cache;

pub use single_flight::{LoadHandle, Ticket};

/// Capacity and time-to-live for one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Maximum number of entries.
    pub capacity: u64,
    /// Lifetime of an entry, measured from its last write.
    pub time_to_live: Duration,
}

impl CacheSettings {
    #[must_use]
    pub const fn new(capacity: u64, time_to_live: Duration) -> Self {
        Self {
            capacity,
            time_to_live,
        }
    }
}

/// Settings for the three customer caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// id → customer.
    pub by_id: CacheSettings,
    /// document number → customer.
    pub by_document: CacheSettings,
    /// id → in-flight load (coalescing cache).
    pub in_flight: CacheSettings,
}

impl CacheConfig {
    /// Default capacity of every customer cache.
    pub const DEFAULT_CAPACITY: u64 = 1_000;
    /// Default lifetime of cached customers.
    pub const DEFAULT_VALUE_TTL: Duration = Duration::from_secs(10 * 60);
    /// Default lifetime of coalescing-cache entries.
    pub const DEFAULT_IN_FLIGHT_TTL: Duration = Duration::from_secs(5 * 60);
}

impl Default for CacheConfig {
    fn default() -> Self {
        let values = CacheSettings::new(Self::DEFAULT_CAPACITY, Self::DEFAULT_VALUE_TTL);
        Self {
            by_id: values,
            by_document: values,
            in_flight: CacheSettings::new(Self::DEFAULT_CAPACITY, Self::DEFAULT_IN_FLIGHT_TTL),
        }
    }
}

/// Build a named, capacity-bounded cache with expire-after-write semantics.
#[must_use]
pub fn bounded_cache<K, V>(name: &str, settings: &CacheSettings) -> Cache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .name(name)
        .max_capacity(settings.capacity)
        .time_to_live(settings.time_to_live)
        .build()
}
