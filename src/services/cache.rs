use crate::models::{NearbyDonorsResponse, NearbyQuery};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// In-process cache for nearby-search responses
///
/// Entries are stored under the directory generation that was current
/// before the handler read its donor snapshot. Every directory write bumps
/// the generation, so a response computed from a snapshot that a write
/// has since replaced is never served, even if it lands after the
/// invalidation.
pub struct NearbyCache {
    cache: moka::future::Cache<String, NearbyDonorsResponse>,
    generation: AtomicU64,
}

impl NearbyCache {
    /// Create a new cache
    pub fn new(max_entries: u64, ttl_secs: u64) -> Self {
        let cache = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            cache,
            generation: AtomicU64::new(0),
        }
    }

    /// Current directory generation; read it before loading the snapshot
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub async fn get(&self, key: &str) -> Option<NearbyDonorsResponse> {
        let key = Self::versioned(self.generation(), key);
        let hit = self.cache.get(&key).await;
        if hit.is_some() {
            tracing::trace!("Cache hit: {}", key);
        } else {
            tracing::trace!("Cache miss: {}", key);
        }
        hit
    }

    /// Store a response computed from a snapshot read at `generation`
    pub async fn insert(&self, generation: u64, key: &str, response: NearbyDonorsResponse) {
        if generation != self.generation() {
            tracing::debug!("Skipping stale cache set: {} (generation {})", key, generation);
            return;
        }
        let key = Self::versioned(generation, key);
        tracing::trace!("Cache set: {}", key);
        self.cache.insert(key, response).await;
    }

    /// Drop every cached response and retire the current generation
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache.invalidate_all();
        tracing::debug!("Invalidated nearby-search cache");
    }

    fn versioned(generation: u64, key: &str) -> String {
        format!("{}:{}", generation, key)
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a nearby search
    ///
    /// Coordinates are keyed at 5 decimals (~1 m).
    pub fn nearby(query: &NearbyQuery) -> String {
        format!(
            "nearby:{:.5}:{:.5}:{}:{}:{}",
            query.center.lat, query.center.lon, query.filter, query.radius_km, query.limit
        )
    }
}
