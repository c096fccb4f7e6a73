use crate::models::Profile;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// In-memory profile cache
///
/// Profiles are read far more often than they change (every deck refill
/// re-reads the same rows), so reads go through a bounded TTL cache.
pub struct ProfileCache {
    cache: moka::future::Cache<String, Profile>,
    ttl_secs: u64,
}

impl ProfileCache {
    pub fn new(max_entries: u64, ttl_secs: u64) -> Self {
        let cache = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache, ttl_secs }
    }

    pub async fn get(&self, user_id: &str) -> Option<Profile> {
        let hit = self.cache.get(user_id).await;
        if hit.is_some() {
            tracing::trace!("Profile cache hit: {}", user_id);
        } else {
            tracing::trace!("Profile cache miss: {}", user_id);
        }
        hit
    }

    pub async fn insert(&self, profile: Profile) {
        tracing::trace!("Profile cache set: {}", profile.id);
        self.cache.insert(profile.id.clone(), profile).await;
    }

    pub async fn invalidate(&self, user_id: &str) {
        self.cache.invalidate(user_id).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.entry_count(),
            ttl_secs: self.ttl_secs,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub ttl_secs: u64,
}
