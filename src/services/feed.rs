use crate::models::{Candidate, Profile};
use crate::services::{ProfileCache, SupabaseClient, SupabaseError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Backend error: {0}")]
    Backend(#[from] SupabaseError),
}

/// Supplies deck candidates and profile reads, backed by the profile cache
pub struct CandidateFeed {
    store: Arc<SupabaseClient>,
    cache: Arc<ProfileCache>,
}

impl CandidateFeed {
    pub fn new(store: Arc<SupabaseClient>, cache: Arc<ProfileCache>) -> Self {
        Self { store, cache }
    }

    /// Load up to `limit` candidates for `viewer_id`, in backend order.
    /// Profiles that cannot be shown on a card are skipped.
    pub async fn load(
        &self,
        viewer_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Candidate>, FeedError> {
        let profiles = self.store.list_profiles(viewer_id, limit).await?;
        let total = profiles.len();

        let mut candidates = Vec::with_capacity(total);
        for profile in profiles {
            self.cache.insert(profile.clone()).await;

            let id = profile.id.clone();
            match profile.into_candidate() {
                Some(candidate) => candidates.push(candidate),
                None => tracing::debug!("Skipping incomplete profile {}", id),
            }
        }

        tracing::info!("Loaded {} candidates ({} profiles)", candidates.len(), total);
        Ok(candidates)
    }

    /// Read a profile, from cache when possible
    pub async fn profile(&self, user_id: &str) -> Result<Profile, FeedError> {
        if let Some(profile) = self.cache.get(user_id).await {
            return Ok(profile);
        }

        let profile = self.store.get_profile(user_id).await?;
        self.cache.insert(profile.clone()).await;
        Ok(profile)
    }

    /// Save the user's own profile and refresh the cached copy
    pub async fn save_profile(&self, profile: &Profile) -> Result<Profile, FeedError> {
        let saved = self.store.upsert_profile(profile).await?;
        self.cache.insert(saved.clone()).await;
        Ok(saved)
    }
}
