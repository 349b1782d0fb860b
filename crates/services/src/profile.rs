use std::env;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;

use course_core::Clock;
use course_core::model::{Language, UserProfile};
use storage::records::ProfileStore;

use crate::error::ProfileError;

/// Outcome of saving the profile: persisted locally, maybe synced remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSaved {
    pub synced: bool,
}

/// Owns the singleton learner profile.
///
/// Saving always persists locally first; the remote sync to the configured
/// endpoint is best-effort and its failure never fails the save.
#[derive(Clone)]
pub struct ProfileService {
    store: ProfileStore,
    client: Client,
    sync_url: Option<String>,
    clock: Clock,
}

impl ProfileService {
    #[must_use]
    pub fn new(store: ProfileStore, sync_url: Option<String>, clock: Clock) -> Self {
        let sync_url = sync_url.filter(|url| !url.trim().is_empty());
        Self {
            store,
            client: Client::new(),
            sync_url,
            clock,
        }
    }

    /// Service with the sync endpoint taken from `COURSE_SYNC_URL`.
    #[must_use]
    pub fn from_env(store: ProfileStore, clock: Clock) -> Self {
        Self::new(store, env::var("COURSE_SYNC_URL").ok(), clock)
    }

    #[must_use]
    pub fn sync_enabled(&self) -> bool {
        self.sync_url.is_some()
    }

    /// Load the stored profile, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` for storage read failures.
    pub async fn load(&self) -> Result<Option<UserProfile>, ProfileError> {
        Ok(self.store.load().await?)
    }

    /// Persist the profile, then attempt the remote sync.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` only if local persistence fails; an
    /// unreachable sync endpoint reports `synced: false` instead.
    pub async fn save(
        &self,
        profile: &UserProfile,
        language: Language,
    ) -> Result<ProfileSaved, ProfileError> {
        self.store.save(profile).await?;
        let synced = self.sync(profile, language).await;
        Ok(ProfileSaved { synced })
    }

    async fn sync(&self, profile: &UserProfile, language: Language) -> bool {
        let Some(url) = &self.sync_url else {
            return false;
        };
        let payload = SyncPayload {
            name: &profile.name,
            email: &profile.email,
            language: language.code(),
            timestamp: self.clock.now(),
        };
        match self.client.post(url).json(&payload).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[derive(Debug, Serialize)]
struct SyncPayload<'a> {
    name: &'a str,
    email: &'a str,
    language: &'a str,
    timestamp: DateTime<Utc>,
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
