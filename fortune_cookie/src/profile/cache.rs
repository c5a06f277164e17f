//! Per-user profile cache used to paint the UI before the network answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

use super::models::Profile;
use crate::store::{self, LocalStore, StoreResult, keys};

/// Cached profile snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedProfile {
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(rename = "cachedAt")]
    pub cached_at: DateTime<Utc>,
}

impl CachedProfile {
    pub fn new(profile: Profile, cached_at: DateTime<Utc>) -> Self {
        Self { profile, cached_at }
    }

    /// Whether the entry was written within `window` of `now`
    pub fn is_fresh_at(&self, window: Duration, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.cached_at);
        match age.to_std() {
            Ok(age) => age <= window,
            // Written "in the future" (clock skew): treat as fresh
            Err(_) => true,
        }
    }
}

/// Profile cache over a [`LocalStore`]
#[derive(Clone)]
pub struct ProfileCache {
    store: Arc<dyn LocalStore>,
    freshness: Duration,
}

impl ProfileCache {
    pub fn new(store: Arc<dyn LocalStore>, freshness: Duration) -> Self {
        Self { store, freshness }
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Load the entry for `user_id`, trusting it only for `session_email`.
    ///
    /// An entry whose email does not match the authenticated session is a
    /// leftover from another account on this device: it is deleted and the
    /// lookup reports a miss.
    pub fn load(&self, user_id: &str, session_email: Option<&str>) -> Option<CachedProfile> {
        let key = keys::profile_cache(user_id);
        let entry: CachedProfile = store::get_json(self.store.as_ref(), &key)?;

        if !emails_match(entry.profile.email.as_deref(), session_email) {
            log::warn!(
                "Cached profile for {} belongs to a different account, discarding",
                user_id
            );
            if let Err(e) = self.store.remove(&key) {
                log::warn!("Failed to remove mismatched profile cache: {}", e);
            }
            return None;
        }

        Some(entry)
    }

    /// Whether `entry` is still within the freshness window
    pub fn is_fresh(&self, entry: &CachedProfile) -> bool {
        entry.is_fresh_at(self.freshness, Utc::now())
    }

    /// Write a server-confirmed profile
    pub fn save(&self, profile: &Profile) -> StoreResult<()> {
        let entry = CachedProfile::new(profile.clone(), Utc::now());
        store::set_json(self.store.as_ref(), &keys::profile_cache(&profile.id), &entry)
    }

    pub fn remove(&self, user_id: &str) -> StoreResult<()> {
        self.store.remove(&keys::profile_cache(user_id))
    }

    /// Drop every cached profile on this device
    pub fn clear_all(&self) -> StoreResult<usize> {
        store::remove_prefixed(self.store.as_ref(), keys::PROFILE_CACHE_PREFIX)
    }
}

fn emails_match(cached: Option<&str>, session: Option<&str>) -> bool {
    match (cached, session) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => false,
    }
}
