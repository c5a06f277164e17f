//! Profile data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use crate::auth::{SessionUser, UserId};

/// School value used before the real one is known
pub const UNKNOWN_SCHOOL: &str = "unknown";

/// Account status as stored by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    #[default]
    Active,
    Inactive,
    Deleted,
    Banned,
}

impl ProfileStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Deleted => "deleted",
            Self::Banned => "banned",
        }
    }
}

impl FromStr for ProfileStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "deleted" => Ok(Self::Deleted),
            "banned" => Ok(Self::Banned),
            other => Err(format!("unknown profile status '{other}'")),
        }
    }
}

/// Server-confirmed user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: ProfileStatus,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Null or unrecognised statuses read as active, as stored rows do
fn lenient_status<'de, D>(deserializer: D) -> Result<ProfileStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let status = match raw.as_ref().and_then(serde_json::Value::as_str) {
        Some(text) => text.parse().unwrap_or_else(|e| {
            log::warn!("{}, treating as active", e);
            ProfileStatus::default()
        }),
        None => ProfileStatus::default(),
    };
    Ok(status)
}

impl Profile {
    /// Whether a real school has been chosen
    pub fn has_school(&self) -> bool {
        school_is_set(self.school.as_deref())
    }

    pub fn is_banned(&self) -> bool {
        self.status == ProfileStatus::Banned
    }
}

/// Absent, blank and `"unknown"` all mean "not chosen yet"
pub fn school_is_set(school: Option<&str>) -> bool {
    match school.map(str::trim) {
        None | Some("") => false,
        Some(s) => s != UNKNOWN_SCHOOL,
    }
}

/// Where the profile fields of an [`AuthUser`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOrigin {
    /// Provider user merged with defaults; nothing confirmed yet
    Placeholder,
    /// Painted from the local cache while the refresh runs
    Cache { fresh: bool },
    /// Confirmed by the backend or the profile store
    Server,
}

/// The user the rest of the application sees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub status: ProfileStatus,
    pub school: Option<String>,
    pub is_admin: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub origin: ProfileOrigin,
}

impl AuthUser {
    /// Provider user merged with `{is_admin: false, status: active, school: unknown}`
    pub fn placeholder(user: &SessionUser) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            status: ProfileStatus::Active,
            school: Some(UNKNOWN_SCHOOL.to_string()),
            is_admin: false,
            created_at: None,
            origin: ProfileOrigin::Placeholder,
        }
    }

    /// Provider user painted with a trusted cache entry
    pub fn from_cache(user: &SessionUser, cached: &Profile, fresh: bool) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            nickname: cached.nickname.clone().or_else(|| user.nickname.clone()),
            status: cached.status,
            school: cached.school.clone(),
            is_admin: cached.is_admin,
            created_at: cached.created_at,
            origin: ProfileOrigin::Cache { fresh },
        }
    }

    /// Overlay server truth
    pub fn apply_profile(&mut self, profile: &Profile) {
        if profile.email.is_some() {
            self.email = profile.email.clone();
        }
        if profile.nickname.is_some() {
            self.nickname = profile.nickname.clone();
        }
        self.status = profile.status;
        self.school = profile.school.clone();
        self.is_admin = profile.is_admin;
        self.created_at = profile.created_at.or(self.created_at);
        self.origin = ProfileOrigin::Server;
    }

    pub fn has_school(&self) -> bool {
        school_is_set(self.school.as_deref())
    }
}
