//! User profiles and the local profile cache.

pub mod cache;
pub mod models;

pub use cache::{CachedProfile, ProfileCache};
pub use models::{AuthUser, Profile, ProfileOrigin, ProfileStatus, UNKNOWN_SCHOOL, school_is_set};
