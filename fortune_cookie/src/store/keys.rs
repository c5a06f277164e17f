//! Well-known local store keys.

/// Per-user profile snapshot, suffixed with the user id
pub const PROFILE_CACHE_PREFIX: &str = "user_profile_cache_";

/// Legacy `{id, email}` identity written by older builds
pub const AUTH_BACKEND_USER: &str = "auth_backend_user";

/// JSON of the last check-login-status response from the OAuth callback
pub const AUTH_CHECK_RESULT: &str = "auth_check_result";

/// Authorization code already exchanged by the callback flow
pub const OAUTH_PROCESSED: &str = "oauth_processed";

/// Prefix of the "where did the history view come from" markers
pub const PAST_CONCERNS_PREFIX: &str = "pastConcernsFrom";

pub const INTRO_EXIT_OVERRIDE: &str = "intro_exit_override";

/// Profile cache key for a user
pub fn profile_cache(user_id: &str) -> String {
    format!("{PROFILE_CACHE_PREFIX}{user_id}")
}

/// Short-lived guards. Boolean ones hold `"true"`; the login check marker
/// holds the id of the user it was written for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Flag {
    /// A restriction redirect is in flight; SIGNED_OUT must not undo it
    CooldownRedirect,
    /// Account deletion is in flight; SIGNED_OUT must not redirect
    AccountDeletion,
    /// The callback flow already ran the restriction check for the stored
    /// user id
    AuthCheckCompleted,
}

impl Flag {
    pub const fn key(self) -> &'static str {
        match self {
            Self::CooldownRedirect => "cooldown-redirect",
            Self::AccountDeletion => "account-deletion",
            Self::AuthCheckCompleted => "auth_check_completed",
        }
    }
}

/// Keys that only make sense for the signed-in session and go away with it
pub fn is_session_scoped(key: &str) -> bool {
    key.starts_with(PAST_CONCERNS_PREFIX)
        || key.starts_with(PROFILE_CACHE_PREFIX)
        || matches!(
            key,
            AUTH_BACKEND_USER | AUTH_CHECK_RESULT | OAUTH_PROCESSED | INTRO_EXIT_OVERRIDE
        )
        || key == Flag::AuthCheckCompleted.key()
}
