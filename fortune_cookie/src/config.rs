//! Session engine configuration.
//!
//! The retry count, backoff and the short background timeouts were tuned
//! empirically in production; they are exposed here as plain fields rather
//! than baked into the engine.

use std::time::Duration;

/// Timing knobs for the reconciliation engine and usage timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Abort timeout for the background `GET /api/auth/profile`
    pub profile_fetch_timeout: Duration,
    /// Race timeout for the direct profile store fallback read
    pub profile_store_timeout: Duration,
    /// Bound on the "does a backing user record exist" check
    pub upsert_check_timeout: Duration,
    /// Bound on the upsert itself
    pub upsert_timeout: Duration,
    /// Session refresh attempts before a SIGNED_OUT is believed
    pub signout_refresh_attempts: u32,
    /// Linear backoff unit between refresh attempts (`unit * attempt`)
    pub signout_refresh_backoff: Duration,
    /// Cached profiles older than this are flagged stale
    pub cache_freshness: Duration,
    /// Foreground inactivity after which usage stops accumulating
    pub usage_idle_timeout: Duration,
    /// How often accumulated usage is flushed
    pub usage_flush_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            profile_fetch_timeout: Duration::from_millis(2000),
            profile_store_timeout: Duration::from_millis(1000),
            upsert_check_timeout: Duration::from_millis(300),
            upsert_timeout: Duration::from_millis(1500),
            signout_refresh_attempts: 3,
            signout_refresh_backoff: Duration::from_millis(1000),
            cache_freshness: Duration::from_secs(5 * 60),
            usage_idle_timeout: Duration::from_secs(5 * 60),
            usage_flush_interval: Duration::from_secs(60),
        }
    }
}

impl SessionConfig {
    /// Load overrides from environment variables, falling back to defaults
    ///
    /// Durations are read in milliseconds:
    /// - `FC_PROFILE_FETCH_TIMEOUT_MS`
    /// - `FC_PROFILE_STORE_TIMEOUT_MS`
    /// - `FC_UPSERT_CHECK_TIMEOUT_MS`
    /// - `FC_UPSERT_TIMEOUT_MS`
    /// - `FC_SIGNOUT_REFRESH_ATTEMPTS` (count)
    /// - `FC_SIGNOUT_REFRESH_BACKOFF_MS`
    /// - `FC_CACHE_FRESHNESS_MS`
    /// - `FC_USAGE_IDLE_TIMEOUT_MS`
    /// - `FC_USAGE_FLUSH_INTERVAL_MS`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the resulting values fail [`SessionConfig::validate`]
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            profile_fetch_timeout: millis_env_or(
                "FC_PROFILE_FETCH_TIMEOUT_MS",
                defaults.profile_fetch_timeout,
            ),
            profile_store_timeout: millis_env_or(
                "FC_PROFILE_STORE_TIMEOUT_MS",
                defaults.profile_store_timeout,
            ),
            upsert_check_timeout: millis_env_or(
                "FC_UPSERT_CHECK_TIMEOUT_MS",
                defaults.upsert_check_timeout,
            ),
            upsert_timeout: millis_env_or("FC_UPSERT_TIMEOUT_MS", defaults.upsert_timeout),
            signout_refresh_attempts: parse_env_or(
                "FC_SIGNOUT_REFRESH_ATTEMPTS",
                defaults.signout_refresh_attempts,
            ),
            signout_refresh_backoff: millis_env_or(
                "FC_SIGNOUT_REFRESH_BACKOFF_MS",
                defaults.signout_refresh_backoff,
            ),
            cache_freshness: millis_env_or("FC_CACHE_FRESHNESS_MS", defaults.cache_freshness),
            usage_idle_timeout: millis_env_or(
                "FC_USAGE_IDLE_TIMEOUT_MS",
                defaults.usage_idle_timeout,
            ),
            usage_flush_interval: millis_env_or(
                "FC_USAGE_FLUSH_INTERVAL_MS",
                defaults.usage_flush_interval,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounded = [
            ("FC_PROFILE_FETCH_TIMEOUT_MS", self.profile_fetch_timeout),
            ("FC_PROFILE_STORE_TIMEOUT_MS", self.profile_store_timeout),
            ("FC_UPSERT_CHECK_TIMEOUT_MS", self.upsert_check_timeout),
            ("FC_UPSERT_TIMEOUT_MS", self.upsert_timeout),
            ("FC_USAGE_FLUSH_INTERVAL_MS", self.usage_flush_interval),
        ];
        for (var, value) in bounded {
            if value.is_zero() {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }
        }

        if self.signout_refresh_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "FC_SIGNOUT_REFRESH_ATTEMPTS".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.usage_idle_timeout < self.usage_flush_interval / 2 {
            return Err(ConfigError::Invalid {
                var: "FC_USAGE_IDLE_TIMEOUT_MS".to_string(),
                reason: format!(
                    "Must be at least half the flush interval ({:?})",
                    self.usage_flush_interval
                ),
            });
        }

        Ok(())
    }

    /// Delay before the given 1-based refresh attempt
    pub fn refresh_delay(&self, attempt: u32) -> Duration {
        self.signout_refresh_backoff.saturating_mul(attempt)
    }
}

/// Paths the engine redirects to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    pub entry: String,
    pub banned: String,
    pub cooldown: String,
    pub school_selection: String,
    pub admin_denied: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            entry: "/".to_string(),
            banned: "/banned".to_string(),
            cooldown: "/cooldown".to_string(),
            school_selection: "/school".to_string(),
            admin_denied: "/".to_string(),
        }
    }
}

impl RouteConfig {
    /// Defaults overridden by `FC_ROUTE_ENTRY`, `FC_ROUTE_BANNED`, `FC_ROUTE_COOLDOWN`,
    /// `FC_ROUTE_SCHOOL` and `FC_ROUTE_ADMIN_DENIED`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            entry: parse_env_or("FC_ROUTE_ENTRY", defaults.entry),
            banned: parse_env_or("FC_ROUTE_BANNED", defaults.banned),
            cooldown: parse_env_or("FC_ROUTE_COOLDOWN", defaults.cooldown),
            school_selection: parse_env_or("FC_ROUTE_SCHOOL", defaults.school_selection),
            admin_denied: parse_env_or("FC_ROUTE_ADMIN_DENIED", defaults.admin_denied),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
pub fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn millis_env_or(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}
