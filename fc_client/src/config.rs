//! Client configuration loaded from the environment.

use std::{path::PathBuf, time::Duration};

use fortune_cookie::{
    ConfigError, RouteConfig, SessionConfig, config::parse_env_or, db::DatabaseConfig,
};

use crate::gotrue::GoTrueConfig;

/// Everything the client binary needs to wire the engine together
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin
    pub api_url: String,
    /// Auth provider connection
    pub auth: GoTrueConfig,
    /// JSON file backing the local store
    pub state_path: PathBuf,
    /// Per-request bound for backend calls
    pub request_timeout: Duration,
    /// Direct profile store, when configured
    pub database: Option<DatabaseConfig>,
    pub session: SessionConfig,
    pub routes: RouteConfig,
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `SUPABASE_URL`: GoTrue project URL (required)
    /// - `SUPABASE_ANON_KEY`: Public anon key (required)
    /// - `FORTUNE_API_URL`: Backend origin (default: `http://localhost:3000`)
    /// - `FORTUNE_REDIRECT_URL`: OAuth callback URL (default: `{FORTUNE_API_URL}/auth/callback`)
    /// - `FORTUNE_STATE_PATH`: Local store file (default: `.fortune/state.json`)
    /// - `FORTUNE_REQUEST_TIMEOUT_SECS`: Backend call bound (default: 10)
    /// - `DATABASE_URL`: Optional direct profile store
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingRequired`] if a required variable is unset
    /// - [`ConfigError::Invalid`] if a URL does not look like one or the
    ///   session timings are inconsistent
    pub fn from_env() -> Result<Self, ConfigError> {
        let supabase_url = required("SUPABASE_URL", "Project URL from the Supabase dashboard")?;
        let anon_key = required("SUPABASE_ANON_KEY", "Public anon key from the Supabase dashboard")?;
        let api_url = parse_env_or("FORTUNE_API_URL", "http://localhost:3000".to_string());
        let redirect_url = std::env::var("FORTUNE_REDIRECT_URL")
            .unwrap_or_else(|_| format!("{}/auth/callback", api_url.trim_end_matches('/')));

        for (var, value) in [
            ("SUPABASE_URL", &supabase_url),
            ("FORTUNE_API_URL", &api_url),
            ("FORTUNE_REDIRECT_URL", &redirect_url),
        ] {
            validate_url(var, value)?;
        }

        let session = SessionConfig::from_env()?;

        Ok(Self {
            api_url,
            auth: GoTrueConfig {
                url: supabase_url,
                anon_key,
                redirect_url,
            },
            state_path: parse_env_or("FORTUNE_STATE_PATH", PathBuf::from(".fortune/state.json")),
            request_timeout: Duration::from_secs(parse_env_or("FORTUNE_REQUEST_TIMEOUT_SECS", 10)),
            database: DatabaseConfig::from_env_optional(),
            session,
            routes: RouteConfig::from_env(),
        })
    }
}

fn required(var: &str, hint: &str) -> Result<String, ConfigError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingRequired {
            var: var.to_string(),
            hint: hint.to_string(),
        })
}

fn validate_url(var: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            var: var.to_string(),
            reason: format!("'{}' is not an http(s) URL", value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "SUPABASE_URL",
        "SUPABASE_ANON_KEY",
        "FORTUNE_API_URL",
        "FORTUNE_REDIRECT_URL",
        "FORTUNE_STATE_PATH",
        "DATABASE_URL",
    ];

    fn clear() {
        for var in VARS {
            // SAFETY: tests touching the environment run serially
            unsafe { std::env::remove_var(var) };
        }
    }

    fn set(var: &str, value: &str) {
        // SAFETY: tests touching the environment run serially
        unsafe { std::env::set_var(var, value) };
    }

    #[test]
    #[serial]
    fn test_missing_supabase_url() {
        clear();
        let err = ClientConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { var, .. } if var == "SUPABASE_URL"));
    }

    #[test]
    #[serial]
    fn test_defaults_derive_from_api_url() {
        clear();
        set("SUPABASE_URL", "https://project.supabase.co");
        set("SUPABASE_ANON_KEY", "anon");
        set("FORTUNE_API_URL", "https://fortune.example.com/");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(
            config.auth.redirect_url,
            "https://fortune.example.com/auth/callback"
        );
        assert_eq!(config.state_path, PathBuf::from(".fortune/state.json"));
        assert!(config.database.is_none());
        assert_eq!(config.routes, RouteConfig::default());
        clear();
    }

    #[test]
    #[serial]
    fn test_rejects_non_http_url() {
        clear();
        set("SUPABASE_URL", "project.supabase.co");
        set("SUPABASE_ANON_KEY", "anon");

        let err = ClientConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == "SUPABASE_URL"));
        clear();
    }
}
