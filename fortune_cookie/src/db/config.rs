//! Database configuration module.
//!
//! Connection settings for the direct profile store (the Supabase Postgres
//! instance behind the auth provider).

use crate::config::{ConfigError, parse_env_or};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 4)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 0)
    /// - `DB_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 5)
    /// - `DB_IDLE_TIMEOUT`: Idle timeout in seconds (default: 300)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequired`] if `DATABASE_URL` is not set
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingRequired {
                var: "DATABASE_URL".to_string(),
                hint: "Use the Supabase pooler connection string".to_string(),
            })?;

        Ok(Self::with_url_defaults(database_url).with_env_pool_settings())
    }

    /// Create configuration from environment if `DATABASE_URL` is present
    pub fn from_env_optional() -> Option<Self> {
        Self::from_env().ok()
    }

    fn with_url_defaults(database_url: String) -> Self {
        Self {
            database_url,
            max_connections: 4,
            min_connections: 0,
            connection_timeout_secs: 5,
            idle_timeout_secs: 300,
        }
    }

    fn with_env_pool_settings(self) -> Self {
        Self {
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", self.max_connections),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", self.min_connections),
            connection_timeout_secs: parse_env_or(
                "DB_CONNECTION_TIMEOUT",
                self.connection_timeout_secs,
            ),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT", self.idle_timeout_secs),
            ..self
        }
    }

    /// Create a default configuration for development
    pub fn development() -> Self {
        Self::with_url_defaults("postgres://postgres@localhost/fortune_dev".to_string())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}
