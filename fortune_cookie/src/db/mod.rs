//! Direct profile store access over PostgreSQL.
//!
//! The engine falls back to reading the `users` table directly when the
//! backend profile endpoint is unavailable, and upserts the backing user
//! record on every fresh login.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod config;
pub mod repository;

pub use config::DatabaseConfig;
pub use repository::{PgProfileStore, ProfileStore, RepositoryError, RepositoryResult};

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// The pool connects lazily; the first query pays the connection cost.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fortune_cookie::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), sqlx::Error> {
    ///     let config = DatabaseConfig::development();
    ///     let db = Database::new(&config)?;
    ///     db.health_check().await?;
    ///     Ok(())
    /// }
    /// ```
    pub fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect_lazy(&config.database_url)?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check if the database connection is healthy
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
