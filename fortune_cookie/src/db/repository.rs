//! Profile store trait and its PostgreSQL implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    auth::SessionUser,
    profile::{Profile, ProfileStatus},
};

/// Profile store errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// User id is not a UUID
    #[error("Invalid user id: {0}")]
    InvalidId(String),
}

/// Result type for profile store operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Direct access to the backing `users` table
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Read a profile by user id
    async fn find_profile(&self, user_id: &str) -> RepositoryResult<Option<Profile>>;

    /// Whether a backing record exists
    async fn user_exists(&self, user_id: &str) -> RepositoryResult<bool>;

    /// Create the backing record for a provider user; no-op if it exists
    async fn insert_user(&self, user: &SessionUser) -> RepositoryResult<()>;

    /// Update `last_login_at` to now
    async fn touch_last_login(&self, user_id: &str) -> RepositoryResult<()>;
}

/// Default PostgreSQL implementation of [`ProfileStore`]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_id(user_id: &str) -> RepositoryResult<Uuid> {
    Uuid::parse_str(user_id).map_err(|_| RepositoryError::InvalidId(user_id.to_string()))
}

fn row_to_profile(row: &PgRow) -> RepositoryResult<Profile> {
    let id: Uuid = row.try_get("id")?;
    let status: Option<String> = row.try_get("status")?;
    let status = status
        .as_deref()
        .map(|s| {
            s.parse::<ProfileStatus>().unwrap_or_else(|e| {
                log::warn!("User {}: {}, treating as active", id, e);
                ProfileStatus::Active
            })
        })
        .unwrap_or_default();

    Ok(Profile {
        id: id.to_string(),
        email: row.try_get("email")?,
        nickname: row.try_get("nickname")?,
        status,
        school: row.try_get("school")?,
        is_admin: row.try_get::<Option<bool>, _>("is_admin")?.unwrap_or(false),
        created_at: row.try_get::<Option<DateTime<Utc>>, _>("created_at")?,
    })
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find_profile(&self, user_id: &str) -> RepositoryResult<Option<Profile>> {
        let id = parse_id(user_id)?;
        let row = sqlx::query(
            r#"
            SELECT id, email, nickname, status, school, is_admin, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_profile).transpose()
    }

    async fn user_exists(&self, user_id: &str) -> RepositoryResult<bool> {
        let id = parse_id(user_id)?;
        let row = sqlx::query("SELECT 1 FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn insert_user(&self, user: &SessionUser) -> RepositoryResult<()> {
        let id = parse_id(&user.id)?;
        sqlx::query(
            r#"
            INSERT INTO users (id, email, nickname, status, school, is_admin, last_login_at)
            VALUES ($1, $2, $3, 'active', NULL, FALSE, NOW())
            ON CONFLICT (id) DO UPDATE SET last_login_at = NOW()
            "#,
        )
        .bind(id)
        .bind(&user.email)
        .bind(&user.nickname)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn touch_last_login(&self, user_id: &str) -> RepositoryResult<()> {
        let id = parse_id(user_id)?;
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
