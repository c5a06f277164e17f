//! Backend REST API contract.
//!
//! The backend enforces the business rules; this crate only issues requests
//! and interprets responses. Implementations attach the caller's access
//! token themselves.

pub mod errors;
pub mod models;

use async_trait::async_trait;

use crate::{auth::LoginStatus, profile::Profile};

pub use errors::{ApiError, ApiResult, ErrorBody, classify, is_ban_message, is_deletion_message};
pub use models::{AccessDecision, ProfileUpdate};

/// Backend endpoints consumed by the engine and the gates
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// `POST /api/auth/check-login-status`
    async fn check_login_status(&self, user_id: &str, email: Option<&str>)
    -> ApiResult<LoginStatus>;

    /// `GET /api/auth/profile`
    async fn fetch_profile(&self) -> ApiResult<Profile>;

    /// `PUT /api/auth/profile`
    async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<Profile>;

    /// `POST /api/auth/logout`
    async fn logout(&self) -> ApiResult<()>;

    /// `POST /api/auth/delete-account`
    async fn delete_account(&self, user_id: Option<&str>) -> ApiResult<()>;

    /// `GET /api/access-control/check-full-access`
    async fn check_full_access(&self) -> ApiResult<AccessDecision>;

    /// `GET /api/access-control/check-access`
    async fn check_access(&self) -> ApiResult<Profile>;
}
