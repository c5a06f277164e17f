//! Authentication error types.

use thiserror::Error;

use crate::{api::ApiError, store::StoreError};

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// OAuth provider name not recognised
    #[error("Unsupported login provider: {0}")]
    UnsupportedProvider(String),

    /// No provider session to act on
    #[error("No active session")]
    NoSession,

    /// Refresh token rejected by the provider
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Provider answered 403 (e.g. signing out a user that was just deleted)
    #[error("Provider refused the request")]
    Forbidden,

    /// Any other provider-side failure
    #[error("Auth provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// Provider unreachable
    #[error("Auth provider unreachable: {0}")]
    Transport(String),

    /// Backend API failure
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Account operation needs a user id and none could be resolved
    #[error("No user id available for this operation")]
    MissingUserId,

    /// Session engine task has stopped
    #[error("Session engine is not running")]
    EngineClosed,
}

impl AuthError {
    /// Whether retrying later might succeed
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Transport(_) => true,
            AuthError::Provider { status, .. } => *status >= 500,
            AuthError::Api(api) => api.is_transport(),
            _ => false,
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
