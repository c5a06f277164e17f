//! Session store adapter contract.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{
    errors::AuthResult,
    models::{AuthEvent, Provider, Session},
};

/// Thin wrapper over the external auth provider.
///
/// Implementations own session persistence; the rest of the crate never
/// stores tokens itself.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Currently held session, if any
    async fn current_session(&self) -> Option<Session>;

    /// Change notifications emitted after subscribing
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    /// Begin an OAuth sign-in and return the URL the user must visit
    async fn sign_in_with_oauth(&self, provider: Provider) -> AuthResult<String>;

    /// Exchange an authorization code for a session.
    ///
    /// The session is persisted but subscribers are not notified; the callback
    /// flow announces the sign-in itself once its own checks are done.
    async fn exchange_code(&self, code: &str) -> AuthResult<Session>;

    /// Refresh the held session, notifying subscribers with `TOKEN_REFRESHED`
    async fn refresh_session(&self) -> AuthResult<Session>;

    /// Drop the held session locally, notify `SIGNED_OUT`, then revoke remotely
    async fn sign_out(&self) -> AuthResult<()>;
}
