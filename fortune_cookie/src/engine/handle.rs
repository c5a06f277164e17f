//! Cloneable front door to the session engine.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::{mpsc, oneshot, watch};

use super::{
    context::EngineContext,
    messages::EngineMessage,
    state::{AuthSnapshot, Input},
};
use crate::{
    api::ProfileUpdate,
    auth::{AuthError, AuthEvent, AuthResult, Provider, RestrictionVerdict, UserId},
    navigation::{self, Destination},
    profile::Profile,
    store::{self, Flag, keys},
};

/// What the OAuth callback did with an authorization code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Session established and handed to the engine
    SignedIn,
    /// This code was already exchanged (double render, reload)
    AlreadyProcessed,
    /// Re-signup cooldown; user sent to the cooldown page
    Restricted,
    /// Banned; user sent to the banned page
    Banned,
}

/// `{id, email}` identity written by older builds
#[derive(Debug, Deserialize)]
struct LegacyIdentity {
    id: UserId,
}

/// Session engine handle for reading state and issuing operations
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<EngineMessage>,
    snapshot: watch::Receiver<AuthSnapshot>,
    ctx: Arc<EngineContext>,
}

impl SessionHandle {
    pub(crate) fn new(
        sender: mpsc::Sender<EngineMessage>,
        snapshot: watch::Receiver<AuthSnapshot>,
        ctx: Arc<EngineContext>,
    ) -> Self {
        Self {
            sender,
            snapshot,
            ctx,
        }
    }

    /// Current `{user, is_logged_in, is_loading}`
    pub fn snapshot(&self) -> AuthSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified on every snapshot change
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.snapshot.clone()
    }

    /// Wait until the snapshot satisfies `predicate`
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EngineClosed`] if the engine stops first
    pub async fn wait_for<P>(&self, mut predicate: P) -> AuthResult<AuthSnapshot>
    where
        P: FnMut(&AuthSnapshot) -> bool,
    {
        let mut receiver = self.snapshot.clone();
        let snapshot = receiver
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| AuthError::EngineClosed)?;
        Ok(snapshot.clone())
    }

    /// Wait for the initial session to be resolved
    pub async fn wait_until_loaded(&self) -> AuthResult<AuthSnapshot> {
        self.wait_for(|s| !s.is_loading).await
    }

    /// Begin an OAuth login
    ///
    /// # Arguments
    ///
    /// * `provider` - Provider name, `"google"` or `"kakao"`
    ///
    /// # Returns
    ///
    /// * `AuthResult<String>` - Authorization URL the user must visit
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnsupportedProvider`] for any other name, or the
    /// session store's error if the flow could not start
    pub async fn login(&self, provider: &str) -> AuthResult<String> {
        let provider: Provider = provider.parse()?;
        let url = self.ctx.sessions.sign_in_with_oauth(provider).await?;
        log::info!("OAuth login started with {}", provider);
        Ok(url)
    }

    /// Finish an OAuth redirect: exchange the code and run the restriction
    /// check before the engine ever sees the session.
    ///
    /// A code already exchanged on this device is ignored.
    ///
    /// # Errors
    ///
    /// Returns the session store's error when the exchange fails
    pub async fn complete_oauth_callback(&self, code: &str) -> AuthResult<CallbackOutcome> {
        let local = self.ctx.store.as_ref();
        if local.get(keys::OAUTH_PROCESSED).as_deref() == Some(code) {
            log::debug!("Authorization code already processed");
            return Ok(CallbackOutcome::AlreadyProcessed);
        }
        local.set(keys::OAUTH_PROCESSED, code)?;

        let session = match self.ctx.sessions.exchange_code(code).await {
            Ok(session) => session,
            Err(e) => {
                log::warn!("Authorization code exchange failed: {}", e);
                if let Err(e) = local.remove(keys::OAUTH_PROCESSED) {
                    log::warn!("Failed to reset callback marker: {}", e);
                }
                return Err(e);
            }
        };

        let verdict = match self
            .ctx
            .api
            .check_login_status(session.user_id(), session.email())
            .await
        {
            Ok(status) => {
                if let Err(e) = store::set_json(local, keys::AUTH_CHECK_RESULT, &status) {
                    log::warn!("Failed to record login status: {}", e);
                }
                RestrictionVerdict::from(&status)
            }
            Err(e) => {
                log::warn!("Callback login status check failed: {}", e);
                RestrictionVerdict::from(&e)
            }
        };

        match verdict {
            RestrictionVerdict::Clear => {
                store::mark_login_checked(local, session.user_id())?;
                self.send(EngineMessage::Event(AuthEvent::signed_in(session)))
                    .await?;
                Ok(CallbackOutcome::SignedIn)
            }
            RestrictionVerdict::Unavailable => {
                // No marker: the engine runs its own check
                self.send(EngineMessage::Event(AuthEvent::signed_in(session)))
                    .await?;
                Ok(CallbackOutcome::SignedIn)
            }
            RestrictionVerdict::Restricted => {
                local.set(Flag::CooldownRedirect.key(), "true")?;
                self.sign_out_quietly().await;
                self.redirect(Destination::Cooldown);
                Ok(CallbackOutcome::Restricted)
            }
            RestrictionVerdict::Banned => {
                self.sign_out_quietly().await;
                self.redirect(Destination::Banned);
                Ok(CallbackOutcome::Banned)
            }
        }
    }

    /// Log out: local state is cleared and the user redirected before this
    /// returns; backend logout and provider sign-out finish in the background.
    pub async fn logout(&self) -> AuthResult<()> {
        self.apply(Input::LogoutRequested).await
    }

    /// Delete the account of the current user
    ///
    /// The deletion guard stays raised on success so the provider's
    /// SIGNED_OUT cannot redirect over the entry page; the next sign-in
    /// lowers it.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingUserId`] if no user id can be resolved
    /// - The backend error if deletion fails; the guard is lowered again
    pub async fn delete_account(&self) -> AuthResult<()> {
        let user_id = self.resolve_user_id().ok_or(AuthError::MissingUserId)?;
        let local = self.ctx.store.as_ref();
        local.set(Flag::AccountDeletion.key(), "true")?;

        if let Err(e) = self.ctx.api.delete_account(Some(&user_id)).await {
            log::error!("Account deletion for {} failed: {}", user_id, e);
            if let Err(e) = local.remove(Flag::AccountDeletion.key()) {
                log::warn!("Failed to lower deletion guard: {}", e);
            }
            return Err(e.into());
        }

        match self.ctx.sessions.sign_out().await {
            Ok(()) => {}
            Err(AuthError::Forbidden) => {
                log::debug!("Provider refused sign-out of deleted user, ignoring");
            }
            Err(e) => log::warn!("Provider sign-out after deletion failed: {}", e),
        }

        log::info!("Account {} deleted", user_id);
        self.apply(Input::DeletionCompleted).await
    }

    /// Set the user's school and refresh the engine's view
    ///
    /// # Errors
    ///
    /// Returns the backend error; the engine state is left unchanged
    pub async fn update_school(&self, school: &str) -> AuthResult<Profile> {
        let update = ProfileUpdate {
            school: Some(school.trim().to_string()),
        };
        let profile = self.ctx.api.update_profile(&update).await?;
        self.apply(Input::ProfileUpdated(profile.clone())).await?;
        Ok(profile)
    }

    /// User id from the engine, else the legacy stored identity
    fn resolve_user_id(&self) -> Option<UserId> {
        if let Some(user) = self.snapshot.borrow().user.as_ref() {
            return Some(user.id.clone());
        }
        store::get_json::<LegacyIdentity>(self.ctx.store.as_ref(), keys::AUTH_BACKEND_USER)
            .map(|legacy| legacy.id)
            .filter(|id| !id.is_empty())
    }

    async fn sign_out_quietly(&self) {
        if let Err(e) = self.ctx.sessions.sign_out().await {
            log::warn!("Provider sign-out failed: {}", e);
        }
    }

    fn redirect(&self, destination: Destination) {
        navigation::redirect(self.ctx.navigator.as_ref(), &self.ctx.routes, destination);
    }

    async fn apply(&self, input: Input) -> AuthResult<()> {
        let (response, done) = oneshot::channel();
        self.send(EngineMessage::ApplyAndAck { input, response })
            .await?;
        done.await.map_err(|_| AuthError::EngineClosed)
    }

    async fn send(&self, message: EngineMessage) -> AuthResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| AuthError::EngineClosed)
    }
}
