//! Daily access gate in front of the "start" action.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use super::{modal::DenialModal, school::extract_school_name};
use crate::{
    api::{AccessDecision, ApiError, BackendApi, is_ban_message},
    auth::SessionStore,
    config::RouteConfig,
    navigation::{self, Destination, Navigator},
};

/// Callback receiving the modal for a denied check
pub type DenialHandler = Box<dyn Fn(DenialModal) + Send + Sync>;

/// Result of one gate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessVerdict {
    Allowed,
    /// Another check is in flight on this gate
    Busy,
    LoginRequired,
    /// Re-signup cooldown; redirected
    Restricted,
    /// Session rejected; redirected to entry
    SignedOut,
    /// Redirected to the banned page
    Banned,
    PeriodUnset { school: String },
    DailyLimit { next_available_at: Option<String> },
    /// Server or transport failure; a modal was shown
    Failed,
}

impl AccessVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Resets the in-flight flag however the check ends
struct CheckingGuard<'a>(&'a AtomicBool);

impl Drop for CheckingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Access control gate; one per screen that offers the action
pub struct AccessGate {
    api: Arc<dyn BackendApi>,
    sessions: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    routes: RouteConfig,
    on_denied: DenialHandler,
    is_checking: AtomicBool,
}

impl AccessGate {
    pub fn new<F>(
        api: Arc<dyn BackendApi>,
        sessions: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        on_denied: F,
    ) -> Self
    where
        F: Fn(DenialModal) + Send + Sync + 'static,
    {
        Self {
            api,
            sessions,
            navigator,
            routes: RouteConfig::default(),
            on_denied: Box::new(on_denied),
            is_checking: AtomicBool::new(false),
        }
    }

    pub fn with_routes(mut self, routes: RouteConfig) -> Self {
        self.routes = routes;
        self
    }

    /// Whether a check is currently in flight
    pub fn is_checking(&self) -> bool {
        self.is_checking.load(Ordering::Acquire)
    }

    /// May the user start right now?
    ///
    /// Denials either redirect or hand exactly one modal to the denial
    /// handler; a call made while another is in flight returns `false`
    /// without contacting the backend.
    pub async fn check_access_permission(&self, user_id: Option<&str>) -> bool {
        self.check(user_id).await.is_allowed()
    }

    /// Run the gate and report which branch was taken
    pub async fn check(&self, user_id: Option<&str>) -> AccessVerdict {
        if self
            .is_checking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("Access check already in flight");
            return AccessVerdict::Busy;
        }
        let _guard = CheckingGuard(&self.is_checking);

        let Some(user_id) = user_id.filter(|id| !id.is_empty()) else {
            return self.deny(DenialModal::LoginRequired, AccessVerdict::LoginRequired);
        };

        if let Err(e) = self.sessions.refresh_session().await {
            log::warn!("Session refresh before access check failed: {}", e);
        }

        let verdict = match self.api.check_full_access().await {
            Ok(decision) => self.evaluate(decision),
            Err(e) => self.on_error(e).await,
        };
        log::info!("Access check for {}: {:?}", user_id, verdict);
        verdict
    }

    fn evaluate(&self, decision: AccessDecision) -> AccessVerdict {
        if !decision.can_access {
            let reason = decision.reason.as_deref();
            if reason.is_some_and(is_ban_message) {
                self.redirect(Destination::Banned);
                return AccessVerdict::Banned;
            }
            let school = extract_school_name(reason);
            return self.deny(
                DenialModal::PeriodNotConfigured {
                    school: school.clone(),
                },
                AccessVerdict::PeriodUnset { school },
            );
        }

        if !decision.can_use {
            let next_available_at = decision.next_available_at;
            return self.deny(
                DenialModal::DailyLimit {
                    next_available_at: next_available_at.clone(),
                },
                AccessVerdict::DailyLimit { next_available_at },
            );
        }

        AccessVerdict::Allowed
    }

    /// Only a 401 ends the session; any other status gets the reload modal
    async fn on_error(&self, error: ApiError) -> AccessVerdict {
        match error {
            ApiError::Restricted { status: 401 } => {
                self.sign_out().await;
                self.redirect(Destination::Cooldown);
                AccessVerdict::Restricted
            }
            ApiError::Banned { status: 401, .. } => {
                self.sign_out().await;
                self.redirect(Destination::Banned);
                AccessVerdict::Banned
            }
            ApiError::Unauthorized { status: 401, .. } | ApiError::Deleted { status: 401, .. } => {
                self.sign_out().await;
                self.redirect(Destination::Entry);
                AccessVerdict::SignedOut
            }
            ApiError::Restricted { .. }
            | ApiError::Banned { .. }
            | ApiError::Deleted { .. }
            | ApiError::Unauthorized { .. }
            | ApiError::Http { .. } => {
                log::warn!("Access check rejected: {}", error);
                self.deny(DenialModal::ServerUnavailable, AccessVerdict::Failed)
            }
            ApiError::Transport(_) | ApiError::Timeout(_) => {
                log::warn!("Access check unreachable: {}", error);
                self.deny(DenialModal::ConnectionError, AccessVerdict::Failed)
            }
            ApiError::Decode(detail) => {
                log::error!("Access check response unreadable: {}", detail);
                self.deny(DenialModal::ClientError { detail }, AccessVerdict::Failed)
            }
        }
    }

    fn deny(&self, modal: DenialModal, verdict: AccessVerdict) -> AccessVerdict {
        (self.on_denied)(modal);
        verdict
    }

    fn redirect(&self, destination: Destination) {
        navigation::redirect(self.navigator.as_ref(), &self.routes, destination);
    }

    async fn sign_out(&self) {
        if let Err(e) = self.sessions.sign_out().await {
            log::warn!("Sign-out after access denial failed: {}", e);
        }
    }
}
