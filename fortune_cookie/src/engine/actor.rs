//! Session actor: owns [`SessionState`] and performs its effects.
//!
//! Every state change happens on this task. Background steps (restriction
//! check, profile refresh, upsert, refresh retries, sign-out) run as spawned
//! tasks and report back through the inbox, so guard checks and transitions
//! are never interleaved.

use std::sync::Arc;

use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc, watch,
};

use super::{
    context::EngineContext,
    messages::EngineMessage,
    state::{
        AuthSnapshot, CachedHint, Effect, Input, ProfileOutcome, RefreshOutcome, SessionState,
    },
};
use crate::{
    api::ApiError,
    auth::{AuthEvent, AuthEventKind, RestrictionVerdict, SessionUser},
    navigation,
    store::{self, Flag, keys},
    timeouts::{TimeoutError, with_timeout},
};

/// Session actor driving the reconciliation engine
pub struct SessionActor {
    /// Reconciliation state
    state: SessionState,

    /// Message inbox
    inbox: mpsc::Receiver<EngineMessage>,

    /// Back-channel for spawned steps; weak so dropped handles stop the loop
    results: mpsc::WeakSender<EngineMessage>,

    /// Session store change notifications
    events: broadcast::Receiver<AuthEvent>,

    /// Published snapshot
    snapshot: watch::Sender<AuthSnapshot>,

    /// Collaborators shared with the handle
    ctx: Arc<EngineContext>,
}

impl SessionActor {
    pub(crate) fn new(
        ctx: Arc<EngineContext>,
        inbox: mpsc::Receiver<EngineMessage>,
        results: mpsc::WeakSender<EngineMessage>,
        snapshot: watch::Sender<AuthSnapshot>,
    ) -> Self {
        // Subscribe before the task starts so no event emitted after
        // construction can be missed.
        let events = ctx.sessions.subscribe();
        Self {
            state: SessionState::new(ctx.config.signout_refresh_attempts),
            inbox,
            results,
            events,
            snapshot,
            ctx,
        }
    }

    /// Run the session actor event loop
    ///
    /// Starts by treating the store's current session as `INITIAL_SESSION`,
    /// then serves the inbox and the store subscription until every handle
    /// has been dropped.
    pub async fn run(mut self) {
        log::info!("Session engine starting");

        let initial = self.ctx.sessions.current_session().await;
        self.handle_event(AuthEvent::new(AuthEventKind::InitialSession, initial));

        let mut events_open = true;
        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    match message {
                        Some(message) => self.handle_message(message),
                        None => break,
                    }
                }

                event = self.events.recv(), if events_open => {
                    match event {
                        Ok(event) => self.handle_event(event),
                        Err(RecvError::Lagged(skipped)) => {
                            log::warn!("Session engine lagged, {} auth events skipped", skipped);
                        }
                        Err(RecvError::Closed) => {
                            log::warn!("Session store subscription closed");
                            events_open = false;
                        }
                    }
                }
            }
        }

        log::info!("Session engine stopped");
    }

    fn handle_message(&mut self, message: EngineMessage) {
        match message {
            EngineMessage::Event(event) => self.handle_event(event),
            EngineMessage::Apply(input) => self.apply(input),
            EngineMessage::ApplyAndAck { input, response } => {
                self.apply(input);
                let _ = response.send(());
            }
        }
    }

    fn handle_event(&mut self, event: AuthEvent) {
        log::debug!("Auth event {:?}", event.kind);
        if let Some(input) = self.input_for(event) {
            self.apply(input);
        }
    }

    /// Enrich a raw auth event with the local state the rules need
    fn input_for(&self, event: AuthEvent) -> Option<Input> {
        let local = self.ctx.store.as_ref();
        match (event.kind, event.session) {
            (AuthEventKind::SignedIn | AuthEventKind::InitialSession, Some(session)) => {
                let cached = self
                    .ctx
                    .cache
                    .load(session.user_id(), session.email())
                    .map(|entry| CachedHint {
                        fresh: self.ctx.cache.is_fresh(&entry),
                        profile: entry.profile,
                    });
                let restriction_checked = store::login_checked_for(local, session.user_id());
                Some(Input::SessionStarted {
                    session,
                    cached,
                    restriction_checked,
                })
            }
            (AuthEventKind::InitialSession, None) => Some(Input::NoSession),
            (AuthEventKind::SignedOut, _) => Some(Input::SignedOut {
                redirect_in_flight: store::flag_is_set(local, Flag::CooldownRedirect)
                    || store::flag_is_set(local, Flag::AccountDeletion),
            }),
            _ => None,
        }
    }

    fn apply(&mut self, input: Input) {
        let state = std::mem::take(&mut self.state);
        let (next, effects) = state.transition(input);
        self.state = next;

        for effect in effects {
            self.execute(effect);
        }

        let snapshot = self.state.snapshot();
        self.snapshot.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    fn execute(&self, effect: Effect) {
        let local = self.ctx.store.as_ref();
        match effect {
            Effect::SetFlag(flag) => {
                if let Err(e) = local.set(flag.key(), "true") {
                    log::warn!("Failed to set {}: {}", flag.key(), e);
                }
            }
            Effect::ClearFlag(flag) => {
                if let Err(e) = local.remove(flag.key()) {
                    log::warn!("Failed to clear {}: {}", flag.key(), e);
                }
            }
            Effect::WriteCache(profile) => {
                if let Err(e) = self.ctx.cache.save(&profile) {
                    log::warn!("Failed to cache profile for {}: {}", profile.id, e);
                }
            }
            Effect::ClearLocalData => clear_local_data(&self.ctx),
            Effect::Redirect(destination) => {
                navigation::redirect(self.ctx.navigator.as_ref(), &self.ctx.routes, destination);
            }
            Effect::CheckRestriction { user_id, email } => {
                let ctx = Arc::clone(&self.ctx);
                self.spawn_step(async move {
                    let verdict = check_restriction(&ctx, &user_id, email.as_deref()).await;
                    Some(Input::RestrictionChecked { user_id, verdict })
                });
            }
            Effect::RefreshProfile { user_id } => {
                let ctx = Arc::clone(&self.ctx);
                self.spawn_step(async move {
                    let outcome = resolve_profile(&ctx, &user_id).await;
                    Some(Input::ProfileResolved { user_id, outcome })
                });
            }
            Effect::UpsertUser { user } => {
                let ctx = Arc::clone(&self.ctx);
                tokio::spawn(async move { ensure_user_record(&ctx, &user).await });
            }
            Effect::ScheduleRefresh { attempt } => {
                let ctx = Arc::clone(&self.ctx);
                self.spawn_step(async move {
                    tokio::time::sleep(ctx.config.refresh_delay(attempt)).await;
                    let outcome = match ctx.sessions.refresh_session().await {
                        Ok(_) => RefreshOutcome::Refreshed,
                        Err(e) if e.is_transient() => {
                            log::warn!("Session refresh attempt {} failed: {}", attempt, e);
                            RefreshOutcome::Transient
                        }
                        Err(e) => {
                            log::info!("Session refresh rejected: {}", e);
                            RefreshOutcome::Failed
                        }
                    };
                    Some(Input::RefreshFinished { attempt, outcome })
                });
            }
            Effect::SignOut { backend_logout } => {
                let ctx = Arc::clone(&self.ctx);
                tokio::spawn(async move {
                    if backend_logout && let Err(e) = ctx.api.logout().await {
                        log::warn!("Backend logout failed: {}", e);
                    }
                    if let Err(e) = ctx.sessions.sign_out().await {
                        log::warn!("Provider sign-out failed: {}", e);
                    }
                });
            }
        }
    }

    /// Spawn a background step whose result is fed back into the engine
    fn spawn_step<F>(&self, step: F)
    where
        F: Future<Output = Option<Input>> + Send + 'static,
    {
        let results = self.results.clone();
        tokio::spawn(async move {
            let Some(input) = step.await else {
                return;
            };
            match results.upgrade() {
                Some(sender) => {
                    if sender.send(EngineMessage::Apply(input)).await.is_err() {
                        log::debug!("Session engine gone, dropping step result");
                    }
                }
                None => log::debug!("Session engine gone, dropping step result"),
            }
        });
    }
}

/// Step 1: `check-login-status`. Only policy answers block the login.
async fn check_restriction(
    ctx: &EngineContext,
    user_id: &str,
    email: Option<&str>,
) -> RestrictionVerdict {
    match ctx.api.check_login_status(user_id, email).await {
        Ok(status) => RestrictionVerdict::from(&status),
        Err(e) => {
            let verdict = RestrictionVerdict::from(&e);
            if verdict == RestrictionVerdict::Unavailable {
                log::warn!("Login status check failed for {}: {}, continuing", user_id, e);
            } else {
                log::info!("Login status check for {} rejected: {}", user_id, e);
            }
            verdict
        }
    }
}

/// Step 3: backend profile, then the direct store, each bounded
pub(crate) async fn resolve_profile(ctx: &EngineContext, user_id: &str) -> ProfileOutcome {
    match with_timeout(ctx.config.profile_fetch_timeout, ctx.api.fetch_profile()).await {
        Ok(profile) if profile.id == user_id => return ProfileOutcome::Confirmed(profile),
        Ok(profile) => {
            log::warn!(
                "Profile endpoint answered for {} while resolving {}",
                profile.id,
                user_id
            );
            return ProfileOutcome::Unavailable;
        }
        Err(TimeoutError::Inner(ApiError::Banned { .. })) => return ProfileOutcome::Banned,
        Err(TimeoutError::Inner(ApiError::Deleted { .. })) => return ProfileOutcome::Deleted,
        Err(TimeoutError::Inner(ApiError::Unauthorized { .. } | ApiError::Restricted { .. })) => {
            return ProfileOutcome::Unauthorized;
        }
        Err(e) => log::warn!("Profile fetch failed ({}), trying direct store", e),
    }

    let Some(profiles) = ctx.profiles.as_ref() else {
        return ProfileOutcome::Unavailable;
    };
    match with_timeout(ctx.config.profile_store_timeout, profiles.find_profile(user_id)).await {
        Ok(Some(profile)) => ProfileOutcome::Confirmed(profile),
        Ok(None) => {
            log::info!("No stored profile for {}", user_id);
            ProfileOutcome::Unavailable
        }
        Err(e) => {
            log::warn!("Direct profile read failed: {}", e);
            ProfileOutcome::Unavailable
        }
    }
}

/// Step 4: make sure a backing user record exists and touch `last_login_at`
pub(crate) async fn ensure_user_record(ctx: &EngineContext, user: &SessionUser) {
    let Some(profiles) = ctx.profiles.as_ref() else {
        return;
    };

    let exists = match with_timeout(ctx.config.upsert_check_timeout, profiles.user_exists(&user.id))
        .await
    {
        Ok(exists) => exists,
        Err(e) => {
            log::debug!("Skipping user upsert until next load: {}", e);
            return;
        }
    };

    let result = if exists {
        with_timeout(ctx.config.upsert_timeout, profiles.touch_last_login(&user.id)).await
    } else {
        with_timeout(ctx.config.upsert_timeout, profiles.insert_user(user)).await
    };

    match result {
        Ok(()) => log::debug!("User record for {} up to date (existed: {})", user.id, exists),
        Err(e) => log::warn!("User upsert for {} failed: {}", user.id, e),
    }
}

/// Remove every session-scoped key, the profile cache included
pub(crate) fn clear_local_data(ctx: &EngineContext) {
    let local = ctx.store.as_ref();
    let mut removed = 0;
    for key in local.keys().into_iter().filter(|k| keys::is_session_scoped(k)) {
        match local.remove(&key) {
            Ok(()) => removed += 1,
            Err(e) => log::warn!("Failed to remove '{}': {}", key, e),
        }
    }
    log::debug!("Cleared {} session-scoped keys", removed);
}
