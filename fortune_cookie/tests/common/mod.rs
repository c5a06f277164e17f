//! In-memory fakes shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use fortune_cookie::{
    api::{AccessDecision, ApiError, ApiResult, BackendApi, ProfileUpdate},
    auth::{AuthError, AuthEvent, AuthEventKind, AuthResult, LoginStatus, Provider, Session, SessionStore, SessionUser},
    db::{ProfileStore, RepositoryResult},
    navigation::Navigator,
    profile::{Profile, ProfileStatus},
};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::sync::broadcast;

// ============================================================================
// Builders
// ============================================================================

pub fn session(id: &str, email: &str) -> Session {
    Session {
        user: SessionUser {
            id: id.to_string(),
            email: Some(email.to_string()),
            nickname: Some("쿠키".to_string()),
        },
        access_token: format!("access-{id}"),
        refresh_token: format!("refresh-{id}"),
        expires_at: None,
    }
}

pub fn profile(id: &str, email: &str, school: Option<&str>) -> Profile {
    Profile {
        id: id.to_string(),
        email: Some(email.to_string()),
        nickname: Some("쿠키".to_string()),
        status: ProfileStatus::Active,
        school: school.map(str::to_string),
        is_admin: false,
        created_at: None,
    }
}

/// Poll `condition` until it holds, failing after two seconds
pub async fn eventually<F>(what: &str, condition: F)
where
    F: Fn() -> bool,
{
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {what}");
}

// ============================================================================
// Backend
// ============================================================================

pub struct FakeBackend {
    pub login_status: Mutex<ApiResult<LoginStatus>>,
    pub profile: Mutex<ApiResult<Profile>>,
    pub profile_delay: Mutex<Duration>,
    pub full_access: Mutex<ApiResult<AccessDecision>>,
    pub full_access_delay: Mutex<Duration>,
    pub admin_check: Mutex<ApiResult<Profile>>,
    pub delete_result: Mutex<ApiResult<()>>,

    pub login_status_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub full_access_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub deleted_ids: Mutex<Vec<Option<String>>>,
    pub updates: Mutex<Vec<ProfileUpdate>>,
}

impl FakeBackend {
    /// Clear login, profile with a school, full access
    pub fn new(profile: Profile) -> Self {
        Self {
            login_status: Mutex::new(Ok(LoginStatus {
                is_restricted: Some(false),
                status: Some("active".to_string()),
            })),
            admin_check: Mutex::new(Ok(profile.clone())),
            profile: Mutex::new(Ok(profile)),
            profile_delay: Mutex::new(Duration::ZERO),
            full_access: Mutex::new(Ok(AccessDecision {
                can_access: true,
                can_use: true,
                reason: None,
                next_available_at: None,
            })),
            full_access_delay: Mutex::new(Duration::ZERO),
            delete_result: Mutex::new(Ok(())),
            login_status_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
            full_access_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            deleted_ids: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn set_login_status(&self, status: ApiResult<LoginStatus>) {
        *self.login_status.lock().unwrap() = status;
    }

    pub fn set_profile(&self, profile: ApiResult<Profile>) {
        *self.profile.lock().unwrap() = profile;
    }

    pub fn set_profile_delay(&self, delay: Duration) {
        *self.profile_delay.lock().unwrap() = delay;
    }

    pub fn set_full_access(&self, decision: ApiResult<AccessDecision>) {
        *self.full_access.lock().unwrap() = decision;
    }

    pub fn set_full_access_delay(&self, delay: Duration) {
        *self.full_access_delay.lock().unwrap() = delay;
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn check_login_status(&self, _user_id: &str, _email: Option<&str>) -> ApiResult<LoginStatus> {
        self.login_status_calls.fetch_add(1, Ordering::SeqCst);
        self.login_status.lock().unwrap().clone()
    }

    async fn fetch_profile(&self) -> ApiResult<Profile> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.profile_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.profile.lock().unwrap().clone()
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<Profile> {
        self.updates.lock().unwrap().push(update.clone());
        let mut profile = self.profile.lock().unwrap().clone()?;
        profile.school = update.school.clone();
        Ok(profile)
    }

    async fn logout(&self) -> ApiResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_account(&self, user_id: Option<&str>) -> ApiResult<()> {
        self.deleted_ids
            .lock()
            .unwrap()
            .push(user_id.map(str::to_string));
        self.delete_result.lock().unwrap().clone()
    }

    async fn check_full_access(&self) -> ApiResult<AccessDecision> {
        self.full_access_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.full_access_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.full_access.lock().unwrap().clone()
    }

    async fn check_access(&self) -> ApiResult<Profile> {
        self.admin_check.lock().unwrap().clone()
    }
}

pub fn transport_error() -> ApiError {
    ApiError::Transport("connection refused".to_string())
}

// ============================================================================
// Session store
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshBehaviour {
    Succeed,
    Transient,
    Reject,
}

pub struct FakeSessionStore {
    session: Mutex<Option<Session>>,
    exchange_session: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    refresh: Mutex<RefreshBehaviour>,
    pub forbid_sign_out: AtomicBool,
    pub refresh_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
    pub exchange_calls: AtomicUsize,
}

impl FakeSessionStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            session: Mutex::new(None),
            exchange_session: Mutex::new(None),
            events,
            refresh: Mutex::new(RefreshBehaviour::Succeed),
            forbid_sign_out: AtomicBool::new(false),
            refresh_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
            exchange_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_session(session: Session) -> Self {
        let store = Self::new();
        *store.session.lock().unwrap() = Some(session);
        store
    }

    /// Session handed out by the next code exchange
    pub fn prepare_exchange(&self, session: Session) {
        *self.exchange_session.lock().unwrap() = Some(session);
    }

    pub fn set_refresh(&self, behaviour: RefreshBehaviour) {
        *self.refresh.lock().unwrap() = behaviour;
    }

    /// Provider-side sign-in
    pub fn sign_in(&self, session: Session) {
        *self.session.lock().unwrap() = Some(session.clone());
        let _ = self.events.send(AuthEvent::signed_in(session));
    }

    /// Provider-side SIGNED_OUT without clearing anything
    pub fn emit_signed_out(&self) {
        let _ = self.events.send(AuthEvent::signed_out());
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for FakeSessionStore {
    async fn current_session(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_oauth(&self, provider: Provider) -> AuthResult<String> {
        Ok(format!("https://auth.test/authorize?provider={provider}"))
    }

    async fn exchange_code(&self, _code: &str) -> AuthResult<Session> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        let session = self
            .exchange_session
            .lock()
            .unwrap()
            .clone()
            .ok_or(AuthError::Provider {
                status: 400,
                message: "invalid grant".to_string(),
            })?;
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(session)
    }

    async fn refresh_session(&self) -> AuthResult<Session> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let behaviour = *self.refresh.lock().unwrap();
        match behaviour {
            RefreshBehaviour::Succeed => {
                let session = self.session.lock().unwrap().clone().ok_or(AuthError::NoSession)?;
                let _ = self.events.send(AuthEvent::new(
                    AuthEventKind::TokenRefreshed,
                    Some(session.clone()),
                ));
                Ok(session)
            }
            RefreshBehaviour::Transient => Err(AuthError::Transport("timeout".to_string())),
            RefreshBehaviour::Reject => Err(AuthError::InvalidRefreshToken),
        }
    }

    async fn sign_out(&self) -> AuthResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        *self.session.lock().unwrap() = None;
        let _ = self.events.send(AuthEvent::signed_out());
        if self.forbid_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::Forbidden);
        }
        Ok(())
    }
}

// ============================================================================
// Profile store
// ============================================================================

#[derive(Default)]
pub struct FakeProfileStore {
    pub profile: Mutex<Option<Profile>>,
    pub exists: AtomicBool,
    pub exists_delay: Mutex<Duration>,
    pub find_calls: AtomicUsize,
    pub insert_calls: AtomicUsize,
    pub touch_calls: AtomicUsize,
}

impl FakeProfileStore {
    pub fn upserts(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst) + self.touch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for FakeProfileStore {
    async fn find_profile(&self, _user_id: &str) -> RepositoryResult<Option<Profile>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.profile.lock().unwrap().clone())
    }

    async fn user_exists(&self, _user_id: &str) -> RepositoryResult<bool> {
        let delay = *self.exists_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(self.exists.load(Ordering::SeqCst))
    }

    async fn insert_user(&self, _user: &SessionUser) -> RepositoryResult<()> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.exists.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn touch_last_login(&self, _user_id: &str) -> RepositoryResult<()> {
        self.touch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Navigator
// ============================================================================

pub struct RecordingNavigator {
    path: Mutex<String>,
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn at(path: &str) -> Self {
        Self {
            path: Mutex::new(path.to_string()),
            visits: Mutex::new(Vec::new()),
        }
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.path.lock().unwrap().clone()
    }

    fn navigate(&self, path: &str) {
        *self.path.lock().unwrap() = path.to_string();
        self.visits.lock().unwrap().push(path.to_string());
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
