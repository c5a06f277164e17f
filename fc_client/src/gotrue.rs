//! Supabase GoTrue session store adapter.
//!
//! Implements OAuth with PKCE, token refresh and logout against the GoTrue
//! REST API. The session and the pending PKCE verifier are persisted in the
//! local store so a later process can finish the callback.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use fortune_cookie::{
    auth::{
        AuthError, AuthEvent, AuthEventKind, AuthResult, Provider, Session, SessionStore,
        SessionUser,
    },
    store::{self, LocalStore},
};
use rand::Rng;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;

/// Local store key holding the persisted session
pub const SESSION_KEY: &str = "fc-auth-session";

/// Local store key holding the verifier of a started PKCE flow
pub const PKCE_VERIFIER_KEY: &str = "fc-auth-code-verifier";

const EVENT_CAPACITY: usize = 16;

/// GoTrue token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

/// Provider-specific profile fields; Kakao and Google fill different ones
#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));
        let metadata = self.user.user_metadata;

        Session {
            user: SessionUser {
                id: self.user.id,
                email: self.user.email,
                nickname: metadata.nickname.or(metadata.name).or(metadata.full_name),
            },
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

#[derive(Serialize)]
struct PkceGrant<'a> {
    auth_code: &'a str,
    code_verifier: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GoTrueErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl GoTrueErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

/// PKCE verifier: 48 random bytes, base64url encoded to 64 characters
pub fn pkce_verifier() -> String {
    let random_bytes: [u8; 48] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// S256 challenge for `verifier`
pub fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// GoTrue client connection settings
#[derive(Debug, Clone)]
pub struct GoTrueConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public anon key sent as `apikey`
    pub anon_key: String,
    /// Where the provider sends the user back with `?code=`
    pub redirect_url: String,
}

/// Session store backed by Supabase GoTrue
pub struct GoTrueClient {
    config: GoTrueConfig,
    client: reqwest::Client,
    local: Arc<dyn LocalStore>,
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl GoTrueClient {
    /// Create a client, restoring any session persisted in `local`
    pub fn new(config: GoTrueConfig, local: Arc<dyn LocalStore>) -> Self {
        let session = store::get_json::<Session>(local.as_ref(), SESSION_KEY);
        if let Some(session) = &session {
            log::debug!("Restored session for {}", session.user_id());
        }
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            config: GoTrueConfig {
                url: config.url.trim_end_matches('/').to_string(),
                ..config
            },
            client: reqwest::Client::new(),
            local,
            session: Mutex::new(session),
            events,
        }
    }

    fn held(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url, path)
    }

    fn store_session(&self, session: &Session) {
        *self.held() = Some(session.clone());
        if let Err(e) = store::set_json(self.local.as_ref(), SESSION_KEY, session) {
            log::warn!("Failed to persist session: {}", e);
        }
    }

    fn drop_session(&self) -> Option<Session> {
        let previous = self.held().take();
        if let Err(e) = self.local.remove(SESSION_KEY) {
            log::warn!("Failed to remove persisted session: {}", e);
        }
        previous
    }

    fn notify(&self, kind: AuthEventKind, session: Option<Session>) {
        // No subscribers is fine
        let _ = self.events.send(AuthEvent::new(kind, session));
    }

    async fn token_grant<B: Serialize>(&self, grant_type: &str, body: &B) -> AuthResult<Session> {
        let response = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.config.anon_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let token: TokenResponse = response.json().await.map_err(|e| AuthError::Provider {
            status: 200,
            message: format!("Failed to parse token response: {}", e),
        })?;
        Ok(token.into_session(Utc::now()))
    }
}

async fn provider_error(response: Response) -> AuthError {
    let status = response.status();
    if status == StatusCode::FORBIDDEN {
        return AuthError::Forbidden;
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GoTrueErrorBody>(&text)
        .ok()
        .and_then(GoTrueErrorBody::into_message)
        .unwrap_or(text);
    AuthError::Provider {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl SessionStore for GoTrueClient {
    async fn current_session(&self) -> Option<Session> {
        let session = self.held().clone()?;
        if !session.is_expired_at(Utc::now()) {
            return Some(session);
        }

        log::debug!("Held session expired, refreshing");
        match self.refresh_session().await {
            Ok(session) => Some(session),
            Err(e) if e.is_transient() => {
                log::warn!("Session refresh failed: {}", e);
                Some(session)
            }
            Err(e) => {
                log::info!("Expired session could not be refreshed: {}", e);
                self.drop_session();
                None
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_oauth(&self, provider: Provider) -> AuthResult<String> {
        let verifier = pkce_verifier();
        self.local.set(PKCE_VERIFIER_KEY, &verifier)?;

        let url = reqwest::Url::parse_with_params(
            &self.endpoint("authorize"),
            &[
                ("provider", provider.as_str()),
                ("redirect_to", self.config.redirect_url.as_str()),
                ("code_challenge", pkce_challenge(&verifier).as_str()),
                ("code_challenge_method", "s256"),
            ],
        )
        .map_err(|e| AuthError::Provider {
            status: 0,
            message: format!("Invalid auth URL: {}", e),
        })?;

        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> AuthResult<Session> {
        let verifier = self
            .local
            .get(PKCE_VERIFIER_KEY)
            .ok_or_else(|| AuthError::Provider {
                status: 400,
                message: "No pending sign-in on this device".to_string(),
            })?;

        let session = self
            .token_grant(
                "pkce",
                &PkceGrant {
                    auth_code: code,
                    code_verifier: &verifier,
                },
            )
            .await?;

        self.store_session(&session);
        if let Err(e) = self.local.remove(PKCE_VERIFIER_KEY) {
            log::warn!("Failed to remove PKCE verifier: {}", e);
        }
        log::info!("Authorization code exchanged for {}", session.user_id());
        Ok(session)
    }

    async fn refresh_session(&self) -> AuthResult<Session> {
        let refresh_token = self
            .held()
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or(AuthError::NoSession)?;

        let session = match self
            .token_grant(
                "refresh_token",
                &RefreshGrant {
                    refresh_token: &refresh_token,
                },
            )
            .await
        {
            Ok(session) => session,
            Err(AuthError::Provider { status, .. }) if status_rejects_refresh(status) => {
                return Err(AuthError::InvalidRefreshToken);
            }
            Err(e) => return Err(e),
        };

        self.store_session(&session);
        self.notify(AuthEventKind::TokenRefreshed, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        let previous = self.drop_session();
        self.notify(AuthEventKind::SignedOut, None);

        let Some(previous) = previous else {
            return Ok(());
        };

        let response = self
            .client
            .post(self.endpoint("logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&previous.access_token)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // Token already revoked or expired
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(provider_error(response).await),
        }
    }
}

fn status_rejects_refresh(status: u16) -> bool {
    matches!(status, 400 | 401)
}
