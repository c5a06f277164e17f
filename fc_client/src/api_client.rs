//! HTTP client for the fortune cookie backend.

use std::{sync::Arc, time::Duration, time::Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use fortune_cookie::{
    SessionStore,
    api::{
        AccessDecision, ApiError, ApiResult, BackendApi, ErrorBody, ProfileUpdate, classify,
        models::{DeleteAccountRequest, LoginStatusRequest, UsageReport, UserEnvelope},
    },
    auth::LoginStatus,
    profile::Profile,
    usage::UsageSink,
};
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::logging::log_api_call;

/// `PUT /api/auth/profile` answers either `{user}` or the bare user
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProfileBody {
    Envelope(UserEnvelope),
    Bare(Profile),
}

impl From<ProfileBody> for Profile {
    fn from(body: ProfileBody) -> Self {
        match body {
            ProfileBody::Envelope(envelope) => envelope.user,
            ProfileBody::Bare(profile) => profile,
        }
    }
}

/// API client for the backend REST endpoints
///
/// Every request carries the current provider access token, if any.
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    sessions: Arc<dyn SessionStore>,
    timeout: Duration,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    ///
    /// * `base_url` - Backend origin, e.g. `https://fortune.example.com`
    /// * `sessions` - Source of the bearer token
    /// * `timeout` - Per-request bound
    pub fn new(
        base_url: impl Into<String>,
        sessions: Arc<dyn SessionStore>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            sessions,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match self.sessions.current_session().await {
            Some(session) => builder.bearer_auth(session.access_token),
            None => builder,
        }
    }

    /// Send a request and turn non-2xx answers into [`ApiError`]s
    async fn send(&self, method: Method, path: &str, builder: RequestBuilder) -> ApiResult<Response> {
        let started = Instant::now();
        let result = builder.send().await;
        let elapsed = started.elapsed().as_millis() as u64;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                log_api_call(method.as_str(), path, None, elapsed);
                return Err(self.transport_error(e));
            }
        };

        let status = response.status();
        log_api_call(method.as_str(), path, Some(status.as_u16()), elapsed);
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
        Err(classify(status.as_u16(), &ErrorBody::parse(&error_text)))
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, path: &str) -> ApiResult<T> {
        let builder = self.request(method.clone(), path).await;
        let response = self.send(method, path, builder).await?;
        decode(response).await
    }

    async fn call_with<B, T>(&self, method: Method, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method.clone(), path).await.json(body);
        let response = self.send(method, path, builder).await?;
        decode(response).await
    }

    async fn post_ignoring_body<B>(&self, path: &str, body: Option<&B>) -> ApiResult<()>
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self.request(Method::POST, path).await;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(Method::POST, path, builder).await.map(|_| ())
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait]
impl BackendApi for ApiClient {
    async fn check_login_status(
        &self,
        user_id: &str,
        email: Option<&str>,
    ) -> ApiResult<LoginStatus> {
        let request = LoginStatusRequest { user_id, email };
        self.call_with(Method::POST, "/api/auth/check-login-status", &request)
            .await
    }

    async fn fetch_profile(&self) -> ApiResult<Profile> {
        let envelope: UserEnvelope = self.call(Method::GET, "/api/auth/profile").await?;
        Ok(envelope.user)
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<Profile> {
        let body: ProfileBody = self
            .call_with(Method::PUT, "/api/auth/profile", update)
            .await?;
        Ok(body.into())
    }

    async fn logout(&self) -> ApiResult<()> {
        self.post_ignoring_body::<()>("/api/auth/logout", None).await
    }

    async fn delete_account(&self, user_id: Option<&str>) -> ApiResult<()> {
        let request = DeleteAccountRequest { user_id };
        self.post_ignoring_body("/api/auth/delete-account", Some(&request))
            .await
    }

    async fn check_full_access(&self) -> ApiResult<AccessDecision> {
        self.call(Method::GET, "/api/access-control/check-full-access")
            .await
    }

    async fn check_access(&self) -> ApiResult<Profile> {
        let envelope: UserEnvelope = self
            .call(Method::GET, "/api/access-control/check-access")
            .await?;
        Ok(envelope.user)
    }
}

#[async_trait]
impl UsageSink for ApiClient {
    async fn report_usage(&self, user_id: &str, seconds: u64) -> ApiResult<()> {
        let report = UsageReport { user_id, seconds };
        self.post_ignoring_body("/api/usage/session", Some(&report))
            .await
    }
}
