//! Backend request/response bodies.

use serde::{Deserialize, Serialize};

use crate::profile::Profile;

fn yes() -> bool {
    true
}

/// `POST /api/auth/check-login-status` body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginStatusRequest<'a> {
    pub user_id: &'a str,
    pub email: Option<&'a str>,
}

/// `{user: ...}` envelope used by the profile and check-access endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: Profile,
}

/// `PUT /api/auth/profile` body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
}

/// `POST /api/auth/delete-account` body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<&'a str>,
}

/// `GET /api/access-control/check-full-access` response
///
/// Missing flags read as `true`: only an explicit `false` denies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    #[serde(default = "yes")]
    pub can_access: bool,
    #[serde(default = "yes")]
    pub can_use: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub next_available_at: Option<String>,
}

/// `POST /api/usage/session` body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport<'a> {
    pub user_id: &'a str,
    pub seconds: u64,
}
