//! Authentication data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::errors::AuthError;
use crate::api::ApiError;

/// User ID type (the auth provider's UUID, kept as text)
pub type UserId = String;

/// User as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub email: Option<String>,
    pub nickname: Option<String>,
}

/// Provider session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn email(&self) -> Option<&str> {
        self.user.email.as_deref()
    }

    /// Whether the access token is past its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// Kind of session change reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// Session change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

impl AuthEvent {
    pub fn new(kind: AuthEventKind, session: Option<Session>) -> Self {
        Self { kind, session }
    }

    pub fn signed_in(session: Session) -> Self {
        Self::new(AuthEventKind::SignedIn, Some(session))
    }

    pub fn signed_out() -> Self {
        Self::new(AuthEventKind::SignedOut, None)
    }
}

/// Supported OAuth providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Kakao,
}

impl Provider {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Kakao => "kakao",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "kakao" => Ok(Self::Kakao),
            other => Err(AuthError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Response of `POST /api/auth/check-login-status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginStatus {
    #[serde(default)]
    pub is_restricted: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
}

/// What the restriction check decided for a login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictionVerdict {
    /// Nothing blocks the login
    Clear,
    /// Re-signup cooldown is active
    Restricted,
    /// Account is banned
    Banned,
    /// The check could not be completed; login continues
    Unavailable,
}

impl From<&LoginStatus> for RestrictionVerdict {
    fn from(status: &LoginStatus) -> Self {
        if status.is_restricted == Some(true) {
            Self::Restricted
        } else if status.status.as_deref() == Some("banned") {
            Self::Banned
        } else {
            Self::Clear
        }
    }
}

impl From<&ApiError> for RestrictionVerdict {
    /// Policy answers still decide the login; anything else leaves it open
    fn from(error: &ApiError) -> Self {
        match error {
            ApiError::Restricted { .. } => Self::Restricted,
            ApiError::Banned { .. } => Self::Banned,
            _ => Self::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("google".parse::<Provider>().unwrap(), Provider::Google);
        assert_eq!(" Kakao ".parse::<Provider>().unwrap(), Provider::Kakao);
        assert!(matches!(
            "github".parse::<Provider>(),
            Err(AuthError::UnsupportedProvider(p)) if p == "github"
        ));
    }

    #[test]
    fn test_login_status_verdicts() {
        let restricted: LoginStatus =
            serde_json::from_str(r#"{"isRestricted": true, "status": "banned"}"#).unwrap();
        assert_eq!(RestrictionVerdict::from(&restricted), RestrictionVerdict::Restricted);

        let banned: LoginStatus = serde_json::from_str(r#"{"status": "banned"}"#).unwrap();
        assert_eq!(RestrictionVerdict::from(&banned), RestrictionVerdict::Banned);

        let clear: LoginStatus = serde_json::from_str("{}").unwrap();
        assert_eq!(RestrictionVerdict::from(&clear), RestrictionVerdict::Clear);
    }

    #[test]
    fn test_error_verdicts() {
        let restricted = ApiError::Restricted { status: 403 };
        assert_eq!(RestrictionVerdict::from(&restricted), RestrictionVerdict::Restricted);

        let banned = ApiError::Banned {
            status: 403,
            message: "차단".to_string(),
        };
        assert_eq!(RestrictionVerdict::from(&banned), RestrictionVerdict::Banned);

        let down = ApiError::Http {
            status: 502,
            message: String::new(),
        };
        assert_eq!(RestrictionVerdict::from(&down), RestrictionVerdict::Unavailable);
        assert_eq!(
            RestrictionVerdict::from(&ApiError::Transport("refused".to_string())),
            RestrictionVerdict::Unavailable
        );
    }

    #[test]
    fn test_event_kind_wire_names() {
        let kind: AuthEventKind = serde_json::from_str("\"INITIAL_SESSION\"").unwrap();
        assert_eq!(kind, AuthEventKind::InitialSession);
        assert_eq!(
            serde_json::to_string(&AuthEventKind::SignedOut).unwrap(),
            "\"SIGNED_OUT\""
        );
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let session = Session {
            user: SessionUser {
                id: "u1".to_string(),
                email: None,
                nickname: None,
            },
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at: Some(now),
        };
        assert!(session.is_expired_at(now));
        assert!(!session.is_expired_at(now - chrono::Duration::seconds(1)));
    }
}
