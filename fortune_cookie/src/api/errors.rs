//! Backend API error taxonomy.
//!
//! Backend error bodies are loosely shaped JSON (`{error?, message?,
//! isRestricted?}`) and some policy signals only exist as words inside the
//! message. All of that string matching happens in [`classify`] so the
//! markers live in one place.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Substrings that mark a ban in backend messages and access reasons
pub const BAN_MARKERS: &[&str] = &["차단", "banned"];

/// Substrings that mark a deleted (withdrawn) account
pub const DELETION_MARKERS: &[&str] = &["탈퇴", "deleted"];

/// Backend API errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Re-signup cooldown (`isRestricted: true`)
    #[error("Account is under a re-signup restriction ({status})")]
    Restricted { status: u16 },

    /// Account banned
    #[error("Account is banned ({status}): {message}")]
    Banned { status: u16, message: String },

    /// Account withdrawn
    #[error("Account has been deleted ({status}): {message}")]
    Deleted { status: u16, message: String },

    /// 401/403 without a more specific policy signal
    #[error("Unauthorized ({status})")]
    Unauthorized { status: u16, message: Option<String> },

    /// Any other non-2xx response
    #[error("Server returned {status}: {message}")]
    Http { status: u16, message: String },

    /// Backend unreachable
    #[error("Network error: {0}")]
    Transport(String),

    /// Call ran past its bound
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// 2xx with a body we could not decode
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether the failure is a connectivity problem rather than an answer
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Timeout(_))
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Restricted { status }
            | ApiError::Banned { status, .. }
            | ApiError::Deleted { status, .. }
            | ApiError::Unauthorized { status, .. }
            | ApiError::Http { status, .. } => Some(*status),
            ApiError::Transport(_) | ApiError::Timeout(_) | ApiError::Decode(_) => None,
        }
    }
}

/// Result type for backend API calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Error body shape shared by the backend endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_restricted: Option<bool>,
}

impl ErrorBody {
    /// Decode a raw body; non-JSON text becomes the message
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|_| {
            let text = raw.trim();
            Self {
                error: (!text.is_empty()).then(|| text.to_string()),
                ..Self::default()
            }
        })
    }

    pub fn text(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

/// Map a non-2xx response to the error taxonomy
pub fn classify(status: u16, body: &ErrorBody) -> ApiError {
    if body.is_restricted == Some(true) {
        return ApiError::Restricted { status };
    }

    let text = body.text().unwrap_or_default().to_string();
    match status {
        401 | 403 if is_ban_message(&text) => ApiError::Banned {
            status,
            message: text,
        },
        401 | 403 if is_deletion_message(&text) => ApiError::Deleted {
            status,
            message: text,
        },
        401 | 403 => ApiError::Unauthorized {
            status,
            message: (!text.is_empty()).then_some(text),
        },
        _ => ApiError::Http {
            status,
            message: text,
        },
    }
}

/// Whether free text signals a ban
pub fn is_ban_message(text: &str) -> bool {
    contains_marker(text, BAN_MARKERS)
}

/// Whether free text signals a withdrawn account
pub fn is_deletion_message(text: &str) -> bool {
    contains_marker(text, DELETION_MARKERS)
}

fn contains_marker(text: &str, markers: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    markers.iter().any(|m| lowered.contains(m))
}
