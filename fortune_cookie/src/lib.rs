//! # Fortune Cookie
//!
//! Client-side session and authorization core of the fortune cookie service.
//!
//! The service itself is a backend plus an OAuth provider (Supabase). This
//! crate decides, on the client, who is logged in and whether they may open
//! today's fortune, enforcing ban, re-signup cooldown, school-period and
//! daily-limit policies the backend reports.
//!
//! ## Core Modules
//!
//! - [`engine`]: Session reconciliation state machine, actor and handle
//! - [`access`]: Daily access gate, admin gate, denial modals and countdown
//! - [`profile`]: Profile model and the per-user local cache
//! - [`auth`]: Session types and the [`auth::SessionStore`] adapter contract
//! - [`api`]: Backend REST contract and error classification
//! - [`db`]: Direct PostgreSQL profile store used as a fallback
//! - [`store`]: Client-local key/value persistence and guard flags
//! - [`usage`]: Foreground usage timer
//!
//! ## Example
//!
//! ```
//! use fortune_cookie::engine::{Input, SessionState};
//!
//! // A fresh engine is loading and nobody is logged in yet
//! let (state, effects) = SessionState::default().transition(Input::NoSession);
//! assert!(!state.is_loading());
//! assert!(!state.is_logged_in());
//! assert!(effects.is_empty());
//! ```

/// Access control gates and their UI collaborators.
pub mod access;

/// Backend REST API contract.
pub mod api;

/// Auth provider session types and adapter contract.
pub mod auth;

/// Engine timing and route configuration.
pub mod config;

/// Direct PostgreSQL profile store.
pub mod db;

/// Session reconciliation engine.
pub mod engine;

/// Redirect destinations.
pub mod navigation;

/// Profiles and the profile cache.
pub mod profile;

/// Client-local key/value storage.
pub mod store;

/// Timeout helpers for bounded background calls.
pub mod timeouts;

/// Usage session timer.
pub mod usage;

pub use access::{AccessGate, AccessVerdict, AdminGate, DenialModal};
pub use auth::{AuthError, AuthResult, Session, SessionStore};
pub use config::{ConfigError, RouteConfig, SessionConfig};
pub use engine::{AuthSnapshot, SessionEngine, SessionHandle};
pub use navigation::{Destination, Navigator};
pub use profile::{AuthUser, Profile};
