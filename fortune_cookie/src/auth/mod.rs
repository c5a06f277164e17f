//! Authentication types shared by the engine, the gate and the adapters.
//!
//! This module defines:
//! - The provider session and its change events
//! - The [`SessionStore`] adapter contract over the external auth provider
//! - The restriction verdict derived from `check-login-status`

pub mod errors;
pub mod models;
pub mod store;

pub use errors::{AuthError, AuthResult};
pub use models::{
    AuthEvent, AuthEventKind, LoginStatus, Provider, RestrictionVerdict, Session, SessionUser,
    UserId,
};
pub use store::SessionStore;
