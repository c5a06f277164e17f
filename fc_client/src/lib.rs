//! Concrete adapters for the fortune cookie client.
//!
//! This library provides the HTTP backend client, the Supabase GoTrue session
//! store, a file-backed local store and the other pieces the `fc_client`
//! binary wires into the session engine.

/// HTTP client for the backend REST API
pub mod api_client;

/// Environment configuration
pub mod config;

/// JSON file local store
pub mod file_store;

/// GoTrue OAuth/PKCE session store
pub mod gotrue;

/// Tracing subscriber setup and structured helpers
pub mod logging;

/// Console navigator
pub mod navigator;

pub use api_client::ApiClient;
pub use config::ClientConfig;
pub use file_store::FileStore;
pub use gotrue::{GoTrueClient, GoTrueConfig};
pub use navigator::ConsoleNavigator;
