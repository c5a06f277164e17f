//! Session reconciliation engine.
//!
//! Turns the auth provider's session events into the application's notion of
//! "who is logged in": runs the restriction check before anything is shown,
//! hydrates optimistically from the profile cache, confirms the profile in
//! the background, and tells a transient SIGNED_OUT apart from a real one.
//!
//! # Architecture
//!
//! - [`state`]: pure `(state, input) -> (state, effects)` transition function
//! - [`SessionActor`]: tokio task owning the state and executing effects
//! - [`SessionHandle`]: cloneable front door (snapshot, login, logout, ...)
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use fortune_cookie::engine::SessionEngine;
//! # async fn demo(
//! #     api: Arc<dyn fortune_cookie::api::BackendApi>,
//! #     sessions: Arc<dyn fortune_cookie::auth::SessionStore>,
//! #     store: Arc<dyn fortune_cookie::store::LocalStore>,
//! #     navigator: Arc<dyn fortune_cookie::navigation::Navigator>,
//! # ) {
//! let handle = SessionEngine::new(api, sessions, store, navigator).spawn();
//! let snapshot = handle.wait_until_loaded().await;
//! # }
//! ```

mod actor;
mod context;
mod handle;
pub mod messages;
pub mod state;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

pub use actor::SessionActor;
pub use handle::{CallbackOutcome, SessionHandle};
pub use state::{AuthSnapshot, Effect, Input, Phase, SessionState};

use crate::{
    api::BackendApi,
    auth::SessionStore,
    config::{RouteConfig, SessionConfig},
    db::ProfileStore,
    navigation::Navigator,
    profile::ProfileCache,
    store::LocalStore,
};
use context::EngineContext;

const INBOX_CAPACITY: usize = 100;

/// Builder wiring the engine's collaborators
pub struct SessionEngine {
    api: Arc<dyn BackendApi>,
    sessions: Arc<dyn SessionStore>,
    store: Arc<dyn LocalStore>,
    navigator: Arc<dyn Navigator>,
    profiles: Option<Arc<dyn ProfileStore>>,
    config: SessionConfig,
    routes: RouteConfig,
}

impl SessionEngine {
    pub fn new(
        api: Arc<dyn BackendApi>,
        sessions: Arc<dyn SessionStore>,
        store: Arc<dyn LocalStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            sessions,
            store,
            navigator,
            profiles: None,
            config: SessionConfig::default(),
            routes: RouteConfig::default(),
        }
    }

    /// Enable the direct profile store fallback and user upserts
    pub fn with_profile_store(mut self, profiles: Arc<dyn ProfileStore>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_routes(mut self, routes: RouteConfig) -> Self {
        self.routes = routes;
        self
    }

    /// Create the actor and its handle without starting it
    ///
    /// # Returns
    ///
    /// * `(SessionActor, SessionHandle)` - Actor to run and handle for callers
    pub fn build(self) -> (SessionActor, SessionHandle) {
        let cache = ProfileCache::new(Arc::clone(&self.store), self.config.cache_freshness);
        let ctx = Arc::new(EngineContext {
            api: self.api,
            sessions: self.sessions,
            profiles: self.profiles,
            store: self.store,
            cache,
            navigator: self.navigator,
            config: self.config,
            routes: self.routes,
        });

        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(AuthSnapshot::default());

        let actor = SessionActor::new(Arc::clone(&ctx), inbox, sender.downgrade(), snapshot_tx);
        let handle = SessionHandle::new(sender, snapshot_rx, ctx);
        (actor, handle)
    }

    /// Build and run the actor on the current tokio runtime
    pub fn spawn(self) -> SessionHandle {
        let (actor, handle) = self.build();
        tokio::spawn(actor.run());
        handle
    }
}
