//! Collaborators shared by the session actor and its handles.

use std::sync::Arc;

use crate::{
    api::BackendApi,
    auth::SessionStore,
    config::{RouteConfig, SessionConfig},
    db::ProfileStore,
    navigation::Navigator,
    profile::ProfileCache,
    store::LocalStore,
};

pub(crate) struct EngineContext {
    pub api: Arc<dyn BackendApi>,
    pub sessions: Arc<dyn SessionStore>,
    /// Direct profile store; fallback reads and upserts are skipped without it
    pub profiles: Option<Arc<dyn ProfileStore>>,
    pub store: Arc<dyn LocalStore>,
    pub cache: ProfileCache,
    pub navigator: Arc<dyn Navigator>,
    pub config: SessionConfig,
    pub routes: RouteConfig,
}
