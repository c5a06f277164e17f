//! Admin page gate.

use std::sync::Arc;

use crate::{
    api::BackendApi,
    config::RouteConfig,
    navigation::{self, Destination, Navigator},
};

/// Lets only administrators through; everyone else is redirected
pub struct AdminGate {
    api: Arc<dyn BackendApi>,
    navigator: Arc<dyn Navigator>,
    routes: RouteConfig,
}

impl AdminGate {
    pub fn new(api: Arc<dyn BackendApi>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            api,
            navigator,
            routes: RouteConfig::default(),
        }
    }

    pub fn with_routes(mut self, routes: RouteConfig) -> Self {
        self.routes = routes;
        self
    }

    /// Confirm admin rights with the backend
    ///
    /// # Returns
    ///
    /// * `bool` - `true` if the backend reports an admin; otherwise the user
    ///   has been sent to the admin-denied destination
    pub async fn verify(&self) -> bool {
        match self.api.check_access().await {
            Ok(profile) if profile.is_admin => {
                log::info!("Admin access granted to {}", profile.id);
                true
            }
            Ok(profile) => {
                log::warn!("Non-admin {} tried to open the admin page", profile.id);
                self.deny();
                false
            }
            Err(e) => {
                log::warn!("Admin access check failed: {}", e);
                self.deny();
                false
            }
        }
    }

    fn deny(&self) {
        navigation::redirect(
            self.navigator.as_ref(),
            &self.routes,
            Destination::AdminDenied,
        );
    }
}
