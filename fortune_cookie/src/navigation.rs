//! Redirect destinations and the navigator seam.

use std::fmt;

use crate::config::RouteConfig;

/// Logical redirect targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Entry / login page
    Entry,
    Banned,
    /// Re-signup cooldown notice
    Cooldown,
    SchoolSelection,
    AdminDenied,
}

impl Destination {
    pub fn path(self, routes: &RouteConfig) -> &str {
        match self {
            Self::Entry => &routes.entry,
            Self::Banned => &routes.banned,
            Self::Cooldown => &routes.cooldown,
            Self::SchoolSelection => &routes.school_selection,
            Self::AdminDenied => &routes.admin_denied,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Entry => "entry",
            Self::Banned => "banned",
            Self::Cooldown => "cooldown",
            Self::SchoolSelection => "school-selection",
            Self::AdminDenied => "admin-denied",
        };
        f.write_str(name)
    }
}

/// Whatever moves the user between pages
pub trait Navigator: Send + Sync {
    /// Path currently shown
    fn current_path(&self) -> String;

    /// Replace the current page with `path`
    fn navigate(&self, path: &str);
}

/// Redirect unless already on the destination. Returns whether it navigated.
pub fn redirect(navigator: &dyn Navigator, routes: &RouteConfig, destination: Destination) -> bool {
    let target = destination.path(routes);
    if navigator.current_path() == target {
        log::debug!("Already on {} ({}), skipping redirect", destination, target);
        return false;
    }
    log::info!("Redirecting to {} ({})", destination, target);
    navigator.navigate(target);
    true
}
