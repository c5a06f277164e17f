//! Structured logging configuration.
//!
//! The core crate logs through the `log` facade; `init` installs a `tracing`
//! subscriber that also picks those records up.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, defaulting to
/// `info,sqlx=warn,reqwest=warn`.
///
/// # Example
///
/// ```no_run
/// use fc_client::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Client starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,reqwest=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::debug!("Structured logging initialized");
}

/// Log a policy decision taken against the current user
///
/// # Arguments
///
/// * `event_type` - Decision kind (`cooldown`, `banned`, `daily_limit`, ...)
/// * `user_id` - Affected user, if known
/// * `message` - Human readable detail
///
/// # Example
///
/// ```
/// use fc_client::logging::log_policy_event;
///
/// log_policy_event("daily_limit", Some("user-1"), "Next use at 09:00");
/// ```
pub fn log_policy_event(event_type: &str, user_id: Option<&str>, message: &str) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        "POLICY: {}",
        message
    );
}

/// Log a completed backend call
///
/// # Arguments
///
/// * `method` - HTTP method
/// * `path` - Request path
/// * `status_code` - Response status, `None` when no response arrived
/// * `duration_ms` - Round trip in milliseconds
pub fn log_api_call(method: &str, path: &str, status_code: Option<u16>, duration_ms: u64) {
    match status_code {
        Some(status) if status < 400 => tracing::debug!(
            http_method = method,
            http_path = path,
            http_status = status,
            duration_ms = duration_ms,
            "API call completed"
        ),
        Some(status) => tracing::info!(
            http_method = method,
            http_path = path,
            http_status = status,
            duration_ms = duration_ms,
            "API call rejected"
        ),
        None => tracing::warn!(
            http_method = method,
            http_path = path,
            duration_ms = duration_ms,
            "API call failed before a response"
        ),
    }

    if duration_ms > 1000 {
        tracing::warn!(
            http_method = method,
            http_path = path,
            duration_ms = duration_ms,
            "Slow API call"
        );
    }
}
