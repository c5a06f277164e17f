//! Foreground usage accounting, driven entirely by caller-supplied instants.

use std::time::Duration;
use tokio::time::Instant;

/// Accumulates time spent visible and not idle
#[derive(Debug, Clone)]
pub struct UsageClock {
    idle_timeout: Duration,
    visible: bool,
    last_activity: Instant,
    last_mark: Instant,
    accumulated: Duration,
}

impl UsageClock {
    /// Start a visible, just-active clock at `now`
    pub fn new(idle_timeout: Duration, now: Instant) -> Self {
        Self {
            idle_timeout,
            visible: true,
            last_activity: now,
            last_mark: now,
            accumulated: Duration::ZERO,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the user counts as active at `now`
    pub fn is_active_at(&self, now: Instant) -> bool {
        self.visible && now.saturating_duration_since(self.last_activity) < self.idle_timeout
    }

    /// Count time up to `now`
    pub fn advance(&mut self, now: Instant) {
        if now <= self.last_mark {
            return;
        }
        if self.visible {
            let active_until = (self.last_activity + self.idle_timeout).min(now);
            self.accumulated += active_until.saturating_duration_since(self.last_mark);
        }
        self.last_mark = now;
    }

    /// User input; restarts the idle window
    pub fn record_activity(&mut self, now: Instant) {
        self.advance(now);
        self.last_activity = self.last_activity.max(now);
    }

    /// Tab shown or hidden; becoming visible counts as activity
    pub fn set_visible(&mut self, visible: bool, now: Instant) {
        self.advance(now);
        if visible && !self.visible {
            self.last_activity = self.last_activity.max(now);
        }
        self.visible = visible;
    }

    /// Counted time not yet taken
    pub fn pending(&self) -> Duration {
        self.accumulated
    }

    /// Remove and return whole seconds, keeping the fraction for later
    pub fn take_whole_seconds(&mut self) -> u64 {
        let seconds = self.accumulated.as_secs();
        self.accumulated -= Duration::from_secs(seconds);
        seconds
    }
}
