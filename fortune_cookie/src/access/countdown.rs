//! Countdown to the next available use.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::{fmt, time::Duration};
use tokio::time::{MissedTickBehavior, interval};

/// Label shown once the wait is over
pub const AVAILABLE_NOW: &str = "지금 이용 가능";

/// Time left, never negative
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Remaining {
    pub hours: u64,
    pub minutes: u8,
    pub seconds: u8,
}

impl Remaining {
    pub const ZERO: Self = Self {
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    pub fn from_seconds(total: u64) -> Self {
        Self {
            hours: total / 3600,
            minutes: ((total % 3600) / 60) as u8,
            seconds: (total % 60) as u8,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// `HH:MM:SS`, or [`AVAILABLE_NOW`] at zero
    pub fn label(&self) -> String {
        if self.is_zero() {
            AVAILABLE_NOW.to_string()
        } else {
            format!("{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
        }
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Parse an ISO timestamp; offsetless values are taken as UTC
pub fn parse_target(target: &str) -> Option<DateTime<Utc>> {
    let target = target.trim();
    DateTime::parse_from_rfc3339(target)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(target, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// `max(0, target - now)`, partial seconds rounded up so zero means reached
pub fn remaining_until(target: DateTime<Utc>, now: DateTime<Utc>) -> Remaining {
    let millis = (target - now).num_milliseconds();
    let seconds = u64::try_from(millis).map_or(0, |ms| ms.div_ceil(1000));
    Remaining::from_seconds(seconds)
}

/// Like [`remaining_until`]; unparsable targets count as already reached
pub fn remaining_at(target: &str, now: DateTime<Utc>) -> Remaining {
    parse_target(target)
        .map(|target| remaining_until(target, now))
        .unwrap_or(Remaining::ZERO)
}

/// Report the remaining time every second until it reaches zero
///
/// `on_tick` is called immediately, then once per second, and a final time
/// with [`Remaining::ZERO`].
pub async fn run_countdown<F>(target: &str, mut on_tick: F)
where
    F: FnMut(Remaining),
{
    let Some(target) = parse_target(target) else {
        log::debug!("Unparsable countdown target {:?}", target);
        on_tick(Remaining::ZERO);
        return;
    };

    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let remaining = remaining_until(target, Utc::now());
        on_tick(remaining);
        if remaining.is_zero() {
            break;
        }
    }
}
