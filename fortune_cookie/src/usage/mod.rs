//! Usage session timer.
//!
//! Side telemetry: foreground time is accumulated with an idle cut-off and
//! flushed periodically. Failures are logged and the time is dropped.

pub mod clock;
pub mod timer;

pub use clock::UsageClock;
pub use timer::{UsageSink, UsageTimer};
