//! Background task flushing usage to a sink.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

use super::clock::UsageClock;
use crate::{api::ApiResult, config::SessionConfig};

/// Destination of accumulated usage
#[async_trait]
pub trait UsageSink: Send + Sync {
    /// Record `seconds` of foreground use for `user_id`
    async fn report_usage(&self, user_id: &str, seconds: u64) -> ApiResult<()>;
}

#[derive(Debug)]
enum UsageCommand {
    Activity,
    Visibility(bool),
}

/// Best-effort usage timer for one signed-in user
pub struct UsageTimer {
    sender: mpsc::Sender<UsageCommand>,
    task: JoinHandle<()>,
}

impl UsageTimer {
    /// Start accounting for `user_id`
    pub fn spawn(sink: Arc<dyn UsageSink>, user_id: impl Into<String>, config: &SessionConfig) -> Self {
        let (sender, inbox) = mpsc::channel(64);
        let task = tokio::spawn(run(
            sink,
            user_id.into(),
            config.usage_idle_timeout,
            config.usage_flush_interval,
            inbox,
        ));
        Self { sender, task }
    }

    /// Note user input
    pub fn record_activity(&self) {
        self.signal(UsageCommand::Activity);
    }

    /// Note the page being shown or hidden
    pub fn set_visible(&self, visible: bool) {
        self.signal(UsageCommand::Visibility(visible));
    }

    /// Stop the timer after a final flush
    pub async fn stop(self) {
        drop(self.sender);
        if let Err(e) = self.task.await {
            log::warn!("Usage timer task ended abnormally: {}", e);
        }
    }

    fn signal(&self, command: UsageCommand) {
        // Dropped signals only cost accuracy
        if let Err(e) = self.sender.try_send(command) {
            log::debug!("Usage signal dropped: {}", e);
        }
    }
}

async fn run(
    sink: Arc<dyn UsageSink>,
    user_id: String,
    idle_timeout: Duration,
    flush_interval: Duration,
    mut inbox: mpsc::Receiver<UsageCommand>,
) {
    let mut clock = UsageClock::new(idle_timeout, Instant::now());
    let mut ticker = interval_at(Instant::now() + flush_interval, flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            command = inbox.recv() => match command {
                Some(UsageCommand::Activity) => clock.record_activity(Instant::now()),
                Some(UsageCommand::Visibility(visible)) => clock.set_visible(visible, Instant::now()),
                None => break,
            },

            _ = ticker.tick() => flush(sink.as_ref(), &user_id, &mut clock).await,
        }
    }

    flush(sink.as_ref(), &user_id, &mut clock).await;
    log::debug!("Usage timer for {} stopped", user_id);
}

async fn flush(sink: &dyn UsageSink, user_id: &str, clock: &mut UsageClock) {
    clock.advance(Instant::now());
    let seconds = clock.take_whole_seconds();
    if seconds == 0 {
        return;
    }
    if let Err(e) = sink.report_usage(user_id, seconds).await {
        log::warn!("Dropping {}s of usage for {}: {}", seconds, user_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        reports: Mutex<Vec<(String, u64)>>,
        fail: bool,
    }

    #[async_trait]
    impl UsageSink for RecordingSink {
        async fn report_usage(&self, user_id: &str, seconds: u64) -> ApiResult<()> {
            if self.fail {
                return Err(ApiError::Transport("offline".to_string()));
            }
            self.reports.lock().unwrap().push((user_id.to_string(), seconds));
            Ok(())
        }
    }

    fn config(flush_ms: u64) -> SessionConfig {
        SessionConfig {
            usage_flush_interval: Duration::from_millis(flush_ms),
            ..SessionConfig::default()
        }
    }

    #[tokio::test]
    async fn test_stop_flushes_whole_seconds() {
        let sink = Arc::new(RecordingSink::default());
        let timer = UsageTimer::spawn(sink.clone(), "u1", &config(60_000));
        timer.record_activity();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        timer.stop().await;

        let reports = sink.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, "u1");
        assert!(reports[0].1 >= 1);
    }

    #[tokio::test]
    async fn test_hidden_page_reports_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let timer = UsageTimer::spawn(sink.clone(), "u1", &config(60_000));
        timer.set_visible(false);
        tokio::time::sleep(Duration::from_millis(1100)).await;
        timer.stop().await;
        assert!(sink.reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..RecordingSink::default()
        });
        let timer = UsageTimer::spawn(sink, "u1", &config(500));
        tokio::time::sleep(Duration::from_millis(1200)).await;
        timer.stop().await;
    }
}
