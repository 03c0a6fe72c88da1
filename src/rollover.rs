use crate::tracker::Tracker;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

pub const ROLLOVER_CHECK_INTERVAL: Duration = Duration::from_millis(60_000);

/// Watches for midnight and starts a fresh in-memory day when it passes.
pub struct DailyRolloverWatch {
    tracker: Arc<Tracker>,
    period: Duration,
}

impl DailyRolloverWatch {
    pub fn new(tracker: Arc<Tracker>) -> Self {
        Self {
            tracker,
            period: ROLLOVER_CHECK_INTERVAL,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                self.check().await;
            }
        })
    }

    /// One check. Returns whether the day changed.
    pub async fn check(&self) -> bool {
        if !self.tracker.check_rollover().await {
            return false;
        }
        // errors are logged by the tracker; the new day simply starts empty
        if let Ok(count) = self.tracker.load_today().await {
            debug!(count, "loaded records for new day");
        }
        true
    }
}
