use crate::{
    Result,
    worker::{RefreshHandle, RefreshReason},
};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Requests a refresh every `interval`, starting immediately.
pub struct RefreshTimer {
    interval: Duration,
}

impl RefreshTimer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub async fn run(self, handle: RefreshHandle, shutdown_listener: CancellationToken) -> Result<()> {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_listener.cancelled() => {
                    info!("shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {
                    handle.request(RefreshReason::Timer);
                }
            }
        }

        Ok(())
    }
}
