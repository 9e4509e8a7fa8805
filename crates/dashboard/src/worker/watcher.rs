use crate::{
    Result,
    client::ChainClient,
    error::{RetryPolicy, rpc_with_retry},
};
use std::{sync::Arc, time::Duration};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polls the chain head and reports each new height.
pub struct BlockWatcher<C: ?Sized> {
    client: Arc<C>,
    poll_interval: Duration,
    retry: RetryPolicy,
}

impl<C: ChainClient + ?Sized> BlockWatcher<C> {
    pub fn new(client: Arc<C>, poll_interval: Duration, retry: RetryPolicy) -> Self {
        Self {
            client,
            poll_interval,
            retry,
        }
    }

    /// Invoke `on_block` for the first observed height and then for every
    /// strictly higher one until shutdown.
    pub async fn run<F>(&self, mut on_block: F, shutdown_listener: CancellationToken) -> Result<()>
    where
        F: FnMut(u64),
    {
        let mut poll_timer = interval(self.poll_interval);
        poll_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_seen: Option<u64> = None;

        loop {
            tokio::select! {
                biased;
                _ = shutdown_listener.cancelled() => {
                    info!("shutdown signal received");
                    break;
                }
                _ = poll_timer.tick() => {}
            }

            let polled = tokio::select! {
                biased;
                _ = shutdown_listener.cancelled() => break,
                polled = rpc_with_retry(
                    &self.retry,
                    || self.client.get_block_number(),
                    "watch_block_number",
                ) => polled,
            };

            let height = match polled {
                Ok(height) => height,
                Err(err) => {
                    warn!(?err, "failed to poll block height; will retry on next tick");
                    metrics::counter!("chain_dashboard_block_poll_failed").increment(1);
                    continue;
                }
            };

            if last_seen.is_none_or(|last| height > last) {
                debug!(height, "new block observed");
                last_seen = Some(height);
                on_block(height);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, client::MockChainClient};

    #[tokio::test(start_paused = true)]
    async fn test_reports_strictly_increasing_heights() {
        let mut client = MockChainClient::new();
        let mut calls = 0u64;
        client.expect_get_block_number().returning(move || {
            // every height is seen twice
            let height = calls / 2;
            calls += 1;
            Ok(height)
        });

        let watcher = BlockWatcher::new(
            Arc::new(client),
            Duration::from_secs(1),
            RetryPolicy::default(),
        );
        let token = CancellationToken::new();
        let mut seen = Vec::new();

        watcher
            .run(
                |height| {
                    seen.push(height);
                    if height == 3 {
                        token.cancel();
                    }
                },
                token.clone(),
            )
            .await
            .unwrap();

        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_keep_polling() {
        let mut client = MockChainClient::new();
        let mut calls = 0u64;
        client.expect_get_block_number().returning(move || {
            calls += 1;
            match calls {
                2 => Err(Error::InvalidResponse("empty body".to_string())),
                3 => Ok(4),
                n => Ok(n + 10),
            }
        });

        let watcher = BlockWatcher::new(
            Arc::new(client),
            Duration::from_secs(1),
            RetryPolicy::default(),
        );
        let token = CancellationToken::new();
        let mut seen = Vec::new();

        watcher
            .run(
                |height| {
                    seen.push(height);
                    if seen.len() == 2 {
                        token.cancel();
                    }
                },
                token.clone(),
            )
            .await
            .unwrap();

        // the lower height returned after the failure is ignored
        assert_eq!(seen, vec![11, 14]);
    }
}
