use crate::{
    Error, Result,
    client::ChainClient,
    dashboard::{DashboardAssembler, DashboardSnapshot},
    worker::{RefreshHandle, RefreshReason, state::DashboardState},
};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Single consumer of the refresh queue.
pub struct DashboardRefresher<C: ?Sized> {
    assembler: DashboardAssembler<C>,
    refresh_timeout: Duration,
    requests: mpsc::Receiver<RefreshReason>,
    state: watch::Sender<DashboardState>,
}

impl<C: ChainClient + ?Sized> DashboardRefresher<C> {
    pub fn new(assembler: DashboardAssembler<C>, refresh_timeout: Duration) -> (Self, RefreshHandle) {
        let (handle, requests) = RefreshHandle::channel();
        let (state, _) = watch::channel(DashboardState::default());

        let refresher = Self {
            assembler,
            refresh_timeout,
            requests,
            state,
        };
        (refresher, handle)
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub async fn run(&mut self, shutdown_listener: CancellationToken) -> Result<()> {
        loop {
            let request = tokio::select! {
                biased;
                _ = shutdown_listener.cancelled() => {
                    info!("shutdown signal received");
                    break;
                }
                request = self.requests.recv() => request,
            };

            let Some(reason) = request else {
                info!("all refresh handles dropped, stopping refresher");
                break;
            };

            if let Err(err) = self.refresh(reason, &shutdown_listener).await {
                if !matches!(err, Error::Cancelled) {
                    error!(?err, %reason, "dashboard refresh failed; keeping last snapshot");
                }
            }
        }

        Ok(())
    }

    /// Assemble a snapshot and publish the outcome.
    pub async fn refresh(
        &self,
        reason: RefreshReason,
        shutdown_listener: &CancellationToken,
    ) -> Result<()> {
        let started = Instant::now();
        debug!(%reason, "refreshing dashboard");

        let result = tokio::select! {
            biased;
            _ = shutdown_listener.cancelled() => Err(Error::Cancelled),
            assembled = tokio::time::timeout(self.refresh_timeout, self.assembler.assemble()) => {
                match assembled {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout(self.refresh_timeout)),
                }
            }
        };

        metrics::histogram!("chain_dashboard_refresh_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match result {
            Ok(snapshot) => {
                export_snapshot_metrics(&snapshot);
                self.state.send_modify(|state| state.mark_success(snapshot));
                metrics::counter!("chain_dashboard_refresh_succeeded").increment(1);
                Ok(())
            }
            Err(Error::Cancelled) => {
                debug!(%reason, "refresh cancelled by shutdown");
                Err(Error::Cancelled)
            }
            Err(err) => {
                self.state.send_modify(|state| state.mark_failure(&err));
                metrics::counter!("chain_dashboard_refresh_failed").increment(1);
                Err(err)
            }
        }
    }
}

fn export_snapshot_metrics(snapshot: &DashboardSnapshot) {
    metrics::gauge!("chain_dashboard_block_height").set(snapshot.block_height as f64);
    metrics::gauge!("chain_dashboard_epoch").set(snapshot.epoch.current_epoch as f64);
    metrics::gauge!("chain_dashboard_epoch_progress_pct").set(snapshot.epoch.progress_pct as f64);
    metrics::gauge!("chain_dashboard_validators_total").set(snapshot.total_validators as f64);
    metrics::gauge!("chain_dashboard_validators_active").set(snapshot.active_validators as f64);

    let network = &snapshot.network;
    if let Some(tps) = network.tps {
        metrics::gauge!("chain_dashboard_tps").set(tps);
    }
    if let Some(block_time) = network.block_time {
        metrics::gauge!("chain_dashboard_block_time_seconds").set(block_time);
    }
    if let Some(gas_utilization) = network.gas_utilization {
        metrics::gauge!("chain_dashboard_gas_utilization_pct").set(gas_utilization);
    }
}
