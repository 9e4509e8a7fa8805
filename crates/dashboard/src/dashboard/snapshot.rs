use crate::{
    Result,
    client::ChainClient,
    dashboard::{
        DashboardConfig,
        epoch::{EpochRange, EpochState},
        history::{BlockSample, fetch_block_history},
        network::NetworkMetrics,
        transactions::{RecentTx, collect_recent_transactions},
        validators::{ValidatorRecord, ValidatorSet},
    },
    error::rpc_with_retry,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{sync::Arc, time::Instant};
use tracing::{debug, info};

const RECENT_EPOCHS: usize = 10;

/// One consistent view of the chain, built in a single refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub block_height: u64,
    pub epoch: EpochState,
    pub recent_epochs: Vec<EpochRange>,
    pub total_validators: usize,
    pub active_validators: usize,
    pub inactive_validators: usize,
    pub active_validator_pct: f64,
    pub validators: Vec<ValidatorRecord>,
    pub network: NetworkMetrics,
    pub block_history: Vec<BlockSample>,
    pub recent_transactions: Vec<RecentTx>,
    pub captured_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn validator_set(&self) -> ValidatorSet {
        ValidatorSet {
            records: self.validators.clone(),
            total: self.total_validators,
            active: self.active_validators,
            inactive: self.inactive_validators,
            active_pct: self.active_validator_pct,
        }
    }
}

pub struct DashboardAssembler<C: ?Sized> {
    client: Arc<C>,
    config: DashboardConfig,
}

impl<C: ChainClient + ?Sized> DashboardAssembler<C> {
    pub fn new(client: Arc<C>, config: DashboardConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Fetch everything concurrently and build a snapshot; any failed read
    /// fails the whole snapshot.
    pub async fn assemble(&self) -> Result<DashboardSnapshot> {
        let started = Instant::now();
        let client = self.client.as_ref();
        let config = &self.config;
        let registry = config.registry;

        let (raw_validators, next_full_dkg, height, history) = tokio::try_join!(
            rpc_with_retry(
                &config.retry,
                || client.get_validators(registry),
                "get_validators"
            ),
            rpc_with_retry(
                &config.retry,
                || client.get_next_full_dkg_ceremony(registry),
                "get_next_full_dkg_ceremony"
            ),
            rpc_with_retry(
                &config.retry,
                || client.get_block_number(),
                "get_block_number"
            ),
            fetch_block_history(client, &config.history, &config.retry),
        )?;

        if let Some(head) = history.latest() {
            if head.number != height {
                debug!(
                    height,
                    window_head = head.number,
                    "block height moved while fetching the window"
                );
            }
        }

        let epoch = EpochState::derive(height, config.epoch_length, next_full_dkg);
        let network = NetworkMetrics::compute(&history.samples, config.tps_window);
        let recent_transactions = collect_recent_transactions(&history.blocks, &config.recent_tx)?;
        let validators = ValidatorSet::from_registry(raw_validators, &config.known_validators);

        info!(
            height,
            epoch = epoch.current_epoch,
            validators = validators.total,
            active = validators.active,
            window = history.samples.len(),
            recent_txs = recent_transactions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "assembled dashboard snapshot"
        );

        Ok(DashboardSnapshot {
            block_height: height,
            recent_epochs: epoch.recent_epochs(RECENT_EPOCHS),
            epoch,
            total_validators: validators.total,
            active_validators: validators.active,
            inactive_validators: validators.inactive,
            active_validator_pct: validators.active_pct,
            validators: validators.records,
            network,
            block_history: history.samples,
            recent_transactions,
            captured_at: Utc::now(),
        })
    }
}
