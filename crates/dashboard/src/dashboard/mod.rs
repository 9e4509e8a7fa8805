pub mod epoch;
pub mod history;
pub mod network;
pub mod snapshot;
pub mod transactions;
pub mod validators;

use crate::RetryPolicy;
use alloy_primitives::Address;
use history::HistoryConfig;
use std::num::NonZeroU64;
use transactions::RecentTxConfig;
use validators::KnownValidator;

pub use epoch::{EpochRange, EpochState};
pub use history::{BlockHistory, BlockSample, fetch_block_history};
pub use network::{BlockTimeStats, NetworkMetrics};
pub use snapshot::{DashboardAssembler, DashboardSnapshot};
pub use transactions::{RecentTx, collect_recent_transactions};
pub use validators::{ValidatorRecord, ValidatorSet};

/// Everything the assembler needs besides the chain client.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Validator registry precompile address
    pub registry: Address,
    pub epoch_length: NonZeroU64,
    pub history: HistoryConfig,
    /// Trailing samples used for average block time and TPS
    pub tps_window: usize,
    pub recent_tx: RecentTxConfig,
    pub retry: RetryPolicy,
    pub known_validators: Vec<KnownValidator>,
}
