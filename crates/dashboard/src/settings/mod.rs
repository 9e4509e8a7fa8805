pub mod validation;

use crate::{
    RetryPolicy,
    display::OutputFormat,
    dashboard::{
        DashboardConfig, history::HistoryConfig, transactions::RecentTxConfig,
        validators::KnownValidator,
    },
};
use alloy_primitives::{Address, address};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    net::SocketAddr,
    num::NonZeroU64,
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;
use validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "chain-dashboard", version, about)]
pub struct AppArgs {
    /// Path to a TOML config file; `DASHBOARD__*` env vars override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Keep the dashboard state refreshed until shutdown (default)
    Run,
    /// Assemble a single snapshot and print it
    Snapshot {
        #[arg(short, long, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

/// Settings for the dashboard service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log filter directive (e.g., "info", "chain_dashboard=debug")
    #[serde(default = "default_log")]
    pub log: String,
    /// Prometheus exporter listen address
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: SocketAddr,
    #[serde(default)]
    pub rpc: RpcSettings,
    #[serde(default)]
    pub chain: ChainSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub transactions: TransactionSettings,
    #[serde(default)]
    pub refresh: RefreshSettings,
    /// Display names for known validator operator addresses
    #[serde(default)]
    pub known_validators: Vec<KnownValidator>,
}

/// RPC endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcSettings {
    /// HTTP JSON-RPC endpoint
    pub url: Url,
    /// Per-request HTTP timeout in milliseconds
    pub request_timeout_ms: u64,
}

/// Chain-wide constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    /// Validator registry precompile address
    pub registry_address: Address,
    /// Blocks per epoch
    pub epoch_length: NonZeroU64,
    /// Decimals of the native unit (18 for wei-denominated chains)
    pub native_decimals: u8,
}

/// Rolling block window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Number of most recent blocks held in the window
    pub window_depth: usize,
    /// Concurrent block requests per batch
    pub batch_size: usize,
    /// Pause between batches in milliseconds
    pub batch_pause_ms: u64,
    /// Trailing samples used for average block time and TPS
    pub tps_window: usize,
}

/// Rate-limit retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the initial attempt
    pub max_retries: usize,
    /// Delay before the first retry in milliseconds, doubled per retry
    pub base_delay_ms: u64,
}

/// Recent transaction feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionSettings {
    /// Maximum transactions in the feed
    pub max_count: usize,
    /// Newest blocks the feed is drawn from
    pub source_blocks: usize,
}

/// Refresh scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    /// Periodic refresh interval in milliseconds
    pub interval_ms: u64,
    /// New block polling interval in milliseconds
    pub block_poll_interval_ms: u64,
    /// Upper bound on a single refresh in milliseconds
    pub timeout_ms: u64,
}

fn default_log() -> String {
    "info".to_string()
}

fn default_metrics_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9090))
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            url: Url::parse("http://localhost:8545").expect("static url is valid"),
            request_timeout_ms: 10_000,
        }
    }
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            registry_address: address!("56c0000000000000000000000000000000000000"),
            epoch_length: NonZeroU64::new(900).expect("non-zero literal"),
            native_decimals: 18,
        }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            window_depth: 30,
            batch_size: 5,
            batch_pause_ms: 200,
            tps_window: 10,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 4,
            base_delay_ms: 500,
        }
    }
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            max_count: 20,
            source_blocks: 3,
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_ms: 6_000,
            block_poll_interval_ms: 1_000,
            timeout_ms: 30_000,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log: default_log(),
            metrics_addr: default_metrics_addr(),
            rpc: RpcSettings::default(),
            chain: ChainSettings::default(),
            history: HistorySettings::default(),
            retry: RetrySettings::default(),
            transactions: TransactionSettings::default(),
            refresh: RefreshSettings::default(),
            known_validators: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file, then `DASHBOARD__*` env vars
    pub fn new<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(&path.as_ref().to_string_lossy()));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("DASHBOARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        validate_config(&settings)?;

        Ok(settings)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc.request_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh.interval_ms)
    }

    pub fn block_poll_interval(&self) -> Duration {
        Duration::from_millis(self.refresh.block_poll_interval_ms)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh.timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_retries,
            Duration::from_millis(self.retry.base_delay_ms),
        )
    }

    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            registry: self.chain.registry_address,
            epoch_length: self.chain.epoch_length,
            history: HistoryConfig {
                depth: self.history.window_depth,
                batch_size: self.history.batch_size,
                batch_pause: Duration::from_millis(self.history.batch_pause_ms),
                full_tx_depth: self.transactions.source_blocks,
            },
            tps_window: self.history.tps_window,
            recent_tx: RecentTxConfig {
                max_count: self.transactions.max_count,
                source_blocks: self.transactions.source_blocks,
                native_decimals: self.chain.native_decimals,
            },
            retry: self.retry_policy(),
            known_validators: self.known_validators.clone(),
        }
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings {{\n\
             \tRPC: {} (timeout {}ms)\n\
             \tRegistry: {}\n\
             \tEpoch length: {}\n\
             \tWindow: {} blocks, batches of {} every {}ms\n\
             \tRetry: {} retries from {}ms\n\
             \tRecent txs: {} from {} blocks\n\
             \tRefresh: every {}ms, block poll {}ms, timeout {}ms\n\
             \tKnown validators: {}\n\
             }}",
            self.rpc.url,
            self.rpc.request_timeout_ms,
            self.chain.registry_address,
            self.chain.epoch_length,
            self.history.window_depth,
            self.history.batch_size,
            self.history.batch_pause_ms,
            self.retry.max_retries,
            self.retry.base_delay_ms,
            self.transactions.max_count,
            self.transactions.source_blocks,
            self.refresh.interval_ms,
            self.refresh.block_poll_interval_ms,
            self.refresh.timeout_ms,
            self.known_validators.len(),
        )
    }
}
