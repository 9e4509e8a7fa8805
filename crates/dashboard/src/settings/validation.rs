use crate::settings::Settings;
use anyhow::{Result, bail};
use std::collections::HashSet;
use tracing_subscriber::EnvFilter;

/// Validate the configuration values
pub fn validate_config(settings: &Settings) -> Result<()> {
    // Validate log filter
    if let Err(err) = EnvFilter::try_new(&settings.log) {
        bail!("Invalid log filter '{}': {err}", settings.log);
    }

    // Validate RPC settings
    if !matches!(settings.rpc.url.scheme(), "http" | "https") {
        bail!(
            "RPC URL must use http:// or https://, got {}",
            settings.rpc.url
        );
    }

    if settings.rpc.request_timeout_ms == 0 {
        bail!("RPC request timeout must be greater than 0");
    }

    // Validate chain settings
    if settings.chain.native_decimals > 77 {
        bail!(
            "Native decimals must be at most 77, got {}",
            settings.chain.native_decimals
        );
    }

    // Validate history window
    if settings.history.window_depth == 0 {
        bail!("History window depth must be greater than 0");
    }

    if settings.history.batch_size == 0 {
        bail!("History batch size must be greater than 0");
    }

    if settings.history.tps_window < 2 {
        bail!(
            "TPS window must cover at least 2 blocks, got {}",
            settings.history.tps_window
        );
    }

    // Validate retry settings
    if settings.retry.base_delay_ms == 0 {
        bail!("Retry base delay must be greater than 0");
    }

    // Validate recent transaction feed
    if settings.transactions.source_blocks > settings.history.window_depth {
        bail!(
            "Recent transaction source blocks ({}) cannot exceed the history window depth ({})",
            settings.transactions.source_blocks,
            settings.history.window_depth
        );
    }

    // Validate refresh scheduling
    if settings.refresh.interval_ms == 0 {
        bail!("Refresh interval must be greater than 0");
    }

    if settings.refresh.block_poll_interval_ms == 0 {
        bail!("Block poll interval must be greater than 0");
    }

    if settings.refresh.timeout_ms == 0 {
        bail!("Refresh timeout must be greater than 0");
    }

    // Validate known validators
    let mut seen = HashSet::new();
    for known in &settings.known_validators {
        if known.name.trim().is_empty() {
            bail!("Known validator {} has an empty name", known.address);
        }
        if !seen.insert(known.address) {
            bail!("Known validator {} is listed more than once", known.address);
        }
    }

    Ok(())
}
