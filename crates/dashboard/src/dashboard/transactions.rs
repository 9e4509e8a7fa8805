use crate::{Result, client::Block};
use alloy_primitives::{Address, B256, U256, utils::format_units};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentTxConfig {
    /// Maximum number of transactions returned
    pub max_count: usize,
    /// Newest blocks the transactions are drawn from
    pub source_blocks: usize,
    /// Decimals of the native unit
    pub native_decimals: u8,
}

impl Default for RecentTxConfig {
    fn default() -> Self {
        Self {
            max_count: 20,
            source_blocks: 3,
            native_decimals: 18,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTx {
    pub hash: B256,
    pub from: Address,
    /// `None` for contract creation
    pub to: Option<Address>,
    /// Decimal amount in the native unit
    pub value: String,
    pub block_number: u64,
    pub timestamp: u64,
}

/// Collect up to `max_count` transactions from the newest `source_blocks`
/// of oldest-first `blocks`, newest block first, in per-block order.
pub fn collect_recent_transactions(
    blocks: &[Block],
    config: &RecentTxConfig,
) -> Result<Vec<RecentTx>> {
    let mut recent = Vec::with_capacity(config.max_count);

    'blocks: for block in blocks.iter().rev().take(config.source_blocks) {
        for tx in &block.transactions {
            if recent.len() >= config.max_count {
                break 'blocks;
            }
            recent.push(RecentTx {
                hash: tx.hash,
                from: tx.from,
                to: tx.to,
                value: format_native(tx.value, config.native_decimals)?,
                block_number: block.number,
                timestamp: block.timestamp,
            });
        }
    }

    Ok(recent)
}

/// Format `value` in the native unit without trailing zeros.
pub fn format_native(value: U256, decimals: u8) -> Result<String> {
    let formatted = format_units(value, decimals)?;
    if !formatted.contains('.') {
        return Ok(formatted);
    }
    Ok(formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string())
}
