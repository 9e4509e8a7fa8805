use crate::{
    Error, Result,
    client::{Block, BlockTag, ChainClient},
    error::{RetryPolicy, rpc_with_retry},
};
use alloy_primitives::{Address, B256};
use futures::future::try_join_all;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Number of most recent blocks in the window
    pub depth: usize,
    /// Blocks requested concurrently per batch
    pub batch_size: usize,
    /// Pause between consecutive batches
    pub batch_pause: Duration,
    /// Newest blocks fetched with full transaction bodies
    pub full_tx_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            depth: 30,
            batch_size: 5,
            batch_pause: Duration::from_millis(200),
            full_tx_depth: 3,
        }
    }
}

/// Derived facts of one block in the rolling window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSample {
    pub number: u64,
    pub timestamp: u64,
    pub tx_count: u64,
    pub gas_used: u64,
    pub gas_limit: u64,
    /// Seconds since the preceding sample; `None` for the oldest sample.
    pub block_time: Option<u64>,
    pub hash: B256,
    pub miner: Address,
}

impl BlockSample {
    /// Gas used as a fraction of the limit, `None` for a zero limit.
    pub fn gas_utilization(&self) -> Option<f64> {
        (self.gas_limit > 0).then(|| self.gas_used as f64 / self.gas_limit as f64)
    }
}

/// Oldest-first window of blocks along with the raw blocks they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockHistory {
    pub samples: Vec<BlockSample>,
    pub blocks: Vec<Block>,
}

impl BlockHistory {
    pub fn latest(&self) -> Option<&BlockSample> {
        self.samples.last()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Fetch the latest `config.depth` blocks in batches and derive samples.
///
/// Any block that cannot be fetched after retries fails the whole window.
pub async fn fetch_block_history<C>(
    client: &C,
    config: &HistoryConfig,
    retry: &RetryPolicy,
) -> Result<BlockHistory>
where
    C: ChainClient + ?Sized,
{
    if config.depth == 0 {
        return Ok(BlockHistory::default());
    }

    let latest = rpc_with_retry(
        retry,
        || client.get_block(BlockTag::Latest, true),
        "get_latest_block",
    )
    .await?;

    let head = latest.number;
    let oldest = head.saturating_sub(config.depth as u64 - 1);
    let wants_full = |number: u64| head - number < config.full_tx_depth as u64;

    // newest first
    let mut blocks = Vec::with_capacity(config.depth);
    blocks.push(latest);

    let remaining: Vec<u64> = (oldest..head).rev().collect();
    let batch_size = config.batch_size.max(1);
    for (batch_idx, batch) in remaining.chunks(batch_size).enumerate() {
        if batch_idx > 0 && !config.batch_pause.is_zero() {
            tokio::time::sleep(config.batch_pause).await;
        }

        debug!(
            batch = batch_idx,
            from = batch[0],
            to = batch[batch.len() - 1],
            "fetching block batch"
        );

        let fetched = try_join_all(
            batch
                .iter()
                .map(|&number| fetch_block(client, number, wants_full(number), retry)),
        )
        .await?;
        blocks.extend(fetched);
    }

    blocks.reverse();
    let samples = build_samples(&blocks);

    Ok(BlockHistory { samples, blocks })
}

async fn fetch_block<C>(
    client: &C,
    number: u64,
    full_transactions: bool,
    retry: &RetryPolicy,
) -> Result<Block>
where
    C: ChainClient + ?Sized,
{
    let block = rpc_with_retry(
        retry,
        || client.get_block(BlockTag::Number(number), full_transactions),
        "get_block",
    )
    .await?;

    if block.number != number {
        return Err(Error::InvalidResponse(format!(
            "requested block {number}, got block {}",
            block.number
        )));
    }

    Ok(block)
}

/// Derive samples from oldest-first blocks.
pub fn build_samples(blocks: &[Block]) -> Vec<BlockSample> {
    let mut samples = Vec::with_capacity(blocks.len());
    let mut previous: Option<&Block> = None;

    for block in blocks {
        if block.gas_used > block.gas_limit {
            warn!(
                block = block.number,
                gas_used = block.gas_used,
                gas_limit = block.gas_limit,
                "block reports gas used above its gas limit"
            );
        }

        let block_time = previous.map(|prev| {
            if block.timestamp < prev.timestamp {
                warn!(
                    block = block.number,
                    timestamp = block.timestamp,
                    previous_timestamp = prev.timestamp,
                    "block timestamp precedes its predecessor"
                );
            }
            block.timestamp.saturating_sub(prev.timestamp)
        });

        samples.push(BlockSample {
            number: block.number,
            timestamp: block.timestamp,
            tx_count: block.transaction_count,
            gas_used: block.gas_used,
            gas_limit: block.gas_limit,
            block_time,
            hash: block.hash,
            miner: block.miner,
        });
        previous = Some(block);
    }

    samples
}
