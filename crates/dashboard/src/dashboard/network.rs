use crate::dashboard::history::BlockSample;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Spread of per-block times across the window, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTimeStats {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    /// Sample standard deviation, `None` with fewer than two block times.
    pub std_dev: Option<f64>,
    pub samples: usize,
}

/// Aggregate statistics over the rolling block window.
///
/// Every metric that cannot be derived from the window (too few samples,
/// zero elapsed time, zero gas limit) is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkMetrics {
    /// Average seconds per block over the trailing sub-window
    pub block_time: Option<f64>,
    /// Transactions per second over the trailing sub-window
    pub tps: Option<f64>,
    /// Highest single-block transactions per second in the window
    pub peak_tps: Option<f64>,
    /// Gas utilization percentage of the latest block
    pub gas_utilization: Option<f64>,
    pub latest_block_tx_count: u64,
    pub latest_block_gas_used: Option<u64>,
    pub latest_block_gas_limit: Option<u64>,
    pub avg_gas_per_block: u64,
    pub total_transactions: u64,
    pub block_time_stats: Option<BlockTimeStats>,
    pub avg_gas_utilization: Option<f64>,
    pub peak_gas_utilization: Option<f64>,
    pub avg_tx_per_block: u64,
    pub max_tx_per_block: u64,
}

impl NetworkMetrics {
    /// Compute metrics over oldest-first `samples`.
    pub fn compute(samples: &[BlockSample], tps_window: usize) -> Self {
        let recent = &samples[samples.len().saturating_sub(tps_window)..];
        let (block_time, tps) = recent_rates(recent);
        let latest = samples.last();

        let total_transactions = samples.iter().map(|s| s.tx_count).sum();
        // a block with no gas limit counts as idle in the window average
        let gas_utilizations: Vec<f64> = samples
            .iter()
            .map(|s| gas_utilization_pct(s.gas_used, s.gas_limit).unwrap_or(0.0))
            .collect();

        Self {
            block_time,
            tps,
            peak_tps: peak_tps(samples),
            gas_utilization: latest.and_then(|s| gas_utilization_pct(s.gas_used, s.gas_limit)),
            latest_block_tx_count: latest.map_or(0, |s| s.tx_count),
            latest_block_gas_used: latest.map(|s| s.gas_used),
            latest_block_gas_limit: latest.map(|s| s.gas_limit),
            avg_gas_per_block: rounded_mean(samples.iter().map(|s| s.gas_used)),
            total_transactions,
            block_time_stats: block_time_stats(samples),
            avg_gas_utilization: (!gas_utilizations.is_empty())
                .then(|| round_to(Statistics::mean(gas_utilizations.iter()), 2)),
            peak_gas_utilization: samples
                .iter()
                .filter_map(|s| gas_utilization_pct(s.gas_used, s.gas_limit))
                .reduce(f64::max),
            avg_tx_per_block: rounded_mean(samples.iter().map(|s| s.tx_count)),
            max_tx_per_block: samples.iter().map(|s| s.tx_count).max().unwrap_or(0),
        }
    }
}

/// `round(used / limit * 10000) / 100`, `None` for a zero limit.
pub fn gas_utilization_pct(gas_used: u64, gas_limit: u64) -> Option<f64> {
    if gas_limit == 0 {
        return None;
    }
    Some((gas_used as f64 / gas_limit as f64 * 10_000.0).round() / 100.0)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn recent_rates(recent: &[BlockSample]) -> (Option<f64>, Option<f64>) {
    let (Some(first), Some(last)) = (recent.first(), recent.last()) else {
        return (None, None);
    };
    let elapsed = last.timestamp.saturating_sub(first.timestamp);
    if recent.len() < 2 || elapsed == 0 {
        return (None, None);
    }

    let block_time = elapsed as f64 / (recent.len() - 1) as f64;
    let transactions: u64 = recent.iter().map(|s| s.tx_count).sum();
    let tps = transactions as f64 / elapsed as f64;

    (Some(round_to(block_time, 2)), Some(round_to(tps, 1)))
}

fn peak_tps(samples: &[BlockSample]) -> Option<f64> {
    samples
        .iter()
        .filter_map(|s| match s.block_time {
            Some(bt) if bt > 0 => Some(s.tx_count as f64 / bt as f64),
            _ => None,
        })
        .reduce(f64::max)
        .map(|tps| round_to(tps, 1))
}

fn block_time_stats(samples: &[BlockSample]) -> Option<BlockTimeStats> {
    let times: Vec<u64> = samples.iter().filter_map(|s| s.block_time).collect();
    let min = *times.iter().min()?;
    let max = *times.iter().max()?;

    let values: Vec<f64> = times.iter().map(|&t| t as f64).collect();
    let std_dev = (values.len() > 1).then(|| round_to(Statistics::std_dev(values.iter()), 2));

    Some(BlockTimeStats {
        min,
        max,
        mean: round_to(Statistics::mean(values.iter()), 2),
        std_dev,
        samples: times.len(),
    })
}

fn rounded_mean(values: impl ExactSizeIterator<Item = u64>) -> u64 {
    let count = values.len();
    if count == 0 {
        return 0;
    }
    let sum: u128 = values.map(u128::from).sum();
    (sum as f64 / count as f64).round() as u64
}
