use crate::{
    Result,
    dashboard::{DashboardSnapshot, history::BlockSample, transactions::RecentTx},
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::{Table, Tabled, builder::Builder as TableBuilder, settings::Style};

/// Output format for the `snapshot` command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[value(name = "table")]
    Table,
    #[value(name = "json")]
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::JsonPretty => write!(f, "json-pretty"),
        }
    }
}

#[derive(Tabled)]
struct ValidatorRow {
    #[tabled(rename = "Index")]
    index: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Inbound")]
    inbound: String,
}

#[derive(Tabled)]
struct BlockRow {
    #[tabled(rename = "Block")]
    number: u64,
    #[tabled(rename = "Txs")]
    tx_count: u64,
    #[tabled(rename = "Gas Used")]
    gas_used: u64,
    #[tabled(rename = "Gas %")]
    gas_pct: String,
    #[tabled(rename = "Block Time")]
    block_time: String,
}

impl From<&BlockSample> for BlockRow {
    fn from(sample: &BlockSample) -> Self {
        Self {
            number: sample.number,
            tx_count: sample.tx_count,
            gas_used: sample.gas_used,
            gas_pct: or_dash(sample.gas_utilization().map(|u| format!("{:.2}", u * 100.0))),
            block_time: or_dash(sample.block_time.map(|bt| format!("{bt}s"))),
        }
    }
}

#[derive(Tabled)]
struct TxRow {
    #[tabled(rename = "Hash")]
    hash: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Block")]
    block_number: u64,
}

impl From<&RecentTx> for TxRow {
    fn from(tx: &RecentTx) -> Self {
        Self {
            hash: tx.hash.to_string(),
            from: tx.from.to_string(),
            to: tx
                .to
                .map_or_else(|| "contract creation".to_string(), |to| to.to_string()),
            value: tx.value.clone(),
            block_number: tx.block_number,
        }
    }
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

pub fn render_snapshot(snapshot: &DashboardSnapshot, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(snapshot)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(snapshot)?),
        OutputFormat::Table => Ok(render_tables(snapshot)),
    }
}

fn render_tables(snapshot: &DashboardSnapshot) -> String {
    let epoch = &snapshot.epoch;
    let network = &snapshot.network;

    let mut summary = TableBuilder::default();
    summary.push_record(["Metric", "Value"]);
    summary.push_record(["Block height".to_string(), snapshot.block_height.to_string()]);
    summary.push_record([
        "Epoch".to_string(),
        format!(
            "{} ({}/{} blocks, {}%)",
            epoch.current_epoch, epoch.progress, epoch.epoch_length, epoch.progress_pct
        ),
    ]);
    summary.push_record([
        "Next full DKG".to_string(),
        format!(
            "epoch {} (in {} epochs)",
            epoch.next_full_dkg_epoch, epoch.epochs_until_dkg
        ),
    ]);
    summary.push_record([
        "Validators".to_string(),
        format!(
            "{} active / {} inactive / {} total ({}%)",
            snapshot.active_validators,
            snapshot.inactive_validators,
            snapshot.total_validators,
            snapshot.active_validator_pct
        ),
    ]);
    summary.push_record([
        "Block time".to_string(),
        or_dash(network.block_time.map(|bt| format!("{bt}s"))),
    ]);
    summary.push_record(["TPS".to_string(), or_dash(network.tps.map(|t| t.to_string()))]);
    summary.push_record([
        "Peak TPS".to_string(),
        or_dash(network.peak_tps.map(|t| t.to_string())),
    ]);
    summary.push_record([
        "Gas utilization".to_string(),
        or_dash(network.gas_utilization.map(|g| format!("{g}%"))),
    ]);
    summary.push_record([
        "Transactions in window".to_string(),
        network.total_transactions.to_string(),
    ]);
    summary.push_record(["Captured at".to_string(), snapshot.captured_at.to_rfc3339()]);

    let validator_rows = snapshot.validator_set();
    let validators: Vec<ValidatorRow> = validator_rows
        .display_order()
        .into_iter()
        .map(|record| ValidatorRow {
            index: record.index,
            name: record.name.clone().unwrap_or_else(|| "-".to_string()),
            status: if record.active { "active" } else { "inactive" },
            address: record.validator_address.to_string(),
            inbound: record.inbound_address.clone(),
        })
        .collect();

    // newest block first
    let blocks: Vec<BlockRow> = snapshot.block_history.iter().rev().map(BlockRow::from).collect();
    let txs: Vec<TxRow> = snapshot.recent_transactions.iter().map(TxRow::from).collect();

    let style = Style::psql().remove_horizontals();
    let summary = summary.build().with(style.clone()).to_string();
    let validators = Table::new(validators).with(style.clone()).to_string();
    let blocks = Table::new(blocks).with(style.clone()).to_string();
    let txs = Table::new(txs).with(style).to_string();

    format!(
        "{summary}\n\nValidators\n{validators}\n\nBlocks\n{blocks}\n\nRecent transactions\n{txs}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{EpochState, NetworkMetrics, ValidatorRecord};
    use alloy_primitives::{Address, B256};
    use chrono::Utc;
    use std::num::NonZeroU64;

    fn snapshot() -> DashboardSnapshot {
        DashboardSnapshot {
            block_height: 1_805,
            epoch: EpochState::derive(1_805, NonZeroU64::new(900).unwrap(), 4),
            recent_epochs: Vec::new(),
            total_validators: 1,
            active_validators: 1,
            inactive_validators: 0,
            active_validator_pct: 100.0,
            validators: vec![ValidatorRecord {
                index: 0,
                public_key: B256::ZERO.to_string(),
                active: true,
                validator_address: Address::repeat_byte(0x11),
                inbound_address: "10.0.0.1:8000".to_string(),
                outbound_address: "10.0.0.1:8001".to_string(),
                name: Some("TEMPO 1".to_string()),
            }],
            network: NetworkMetrics {
                tps: Some(12.5),
                ..Default::default()
            },
            block_history: Vec::new(),
            recent_transactions: Vec::new(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn test_table_output_mentions_key_metrics() {
        let out = render_snapshot(&snapshot(), OutputFormat::Table).unwrap();
        assert!(out.contains("1805"));
        assert!(out.contains("TEMPO 1"));
        assert!(out.contains("12.5"));
        assert!(out.contains("Recent transactions"));
    }

    #[test]
    fn test_json_output_is_camel_case() {
        let out = render_snapshot(&snapshot(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["epoch"]["currentEpoch"], 3);
        assert_eq!(value["validators"][0]["name"], "TEMPO 1");
    }
}
