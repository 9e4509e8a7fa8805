#![allow(dead_code)]

use alloy_primitives::{Address, B256, U256};
use chain_dashboard::{
    Error, RetryPolicy,
    client::{Block, BlockTag, MockChainClient, RegistryValidator, Transaction},
    dashboard::{
        DashboardConfig, history::HistoryConfig, transactions::RecentTxConfig,
        validators::KnownValidator,
    },
};
use std::{num::NonZeroU64, time::Duration};

pub const REGISTRY: Address = Address::repeat_byte(0x56);

/// Dashboard config with fast retries and no batch pause
pub fn test_config() -> DashboardConfig {
    DashboardConfig {
        registry: REGISTRY,
        epoch_length: NonZeroU64::new(900).unwrap(),
        history: HistoryConfig {
            depth: 10,
            batch_size: 4,
            batch_pause: Duration::ZERO,
            full_tx_depth: 3,
        },
        tps_window: 10,
        recent_tx: RecentTxConfig {
            max_count: 20,
            source_blocks: 3,
            native_decimals: 18,
        },
        retry: RetryPolicy::new(4, Duration::from_millis(1)),
        known_validators: vec![KnownValidator {
            address: Address::repeat_byte(0xa1),
            name: "TEMPO 1".to_string(),
        }],
    }
}

pub fn rate_limited() -> Error {
    Error::JsonRpc {
        code: 429,
        message: "Too Many Requests".to_string(),
    }
}

/// Block with `tx_count` transactions, two seconds after its parent.
/// Transaction bodies are only attached when `full` is set.
pub fn block(number: u64, tx_count: usize, full: bool) -> Block {
    let transactions = if full {
        (0..tx_count)
            .map(|i| Transaction {
                hash: B256::left_padding_from(&(number * 1_000 + i as u64).to_be_bytes()),
                from: Address::repeat_byte(0x01),
                to: Some(Address::repeat_byte(0x02)),
                value: U256::from(250_000_000_000_000_000u128),
            })
            .collect()
    } else {
        Vec::new()
    };

    Block {
        number,
        timestamp: 1_750_000_000 + number * 2,
        gas_used: 6_000_000,
        gas_limit: 30_000_000,
        hash: B256::with_last_byte(number as u8),
        miner: Address::repeat_byte(0xa1),
        transaction_count: tx_count as u64,
        transactions,
    }
}

pub fn validator(index: u64, active: bool) -> RegistryValidator {
    RegistryValidator {
        publicKey: B256::repeat_byte(0x10 + index as u8),
        inboundAddress: format!("192.168.0.{index}:8000"),
        outboundAddress: format!("192.168.0.{index}:8001"),
        active,
        validatorAddress: Address::repeat_byte(0xa0 + index as u8),
        index,
    }
}

/// Healthy chain at `head` where block `n` carries `tx_counts(n)` transactions.
pub fn mock_chain(head: u64, tx_counts: fn(u64) -> usize) -> MockChainClient {
    let mut client = MockChainClient::new();
    client
        .expect_get_validators()
        .returning(|_| Ok(vec![validator(2, false), validator(0, true), validator(1, true)]));
    client
        .expect_get_next_full_dkg_ceremony()
        .returning(|_| Ok(6));
    client
        .expect_get_block_number()
        .returning(move || Ok(head));
    client.expect_get_block().returning(move |tag, full| {
        let number = match tag {
            BlockTag::Latest => head,
            BlockTag::Number(n) => n,
        };
        Ok(block(number, tx_counts(number), full))
    });
    client
}
