pub mod json_rpc;
pub mod registry;

use crate::Result;
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use mockall::automock;
use std::fmt;

pub use json_rpc::JsonRpcClient;
pub use registry::Validator as RegistryValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockTag {
    Latest,
    Number(u64),
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Number(number) => write!(f, "{number:#x}"),
        }
    }
}

/// A block as returned by the chain. `transactions` is only populated when
/// the block was requested with full transaction bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub timestamp: u64,
    pub gas_used: u64,
    pub gas_limit: u64,
    pub hash: B256,
    pub miner: Address,
    pub transaction_count: u64,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub hash: B256,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    /// Value in the chain's smallest denomination.
    pub value: U256,
}

/// Read-only view of the chain used to assemble dashboard snapshots.
#[automock]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Full validator set from the validator registry contract.
    async fn get_validators(&self, registry: Address) -> Result<Vec<RegistryValidator>>;

    /// Epoch of the next scheduled full DKG ceremony.
    async fn get_next_full_dkg_ceremony(&self, registry: Address) -> Result<u64>;

    async fn get_block_number(&self) -> Result<u64>;

    async fn get_block(&self, tag: BlockTag, full_transactions: bool) -> Result<Block>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_tags_render_as_rpc_params() {
        assert_eq!(BlockTag::Latest.to_string(), "latest");
        assert_eq!(BlockTag::Number(0).to_string(), "0x0");
        assert_eq!(BlockTag::Number(1_234).to_string(), "0x4d2");
    }
}
