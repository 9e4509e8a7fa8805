use crate::{
    Error, Result,
    client::{Block, BlockTag, ChainClient, RegistryValidator, Transaction, registry},
};
use alloy_primitives::{Address, B256, Bytes, U64, U256};
use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tracing::{debug, trace};
use url::Url;

/// `ChainClient` over HTTP JSON-RPC 2.0.
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: Url, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn request<R: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<Option<R>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!(id, method, "sending json-rpc request");

        let response = self.http.post(self.url.clone()).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(id, method, %status, body = %body, "json-rpc request rejected");
            return Err(Error::HttpStatus { status, body });
        }

        response.json::<Reply<R>>().await?.into_result()
    }

    async fn eth_call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?
            .ok_or_else(|| Error::InvalidResponse("eth_call returned no result".to_string()))
    }
}

#[async_trait]
impl ChainClient for JsonRpcClient {
    async fn get_validators(&self, registry: Address) -> Result<Vec<RegistryValidator>> {
        let output = self
            .eth_call(registry, registry::get_validators_calldata())
            .await?;
        registry::decode_validators(&output)
    }

    async fn get_next_full_dkg_ceremony(&self, registry: Address) -> Result<u64> {
        let output = self
            .eth_call(registry, registry::get_next_full_dkg_ceremony_calldata())
            .await?;
        registry::decode_next_full_dkg_ceremony(&output)
    }

    async fn get_block_number(&self) -> Result<u64> {
        let number: U64 = self
            .request("eth_blockNumber", json!([]))
            .await?
            .ok_or_else(|| {
                Error::InvalidResponse("eth_blockNumber returned no result".to_string())
            })?;
        Ok(number.to())
    }

    async fn get_block(&self, tag: BlockTag, full_transactions: bool) -> Result<Block> {
        let block: RpcBlock = self
            .request(
                "eth_getBlockByNumber",
                json!([tag.to_string(), full_transactions]),
            )
            .await?
            .ok_or(Error::BlockNotFound(tag))?;
        Ok(block.into())
    }
}

#[derive(Debug, Deserialize)]
struct Reply<R> {
    result: Option<R>,
    error: Option<ReplyError>,
}

#[derive(Debug, Deserialize)]
struct ReplyError {
    code: i64,
    message: String,
}

impl<R> Reply<R> {
    fn into_result(self) -> Result<Option<R>> {
        match self.error {
            Some(ReplyError { code, message }) => Err(Error::JsonRpc { code, message }),
            None => Ok(self.result),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlock {
    number: U64,
    timestamp: U64,
    gas_used: U64,
    gas_limit: U64,
    hash: B256,
    miner: Address,
    transactions: RpcBlockTransactions,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RpcBlockTransactions {
    Full(Vec<RpcTransaction>),
    Hashes(Vec<B256>),
}

#[derive(Debug, Deserialize)]
struct RpcTransaction {
    hash: B256,
    from: Address,
    to: Option<Address>,
    value: U256,
}

impl From<RpcBlock> for Block {
    fn from(block: RpcBlock) -> Self {
        let (transaction_count, transactions) = match block.transactions {
            RpcBlockTransactions::Full(transactions) => {
                let transactions: Vec<Transaction> = transactions
                    .into_iter()
                    .map(|tx| Transaction {
                        hash: tx.hash,
                        from: tx.from,
                        to: tx.to,
                        value: tx.value,
                    })
                    .collect();
                (transactions.len() as u64, transactions)
            }
            RpcBlockTransactions::Hashes(hashes) => (hashes.len() as u64, Vec::new()),
        };

        Self {
            number: block.number.to(),
            timestamp: block.timestamp.to(),
            gas_used: block.gas_used.to(),
            gas_limit: block.gas_limit.to(),
            hash: block.hash,
            miner: block.miner,
            transaction_count,
            transactions,
        }
    }
}
