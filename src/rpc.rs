// src/rpc.rs
use alloy::eips::BlockId;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::transports::http::reqwest::Url;
use alloy::transports::TransportError;
use async_trait::async_trait;
use std::future::IntoFuture;
use std::time::Duration;
use tracing::{debug, info};

use crate::chain::{BalanceFetcher, FetchError, ReceiptFetcher};
use crate::events::TransactionEvent;

/// JSON-RPC backed chain access. Every call is bounded by `timeout`;
/// failures are returned, never retried here.
#[derive(Clone)]
pub struct ChainClient {
    provider: DynProvider,
    timeout: Duration,
}

impl ChainClient {
    pub fn connect_http(rpc_url: Url, timeout: Duration) -> Self {
        info!("📡 Connecting HTTP provider → {}", rpc_url);
        Self::new(ProviderBuilder::new().connect_http(rpc_url).erased(), timeout)
    }

    pub fn new(provider: DynProvider, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, FetchError>
    where
        F: IntoFuture<Output = Result<T, TransportError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(res) => res.map_err(FetchError::from),
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }

    /// Latest block number known to the node.
    pub async fn latest_block(&self) -> Result<u64, FetchError> {
        self.bounded(self.provider.get_block_number()).await
    }

    /// All mined transactions of a block as detector inputs, in block order.
    /// `None` when the node does not know the block yet.
    pub async fn block_transactions(
        &self,
        block_number: u64,
    ) -> Result<Option<Vec<TransactionEvent>>, FetchError> {
        let receipts = self
            .bounded(self.provider.get_block_receipts(BlockId::number(block_number)))
            .await?;

        Ok(receipts.map(|receipts| {
            debug!("Block {}: {} receipts", block_number, receipts.len());
            receipts
                .iter()
                .filter_map(TransactionEvent::from_receipt)
                .collect()
        }))
    }
}

#[async_trait]
impl ReceiptFetcher for ChainClient {
    async fn gas_used(&self, tx_hash: B256) -> Result<U256, FetchError> {
        let receipt = self
            .bounded(self.provider.get_transaction_receipt(tx_hash))
            .await?
            .ok_or(FetchError::ReceiptNotFound(tx_hash))?;
        Ok(U256::from(receipt.gas_used))
    }
}

#[async_trait]
impl BalanceFetcher for ChainClient {
    async fn balance_at(&self, address: Address, block_number: u64) -> Result<U256, FetchError> {
        self.bounded(
            self.provider
                .get_balance(address)
                .block_id(BlockId::number(block_number)),
        )
        .await
    }
}
