// src/chain.rs
use alloy::primitives::{Address, B256, U256};
use alloy::transports::TransportError;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rpc transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("no receipt found for transaction {0}")]
    ReceiptNotFound(B256),

    #[error("rpc call timed out after {0:?}")]
    Timeout(Duration),
}

/// Looks up how much gas a mined transaction consumed.
#[async_trait]
pub trait ReceiptFetcher: Send + Sync {
    async fn gas_used(&self, tx_hash: B256) -> Result<U256, FetchError>;
}

/// Looks up the native balance (wei) of an address as of a block.
#[async_trait]
pub trait BalanceFetcher: Send + Sync {
    async fn balance_at(&self, address: Address, block_number: u64) -> Result<U256, FetchError>;
}
