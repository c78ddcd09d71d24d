// src/error.rs
use alloy::primitives::{Address, B256};
use thiserror::Error;

use crate::chain::FetchError;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("failed to fetch gas used for transaction {tx_hash}")]
    GasLookup {
        tx_hash: B256,
        #[source]
        source: FetchError,
    },

    #[error("failed to fetch balance of {address} at block {block_number}")]
    BalanceLookup {
        address: Address,
        block_number: u64,
        #[source]
        source: FetchError,
    },

    #[error("transaction {0} is in the genesis block, there is no previous balance to compare")]
    GenesisBlock(B256),
}
