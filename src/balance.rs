// src/balance.rs
use alloy::primitives::{Address, U256};

/// Native balance of an address as of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub address: Address,
    pub block_number: u64,
    pub balance: U256,
}

impl BalanceSnapshot {
    pub fn new(address: Address, block_number: u64, balance: U256) -> Self {
        Self {
            address,
            block_number,
            balance,
        }
    }
}

/// `previous - current` in wei, or `None` when the balance grew (a negative diff).
pub fn balance_loss(previous: &BalanceSnapshot, current: &BalanceSnapshot) -> Option<U256> {
    previous.balance.checked_sub(current.balance)
}
