// src/events.rs
use alloy::primitives::{Address, Log, B256};
use alloy::rpc::types::TransactionReceipt;
use alloy::sol;
use alloy::sol_types::SolEvent;
use std::collections::HashSet;
use tracing::warn;

sol! {
    /// Aave V2 LendingPool flash loan
    #[derive(Debug, PartialEq, Eq)]
    event FlashLoan(
        address indexed target,
        address indexed initiator,
        address indexed asset,
        uint256 amount,
        uint256 premium,
        uint16 referralCode
    );
}

/// Read-only view of a mined transaction handed to the detector.
pub trait TransactionData {
    fn hash(&self) -> B256;

    fn block_number(&self) -> u64;

    /// Whether `address` took part in the transaction.
    fn involves(&self, address: &Address) -> bool;

    /// Logs whose first topic is `E`'s signature hash, decoded as `E`.
    fn filter_log<E: SolEvent>(&self) -> Vec<Log<E>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEvent {
    pub hash: B256,
    pub block_number: u64,
    pub addresses: HashSet<Address>,
    pub logs: Vec<Log>,
}

impl TransactionEvent {
    pub fn new(hash: B256, block_number: u64) -> Self {
        Self {
            hash,
            block_number,
            addresses: HashSet::new(),
            logs: Vec::new(),
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.addresses.insert(address);
        self
    }

    /// Adds a log and marks its emitter as involved.
    pub fn with_log(mut self, log: Log) -> Self {
        self.addresses.insert(log.address);
        self.logs.push(log);
        self
    }

    /// Builds the event from a mined receipt. Involved addresses are the
    /// sender, the recipient, any created contract and every log emitter.
    /// Returns `None` for receipts without a block number.
    ///
    /// Receipts carry no call trace, so a contract reached only through an
    /// internal call that emits no log is not in the set. A monitored
    /// protocol drained that way will not match.
    pub fn from_receipt(receipt: &TransactionReceipt) -> Option<Self> {
        let block_number = receipt.block_number?;
        let mut event = Self::new(receipt.transaction_hash, block_number).with_address(receipt.from);

        if let Some(to) = receipt.to {
            event = event.with_address(to);
        }
        if let Some(created) = receipt.contract_address {
            event = event.with_address(created);
        }
        for log in receipt.inner.logs() {
            event = event.with_log(log.inner.clone());
        }

        Some(event)
    }
}

impl TransactionData for TransactionEvent {
    fn hash(&self) -> B256 {
        self.hash
    }

    fn block_number(&self) -> u64 {
        self.block_number
    }

    fn involves(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    fn filter_log<E: SolEvent>(&self) -> Vec<Log<E>> {
        self.logs
            .iter()
            .filter(|log| log.topics().first() == Some(&E::SIGNATURE_HASH))
            .filter_map(|log| match E::decode_log(log) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!(
                        "Undecodable {} log from {} in tx {}: {}",
                        E::SIGNATURE,
                        log.address,
                        self.hash,
                        e
                    );
                    None
                }
            })
            .collect()
    }
}
