// src/detector.rs
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, Log, U256};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::balance::{balance_loss, BalanceSnapshot};
use crate::chain::{BalanceFetcher, ReceiptFetcher};
use crate::constants::{
    AAVE_V2_ADDRESS, ALERT_ID, BALANCE_DIFF_THRESHOLD, FINDING_NAME, HIGH_GAS_THRESHOLD,
    MONITORED_PROTOCOLS, PROTOCOL,
};
use crate::error::DetectorError;
use crate::events::{FlashLoan, TransactionData};
use crate::models::{Finding, FindingSeverity, FindingType, FlashLoanLeg};

/// Fixed inputs of the detector. `Default` uses the compiled-in constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    pub lending_protocol: Address,
    /// Checked in order; the first one present in a transaction wins.
    pub monitored_protocols: Vec<Address>,
    pub gas_threshold: U256,
    pub balance_loss_threshold: U256,
    pub alert_id: String,
    pub protocol: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            lending_protocol: AAVE_V2_ADDRESS,
            monitored_protocols: MONITORED_PROTOCOLS.to_vec(),
            gas_threshold: HIGH_GAS_THRESHOLD,
            balance_loss_threshold: BALANCE_DIFF_THRESHOLD,
            alert_id: ALERT_ID.to_string(),
            protocol: PROTOCOL.to_string(),
        }
    }
}

/// Flags flash loans from the lending protocol that coincide with a large
/// native balance drop in a monitored protocol and heavy gas usage.
///
/// Only the matched monitored protocol's balance is compared; the lending
/// protocol itself is never checked for loss.
pub struct FlashLoanDetector {
    config: DetectorConfig,
    receipts: Arc<dyn ReceiptFetcher>,
    balances: Arc<dyn BalanceFetcher>,
}

impl FlashLoanDetector {
    pub fn new(
        config: DetectorConfig,
        receipts: Arc<dyn ReceiptFetcher>,
        balances: Arc<dyn BalanceFetcher>,
    ) -> Self {
        Self {
            config,
            receipts,
            balances,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Evaluates one transaction, returning zero or one finding.
    /// Lookup failures are returned as errors, never as an empty result.
    pub async fn handle_transaction<T>(&self, tx: &T) -> Result<Vec<Finding>, DetectorError>
    where
        T: TransactionData + Sync + ?Sized,
    {
        Ok(self.evaluate(tx).await?.into_iter().collect())
    }

    async fn evaluate<T>(&self, tx: &T) -> Result<Option<Finding>, DetectorError>
    where
        T: TransactionData + Sync + ?Sized,
    {
        let tx_hash = tx.hash();

        // Step 1: lending protocol involvement, no I/O
        if !tx.involves(&self.config.lending_protocol) {
            return Ok(None);
        }

        // Step 2: flash loan logs
        let loans = tx.filter_log::<FlashLoan>();
        if loans.is_empty() {
            debug!("tx {}: lending protocol involved but no FlashLoan logs", tx_hash);
            return Ok(None);
        }

        // Step 3: first watch-listed protocol present
        let Some(protocol_address) = self.matched_protocol(tx) else {
            debug!("tx {}: {} flash loan(s), no monitored protocol", tx_hash, loans.len());
            return Ok(None);
        };

        // Step 4: gas usage
        let gas_used = self
            .receipts
            .gas_used(tx_hash)
            .await
            .map_err(|source| DetectorError::GasLookup { tx_hash, source })?;
        if gas_used < self.config.gas_threshold {
            debug!("tx {}: gas used {} below threshold", tx_hash, gas_used);
            return Ok(None);
        }

        // Step 5: balance drop across the block
        let block_number = tx.block_number();
        let previous_block = block_number
            .checked_sub(1)
            .ok_or(DetectorError::GenesisBlock(tx_hash))?;
        let (current, previous) = tokio::try_join!(
            self.snapshot(protocol_address, block_number),
            self.snapshot(protocol_address, previous_block),
        )?;

        let threshold = self.config.balance_loss_threshold;
        let Some(balance_diff) = balance_loss(&previous, &current).filter(|diff| *diff >= threshold)
        else {
            debug!(
                "tx {}: {} balance {} -> {} does not reach loss threshold",
                tx_hash, protocol_address, previous.balance, current.balance
            );
            return Ok(None);
        };

        warn!(
            "🚨 tx {}: flash loan with {} ETH loss for {}",
            tx_hash,
            format_ether(balance_diff),
            protocol_address
        );

        Ok(Some(self.build_finding(protocol_address, balance_diff, &loans)))
    }

    fn matched_protocol<T>(&self, tx: &T) -> Option<Address>
    where
        T: TransactionData + ?Sized,
    {
        self.config
            .monitored_protocols
            .iter()
            .find(|address| tx.involves(address))
            .copied()
    }

    async fn snapshot(
        &self,
        address: Address,
        block_number: u64,
    ) -> Result<BalanceSnapshot, DetectorError> {
        let balance = self
            .balances
            .balance_at(address, block_number)
            .await
            .map_err(|source| DetectorError::BalanceLookup {
                address,
                block_number,
                source,
            })?;
        Ok(BalanceSnapshot::new(address, block_number, balance))
    }

    fn build_finding(
        &self,
        protocol_address: Address,
        balance_diff: U256,
        loans: &[Log<FlashLoan>],
    ) -> Finding {
        let loans_json = Value::Array(
            loans
                .iter()
                .map(|log| FlashLoanLeg::from(log).to_json())
                .collect(),
        )
        .to_string();

        let mut metadata = BTreeMap::new();
        metadata.insert("protocolAddress".to_string(), protocol_address.to_string());
        metadata.insert("balanceDiff".to_string(), balance_diff.to_string());
        metadata.insert("loans".to_string(), loans_json);

        Finding {
            name: FINDING_NAME.to_string(),
            description: format!(
                "Flash Loan with loss of {} detected for {}",
                balance_diff, protocol_address
            ),
            alert_id: self.config.alert_id.clone(),
            protocol: self.config.protocol.clone(),
            severity: FindingSeverity::High,
            finding_type: FindingType::Suspicious,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_compiled_constants() {
        let config = DetectorConfig::default();
        assert_eq!(config.lending_protocol, AAVE_V2_ADDRESS);
        assert_eq!(config.monitored_protocols, MONITORED_PROTOCOLS.to_vec());
        assert_eq!(config.gas_threshold, U256::from(5_000_000u64));
        assert_eq!(config.alert_id, "FORTA-5");
        assert_eq!(config.protocol, "aave");
    }
}
