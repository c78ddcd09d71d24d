// src/constants.rs
use alloy::primitives::{address, Address, U256};

/// Aave V2 LendingPool
pub const AAVE_V2_ADDRESS: Address = address!("7d2768de32b0b80b7a3454c06bdac94a69ddc7a9");

/// Protocols whose native balance is checked after a flash loan.
pub const MONITORED_PROTOCOLS: [Address; 1] = [
    address!("4e68Ccd3E89f51C3074ca5072bbAC773960dFa36"), // Uniswap V3 USDC/ETH
];

/// Gas used at or above this counts as a heavy transaction.
pub const HIGH_GAS_THRESHOLD: U256 = U256::from_limbs([5_000_000, 0, 0, 0]);

/// 200 ETH in wei (200 * 10^18 = 0xad78ebc5ac6200000, spills into the second limb)
pub const BALANCE_DIFF_THRESHOLD: U256 =
    U256::from_limbs([0xd78e_bc5a_c620_0000, 0xa, 0, 0]);

pub const FLASH_LOAN_EVENT: &str = "event FlashLoan(address indexed target, address indexed initiator, address indexed asset, uint256 amount, uint256 premium, uint16 referralCode)";

pub const FINDING_NAME: &str = "Flash Loan with Loss";
pub const ALERT_ID: &str = "FORTA-5";
pub const PROTOCOL: &str = "aave";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_match_their_decimal_values() {
        assert_eq!(HIGH_GAS_THRESHOLD, U256::from(5_000_000u64));
        assert_eq!(
            BALANCE_DIFF_THRESHOLD,
            U256::from(200u64) * U256::from(10u64).pow(U256::from(18u64))
        );
        assert_eq!(BALANCE_DIFF_THRESHOLD.to_string(), "200000000000000000000");
    }

    #[test]
    fn event_signature_matches_decoder() {
        use crate::events::FlashLoan;
        use alloy::json_abi::Event;
        use alloy::sol_types::SolEvent;

        let event = Event::parse(FLASH_LOAN_EVENT).unwrap();
        assert_eq!(event.selector(), FlashLoan::SIGNATURE_HASH);
        assert_eq!(event.inputs.iter().filter(|p| p.indexed).count(), 3);
    }
}
