// src/models.rs
use alloy::primitives::Log;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::events::FlashLoan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingSeverity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingType {
    Info,
    Suspicious,
    Degraded,
    Exploit,
}

/// Alert emitted for a transaction that matched the detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub name: String,
    pub description: String,
    pub alert_id: String,
    pub protocol: String,
    pub severity: FindingSeverity,
    #[serde(rename = "type")]
    pub finding_type: FindingType,
    pub metadata: BTreeMap<String, String>,
}

/// One decoded FlashLoan log as it appears in `metadata.loans`.
/// Amounts are decimal strings so wei values keep full precision in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashLoanLeg {
    pub address: String,
    pub target: String,
    pub initiator: String,
    pub asset: String,
    pub amount: String,
    pub premium: String,
    pub referral_code: u16,
}

impl FlashLoanLeg {
    /// Same shape as the derived `Serialize` output.
    pub fn to_json(&self) -> Value {
        json!({
            "address": self.address,
            "target": self.target,
            "initiator": self.initiator,
            "asset": self.asset,
            "amount": self.amount,
            "premium": self.premium,
            "referralCode": self.referral_code,
        })
    }
}

impl From<&Log<FlashLoan>> for FlashLoanLeg {
    fn from(log: &Log<FlashLoan>) -> Self {
        let loan = &log.data;
        Self {
            address: log.address.to_string(),
            target: loan.target.to_string(),
            initiator: loan.initiator.to_string(),
            asset: loan.asset.to_string(),
            amount: loan.amount.to_string(),
            premium: loan.premium.to_string(),
            referral_code: loan.referralCode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finding_serializes_with_alert_field_names() {
        let finding = Finding {
            name: "n".into(),
            description: "d".into(),
            alert_id: "FORTA-5".into(),
            protocol: "aave".into(),
            severity: FindingSeverity::High,
            finding_type: FindingType::Suspicious,
            metadata: BTreeMap::from([("balanceDiff".to_string(), "1".to_string())]),
        };

        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["alertId"], "FORTA-5");
        assert_eq!(json["type"], "Suspicious");
        assert_eq!(json["severity"], "High");
        assert_eq!(json["metadata"]["balanceDiff"], "1");

        let back: Finding = serde_json::from_value(json).unwrap();
        assert_eq!(back, finding);
    }

    #[test]
    fn leg_json_matches_derived_shape() {
        let leg = FlashLoanLeg {
            address: "0xa".into(),
            target: "0xb".into(),
            initiator: "0xc".into(),
            asset: "0xd".into(),
            amount: "1000000000000000000000".into(),
            premium: "9".into(),
            referral_code: 7,
        };

        assert_eq!(leg.to_json(), serde_json::to_value(&leg).unwrap());
        let back: FlashLoanLeg = serde_json::from_value(leg.to_json()).unwrap();
        assert_eq!(back, leg);
    }
}
