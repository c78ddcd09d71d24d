pub mod balance;
pub mod chain;
pub mod constants;
pub mod detector;
pub mod error;
pub mod events;
pub mod models;
pub mod rpc;

pub use chain::{BalanceFetcher, FetchError, ReceiptFetcher};
pub use detector::{DetectorConfig, FlashLoanDetector};
pub use error::DetectorError;
pub use events::{FlashLoan, TransactionData, TransactionEvent};
pub use models::{Finding, FindingSeverity, FindingType, FlashLoanLeg};
