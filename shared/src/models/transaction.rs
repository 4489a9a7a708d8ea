//! Ledger transaction models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger transaction types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Stock received (purchases, initial-stock top-ups)
    In,
    /// Stock consumed or shipped
    Out,
    /// Signed adjustment outside normal movement; the quantity carries its sign
    Correction,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::In => "IN",
            TransactionType::Out => "OUT",
            TransactionType::Correction => "CORRECTION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(TransactionType::In),
            "OUT" => Some(TransactionType::Out),
            "CORRECTION" => Some(TransactionType::Correction),
            _ => None,
        }
    }
}

/// A draft ledger entry, not yet committed to the store.
///
/// `quantity` is non-negative for `IN`/`OUT` (the sign is implied by the
/// type); for `CORRECTION` the sign is meaningful and preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub product_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: Decimal,
    /// Business-effective date of the event, not the insertion time
    pub date: NaiveDate,
    pub notes: Option<String>,
    /// Only meaningful for `OUT`: counts toward the rolling average
    pub include_in_avg: bool,
    /// Batch that created this entry; `None` for manual entries
    pub sync_batch_id: Option<String>,
}
