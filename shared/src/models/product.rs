//! Product model, limited to the fields the ledger core touches

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product as seen by the ledger core.
///
/// `current_stock` and `avg_consumption` are derived caches: the transaction
/// table is the source of truth and both fields are overwritten in full on
/// every recompute. Product CRUD lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// External codes this product appears under in the spreadsheets
    pub artis_codes: Vec<String>,
    pub current_stock: Decimal,
    pub avg_consumption: Decimal,
}
