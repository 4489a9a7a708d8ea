//! HTTP handlers for manual ledger entry and product recomputation

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::ledger::{ProductAggregates, RecordTransactionInput, Transaction};
use crate::services::LedgerService;
use crate::AppState;

/// Record a manually entered transaction
pub async fn record_transaction(
    State(state): State<AppState>,
    Json(input): Json<RecordTransactionInput>,
) -> AppResult<Json<Transaction>> {
    let service = LedgerService::new(state.db);
    let transaction = service.record_transaction(input).await?;
    Ok(Json(transaction))
}

/// Get all transactions for a product
pub async fn get_product_transactions(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Vec<Transaction>>> {
    let service = LedgerService::new(state.db);
    let transactions = service.get_transactions(product_id).await?;
    Ok(Json(transactions))
}

/// Recompute a product's stock and average-consumption cache from its
/// transactions. Exposed so the product CRUD side can trigger the same
/// recomputation the sync engine uses.
pub async fn recompute_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductAggregates>> {
    let service = LedgerService::new(state.db);
    let aggregates = service.recompute(product_id).await?;
    Ok(Json(aggregates))
}
