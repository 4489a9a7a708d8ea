//! Route definitions for the Artis inventory backend

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Spreadsheet sync, archive, and template management
        .nest("/sheets", sheet_routes())
        // Manual ledger entry
        .nest("/transactions", transaction_routes())
        // Per-product ledger views and recompute
        .nest("/products", product_routes())
        // Sync audit trail
        .nest("/sync-history", history_routes())
}

/// Spreadsheet sync and maintenance routes
fn sheet_routes() -> Router<AppState> {
    Router::new()
        .route("/sync/consumption", post(handlers::sync_consumption))
        .route("/sync/purchases", post(handlers::sync_purchases))
        .route("/sync/corrections", post(handlers::sync_corrections))
        .route("/sync/initial-stock", post(handlers::sync_initial_stock))
        .route("/pending", get(handlers::get_pending_summary))
        .route("/archive/:category", post(handlers::archive_sheet))
        .route("/archives/:category", get(handlers::list_archives))
        .route("/templates/:category", post(handlers::setup_template))
}

/// Manual ledger entry routes
fn transaction_routes() -> Router<AppState> {
    Router::new().route("/", post(handlers::record_transaction))
}

/// Product ledger routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:product_id/transactions",
            get(handlers::get_product_transactions),
        )
        .route("/:product_id/recompute", post(handlers::recompute_product))
}

/// Sync history routes
fn history_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sync_history))
        .route("/:batch_id", get(handlers::get_sync_batch))
}
