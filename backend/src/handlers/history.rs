//! HTTP handlers for the sync history audit trail

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use shared::models::SyncHistory;

use crate::error::AppResult;
use crate::services::SyncHistoryService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListHistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// List sync batch records, newest first
pub async fn list_sync_history(
    State(state): State<AppState>,
    Query(query): Query<ListHistoryQuery>,
) -> AppResult<Json<Vec<SyncHistory>>> {
    let service = SyncHistoryService::new(state.db);
    let history = service.list(query.limit.clamp(1, 500)).await?;
    Ok(Json(history))
}

/// Get the record for one sync batch
pub async fn get_sync_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> AppResult<Json<SyncHistory>> {
    let service = SyncHistoryService::new(state.db);
    let record = service.get_by_batch(&batch_id).await?;
    Ok(Json(record))
}
