//! HTTP handlers for spreadsheet sync, archive, and template endpoints
//!
//! Re-running a sync before the sheet is archived and cleared double-counts
//! its rows; callers are expected to archive after a successful sync.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::models::{SyncReport, SyncType};

use crate::error::{AppError, AppResult};
use crate::services::templates::PendingSummary;
use crate::services::{ArchiveService, SheetSyncEngine, TemplateService};
use crate::AppState;

/// Authentication is handled upstream; the initiating user, when known,
/// arrives as an `x-user-id` header and is stored for the audit trail only.
fn user_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
}

fn parse_category(category: &str) -> AppResult<SyncType> {
    SyncType::parse(category).ok_or_else(|| AppError::Validation {
        field: "category".to_string(),
        message: format!("Unknown sync category: {}", category),
    })
}

fn engine(state: &AppState) -> SheetSyncEngine<crate::external::GoogleSheetsClient> {
    SheetSyncEngine::new(
        state.db.clone(),
        state.sheets.clone(),
        state.config.sheets.clone(),
    )
}

/// Sync consumption rows from the external sheet
pub async fn sync_consumption(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<SyncReport>> {
    let report = engine(&state)
        .sync_consumption(user_id_from_headers(&headers))
        .await?;
    Ok(Json(report))
}

/// Sync purchase rows from the external sheet
pub async fn sync_purchases(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<SyncReport>> {
    let report = engine(&state)
        .sync_purchases(user_id_from_headers(&headers))
        .await?;
    Ok(Json(report))
}

/// Sync correction rows from the external sheet
pub async fn sync_corrections(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<SyncReport>> {
    let report = engine(&state)
        .sync_corrections(user_id_from_headers(&headers))
        .await?;
    Ok(Json(report))
}

/// Sync initial stock rows from the external sheet
pub async fn sync_initial_stock(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<SyncReport>> {
    let report = engine(&state)
        .sync_initial_stock(user_id_from_headers(&headers))
        .await?;
    Ok(Json(report))
}

/// Get counts of pending rows per category sheet
pub async fn get_pending_summary(
    State(state): State<AppState>,
) -> AppResult<Json<PendingSummary>> {
    let service = TemplateService::new(state.db.clone(), state.sheets.clone());
    let summary = service.pending_summary(&state.config.sheets).await?;
    Ok(Json(summary))
}

#[derive(Debug, Default, Deserialize)]
pub struct ArchiveRequest {
    pub archive_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ArchiveResponse {
    /// Name of the created archive tab; null when there was nothing to move
    pub archived_tab: Option<String>,
}

/// Archive a category sheet's rows to a new tab, then clear the live rows
pub async fn archive_sheet(
    State(state): State<AppState>,
    Path(category): Path<String>,
    body: Option<Json<ArchiveRequest>>,
) -> AppResult<Json<ArchiveResponse>> {
    let sync_type = parse_category(&category)?;
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let service = ArchiveService::new(state.sheets.clone());
    let archived_tab = service
        .archive_and_clear(
            state.config.sheets.spreadsheet_id(sync_type),
            request.archive_name.as_deref(),
        )
        .await?;

    Ok(Json(ArchiveResponse { archived_tab }))
}

/// List archive tabs for a category sheet, most recent first
pub async fn list_archives(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    let sync_type = parse_category(&category)?;
    let service = ArchiveService::new(state.sheets.clone());
    let archives = service
        .list_archives(state.config.sheets.spreadsheet_id(sync_type))
        .await?;
    Ok(Json(archives))
}

/// (Re)write the entry template for a category sheet
pub async fn setup_template(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> AppResult<Json<()>> {
    let sync_type = parse_category(&category)?;
    let service = TemplateService::new(state.db.clone(), state.sheets.clone());
    service.setup(&state.config.sheets, sync_type).await?;
    Ok(Json(()))
}
