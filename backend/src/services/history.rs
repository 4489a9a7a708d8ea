//! Append-only audit log of sync batches
//!
//! One record per batch attempt, written on the success and the rollback
//! path alike, and never edited afterwards. History deliberately has no
//! foreign key into the transaction table: the batch id string is the only
//! linkage, so the trail survives even if transactions are later purged.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{SyncHistory, SyncStatus, SyncType};

use crate::error::{AppError, AppResult};

/// Sync history service
#[derive(Clone)]
pub struct SyncHistoryService {
    db: PgPool,
}

/// Row shape for sync_history reads
#[derive(Debug, FromRow)]
struct SyncHistoryRow {
    id: Uuid,
    sync_batch_id: String,
    sync_type: String,
    sync_date: DateTime<Utc>,
    item_count: i32,
    status: String,
    errors: Vec<String>,
    warnings: Vec<String>,
    metadata: Value,
    user_id: Option<Uuid>,
}

impl SyncHistoryRow {
    fn into_model(self) -> AppResult<SyncHistory> {
        let sync_type = SyncType::parse(&self.sync_type)
            .ok_or_else(|| anyhow::anyhow!("unknown sync type in history: {}", self.sync_type))?;
        let status = SyncStatus::parse(&self.status)
            .ok_or_else(|| anyhow::anyhow!("unknown sync status in history: {}", self.status))?;

        Ok(SyncHistory {
            id: self.id,
            sync_batch_id: self.sync_batch_id,
            sync_type,
            sync_date: self.sync_date,
            item_count: self.item_count,
            status,
            errors: self.errors,
            warnings: self.warnings,
            metadata: self.metadata,
            user_id: self.user_id,
        })
    }
}

impl SyncHistoryService {
    /// Create a new SyncHistoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append one batch record
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        &self,
        sync_batch_id: &str,
        sync_type: SyncType,
        item_count: i32,
        status: SyncStatus,
        errors: &[String],
        warnings: &[String],
        metadata: Value,
        user_id: Option<Uuid>,
    ) -> AppResult<SyncHistory> {
        let row = sqlx::query_as::<_, SyncHistoryRow>(
            r#"
            INSERT INTO sync_history
                (sync_batch_id, sync_type, sync_date, item_count, status, errors, warnings, metadata, user_id)
            VALUES ($1, $2, NOW(), $3, $4, $5, $6, $7, $8)
            RETURNING id, sync_batch_id, sync_type, sync_date, item_count, status,
                      errors, warnings, metadata, user_id
            "#,
        )
        .bind(sync_batch_id)
        .bind(sync_type.as_str())
        .bind(item_count)
        .bind(status.as_str())
        .bind(errors)
        .bind(warnings)
        .bind(metadata)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        row.into_model()
    }

    /// List batch records, newest first
    pub async fn list(&self, limit: i64) -> AppResult<Vec<SyncHistory>> {
        let rows = sqlx::query_as::<_, SyncHistoryRow>(
            r#"
            SELECT id, sync_batch_id, sync_type, sync_date, item_count, status,
                   errors, warnings, metadata, user_id
            FROM sync_history
            ORDER BY sync_date DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(SyncHistoryRow::into_model).collect()
    }

    /// Fetch the record for one batch id
    pub async fn get_by_batch(&self, sync_batch_id: &str) -> AppResult<SyncHistory> {
        let row = sqlx::query_as::<_, SyncHistoryRow>(
            r#"
            SELECT id, sync_batch_id, sync_type, sync_date, item_count, status,
                   errors, warnings, metadata, user_id
            FROM sync_history
            WHERE sync_batch_id = $1
            "#,
        )
        .bind(sync_batch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sync batch".to_string()))?;

        row.into_model()
    }
}
