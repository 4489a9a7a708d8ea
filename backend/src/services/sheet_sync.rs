//! Batch ingestion of the external spreadsheets into the ledger.
//!
//! Each category sync follows the same skeleton: fresh batch id, fresh
//! product cache, read the sheet, process rows in source order (row problems
//! are collected, they never abort the batch), then bulk-insert the drafts
//! and recompute every touched product inside one database transaction. An
//! audit record is written whether the batch commits or rolls back.
//!
//! Re-running a sync against an unarchived, unchanged sheet double-counts:
//! there is no cross-batch deduplication. Idempotency is the caller's
//! responsibility via the archive-then-clear flow.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{NewTransaction, SyncReport, SyncStatus, SyncType, TransactionType};
use shared::rows::{
    initial_stock_delta, is_placeholder_code, normalize_artis_code, parse_correction_amount,
    parse_flexible_date, parse_month_label,
};
use shared::validation::{
    validate_consumption_row, validate_correction_row, validate_purchase_row,
};

use crate::config::SheetsConfig;
use crate::error::{AppError, AppResult};
use crate::external::SheetsApi;
use crate::services::history::SyncHistoryService;
use crate::services::ledger::LedgerService;

/// The source has no reliable row count, so reads use a bounded but
/// generously large range.
const CONSUMPTION_RANGE: &str = "Sheet1!A2:D10000";
const PURCHASES_RANGE: &str = "Sheet1!A2:E10000";
const CORRECTIONS_RANGE: &str = "Sheet1!A2:E10000";
const INITIAL_STOCK_RANGE: &str = "Sheet1!A2:D10000";

/// Batch sync engine over an injected spreadsheet collaborator
pub struct SheetSyncEngine<S: SheetsApi> {
    db: PgPool,
    sheets: S,
    config: SheetsConfig,
}

/// Product identity resolved from an external code, plus the cached stock
/// the initial-stock difference is taken against.
#[derive(Debug, Clone, Copy)]
struct CachedProduct {
    id: Uuid,
    current_stock: Decimal,
}

/// Cell accessor tolerating ragged rows
fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("").trim()
}

impl<S: SheetsApi> SheetSyncEngine<S> {
    /// Create a new engine instance
    pub fn new(db: PgPool, sheets: S, config: SheetsConfig) -> Self {
        Self { db, sheets, config }
    }

    /// Human-diagnosable batch id: category, UTC timestamp, random suffix
    fn generate_batch_id(sync_type: SyncType) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "{}-{}-{}",
            sync_type.as_str(),
            Utc::now().format("%Y%m%dT%H%M%SZ"),
            &suffix[..6]
        )
    }

    /// Full reload of the code-to-product map. Rebuilt per batch; a stale
    /// cache across a long-running batch is a worse trade than the reload.
    async fn load_product_cache(&self) -> AppResult<HashMap<String, CachedProduct>> {
        let rows = sqlx::query_as::<_, (Uuid, Vec<String>, Decimal)>(
            "SELECT id, artis_codes, current_stock FROM products",
        )
        .fetch_all(&self.db)
        .await?;

        let mut cache = HashMap::new();
        for (id, codes, current_stock) in rows {
            for code in codes {
                cache.insert(code, CachedProduct { id, current_stock });
            }
        }
        Ok(cache)
    }

    /// Sync monthly consumption rows: `[code, amount, month label, notes]`.
    /// Each valid row becomes an `OUT` transaction dated to the last day of
    /// the labelled month and counted toward the rolling average.
    pub async fn sync_consumption(&self, user_id: Option<Uuid>) -> AppResult<SyncReport> {
        let batch_id = Self::generate_batch_id(SyncType::Consumption);
        let cache = self.load_product_cache().await?;
        let rows = self
            .sheets
            .read(&self.config.consumption_id, CONSUMPTION_RANGE)
            .await?;
        let today = Utc::now().date_naive();

        tracing::info!(batch_id = %batch_id, rows = rows.len(), "processing consumption rows");

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut drafts = Vec::new();

        for (i, row) in rows.iter().enumerate() {
            let row_no = i + 2;
            let code_raw = cell(row, 0);
            let amount = cell(row, 1);
            let month = cell(row, 2);
            let notes = cell(row, 3);

            if code_raw.is_empty() || is_placeholder_code(code_raw) || amount.is_empty() {
                continue;
            }
            let code = normalize_artis_code(code_raw);

            let validation = validate_consumption_row(amount, month);
            if !validation.is_valid() {
                errors.push(format!(
                    "Row {} ({}): {}",
                    row_no,
                    code,
                    validation.errors.join(", ")
                ));
                continue;
            }
            if !validation.warnings.is_empty() {
                warnings.push(format!(
                    "Row {} ({}): {}",
                    row_no,
                    code,
                    validation.warnings.join(", ")
                ));
            }

            let Some(product) = cache.get(&code) else {
                errors.push(format!("Row {}: Product not found: {}", row_no, code));
                continue;
            };
            let Ok(quantity) = Decimal::from_str(amount) else {
                continue;
            };

            let date = parse_month_label(month).unwrap_or(today);
            let notes = if notes.is_empty() {
                let label = if month.is_empty() {
                    today.format("%B %Y").to_string()
                } else {
                    month.to_string()
                };
                format!("Monthly consumption for {}", label)
            } else {
                notes.to_string()
            };

            drafts.push(NewTransaction {
                product_id: product.id,
                transaction_type: TransactionType::Out,
                quantity: quantity.round_dp(2),
                date,
                notes: Some(notes),
                include_in_avg: true,
                sync_batch_id: Some(batch_id.clone()),
            });
        }

        self.commit_batch(
            SyncType::Consumption,
            batch_id,
            rows.len(),
            drafts,
            errors,
            warnings,
            user_id,
        )
        .await
    }

    /// Sync purchase rows: `[code, date, amount, supplier, notes]`.
    /// Each valid row becomes an `IN` transaction on the purchase date.
    pub async fn sync_purchases(&self, user_id: Option<Uuid>) -> AppResult<SyncReport> {
        let batch_id = Self::generate_batch_id(SyncType::Purchases);
        let cache = self.load_product_cache().await?;
        let rows = self
            .sheets
            .read(&self.config.purchases_id, PURCHASES_RANGE)
            .await?;
        let today = Utc::now().date_naive();

        tracing::info!(batch_id = %batch_id, rows = rows.len(), "processing purchase rows");

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut drafts = Vec::new();

        for (i, row) in rows.iter().enumerate() {
            let row_no = i + 2;
            let code_raw = cell(row, 0);
            let date_raw = cell(row, 1);
            let amount = cell(row, 2);
            let supplier = cell(row, 3);
            let notes = cell(row, 4);

            if code_raw.is_empty() || is_placeholder_code(code_raw) {
                continue;
            }
            if amount.is_empty() || date_raw.is_empty() {
                continue;
            }
            let code = normalize_artis_code(code_raw);

            let validation = validate_purchase_row(date_raw, amount, today);
            if !validation.is_valid() {
                errors.push(format!(
                    "Row {} ({}): {}",
                    row_no,
                    code,
                    validation.errors.join(", ")
                ));
                continue;
            }
            if !validation.warnings.is_empty() {
                warnings.push(format!(
                    "Row {} ({}): {}",
                    row_no,
                    code,
                    validation.warnings.join(", ")
                ));
            }

            let Some(product) = cache.get(&code) else {
                errors.push(format!("Row {}: Product not found: {}", row_no, code));
                continue;
            };
            let (Ok(quantity), Some(date)) =
                (Decimal::from_str(amount), parse_flexible_date(date_raw))
            else {
                continue;
            };

            let mut note = String::new();
            if !supplier.is_empty() {
                note.push_str(&format!("Supplier: {}. ", supplier));
            }
            note.push_str(notes);
            let note = note.trim().to_string();

            drafts.push(NewTransaction {
                product_id: product.id,
                transaction_type: TransactionType::In,
                quantity: quantity.round_dp(2),
                date,
                notes: (!note.is_empty()).then_some(note),
                include_in_avg: false,
                sync_batch_id: Some(batch_id.clone()),
            });
        }

        self.commit_batch(
            SyncType::Purchases,
            batch_id,
            rows.len(),
            drafts,
            errors,
            warnings,
            user_id,
        )
        .await
    }

    /// Sync correction rows: `[code, signed amount with optional suffix text,
    /// type, date applied, reason]`. The sign is preserved on the
    /// `CORRECTION` transaction; rows extracting to exactly zero are dropped
    /// silently since they have no ledger effect.
    pub async fn sync_corrections(&self, user_id: Option<Uuid>) -> AppResult<SyncReport> {
        let batch_id = Self::generate_batch_id(SyncType::Corrections);
        let cache = self.load_product_cache().await?;
        let rows = self
            .sheets
            .read(&self.config.corrections_id, CORRECTIONS_RANGE)
            .await?;
        let today = Utc::now().date_naive();

        tracing::info!(batch_id = %batch_id, rows = rows.len(), "processing correction rows");

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut drafts = Vec::new();

        for (i, row) in rows.iter().enumerate() {
            let row_no = i + 2;
            let code_raw = cell(row, 0);
            let correction = cell(row, 1);
            let date_raw = cell(row, 3);
            let reason = cell(row, 4);

            if code_raw.is_empty() || is_placeholder_code(code_raw) || correction.is_empty() {
                continue;
            }
            let code = normalize_artis_code(code_raw);

            let validation = validate_correction_row(correction, date_raw, today);
            if !validation.is_valid() {
                errors.push(format!(
                    "Row {} ({}): {}",
                    row_no,
                    code,
                    validation.errors.join(", ")
                ));
                continue;
            }
            if !validation.warnings.is_empty() {
                warnings.push(format!(
                    "Row {} ({}): {}",
                    row_no,
                    code,
                    validation.warnings.join(", ")
                ));
            }

            let Some(product) = cache.get(&code) else {
                errors.push(format!("Row {}: Product not found: {}", row_no, code));
                continue;
            };
            let Some(amount) = parse_correction_amount(correction) else {
                continue;
            };
            // A zero correction has no ledger effect
            if amount.is_zero() {
                continue;
            }

            let date = parse_flexible_date(date_raw).unwrap_or(today);

            let sign = if amount > Decimal::ZERO { "+" } else { "" };
            let mut note = format!("CORRECTION: {}{} kg.", sign, amount);
            if !reason.is_empty() {
                note.push(' ');
                note.push_str(reason);
            }

            drafts.push(NewTransaction {
                product_id: product.id,
                transaction_type: TransactionType::Correction,
                quantity: amount.round_dp(2),
                date,
                notes: Some(note),
                include_in_avg: false,
                sync_batch_id: Some(batch_id.clone()),
            });
        }

        self.commit_batch(
            SyncType::Corrections,
            batch_id,
            rows.len(),
            drafts,
            errors,
            warnings,
            user_id,
        )
        .await
    }

    /// Sync initial stock rows: `[code, requested stock, date, notes]`.
    ///
    /// Not a raw row-to-transaction mapping: the requested figure is diffed
    /// against the product's cached stock and a single `IN`/`OUT` movement
    /// of the difference is synthesized. An unchanged row is a no-op, so
    /// re-applying the sheet is idempotent.
    pub async fn sync_initial_stock(&self, user_id: Option<Uuid>) -> AppResult<SyncReport> {
        let batch_id = Self::generate_batch_id(SyncType::InitialStock);
        let cache = self.load_product_cache().await?;
        let rows = self
            .sheets
            .read(&self.config.initial_stock_id, INITIAL_STOCK_RANGE)
            .await?;
        let today = Utc::now().date_naive();

        tracing::info!(batch_id = %batch_id, rows = rows.len(), "processing initial stock rows");

        let mut errors = Vec::new();
        let mut drafts = Vec::new();

        for (i, row) in rows.iter().enumerate() {
            let row_no = i + 2;
            let code_raw = cell(row, 0);
            let requested_raw = cell(row, 1);
            let date_raw = cell(row, 2);
            let notes = cell(row, 3);

            if code_raw.is_empty() || is_placeholder_code(code_raw) || requested_raw.is_empty() {
                continue;
            }
            let code = normalize_artis_code(code_raw);

            let Ok(requested) = Decimal::from_str(requested_raw) else {
                errors.push(format!(
                    "Row {} ({}): Invalid initial stock amount: {}",
                    row_no, code, requested_raw
                ));
                continue;
            };

            let Some(product) = cache.get(&code) else {
                errors.push(format!("Row {}: Product not found: {}", row_no, code));
                continue;
            };

            let Some((transaction_type, quantity)) =
                initial_stock_delta(requested, product.current_stock)
            else {
                continue;
            };

            let date = parse_flexible_date(date_raw).unwrap_or(today);
            let mut note = format!("INITIAL STOCK: Set to {} kg.", requested);
            if !notes.is_empty() {
                note.push(' ');
                note.push_str(notes);
            }

            drafts.push(NewTransaction {
                product_id: product.id,
                transaction_type,
                quantity: quantity.round_dp(2),
                date,
                notes: Some(note),
                include_in_avg: false,
                sync_batch_id: Some(batch_id.clone()),
            });
        }

        self.commit_batch(
            SyncType::InitialStock,
            batch_id,
            rows.len(),
            drafts,
            errors,
            Vec::new(),
            user_id,
        )
        .await
    }

    /// Commit the batch and write its audit record.
    ///
    /// Bulk insert plus every per-product recompute happen in one database
    /// transaction: either all of it persists or none of it does. The
    /// history record is written on both paths, after the outcome is known.
    #[allow(clippy::too_many_arguments)]
    async fn commit_batch(
        &self,
        sync_type: SyncType,
        batch_id: String,
        rows_read: usize,
        drafts: Vec<NewTransaction>,
        errors: Vec<String>,
        warnings: Vec<String>,
        user_id: Option<Uuid>,
    ) -> AppResult<SyncReport> {
        let touched: HashSet<Uuid> = drafts.iter().map(|d| d.product_id).collect();
        // Purchases and corrections cannot move the average; skip the rewrite
        let update_avg = matches!(sync_type, SyncType::Consumption | SyncType::InitialStock);
        let history = SyncHistoryService::new(self.db.clone());
        let metadata = json!({ "rows_processed": rows_read });

        match self.apply(&drafts, &touched, update_avg).await {
            Ok(()) => {
                let status = if errors.is_empty() {
                    SyncStatus::Completed
                } else {
                    SyncStatus::Failed
                };
                history
                    .record(
                        &batch_id,
                        sync_type,
                        drafts.len() as i32,
                        status,
                        &errors,
                        &warnings,
                        metadata,
                        user_id,
                    )
                    .await?;

                tracing::info!(
                    batch_id = %batch_id,
                    added = drafts.len(),
                    products = touched.len(),
                    errors = errors.len(),
                    warnings = warnings.len(),
                    "sync batch committed"
                );

                Ok(SyncReport {
                    added: drafts.len(),
                    errors,
                    warnings,
                })
            }
            Err(e) => {
                tracing::error!(batch_id = %batch_id, error = %e, "sync batch rolled back");

                let mut errors = errors;
                let message = e.to_string();
                errors.push(format!("Batch commit failed: {}", message));
                // The rollback already happened; the audit trail still gets
                // its record before the error propagates.
                history
                    .record(
                        &batch_id,
                        sync_type,
                        0,
                        SyncStatus::Failed,
                        &errors,
                        &warnings,
                        metadata,
                        user_id,
                    )
                    .await?;

                Err(AppError::SyncFailed { batch_id, message })
            }
        }
    }

    /// Bulk insert all drafts, then recompute each touched product, inside
    /// one database transaction. Recomputation runs strictly after the
    /// insert so it sees the whole batch.
    async fn apply(
        &self,
        drafts: &[NewTransaction],
        touched: &HashSet<Uuid>,
        update_avg: bool,
    ) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        if !drafts.is_empty() {
            let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
                "INSERT INTO transactions \
                 (product_id, type, quantity, date, notes, include_in_avg, sync_batch_id) ",
            );
            builder.push_values(drafts, |mut b, d| {
                b.push_bind(d.product_id)
                    .push_bind(d.transaction_type.as_str())
                    .push_bind(d.quantity)
                    .push_bind(d.date)
                    .push_bind(d.notes.as_deref())
                    .push_bind(d.include_in_avg)
                    .push_bind(d.sync_batch_id.as_deref());
            });
            builder.build().execute(&mut *tx).await?;
        }

        for product_id in touched {
            LedgerService::recompute_in(&mut *tx, *product_id, update_avg).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_ids_carry_category_and_are_unique() {
        let a = SheetSyncEngine::<crate::external::GoogleSheetsClient>::generate_batch_id(
            SyncType::Consumption,
        );
        let b = SheetSyncEngine::<crate::external::GoogleSheetsClient>::generate_batch_id(
            SyncType::Consumption,
        );
        assert!(a.starts_with("consumption-"));
        assert_ne!(a, b);
    }

    #[test]
    fn cell_tolerates_ragged_rows() {
        let row = vec!["101".to_string(), " 50 ".to_string()];
        assert_eq!(cell(&row, 0), "101");
        assert_eq!(cell(&row, 1), "50");
        assert_eq!(cell(&row, 3), "");
    }
}
