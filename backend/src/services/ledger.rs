//! Ledger service: the transaction store and the product cache recompute
//!
//! The transaction table is the source of truth for stock. `current_stock`
//! and `avg_consumption` on the product row are caches, rewritten by a full
//! re-aggregation whenever the transaction set changes, never trusted
//! incrementally across restarts.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::ledger::{self, LedgerEntry};
use shared::models::TransactionType;

use crate::error::{AppError, AppResult};

/// Ledger service for manual entries and cache recomputation
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

/// A committed ledger transaction
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub product_id: Uuid,
    #[sqlx(rename = "type")]
    pub transaction_type: String,
    pub quantity: Decimal,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub include_in_avg: bool,
    pub sync_batch_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a manual transaction
#[derive(Debug, Deserialize)]
pub struct RecordTransactionInput {
    pub product_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: Decimal,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub include_in_avg: Option<bool>,
}

/// Cache fields produced by a recompute
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProductAggregates {
    pub current_stock: Decimal,
    pub avg_consumption: Decimal,
}

/// Row shape for the aggregate query
#[derive(Debug, FromRow)]
struct EntryRow {
    #[sqlx(rename = "type")]
    transaction_type: String,
    quantity: Decimal,
    date: NaiveDate,
    include_in_avg: bool,
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a manually entered transaction and recompute the product cache
    /// in the same database transaction.
    pub async fn record_transaction(
        &self,
        input: RecordTransactionInput,
    ) -> AppResult<Transaction> {
        match input.transaction_type {
            TransactionType::In | TransactionType::Out => {
                if input.quantity <= Decimal::ZERO {
                    return Err(AppError::Validation {
                        field: "quantity".to_string(),
                        message: "Quantity must be positive".to_string(),
                    });
                }
            }
            TransactionType::Correction => {
                if input.quantity.is_zero() {
                    return Err(AppError::Validation {
                        field: "quantity".to_string(),
                        message: "Correction quantity must be non-zero".to_string(),
                    });
                }
            }
        }

        let product_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(input.product_id)
                .fetch_one(&self.db)
                .await?;

        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());
        // The flag only counts for OUT movements
        let include_in_avg = input.include_in_avg.unwrap_or(false)
            && input.transaction_type == TransactionType::Out;

        let mut tx = self.db.begin().await?;

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (product_id, type, quantity, date, notes, include_in_avg)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, product_id, type, quantity, date, notes, include_in_avg,
                      sync_batch_id, created_at
            "#,
        )
        .bind(input.product_id)
        .bind(input.transaction_type.as_str())
        .bind(input.quantity.round_dp(2))
        .bind(date)
        .bind(&input.notes)
        .bind(include_in_avg)
        .fetch_one(&mut *tx)
        .await?;

        Self::recompute_in(&mut *tx, input.product_id, true).await?;

        tx.commit().await?;

        Ok(transaction)
    }

    /// Get all transactions for a product, newest first
    pub async fn get_transactions(&self, product_id: Uuid) -> AppResult<Vec<Transaction>> {
        let product_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(product_id)
                .fetch_one(&self.db)
                .await?;

        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, product_id, type, quantity, date, notes, include_in_avg,
                   sync_batch_id, created_at
            FROM transactions
            WHERE product_id = $1
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(transactions)
    }

    /// Recompute one product's cache fields on a fresh database transaction.
    ///
    /// Callable standalone so manual entry paths outside the sync engine
    /// trigger the identical recomputation.
    pub async fn recompute(&self, product_id: Uuid) -> AppResult<ProductAggregates> {
        let mut tx = self.db.begin().await?;
        let aggregates = Self::recompute_in(&mut *tx, product_id, true).await?;
        tx.commit().await?;
        Ok(aggregates)
    }

    /// Recompute one product's cache fields inside an open transaction.
    ///
    /// Always rewrites `current_stock`; rewrites `avg_consumption` when
    /// `update_avg` is set. Both are full re-aggregations over every
    /// transaction of the product, rounded to 2 decimals at the write.
    pub async fn recompute_in(
        conn: &mut PgConnection,
        product_id: Uuid,
        update_avg: bool,
    ) -> AppResult<ProductAggregates> {
        let rows = sqlx::query_as::<_, EntryRow>(
            "SELECT type, quantity, date, include_in_avg FROM transactions WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await?;

        let entries = rows
            .into_iter()
            .map(|r| {
                let transaction_type = TransactionType::parse(&r.transaction_type)
                    .ok_or_else(|| {
                        anyhow::anyhow!("unknown transaction type in ledger: {}", r.transaction_type)
                    })?;
                Ok(LedgerEntry {
                    transaction_type,
                    quantity: r.quantity,
                    date: r.date,
                    include_in_avg: r.include_in_avg,
                })
            })
            .collect::<Result<Vec<_>, anyhow::Error>>()?;

        let current_stock = ledger::current_stock(&entries).round_dp(2);
        let avg_consumption = ledger::average_consumption(&entries).round_dp(2);

        let result = if update_avg {
            sqlx::query(
                r#"
                UPDATE products
                SET current_stock = $1, avg_consumption = $2, updated_at = NOW()
                WHERE id = $3
                "#,
            )
            .bind(current_stock)
            .bind(avg_consumption)
            .bind(product_id)
            .execute(&mut *conn)
            .await?
        } else {
            sqlx::query(
                "UPDATE products SET current_stock = $1, updated_at = NOW() WHERE id = $2",
            )
            .bind(current_stock)
            .bind(product_id)
            .execute(&mut *conn)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(ProductAggregates {
            current_stock,
            avg_consumption,
        })
    }
}
