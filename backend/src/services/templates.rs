//! Entry templates for the external sheets, and the pending-row summary
//!
//! Templates carry the headers and the instruction rows the sync engine
//! later skips as placeholders. Consumption and initial-stock templates are
//! pre-seeded with one row per product so staff only fill in the figures.

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;

use shared::models::SyncType;
use shared::rows::is_placeholder_code;

use crate::config::SheetsConfig;
use crate::error::AppResult;
use crate::external::SheetsApi;

/// Template and summary operations over the category sheets
pub struct TemplateService<S: SheetsApi> {
    db: PgPool,
    sheets: S,
}

/// Count of filled, ingestible rows waiting in each sheet
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PendingSummary {
    pub consumption: usize,
    pub purchases: usize,
    pub corrections: usize,
    #[serde(rename = "initialStock")]
    pub initial_stock: usize,
}

impl<S: SheetsApi> TemplateService<S> {
    /// Create a new TemplateService instance
    pub fn new(db: PgPool, sheets: S) -> Self {
        Self { db, sheets }
    }

    /// (Re)write the entry template for one category sheet
    pub async fn setup(&self, config: &SheetsConfig, sync_type: SyncType) -> AppResult<()> {
        let rows = match sync_type {
            SyncType::Consumption => self.consumption_template().await?,
            SyncType::Purchases => purchases_template(),
            SyncType::Corrections => corrections_template(),
            SyncType::InitialStock => self.initial_stock_template().await?,
        };

        self.sheets
            .update(config.spreadsheet_id(sync_type), "Sheet1!A1", &rows)
            .await?;

        tracing::info!(sheet = sync_type.as_str(), "entry template written");
        Ok(())
    }

    /// Header plus one row per product, current month pre-filled
    async fn consumption_template(&self) -> AppResult<Vec<Vec<String>>> {
        let current_month = Utc::now().format("%B %Y").to_string();
        let mut rows = vec![header(&["Artis Code", "Consumption (kg)", "Month", "Notes"])];

        for (codes,) in self.products().await? {
            rows.push(vec![
                codes.first().cloned().unwrap_or_default(),
                String::new(),
                current_month.clone(),
                String::new(),
            ]);
        }
        Ok(rows)
    }

    /// Header plus one row per product, seeded with the cached stock
    async fn initial_stock_template(&self) -> AppResult<Vec<Vec<String>>> {
        let today = Utc::now().date_naive().to_string();
        let mut rows = vec![header(&["Artis Code", "Initial Stock (kg)", "Date", "Notes"])];

        let products = sqlx::query_as::<_, (Vec<String>, rust_decimal::Decimal)>(
            "SELECT artis_codes, current_stock FROM products ORDER BY artis_codes",
        )
        .fetch_all(&self.db)
        .await?;

        for (codes, current_stock) in products {
            rows.push(vec![
                codes.first().cloned().unwrap_or_default(),
                current_stock.to_string(),
                today.clone(),
                "Opening balance".to_string(),
            ]);
        }
        Ok(rows)
    }

    async fn products(&self) -> AppResult<Vec<(Vec<String>,)>> {
        Ok(sqlx::query_as::<_, (Vec<String>,)>(
            "SELECT artis_codes FROM products ORDER BY artis_codes",
        )
        .fetch_all(&self.db)
        .await?)
    }

    /// Count rows with the required fields filled in, per category, without
    /// ingesting anything.
    pub async fn pending_summary(&self, config: &SheetsConfig) -> AppResult<PendingSummary> {
        let consumption = self
            .sheets
            .read(&config.consumption_id, "Sheet1!A2:B10000")
            .await?;
        let purchases = self
            .sheets
            .read(&config.purchases_id, "Sheet1!A2:C10000")
            .await?;
        let corrections = self
            .sheets
            .read(&config.corrections_id, "Sheet1!A2:B10000")
            .await?;
        let initial_stock = self
            .sheets
            .read(&config.initial_stock_id, "Sheet1!A2:B10000")
            .await?;

        Ok(PendingSummary {
            consumption: count_filled(&consumption, 2),
            purchases: count_filled(&purchases, 3),
            corrections: count_filled(&corrections, 2),
            initial_stock: count_filled(&initial_stock, 2),
        })
    }
}

fn header(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

/// A row counts as pending when its first `required` cells are non-empty and
/// it is not a template placeholder.
fn count_filled(rows: &[Vec<String>], required: usize) -> usize {
    rows.iter()
        .filter(|row| {
            let code = row.first().map(String::as_str).unwrap_or("");
            !code.trim().is_empty()
                && !is_placeholder_code(code)
                && (0..required).all(|i| {
                    row.get(i).map(|c| !c.trim().is_empty()).unwrap_or(false)
                })
        })
        .count()
}

fn purchases_template() -> Vec<Vec<String>> {
    [
        vec!["Artis Code", "Date", "Amount (kg)", "Supplier", "Notes"],
        vec!["Example: 101", "2025-01-15", "500", "", "PO #123"],
        vec!["", "", "", "", ""],
        vec!["Instructions:", "", "", "", ""],
        vec!["1. Enter date as YYYY-MM-DD or DD.MM.YYYY", "", "", "", ""],
        vec!["2. One row per purchase transaction", "", "", "", ""],
        vec!["3. Multiple purchases for same product are OK", "", "", "", ""],
    ]
    .into_iter()
    .map(|row| header(&row))
    .collect()
}

fn corrections_template() -> Vec<Vec<String>> {
    [
        vec!["Artis Code", "Correction Amount", "Type", "Date Applied", "Reason"],
        vec!["Example: 101", "+50", "Stock Adjustment", "2025-01-15", "Found extra stock"],
        vec!["Example: 102", "-30", "Damaged Goods", "2025-01-15", "Water damage"],
        vec!["", "", "", "", ""],
        vec!["Instructions:", "", "", "", ""],
        vec!["1. Use + for adding stock (e.g., +100)", "", "", "", ""],
        vec!["2. Use - for removing stock (e.g., -50)", "", "", "", ""],
        vec!["3. Date Applied is when the correction should be recorded", "", "", "", ""],
        vec!["4. Always provide a reason for tracking", "", "", "", ""],
    ]
    .into_iter()
    .map(|row| header(&row))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn counts_only_filled_non_placeholder_rows() {
        let rows = vec![
            row(&["101", "50"]),
            row(&["102", ""]),
            row(&["", "10"]),
            row(&["Example: 101", "500"]),
            row(&["Instructions:", ""]),
            row(&["103", "75"]),
        ];
        assert_eq!(count_filled(&rows, 2), 2);
    }

    #[test]
    fn short_rows_do_not_count() {
        let rows = vec![row(&["101"])];
        assert_eq!(count_filled(&rows, 2), 0);
    }
}
