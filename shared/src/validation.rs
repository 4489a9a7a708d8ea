//! Per-category validation of external spreadsheet rows.
//!
//! Errors block a row from becoming a transaction; warnings are recorded for
//! the audit trail but never block. The rows are hand-typed by warehouse
//! staff, so "a bit too large" is common and legitimate.

use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;

use crate::rows::{month_label_has_shape, parse_correction_amount, parse_flexible_date};

/// Highest believable monthly consumption, in kg
pub const MAX_CONSUMPTION_PER_MONTH_KG: i64 = 10_000;
/// Highest believable single purchase, in kg
pub const MAX_PURCHASE_AMOUNT_KG: i64 = 50_000;
/// Highest believable correction magnitude, in kg
pub const MAX_CORRECTION_AMOUNT_KG: i64 = 5_000;
/// Purchases dated before this year raise a warning
pub const MIN_PURCHASE_YEAR: i32 = 2020;

/// Result of validating one row
#[derive(Debug, Clone, Default)]
pub struct RowValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl RowValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Dates more than a year out are rejected rather than flagged
fn max_acceptable_date(today: NaiveDate) -> NaiveDate {
    today + Months::new(12)
}

/// Validate a consumption row: amount plus the "<MonthName> <Year>" label.
pub fn validate_consumption_row(amount: &str, month_label: &str) -> RowValidation {
    let mut v = RowValidation::default();

    match Decimal::from_str(amount.trim()) {
        Err(_) => v
            .errors
            .push(format!("Invalid consumption amount: {amount}")),
        Ok(n) => {
            if n < Decimal::ZERO {
                v.errors
                    .push(format!("Negative consumption not allowed: {n} kg"));
            }
            if n > Decimal::from(MAX_CONSUMPTION_PER_MONTH_KG) {
                v.warnings.push(format!(
                    "Unusually high consumption: {n} kg (max expected: {MAX_CONSUMPTION_PER_MONTH_KG} kg)"
                ));
            }
            if n.is_zero() {
                v.warnings.push("Zero consumption recorded".to_string());
            }
        }
    }

    // A malformed label only warns; ingestion falls back to today
    if !month_label_has_shape(month_label) {
        v.warnings.push(format!("Invalid month format: {month_label}"));
    }

    v
}

/// Validate a purchase row: date and strictly positive amount.
pub fn validate_purchase_row(date: &str, amount: &str, today: NaiveDate) -> RowValidation {
    let mut v = RowValidation::default();

    match Decimal::from_str(amount.trim()) {
        Err(_) => v.errors.push(format!("Invalid purchase amount: {amount}")),
        Ok(n) => {
            if n <= Decimal::ZERO {
                v.errors
                    .push(format!("Purchase amount must be positive: {n} kg"));
            }
            if n > Decimal::from(MAX_PURCHASE_AMOUNT_KG) {
                v.warnings.push(format!(
                    "Unusually large purchase: {n} kg (max expected: {MAX_PURCHASE_AMOUNT_KG} kg)"
                ));
            }
        }
    }

    match parse_flexible_date(date) {
        None => v.errors.push(format!("Invalid date format: {date}")),
        Some(d) => {
            if d.year() < MIN_PURCHASE_YEAR {
                v.warnings.push(format!("Date is very old: {date}"));
            }
            if d > max_acceptable_date(today) {
                v.errors.push(format!("Date is in the future: {date}"));
            }
        }
    }

    v
}

/// Validate a correction row: signed amount with optional trailing text and
/// an optional application date.
pub fn validate_correction_row(correction: &str, date: &str, today: NaiveDate) -> RowValidation {
    let mut v = RowValidation::default();

    match parse_correction_amount(correction) {
        None => v
            .errors
            .push(format!("Invalid correction format: {correction}")),
        Some(n) => {
            if n.abs() > Decimal::from(MAX_CORRECTION_AMOUNT_KG) {
                v.warnings.push(format!(
                    "Large correction amount: {n} kg (max expected: ±{MAX_CORRECTION_AMOUNT_KG} kg)"
                ));
            }
            if n.is_zero() {
                v.warnings.push("Zero correction amount".to_string());
            }
        }
    }

    // Missing or unparseable dates are tolerated; ingestion falls back to today
    if !date.trim().is_empty() {
        if let Some(d) = parse_flexible_date(date) {
            if d > max_acceptable_date(today) {
                v.errors.push(format!("Date is in the future: {date}"));
            }
        }
    }

    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    // ========================================================================
    // Consumption
    // ========================================================================

    #[test]
    fn consumption_accepts_ordinary_amounts() {
        let v = validate_consumption_row("100", "January 2024");
        assert!(v.is_valid());
        assert!(v.warnings.is_empty());
    }

    #[test]
    fn consumption_rejects_negative_amounts() {
        let v = validate_consumption_row("-1", "January 2024");
        assert!(!v.is_valid());
        assert!(v.errors[0].contains("Negative consumption"));
    }

    #[test]
    fn consumption_warns_on_unusually_high_amounts() {
        let v = validate_consumption_row("15000", "January 2024");
        assert!(v.is_valid());
        assert!(v.warnings[0].contains("Unusually high consumption"));
    }

    #[test]
    fn consumption_rejects_non_numeric_amounts() {
        let v = validate_consumption_row("abc", "January 2024");
        assert!(!v.is_valid());
        assert!(v.errors[0].contains("Invalid consumption amount"));
    }

    #[test]
    fn consumption_warns_on_zero() {
        let v = validate_consumption_row("0", "January 2024");
        assert!(v.is_valid());
        assert!(v.warnings[0].contains("Zero consumption"));
    }

    #[test]
    fn consumption_warns_on_bad_month_label() {
        let v = validate_consumption_row("100", "sometime soon");
        assert!(v.is_valid());
        assert!(v.warnings[0].contains("Invalid month format"));
    }

    // ========================================================================
    // Purchases
    // ========================================================================

    #[test]
    fn purchase_accepts_ordinary_rows() {
        let v = validate_purchase_row("2025-01-15", "500", today());
        assert!(v.is_valid());
        assert!(v.warnings.is_empty());
    }

    #[test]
    fn purchase_rejects_zero_and_negative_amounts() {
        assert!(!validate_purchase_row("2025-01-15", "0", today()).is_valid());
        assert!(!validate_purchase_row("2025-01-15", "-5", today()).is_valid());
    }

    #[test]
    fn purchase_warns_on_very_large_amounts() {
        let v = validate_purchase_row("2025-01-15", "60000", today());
        assert!(v.is_valid());
        assert!(v.warnings[0].contains("Unusually large purchase"));
    }

    #[test]
    fn purchase_rejects_unparseable_dates() {
        let v = validate_purchase_row("not a date", "500", today());
        assert!(!v.is_valid());
        assert!(v.errors[0].contains("Invalid date format"));
    }

    #[test]
    fn purchase_accepts_dotted_dates() {
        assert!(validate_purchase_row("15.1.2025", "500", today()).is_valid());
    }

    #[test]
    fn purchase_warns_on_pre_2020_dates() {
        let v = validate_purchase_row("2019-12-31", "500", today());
        assert!(v.is_valid());
        assert!(v.warnings[0].contains("Date is very old"));
    }

    #[test]
    fn purchase_rejects_far_future_dates() {
        let v = validate_purchase_row("2027-01-01", "500", today());
        assert!(!v.is_valid());
        assert!(v.errors[0].contains("Date is in the future"));
    }

    // ========================================================================
    // Corrections
    // ========================================================================

    #[test]
    fn correction_extracts_amount_with_trailing_text() {
        let v = validate_correction_row("16 Stock Adjustment", "", today());
        assert!(v.is_valid());
        assert!(v.warnings.is_empty());
    }

    #[test]
    fn correction_rejects_non_numeric_prefix() {
        let v = validate_correction_row("invalid", "", today());
        assert!(!v.is_valid());
        assert!(v.errors[0].contains("Invalid correction format"));
    }

    #[test]
    fn correction_warns_on_large_magnitudes_either_sign() {
        assert!(validate_correction_row("6000", "", today()).warnings[0]
            .contains("Large correction amount"));
        assert!(validate_correction_row("-6000", "", today()).warnings[0]
            .contains("Large correction amount"));
    }

    #[test]
    fn correction_warns_on_zero_but_stays_valid() {
        let v = validate_correction_row("0", "", today());
        assert!(v.is_valid());
        assert!(v.warnings[0].contains("Zero correction"));
    }

    #[test]
    fn correction_tolerates_missing_or_junk_dates() {
        assert!(validate_correction_row("16", "", today()).is_valid());
        assert!(validate_correction_row("16", "garbage", today()).is_valid());
    }

    #[test]
    fn correction_rejects_far_future_dates() {
        let v = validate_correction_row("16", "2027-06-16", today());
        assert!(!v.is_valid());
        assert!(v.errors[0].contains("Date is in the future"));
    }
}
