//! External row handling tests
//!
//! Covers the validation boundaries for each sheet category, the month-label
//! and date parsing used to place transactions in time, correction-amount
//! extraction, and the difference-based initial stock behavior.

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::ledger::{average_consumption, current_stock, LedgerEntry};
use shared::models::TransactionType;
use shared::rows::{
    initial_stock_delta, is_placeholder_code, last_day_of_month, normalize_artis_code,
    parse_correction_amount, parse_flexible_date, parse_month_label,
};
use shared::validation::{
    validate_consumption_row, validate_correction_row, validate_purchase_row,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// The consumption ingestion kernel: a row of `["101", "100",
    /// "January 2024", ""]` becomes an OUT of 100 dated 2024-01-31 that
    /// counts toward the average; stock drops by 100 and the average for a
    /// single consumption month is the consumption itself.
    #[test]
    fn test_consumption_row_scenario() {
        let validation = validate_consumption_row("100", "January 2024");
        assert!(validation.is_valid());
        assert!(validation.warnings.is_empty());

        let date = parse_month_label("January 2024").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());

        let mut entries = vec![LedgerEntry {
            transaction_type: TransactionType::In,
            quantity: dec("500"),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            include_in_avg: false,
        }];
        let stock_before = current_stock(&entries);

        entries.push(LedgerEntry {
            transaction_type: TransactionType::Out,
            quantity: dec("100"),
            date,
            include_in_avg: true,
        });

        assert_eq!(current_stock(&entries), stock_before - dec("100"));
        assert_eq!(average_consumption(&entries), dec("100"));
    }

    /// Validator boundaries for consumption amounts
    #[test]
    fn test_consumption_amount_boundaries() {
        let negative = validate_consumption_row("-1", "January 2024");
        assert!(!negative.is_valid());
        assert!(negative.errors[0].contains("Negative consumption"));

        let high = validate_consumption_row("15000", "January 2024");
        assert!(high.is_valid());
        assert!(high.warnings[0].contains("Unusually high consumption"));

        let garbage = validate_consumption_row("abc", "January 2024");
        assert!(!garbage.is_valid());
        assert!(garbage.errors[0].contains("Invalid consumption amount"));
    }

    /// Correction extraction keeps the number and drops the commentary
    #[test]
    fn test_correction_extraction() {
        assert_eq!(
            parse_correction_amount("16 Stock Adjustment"),
            Some(dec("16"))
        );
        assert_eq!(parse_correction_amount("invalid"), None);

        let ok = validate_correction_row("16 Stock Adjustment", "", today());
        assert!(ok.is_valid());

        let bad = validate_correction_row("invalid", "", today());
        assert!(!bad.is_valid());
        assert!(bad.errors[0].contains("Invalid correction format"));
    }

    /// Purchase validation: zero is an error, not a warning
    #[test]
    fn test_purchase_rejects_zero() {
        let v = validate_purchase_row("2025-01-15", "0", today());
        assert!(!v.is_valid());
        assert!(v.errors[0].contains("must be positive"));
    }

    /// Future-dated purchases are rejected, not merely flagged
    #[test]
    fn test_purchase_future_date_is_error() {
        let v = validate_purchase_row("2026-12-31", "100", today());
        assert!(!v.is_valid());
        assert!(v.errors[0].contains("Date is in the future"));
    }

    /// A purchase exactly at the one-year horizon still passes
    #[test]
    fn test_purchase_at_horizon_passes() {
        let v = validate_purchase_row("2026-06-15", "100", today());
        assert!(v.is_valid());
    }

    /// Spreadsheet auto-formatting commas are stripped from codes
    #[test]
    fn test_code_normalization() {
        assert_eq!(normalize_artis_code("1,015"), "1015");
        assert_eq!(normalize_artis_code(" 901 "), "901");
    }

    /// Template markers never ingest
    #[test]
    fn test_placeholder_rows() {
        assert!(is_placeholder_code("Example: 101"));
        assert!(is_placeholder_code("Instructions:"));
        assert!(!is_placeholder_code("101"));
    }

    /// Re-applying an unchanged initial stock figure is a no-op
    #[test]
    fn test_initial_stock_idempotent() {
        // First application moves the stock
        let first = initial_stock_delta(dec("250"), dec("100"));
        assert_eq!(first, Some((TransactionType::In, dec("150"))));

        // After the ledger absorbs the movement the cache reads 250, and a
        // second application collapses to nothing
        let second = initial_stock_delta(dec("250"), dec("250"));
        assert_eq!(second, None);
    }

    /// Lowering the figure synthesizes an OUT of the difference
    #[test]
    fn test_initial_stock_decrease() {
        assert_eq!(
            initial_stock_delta(dec("80"), dec("100")),
            Some((TransactionType::Out, dec("20")))
        );
    }

    /// Month ends, including leap February
    #[test]
    fn test_month_end_dates() {
        assert_eq!(
            parse_month_label("February 2024"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            parse_month_label("February 2023"),
            NaiveDate::from_ymd_opt(2023, 2, 28)
        );
        assert_eq!(
            parse_month_label("December 2024"),
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    const MONTH_NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every month label parses to the last day of its month
        #[test]
        fn prop_month_label_parses_to_month_end(
            year in 1990i32..=2100,
            month_idx in 0usize..12
        ) {
            let label = format!("{} {}", MONTH_NAMES[month_idx], year);
            let parsed = parse_month_label(&label).unwrap();

            prop_assert_eq!(parsed.year(), year);
            prop_assert_eq!(parsed.month() as usize, month_idx + 1);
            prop_assert_eq!(Some(parsed), last_day_of_month(year, month_idx as u32 + 1));
            // The following day is the first of the next month
            let next = parsed.succ_opt().unwrap();
            prop_assert_eq!(next.day(), 1);
        }

        /// Correction extraction recovers the leading number exactly,
        /// whatever trails it
        #[test]
        fn prop_correction_prefix_roundtrip(
            cents in -5_000_000i64..=5_000_000,
            suffix in "[a-zA-Z][a-zA-Z ]{0,16}"
        ) {
            let amount = Decimal::new(cents, 2);
            let raw = format!("{} {}", amount, suffix);
            prop_assert_eq!(parse_correction_amount(&raw), Some(amount));
        }

        /// Normalized codes never contain commas and normalization is
        /// idempotent
        #[test]
        fn prop_code_normalization_idempotent(code in "[0-9A-Za-z, ]{0,12}") {
            let normalized = normalize_artis_code(&code);
            prop_assert!(!normalized.contains(','));
            prop_assert_eq!(normalize_artis_code(&normalized), normalized.clone());
        }

        /// Applying the synthesized delta always lands on the requested figure
        #[test]
        fn prop_initial_stock_delta_reaches_target(
            requested_cents in -1_000_000i64..=1_000_000,
            current_cents in -1_000_000i64..=1_000_000
        ) {
            let requested = Decimal::new(requested_cents, 2);
            let current = Decimal::new(current_cents, 2);

            match initial_stock_delta(requested, current) {
                None => prop_assert_eq!(requested, current),
                Some((TransactionType::In, qty)) => {
                    prop_assert!(qty > Decimal::ZERO);
                    prop_assert_eq!(current + qty, requested);
                }
                Some((TransactionType::Out, qty)) => {
                    prop_assert!(qty > Decimal::ZERO);
                    prop_assert_eq!(current - qty, requested);
                }
                Some((TransactionType::Correction, _)) => {
                    prop_assert!(false, "initial stock never synthesizes corrections");
                }
            }
        }

        /// Dotted dates round-trip through the parser
        #[test]
        fn prop_dotted_date_roundtrip(
            year in 2000i32..=2030,
            month in 1u32..=12,
            day in 1u32..=28
        ) {
            let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
            let dotted = date.format("%d.%m.%Y").to_string();
            prop_assert_eq!(parse_flexible_date(&dotted), Some(date));

            let iso = date.format("%Y-%m-%d").to_string();
            prop_assert_eq!(parse_flexible_date(&iso), Some(date));
        }

        /// Whole numbers extract whether or not text follows
        #[test]
        fn prop_bare_correction_numbers_extract(n in -99_999i64..=99_999) {
            let raw = n.to_string();
            prop_assert_eq!(parse_correction_amount(&raw), Some(Decimal::from(n)));
        }
    }
}
