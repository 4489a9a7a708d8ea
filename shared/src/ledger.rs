//! Pure ledger arithmetic: current stock and rolling average consumption.
//!
//! Both figures are recomputed from the full transaction set rather than
//! maintained incrementally, so the product cache is always reproducible
//! from the transaction log alone, including after out-of-band corrections.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::models::TransactionType;

/// The slice of a committed transaction the aggregates need
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    pub transaction_type: TransactionType,
    pub quantity: Decimal,
    pub date: NaiveDate,
    pub include_in_avg: bool,
}

/// Signed contribution of one entry to current stock
pub fn signed_quantity(transaction_type: TransactionType, quantity: Decimal) -> Decimal {
    match transaction_type {
        TransactionType::In => quantity,
        TransactionType::Out => -quantity,
        TransactionType::Correction => quantity,
    }
}

/// Current stock: sum(IN) - sum(OUT) + sum(CORRECTION) over every entry.
/// Order-independent by construction.
pub fn current_stock(entries: &[LedgerEntry]) -> Decimal {
    entries.iter().fold(Decimal::ZERO, |acc, e| {
        acc + signed_quantity(e.transaction_type, e.quantity)
    })
}

/// Rolling average consumption: total flagged `OUT` quantity divided by the
/// number of distinct calendar months containing at least one flagged `OUT`
/// entry. A product with no qualifying months averages zero.
///
/// The result is unrounded; rounding to two decimals happens where the
/// product cache field is written.
pub fn average_consumption(entries: &[LedgerEntry]) -> Decimal {
    let mut months: HashSet<(i32, u32)> = HashSet::new();
    let mut total = Decimal::ZERO;

    for e in entries {
        if e.transaction_type == TransactionType::Out && e.include_in_avg {
            months.insert((e.date.year(), e.date.month()));
            total += e.quantity;
        }
    }

    if months.is_empty() {
        return Decimal::ZERO;
    }
    total / Decimal::from(months.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn entry(t: TransactionType, qty: &str, date: (i32, u32, u32), avg: bool) -> LedgerEntry {
        LedgerEntry {
            transaction_type: t,
            quantity: dec(qty),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            include_in_avg: avg,
        }
    }

    #[test]
    fn stock_is_signed_sum() {
        let entries = vec![
            entry(TransactionType::In, "1000", (2024, 1, 10), false),
            entry(TransactionType::Out, "300", (2024, 1, 31), true),
            entry(TransactionType::In, "500", (2024, 2, 5), false),
            entry(TransactionType::Out, "200", (2024, 2, 29), true),
            entry(TransactionType::Correction, "-50", (2024, 3, 1), false),
            entry(TransactionType::Correction, "25", (2024, 3, 2), false),
        ];
        assert_eq!(current_stock(&entries), dec("975"));
    }

    #[test]
    fn stock_of_empty_ledger_is_zero() {
        assert_eq!(current_stock(&[]), Decimal::ZERO);
    }

    #[test]
    fn correction_sign_is_preserved() {
        assert_eq!(
            signed_quantity(TransactionType::Correction, dec("-16")),
            dec("-16")
        );
        assert_eq!(signed_quantity(TransactionType::Out, dec("16")), dec("-16"));
    }

    #[test]
    fn average_over_distinct_months() {
        let entries = vec![
            entry(TransactionType::Out, "100", (2024, 1, 31), true),
            entry(TransactionType::Out, "120", (2024, 2, 29), true),
            entry(TransactionType::Out, "90", (2024, 3, 31), true),
            entry(TransactionType::Out, "130", (2024, 4, 30), true),
            entry(TransactionType::Out, "110", (2024, 5, 31), true),
            entry(TransactionType::Out, "100", (2024, 6, 30), true),
        ];
        // 650 / 6
        assert_eq!(average_consumption(&entries).round_dp(2), dec("108.33"));
    }

    #[test]
    fn unflagged_out_does_not_change_average() {
        let mut entries = vec![
            entry(TransactionType::Out, "100", (2024, 1, 31), true),
            entry(TransactionType::Out, "200", (2024, 2, 29), true),
        ];
        let before = average_consumption(&entries);
        entries.push(entry(TransactionType::Out, "99999", (2024, 7, 15), false));
        assert_eq!(average_consumption(&entries), before);
    }

    #[test]
    fn same_month_entries_share_a_bucket() {
        let entries = vec![
            entry(TransactionType::Out, "40", (2024, 1, 10), true),
            entry(TransactionType::Out, "60", (2024, 1, 25), true),
        ];
        assert_eq!(average_consumption(&entries), dec("100"));
    }

    #[test]
    fn no_qualifying_months_averages_zero() {
        let entries = vec![
            entry(TransactionType::In, "500", (2024, 1, 10), false),
            entry(TransactionType::Out, "100", (2024, 1, 31), false),
        ];
        assert_eq!(average_consumption(&entries), Decimal::ZERO);
    }
}
