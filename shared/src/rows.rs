//! Helpers for the loosely-typed spreadsheet rows.
//!
//! Cells arrive as hand-typed strings; everything here tolerates the
//! artifacts that come with that: auto-formatted numeric codes, month names
//! instead of dates, amounts with trailing commentary.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use crate::models::TransactionType;

/// English month names, position = month number - 1
const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

fn month_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Za-z]+)\s+(\d{4})").unwrap())
}

fn correction_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*([+-]?\d+\.?\d*)").unwrap())
}

/// Strip the thousands-separator commas spreadsheets add to numeric-looking
/// product codes ("1,015" was typed as "1015").
pub fn normalize_artis_code(raw: &str) -> String {
    raw.trim().replace(',', "")
}

/// Template rows that must never become transactions
pub fn is_placeholder_code(code: &str) -> bool {
    code.contains("Example:") || code.contains("Instructions:")
}

/// Shape check used by validation: word followed by a 4-digit year. A label
/// can pass the shape check and still name no real month, in which case
/// ingestion falls back to the current date.
pub fn month_label_has_shape(label: &str) -> bool {
    month_label_re().is_match(label)
}

/// Parse "<MonthName> <Year>" into the last calendar day of that month,
/// the business-effective date of a monthly consumption figure.
pub fn parse_month_label(label: &str) -> Option<NaiveDate> {
    let caps = month_label_re().captures(label)?;
    let name = caps.get(1)?.as_str().to_lowercase();
    let year: i32 = caps.get(2)?.as_str().parse().ok()?;
    let month = MONTH_NAMES.iter().position(|m| *m == name)? as u32 + 1;
    last_day_of_month(year, month)
}

/// Last calendar day of a month
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// Dates as staff actually type them: dotted `15.1.2025`, ISO `2025-01-15`,
/// or slashed `15/01/2025`.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in ["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    None
}

/// Extract the leading signed amount from a correction cell such as
/// `"16 Stock Adjustment"` or `"-30"`. Trailing text is audit commentary.
pub fn parse_correction_amount(raw: &str) -> Option<Decimal> {
    let caps = correction_re().captures(raw)?;
    let number = caps.get(1)?.as_str().trim_end_matches('.');
    Decimal::from_str(number).ok()
}

/// Difference-based initial stock: the single synthesized movement that
/// brings `current` to `requested`, or `None` when they already agree
/// (re-applying an unchanged initial-stock row is a no-op).
pub fn initial_stock_delta(
    requested: Decimal,
    current: Decimal,
) -> Option<(TransactionType, Decimal)> {
    let difference = requested - current;
    if difference.is_zero() {
        None
    } else if difference > Decimal::ZERO {
        Some((TransactionType::In, difference))
    } else {
        Some((TransactionType::Out, -difference))
    }
}
