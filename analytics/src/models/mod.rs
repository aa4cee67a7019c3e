//! Domain models for the sales analytics pipeline.
//!
//! This module contains the typed tables passed between stages:
//!
//! - [`TransactionRecord`] - One cleaned sale (the fact table row)
//! - [`CalendarRow`] - One day of the date dimension
//! - [`YearMonth`] / [`YearQuarter`] - Period keys used for time buckets

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;

/// Label written into optional text fields that are absent or blank.
pub const UNKNOWN: &str = "Unknown";

// =============================================================================
// Transaction Record
// =============================================================================

/// One cleaned sale.
///
/// `amount` is always finite and non-negative, `date` is always a valid
/// calendar date. Text fields are never empty: absent values carry the
/// unknown label configured for the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    /// 1-based data row number in the source (header excluded).
    pub source_row: usize,
    pub date: NaiveDate,
    pub product: String,
    pub amount: f64,
    pub customer: String,
    pub region: String,
    /// Units sold, when the source carries a quantity column.
    pub quantity: Option<f64>,
    /// Total cost (quantity x unit cost), when both are known.
    pub cost: Option<f64>,
}

impl TransactionRecord {
    /// Profit of the sale, when its cost is known.
    pub fn profit(&self) -> Option<f64> {
        self.cost.map(|cost| self.amount - cost)
    }

    /// Calendar month this sale falls in.
    pub fn period(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

// =============================================================================
// Period keys
// =============================================================================

/// A calendar month, ordered chronologically. Displays as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self::new(date.year(), date.month())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A calendar quarter. Displays as `YYYY-Qn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearQuarter {
    pub year: i32,
    pub quarter: u32,
}

impl YearQuarter {
    pub fn from_date(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            quarter: quarter_of(date.month()),
        }
    }
}

impl fmt::Display for YearQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-Q{}", self.year, self.quarter)
    }
}

impl Serialize for YearQuarter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Calendar quarter of a month: ceil(month / 3).
pub fn quarter_of(month: u32) -> u32 {
    (month + 2) / 3
}

// =============================================================================
// Calendar Row
// =============================================================================

/// One day of the date dimension.
///
/// Field names follow the exported date table columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarRow {
    pub date: NaiveDate,
    pub year: i32,
    pub quarter: u32,
    pub quarter_name: String,
    pub month: u32,
    pub month_name: String,
    pub month_short: String,
    pub day: u32,
    pub day_name: String,
    pub day_short: String,
    /// ISO 8601 week number.
    pub week: u32,
    /// ISO 8601 week-numbering year (differs from `year` around new year).
    pub iso_year: i32,
    /// Monday = 1 .. Sunday = 7.
    pub day_of_week: u32,
    pub day_of_year: u32,
    pub is_weekend: bool,
    pub is_month_start: bool,
    pub is_month_end: bool,
    pub is_quarter_start: bool,
    pub is_quarter_end: bool,
    pub is_year_start: bool,
    pub is_year_end: bool,
    pub year_month: YearMonth,
    pub year_quarter: YearQuarter,
    pub fiscal_year: i32,
    pub fiscal_quarter: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(amount: f64, cost: Option<f64>) -> TransactionRecord {
        TransactionRecord {
            source_row: 1,
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            product: "Widget".into(),
            amount,
            customer: UNKNOWN.into(),
            region: UNKNOWN.into(),
            quantity: None,
            cost,
        }
    }

    #[test]
    fn test_profit_requires_cost() {
        assert_eq!(record(10.0, None).profit(), None);
        assert_eq!(record(10.0, Some(4.0)).profit(), Some(6.0));
    }

    #[test]
    fn test_year_month_display_and_order() {
        let jan = YearMonth::new(2024, 1);
        let dec = YearMonth::new(2023, 12);
        assert_eq!(jan.to_string(), "2024-01");
        assert!(dec < jan);
    }

    #[test]
    fn test_period_keys_serialize_as_strings() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 2).unwrap();
        assert_eq!(
            serde_json::to_string(&YearMonth::from_date(date)).unwrap(),
            "\"2024-11\""
        );
        assert_eq!(
            serde_json::to_string(&YearQuarter::from_date(date)).unwrap(),
            "\"2024-Q4\""
        );
    }

    #[test]
    fn test_quarter_of() {
        assert_eq!(quarter_of(1), 1);
        assert_eq!(quarter_of(3), 1);
        assert_eq!(quarter_of(4), 2);
        assert_eq!(quarter_of(12), 4);
    }
}
