//! Turn a raw table into typed transaction records.
//!
//! Cleaning is row-local and never aborts on a bad row: rows whose date or
//! amount cannot be interpreted are dropped and reported in the
//! [`CleaningSummary`]. Only a missing required column is fatal.
//!
//! ```text
//! ParseResult (untyped cells)
//!     │  resolve_columns   header synonyms -> ColumnMapping   (fatal if missing)
//!     │  dedupe            identical raw rows                  (dropped, counted)
//!     │  parse_date        formats / RFC 3339 / Excel serial   (dropped, counted)
//!     │  parse_amount      currency, separators, qty x price   (dropped, counted)
//!     ▼
//! CleanedTable { records, summary }
//! ```

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::RangeInclusive;

use crate::config::{CleaningConfig, ColumnSynonyms};
use crate::error::{DataFormatError, DataResult};
use crate::logs::RunLog;
use crate::models::TransactionRecord;
use crate::parser::ParseResult;

// =============================================================================
// Row warnings
// =============================================================================

/// Why a row was left out of the cleaned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Every cell repeats an earlier row.
    Duplicate,
    /// Date cell is empty, matches no accepted format, or falls outside the
    /// accepted year window.
    InvalidDate,
    /// Amount (or quantity / unit price it is derived from) is not a number.
    InvalidAmount,
    /// Amount is below zero.
    NegativeAmount,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DropReason::Duplicate => "duplicate row",
            DropReason::InvalidDate => "invalid date",
            DropReason::InvalidAmount => "invalid amount",
            DropReason::NegativeAmount => "negative amount",
        };
        f.write_str(label)
    }
}

/// A row that failed validation and was dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowValidationWarning {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub column: Option<String>,
    pub value: Option<String>,
    pub reason: DropReason,
}

impl RowValidationWarning {
    pub fn new(row: usize, reason: DropReason) -> Self {
        Self {
            row,
            column: None,
            value: None,
            reason,
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for RowValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.column, &self.value) {
            (Some(col), Some(val)) => {
                write!(f, "Row {}, column '{}' (value '{}'): {}", self.row, col, val, self.reason)
            }
            (Some(col), None) => write!(f, "Row {}, column '{}': {}", self.row, col, self.reason),
            _ => write!(f, "Row {}: {}", self.row, self.reason),
        }
    }
}

// =============================================================================
// Column resolution
// =============================================================================

/// Source header chosen for each logical column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMapping {
    pub date: String,
    pub product: String,
    /// Absent when the amount is derived from quantity x unit price.
    pub amount: Option<String>,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
    pub unit_cost: Option<String>,
    pub customer: Option<String>,
    pub region: Option<String>,
}

/// Lowercase, `_`/`-` to space, whitespace collapsed.
pub fn normalize_header(header: &str) -> String {
    header
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn find_column(headers: &[String], synonyms: &[String], claimed: &mut HashSet<String>) -> Option<String> {
    for synonym in synonyms {
        let wanted = normalize_header(synonym);
        if let Some(header) = headers
            .iter()
            .find(|h| !claimed.contains(*h) && normalize_header(h) == wanted)
        {
            claimed.insert(header.clone());
            return Some(header.clone());
        }
    }
    None
}

/// Match source headers against the configured synonyms.
///
/// Required: a date column, a product column, and either an amount column
/// or both quantity and unit price. A header is assigned to at most one
/// logical column.
pub fn resolve_columns(headers: &[String], synonyms: &ColumnSynonyms) -> DataResult<ColumnMapping> {
    let mut claimed = HashSet::new();
    let missing = |column: &str, expected: &[String]| DataFormatError::MissingColumn {
        column: column.to_string(),
        expected: expected.to_vec(),
    };

    let date = find_column(headers, &synonyms.date, &mut claimed)
        .ok_or_else(|| missing("date", &synonyms.date))?;
    let product = find_column(headers, &synonyms.product, &mut claimed)
        .ok_or_else(|| missing("product", &synonyms.product))?;
    let amount = find_column(headers, &synonyms.amount, &mut claimed);
    let quantity = find_column(headers, &synonyms.quantity, &mut claimed);
    let unit_price = find_column(headers, &synonyms.unit_price, &mut claimed);
    let unit_cost = find_column(headers, &synonyms.unit_cost, &mut claimed);
    let customer = find_column(headers, &synonyms.customer, &mut claimed);
    let region = find_column(headers, &synonyms.region, &mut claimed);

    if amount.is_none() && (quantity.is_none() || unit_price.is_none()) {
        return Err(missing("amount", &synonyms.amount));
    }

    Ok(ColumnMapping {
        date,
        product,
        amount,
        quantity,
        unit_price,
        unit_cost,
        customer,
        region,
    })
}

// =============================================================================
// Cell parsing
// =============================================================================

/// Days between 1899-12-30 (the spreadsheet epoch) and 9999-12-31.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

static CURRENCY_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\s\u{a0}\u{202f}'€$£¥₹]|\b(?:eur|usd|gbp|chf|jpy)\b").expect("valid regex")
});

static THOUSANDS_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?\d{1,3}(,\d{3})+$").expect("valid regex"));

static THOUSANDS_DOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?\d{1,3}(\.\d{3}){2,}$").expect("valid regex"));

/// Interpret a cell as a calendar date within `years`.
///
/// Strings are tried against `formats` in order (date-time matches are
/// truncated to the date), then RFC 3339. The first match whose year falls
/// in `years` wins, so `06/01/24` is not read as year 6 or 24 when a
/// two-digit-year format follows. Numeric cells are spreadsheet serial
/// dates.
pub fn parse_date(value: &Value, formats: &[String], years: &RangeInclusive<i32>) -> Option<NaiveDate> {
    let in_window = |date: &NaiveDate| years.contains(&date.year());
    match value {
        Value::String(s) => parse_date_str(s.trim(), formats, &in_window),
        Value::Number(n) => n.as_f64().and_then(excel_serial_to_date).filter(in_window),
        _ => None,
    }
}

fn parse_date_str(s: &str, formats: &[String], in_window: &dyn Fn(&NaiveDate) -> bool) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    let candidates = formats.iter().filter_map(|format| {
        NaiveDate::parse_from_str(s, format)
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(s, format).ok().map(|ts| ts.date()))
    });
    let rfc3339 = DateTime::parse_from_rfc3339(s).ok().map(|ts| ts.date_naive());
    candidates.chain(rfc3339).find(|date| in_window(date))
}

fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Interpret a cell as a number.
///
/// Currency symbols, codes and grouping spaces are ignored. When both `,`
/// and `.` appear, the last one is the decimal separator. A lone `,` is a
/// thousands separator when every group after it has three digits (`1,234`,
/// `1,234,567`), otherwise decimal. A lone `.` is a thousands separator only
/// with two or more such groups (`1.234.567`). Negative zero is read as zero.
/// Accounting negatives `(12.50)` are supported. Non-finite results are
/// rejected.
pub fn parse_amount(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount_str(s.trim()),
        _ => None,
    }?;
    // -0 and (0)
    let parsed = parsed + 0.0;
    parsed.is_finite().then_some(parsed)
}

fn parse_amount_str(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }

    let (negative, body) = match s.strip_prefix('(').and_then(|b| b.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, s),
    };

    let cleaned = CURRENCY_NOISE.replace_all(body, "");
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit() || ".,-+".contains(c)) {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if THOUSANDS_COMMA.is_match(&cleaned) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        (None, Some(_)) if THOUSANDS_DOT.is_match(&cleaned) => cleaned.replace('.', ""),
        _ => cleaned.to_string(),
    };

    let number: f64 = normalized.parse().ok()?;
    Some(if negative { -number } else { number })
}

/// Non-empty text of a cell. Integral numbers print without a fraction.
fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn display_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// =============================================================================
// Cleaned table
// =============================================================================

/// Outcome of the cleaning stage, reported for every run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningSummary {
    pub rows_in: usize,
    pub rows_kept: usize,
    /// Dropped row count per reason.
    pub dropped: BTreeMap<DropReason, usize>,
    /// First warnings, up to the configured limit.
    pub warnings: Vec<RowValidationWarning>,
    pub columns: ColumnMapping,
}

impl CleaningSummary {
    pub fn rows_dropped(&self) -> usize {
        self.dropped.values().sum()
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "Cleaned: {} rows in, {} kept, {} dropped",
            self.rows_in,
            self.rows_kept,
            self.rows_dropped()
        )
    }

    /// Write the summary and a sample of warnings to the run log.
    pub fn log_to(&self, log: &mut RunLog) {
        if self.rows_dropped() == 0 {
            log.success(self.summary());
            return;
        }

        log.warning(self.summary());
        for (reason, count) in &self.dropped {
            log.warning_indent(format!("{}: {}", reason, count), 1);
        }
        for warning in self.warnings.iter().take(5) {
            log.info_indent(warning.to_string(), 2);
        }
        if self.warnings.len() > 5 {
            log.info_indent(format!("... +{} more", self.rows_dropped() - 5), 2);
        }
    }
}

/// Typed fact table plus the report of what was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTable {
    pub records: Vec<TransactionRecord>,
    pub summary: CleaningSummary,
}

impl CleanedTable {
    /// Earliest and latest transaction dates, `None` when empty.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}

/// Clean a raw table.
///
/// Pure: the same input and configuration always yield the same records and
/// summary.
pub fn clean_table(
    raw: &ParseResult,
    config: &CleaningConfig,
    synonyms: &ColumnSynonyms,
) -> DataResult<CleanedTable> {
    let columns = resolve_columns(&raw.headers, synonyms)?;

    let mut records = Vec::with_capacity(raw.records.len());
    let mut dropped: BTreeMap<DropReason, usize> = BTreeMap::new();
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();

    for (idx, row) in raw.records.iter().enumerate() {
        let row_num = idx + 1;

        if config.drop_duplicates && !seen.insert(row.to_string()) {
            *dropped.entry(DropReason::Duplicate).or_default() += 1;
            if warnings.len() < config.max_warnings {
                warnings.push(RowValidationWarning::new(row_num, DropReason::Duplicate));
            }
            continue;
        }

        match clean_row(row, row_num, &columns, config) {
            Ok(record) => records.push(record),
            Err(warning) => {
                *dropped.entry(warning.reason).or_default() += 1;
                if warnings.len() < config.max_warnings {
                    warnings.push(warning);
                }
            }
        }
    }

    let summary = CleaningSummary {
        rows_in: raw.records.len(),
        rows_kept: records.len(),
        dropped,
        warnings,
        columns,
    };

    Ok(CleanedTable { records, summary })
}

fn clean_row(
    row: &Value,
    row_num: usize,
    columns: &ColumnMapping,
    config: &CleaningConfig,
) -> Result<TransactionRecord, RowValidationWarning> {
    let cell = |column: &str| row.get(column).unwrap_or(&Value::Null);
    let optional_number = |column: Option<&str>| column.and_then(|c| parse_amount(cell(c)));
    let text_or_unknown = |column: Option<&str>| {
        column
            .and_then(|c| cell_text(cell(c)))
            .unwrap_or_else(|| config.unknown_label.clone())
    };

    let date_cell = cell(&columns.date);
    let date = parse_date(date_cell, &config.date_formats, &config.year_window()).ok_or_else(|| {
        RowValidationWarning::new(row_num, DropReason::InvalidDate)
            .with_column(&columns.date)
            .with_value(display_cell(date_cell))
    })?;

    let quantity = optional_number(columns.quantity.as_deref());

    let amount = match (&columns.amount, &columns.unit_price) {
        (Some(amount_col), _) => {
            let amount_cell = cell(amount_col);
            parse_amount(amount_cell).ok_or_else(|| {
                RowValidationWarning::new(row_num, DropReason::InvalidAmount)
                    .with_column(amount_col)
                    .with_value(display_cell(amount_cell))
            })?
        }
        (None, Some(price_col)) => {
            let price = parse_amount(cell(price_col));
            match (quantity, price) {
                (Some(q), Some(p)) => q * p,
                _ => {
                    let (col, bad) = if price.is_none() {
                        (price_col.as_str(), cell(price_col))
                    } else {
                        let qty_col = columns.quantity.as_deref().unwrap_or_default();
                        (qty_col, cell(qty_col))
                    };
                    return Err(RowValidationWarning::new(row_num, DropReason::InvalidAmount)
                        .with_column(col)
                        .with_value(display_cell(bad)));
                }
            }
        }
        (None, None) => {
            return Err(RowValidationWarning::new(row_num, DropReason::InvalidAmount));
        }
    };

    if amount < 0.0 {
        let column = columns
            .amount
            .as_deref()
            .or(columns.unit_price.as_deref())
            .unwrap_or_default();
        return Err(RowValidationWarning::new(row_num, DropReason::NegativeAmount)
            .with_column(column)
            .with_value(amount.to_string()));
    }

    let cost = match (quantity, optional_number(columns.unit_cost.as_deref())) {
        (Some(q), Some(unit_cost)) => Some(q * unit_cost),
        _ => None,
    };

    Ok(TransactionRecord {
        source_row: row_num,
        date,
        product: text_or_unknown(Some(&columns.product)),
        amount,
        customer: text_or_unknown(columns.customer.as_deref()),
        region: text_or_unknown(columns.region.as_deref()),
        quantity,
        cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_string_with_metadata, SourceFormat};
    use serde_json::json;

    fn table(headers: &[&str], rows: Vec<Value>) -> ParseResult {
        ParseResult {
            records: rows,
            encoding: "utf-8".into(),
            delimiter: ',',
            headers: headers.iter().map(|h| h.to_string()).collect(),
            format: SourceFormat::Csv,
            sheet: None,
        }
    }

    fn clean(raw: &ParseResult) -> DataResult<CleanedTable> {
        clean_table(raw, &CleaningConfig::default(), &ColumnSynonyms::default())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_worked_example() {
        let raw = table(
            &["date", "product", "amount"],
            vec![
                json!({"date": "2024-01-05", "product": "Widget", "amount": 10.0}),
                json!({"date": "2024-01-05", "product": "Widget", "amount": "bad"}),
                json!({"date": "2024-02-10", "product": "Gadget", "amount": 20.0}),
            ],
        );
        let cleaned = clean(&raw).unwrap();

        assert_eq!(cleaned.records.len(), 2);
        assert_eq!(cleaned.summary.rows_in, 3);
        assert_eq!(cleaned.summary.rows_dropped(), 1);
        assert_eq!(cleaned.summary.dropped[&DropReason::InvalidAmount], 1);
        assert_eq!(cleaned.summary.warnings[0].row, 2);
        assert_eq!(cleaned.summary.warnings[0].value.as_deref(), Some("bad"));
        assert_eq!(cleaned.date_range(), Some((date(2024, 1, 5), date(2024, 2, 10))));
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let raw = table(&["when", "product", "amount"], vec![]);
        let err = clean(&raw).unwrap_err();
        match err {
            DataFormatError::MissingColumn { column, expected } => {
                assert_eq!(column, "date");
                assert!(expected.contains(&"transaction date".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_amount_without_quantity_and_price() {
        let raw = table(&["Date", "Product", "Quantity"], vec![]);
        let err = clean(&raw).unwrap_err();
        assert!(err.to_string().contains("'amount'"));
    }

    #[test]
    fn test_headers_matched_case_insensitively() {
        let headers: Vec<String> = ["Transaction_Date", "PRODUCT NAME", "Sale Amount", "Customer Names", "City"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mapping = resolve_columns(&headers, &ColumnSynonyms::default()).unwrap();
        assert_eq!(mapping.date, "Transaction_Date");
        assert_eq!(mapping.product, "PRODUCT NAME");
        assert_eq!(mapping.amount.as_deref(), Some("Sale Amount"));
        assert_eq!(mapping.customer.as_deref(), Some("Customer Names"));
        assert_eq!(mapping.region.as_deref(), Some("City"));
    }

    #[test]
    fn test_header_claimed_once() {
        let synonyms = ColumnSynonyms {
            amount: vec!["total".into()],
            unit_cost: vec!["total".into(), "unit cost".into()],
            ..ColumnSynonyms::default()
        };
        let headers: Vec<String> = ["date", "product", "total"].iter().map(|s| s.to_string()).collect();
        let mapping = resolve_columns(&headers, &synonyms).unwrap();
        assert_eq!(mapping.amount.as_deref(), Some("total"));
        assert_eq!(mapping.unit_cost, None);
    }

    #[test]
    fn test_optional_columns_filled_with_unknown() {
        let raw = table(
            &["date", "product", "amount", "customer"],
            vec![
                json!({"date": "2024-01-05", "product": "", "amount": "5", "customer": "  "}),
                json!({"date": "2024-01-06", "product": "Widget", "amount": "5", "customer": 1042}),
            ],
        );
        let cleaned = clean(&raw).unwrap();
        assert_eq!(cleaned.records[0].product, "Unknown");
        assert_eq!(cleaned.records[0].customer, "Unknown");
        assert_eq!(cleaned.records[0].region, "Unknown");
        assert_eq!(cleaned.records[1].customer, "1042");
    }

    #[test]
    fn test_invalid_date_and_negative_amount_dropped() {
        let raw = table(
            &["date", "product", "amount"],
            vec![
                json!({"date": "not a date", "product": "A", "amount": "1"}),
                json!({"date": "", "product": "A", "amount": "1"}),
                json!({"date": "2024-03-01", "product": "A", "amount": "-4"}),
                json!({"date": "2024-03-01", "product": "A", "amount": "0"}),
            ],
        );
        let cleaned = clean(&raw).unwrap();
        assert_eq!(cleaned.records.len(), 1);
        assert_eq!(cleaned.summary.dropped[&DropReason::InvalidDate], 2);
        assert_eq!(cleaned.summary.dropped[&DropReason::NegativeAmount], 1);
    }

    #[test]
    fn test_duplicates_dropped_when_enabled() {
        let row = json!({"date": "2024-01-05", "product": "A", "amount": "1"});
        let raw = table(&["date", "product", "amount"], vec![row.clone(), row]);

        let cleaned = clean(&raw).unwrap();
        assert_eq!(cleaned.records.len(), 1);
        assert_eq!(cleaned.summary.dropped[&DropReason::Duplicate], 1);

        let config = CleaningConfig {
            drop_duplicates: false,
            ..CleaningConfig::default()
        };
        let cleaned = clean_table(&raw, &config, &ColumnSynonyms::default()).unwrap();
        assert_eq!(cleaned.records.len(), 2);
    }

    #[test]
    fn test_amount_derived_from_quantity_and_price() {
        let raw = parse_string_with_metadata(
            "OrderDate,Product Description,Order Quantity,Unit Selling Price,Unit Cost\n\
             2024-05-01,Widget,3,2.50,1.00\n\
             2024-05-02,Widget,x,2.50,1.00\n",
            ',',
            "utf-8".into(),
        )
        .unwrap();
        let cleaned = clean(&raw).unwrap();

        assert_eq!(cleaned.records.len(), 1);
        let record = &cleaned.records[0];
        assert_eq!(record.amount, 7.5);
        assert_eq!(record.quantity, Some(3.0));
        assert_eq!(record.cost, Some(3.0));
        assert_eq!(record.profit(), Some(4.5));
        assert_eq!(cleaned.summary.warnings[0].column.as_deref(), Some("Order Quantity"));
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let raw = table(
            &["date", "product", "amount"],
            vec![
                json!({"date": "2024-01-05", "product": "Widget", "amount": "10"}),
                json!({"date": "??", "product": "Widget", "amount": "10"}),
                json!({"date": "2024-01-05", "product": "Widget", "amount": "10"}),
            ],
        );
        let first = clean(&raw).unwrap();
        let second = clean(&raw).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_date_formats() {
        let config = CleaningConfig::default();
        let (formats, years) = (&config.date_formats, config.year_window());
        let expected = Some(date(2024, 1, 5));
        assert_eq!(parse_date(&json!("2024-01-05"), formats, &years), expected);
        assert_eq!(parse_date(&json!("2024/01/05"), formats, &years), expected);
        assert_eq!(parse_date(&json!("05/01/2024"), formats, &years), expected);
        assert_eq!(parse_date(&json!("05.01.2024"), formats, &years), expected);
        assert_eq!(parse_date(&json!("2024-01-05 13:45:00"), formats, &years), expected);
        assert_eq!(parse_date(&json!("2024-01-05T13:45:00+02:00"), formats, &years), expected);
        assert_eq!(parse_date(&json!(45296), formats, &years), expected);
        assert_eq!(parse_date(&json!("2024-02-30"), formats, &years), None);
        assert_eq!(parse_date(&json!(true), formats, &years), None);
        assert_eq!(parse_date(&Value::Null, formats, &years), None);
    }

    #[test]
    fn test_short_year_dates() {
        let config = CleaningConfig::default();
        let (formats, years) = (&config.date_formats, config.year_window());
        assert_eq!(parse_date(&json!("05/01/24"), formats, &years), Some(date(2024, 1, 5)));
        assert_eq!(parse_date(&json!("05.01.24"), formats, &years), Some(date(2024, 1, 5)));

        // No two-digit-year format to fall back on: out-of-window years are rejected
        let four_digit_only = vec!["%Y/%m/%d".to_string(), "%d/%m/%Y".to_string()];
        assert_eq!(parse_date(&json!("06/01/24"), &four_digit_only, &years), None);
        assert_eq!(parse_date(&json!("0006-01-24T00:00:00Z"), formats, &years), None);
        assert_eq!(parse_date(&json!(1.0), formats, &years), None);
    }

    #[test]
    fn test_dates_outside_year_window_dropped() {
        let raw = parse_string_with_metadata(
            "Date,Product,Amount\n05/01/2024,Widget,10\n06/01/0024,Widget,5\n01/01/2250,Widget,7\n",
            ',',
            "utf-8".to_string(),
        )
        .unwrap();
        let cleaned = clean_table(&raw, &CleaningConfig::default(), &ColumnSynonyms::default()).unwrap();

        assert_eq!(cleaned.summary.rows_kept, 1);
        assert_eq!(cleaned.summary.dropped[&DropReason::InvalidDate], 2);
        assert_eq!(cleaned.date_range(), Some((date(2024, 1, 5), date(2024, 1, 5))));

        let wide = CleaningConfig {
            min_year: 1,
            max_year: 9999,
            ..CleaningConfig::default()
        };
        let cleaned = clean_table(&raw, &wide, &ColumnSynonyms::default()).unwrap();
        assert_eq!(cleaned.summary.rows_kept, 3);
    }

    #[test]
    fn test_parse_amount_shapes() {
        assert_eq!(parse_amount(&json!(12.5)), Some(12.5));
        assert_eq!(parse_amount(&json!("12.5")), Some(12.5));
        assert_eq!(parse_amount(&json!("€ 1,200.50")), Some(1200.5));
        assert_eq!(parse_amount(&json!("1.234,56 EUR")), Some(1234.56));
        assert_eq!(parse_amount(&json!("12,5")), Some(12.5));
        assert_eq!(parse_amount(&json!("1,234")), Some(1234.0));
        assert_eq!(parse_amount(&json!("1.234.567")), Some(1234567.0));
        assert_eq!(parse_amount(&json!("$(12.50)")), None);
        assert_eq!(parse_amount(&json!("(12.50)")), Some(-12.5));
        assert_eq!(parse_amount(&json!("1 000")), Some(1000.0));
        assert_eq!(parse_amount(&json!("bad")), None);
        assert_eq!(parse_amount(&json!("12abc")), None);
        assert_eq!(parse_amount(&json!("")), None);
        assert_eq!(parse_amount(&json!("inf")), None);
    }

    #[test]
    fn test_negative_zero_amount_kept_as_zero() {
        for cell in [json!("-0"), json!("(0)"), json!(-0.0)] {
            let amount = parse_amount(&cell).unwrap();
            assert!(amount == 0.0 && amount.is_sign_positive(), "{cell} -> {amount}");
        }

        let raw = table(
            &["Date", "Product", "Amount"],
            vec![json!({"Date": "2024-01-05", "Product": "W", "Amount": "-0"})],
        );
        let cleaned = clean(&raw).unwrap();
        assert_eq!(cleaned.records[0].amount.to_string(), "0");
    }

    #[test]
    fn test_warning_message_format() {
        let warning = RowValidationWarning::new(5, DropReason::InvalidDate)
            .with_column("OrderDate")
            .with_value("31/31/2024");
        let msg = warning.to_string();
        assert!(msg.contains("Row 5"));
        assert!(msg.contains("column 'OrderDate'"));
        assert!(msg.contains("value '31/31/2024'"));
        assert!(msg.contains("invalid date"));
    }

    #[test]
    fn test_summary_logged() {
        let raw = table(
            &["date", "product", "amount"],
            vec![json!({"date": "x", "product": "A", "amount": "1"})],
        );
        let cleaned = clean(&raw).unwrap();
        let mut log = RunLog::new();
        cleaned.summary.log_to(&mut log);
        assert!(log.entries()[0].message.contains("1 dropped"));
        assert!(log.problem_count() >= 2);
    }
}
