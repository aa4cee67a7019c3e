//! Date dimension builder.
//!
//! Produces one [`CalendarRow`] per day, with no gaps, so time-bucketed KPIs
//! can list periods that had no sales at all.

use chrono::{Datelike, Months, NaiveDate, Weekday};

use crate::config::CalendarConfig;
use crate::models::{quarter_of, CalendarRow, TransactionRecord, YearMonth, YearQuarter};

/// Build the date table for the inclusive range `[min, max]`.
///
/// Rows are in ascending date order. `min > max` yields an empty table.
/// Deterministic: the same range and fiscal start always give the same rows.
pub fn build_calendar(min: NaiveDate, max: NaiveDate, fiscal_start_month: u32) -> Vec<CalendarRow> {
    if min > max {
        return Vec::new();
    }

    let days = (max - min).num_days() as usize + 1;
    min.iter_days()
        .take(days)
        .map(|date| calendar_row(date, fiscal_start_month))
        .collect()
}

/// Build the date table spanning the given records.
///
/// With `buffer_months > 0` the range is widened to whole months:
/// from the first day of the month `buffer_months` before the earliest sale
/// to the last day of the month `buffer_months` after the latest one.
pub fn calendar_for_records(records: &[TransactionRecord], config: &CalendarConfig) -> Vec<CalendarRow> {
    let (Some(min), Some(max)) = (
        records.iter().map(|r| r.date).min(),
        records.iter().map(|r| r.date).max(),
    ) else {
        return Vec::new();
    };

    let (start, end) = if config.buffer_months == 0 {
        (min, max)
    } else {
        widen_to_months(min, max, config.buffer_months)
    };

    build_calendar(start, end, config.fiscal_start_month)
}

fn widen_to_months(min: NaiveDate, max: NaiveDate, buffer: u32) -> (NaiveDate, NaiveDate) {
    let start = min
        .with_day(1)
        .and_then(|d| d.checked_sub_months(Months::new(buffer)))
        .unwrap_or(NaiveDate::MIN);
    let end = max
        .with_day(1)
        .and_then(|d| d.checked_add_months(Months::new(buffer + 1)))
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    (start, end)
}

/// Fiscal year and quarter of a date.
///
/// The fiscal year is labelled by the calendar year in which it starts:
/// with an April start, 2024-03-31 is in fiscal 2023 Q4 and 2024-04-01 in
/// fiscal 2024 Q1.
pub fn fiscal_period(date: NaiveDate, fiscal_start_month: u32) -> (i32, u32) {
    let start = fiscal_start_month.clamp(1, 12);
    let month = date.month();
    let fiscal_year = if month >= start { date.year() } else { date.year() - 1 };
    let fiscal_quarter = ((month + 12 - start) % 12) / 3 + 1;
    (fiscal_year, fiscal_quarter)
}

fn calendar_row(date: NaiveDate, fiscal_start_month: u32) -> CalendarRow {
    let year = date.year();
    let month = date.month();
    let quarter = quarter_of(month);
    let iso = date.iso_week();
    let weekday = date.weekday();
    let next = date.succ_opt();
    let prev = date.pred_opt();

    let is_month_start = date.day() == 1;
    let is_month_end = next.map_or(true, |d| d.month() != month);
    let (fiscal_year, fiscal_quarter) = fiscal_period(date, fiscal_start_month);

    CalendarRow {
        date,
        year,
        quarter,
        quarter_name: format!("Q{}", quarter),
        month,
        month_name: date.format("%B").to_string(),
        month_short: date.format("%b").to_string(),
        day: date.day(),
        day_name: date.format("%A").to_string(),
        day_short: date.format("%a").to_string(),
        week: iso.week(),
        iso_year: iso.year(),
        day_of_week: weekday.number_from_monday(),
        day_of_year: date.ordinal(),
        is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
        is_month_start,
        is_month_end,
        is_quarter_start: is_month_start && (month - 1) % 3 == 0,
        is_quarter_end: is_month_end && month % 3 == 0,
        is_year_start: prev.map_or(true, |d| d.year() != year),
        is_year_end: next.map_or(true, |d| d.year() != year),
        year_month: YearMonth::new(year, month),
        year_quarter: YearQuarter { year, quarter },
        fiscal_year,
        fiscal_quarter,
    }
}
