//! KPI catalog.
//!
//! Every KPI is a pure function of the cleaned records (plus the calendar
//! for time-bucketed KPIs). No KPI reads another KPI's result, so they can be
//! computed in any order.
//!
//! Ratios never fail on a zero denominator:
//!
//! | KPI                          | zero denominator |
//! |------------------------------|------------------|
//! | average transaction value    | `0.0`            |
//! | average spend per customer   | `0.0`            |
//! | growth rate / variance %     | `None`           |
//! | profit margin %              | `None`           |

mod dimension;

pub use dimension::{measures_by_dimension, Dimension, DimensionMeasures};

use chrono::{Datelike, Weekday};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::config::AnalyticsConfig;
use crate::models::{CalendarRow, TransactionRecord, YearMonth, YearQuarter};

// =============================================================================
// Result types
// =============================================================================

/// Sales of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSales {
    pub period: YearMonth,
    pub total: f64,
    pub transactions: usize,
}

/// Change between two consecutive months.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodGrowth {
    pub period: YearMonth,
    pub previous_period: YearMonth,
    pub current: f64,
    pub previous: f64,
    /// `(current - previous) / previous`; `None` when `previous` is zero.
    pub rate: Option<f64>,
}

/// Sales of one calendar quarter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterSales {
    pub period: YearQuarter,
    pub total: f64,
    pub transactions: usize,
}

/// Sales on one day of the week, across the whole range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdaySales {
    pub weekday: String,
    pub total: f64,
    pub transactions: usize,
}

/// Total attributed to one key (customer, product).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTotal {
    pub key: String,
    pub total: f64,
    pub transactions: usize,
}

/// Customer-level KPIs. Rows without a customer form one group under the
/// unknown label and are counted and ranked like any other customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerMetrics {
    pub distinct_customers: usize,
    pub average_spend_per_customer: f64,
    /// Customers other than the unknown label.
    pub attributed_customers: usize,
    /// Sales with no customer attached.
    pub unattributed_sales: f64,
    pub top_customers: Vec<RankedTotal>,
}

/// One metric for the current year against the previous one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub current: f64,
    pub previous: f64,
    pub variance: f64,
    /// `variance / previous * 100`; `None` when `previous` is zero.
    pub variance_pct: Option<f64>,
}

impl Comparison {
    pub fn new(current: f64, previous: f64) -> Self {
        let variance = current - previous;
        Self {
            current,
            previous,
            variance,
            variance_pct: growth_rate(current, previous).map(|r| r * 100.0),
        }
    }
}

/// Year-over-year comparison of sales, profit and quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearOverYear {
    pub current_year: i32,
    pub previous_year: i32,
    pub sales: Comparison,
    /// Present when the data carries costs.
    pub profit: Option<Comparison>,
    /// Present when the data carries quantities.
    pub quantity: Option<Comparison>,
}

/// Cost and profit over the sales whose cost is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profitability {
    pub costed_transactions: usize,
    pub total_cost: f64,
    pub total_profit: f64,
    /// `profit / sales * 100` over costed sales; `None` when those sales are zero.
    pub margin_pct: Option<f64>,
}

/// The full KPI catalog of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCatalog {
    pub total_sales: f64,
    pub transaction_count: usize,
    pub average_transaction_value: f64,
    pub sales_by_period: Vec<PeriodSales>,
    pub period_growth: Vec<PeriodGrowth>,
    pub sales_by_quarter: Vec<QuarterSales>,
    pub sales_by_weekday: Vec<WeekdaySales>,
    pub customers: CustomerMetrics,
    pub top_products: Vec<RankedTotal>,
    pub year_over_year: Option<YearOverYear>,
    pub profitability: Option<Profitability>,
    pub by_product: Vec<DimensionMeasures>,
    pub by_region: Vec<DimensionMeasures>,
    pub by_customer: Vec<DimensionMeasures>,
}

// =============================================================================
// KPI functions
// =============================================================================

/// `(current - previous) / previous`, undefined when `previous` is zero.
pub fn growth_rate(current: f64, previous: f64) -> Option<f64> {
    (previous != 0.0).then(|| (current - previous) / previous)
}

/// Sum of all amounts.
pub fn total_sales(records: &[TransactionRecord]) -> f64 {
    records.iter().map(|r| r.amount).sum()
}

/// Total divided by count; `0.0` for an empty table.
pub fn average_transaction_value(records: &[TransactionRecord]) -> f64 {
    if records.is_empty() {
        0.0
    } else {
        total_sales(records) / records.len() as f64
    }
}

/// Sales per year-month, ascending.
///
/// Every month covered by the calendar appears, with zero when nothing sold.
pub fn sales_by_period(records: &[TransactionRecord], calendar: &[CalendarRow]) -> Vec<PeriodSales> {
    let mut buckets: BTreeMap<YearMonth, (f64, usize)> = calendar
        .iter()
        .map(|day| (day.year_month, (0.0, 0)))
        .collect();

    for record in records {
        let bucket = buckets.entry(record.period()).or_insert((0.0, 0));
        bucket.0 += record.amount;
        bucket.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(period, (total, transactions))| PeriodSales {
            period,
            total,
            transactions,
        })
        .collect()
}

/// Month-over-month growth for every consecutive pair of months.
pub fn period_growth(records: &[TransactionRecord], calendar: &[CalendarRow]) -> Vec<PeriodGrowth> {
    sales_by_period(records, calendar)
        .windows(2)
        .map(|pair| PeriodGrowth {
            period: pair[1].period,
            previous_period: pair[0].period,
            current: pair[1].total,
            previous: pair[0].total,
            rate: growth_rate(pair[1].total, pair[0].total),
        })
        .collect()
}

/// Sales per year-quarter, ascending, zero-filled over the calendar.
pub fn sales_by_quarter(records: &[TransactionRecord], calendar: &[CalendarRow]) -> Vec<QuarterSales> {
    let mut buckets: BTreeMap<YearQuarter, (f64, usize)> = calendar
        .iter()
        .map(|day| (day.year_quarter, (0.0, 0)))
        .collect();

    for record in records {
        let bucket = buckets
            .entry(YearQuarter::from_date(record.date))
            .or_insert((0.0, 0));
        bucket.0 += record.amount;
        bucket.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(period, (total, transactions))| QuarterSales {
            period,
            total,
            transactions,
        })
        .collect()
}

/// Sales per weekday, Monday first. All seven days are listed.
pub fn sales_by_weekday(records: &[TransactionRecord]) -> Vec<WeekdaySales> {
    let mut totals = [(0.0_f64, 0_usize); 7];
    for record in records {
        let slot = &mut totals[record.date.weekday().num_days_from_monday() as usize];
        slot.0 += record.amount;
        slot.1 += 1;
    }

    const WEEK: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
    WEEK.iter()
        .zip(totals)
        .map(|(day, (total, transactions))| WeekdaySales {
            weekday: day.to_string(),
            total,
            transactions,
        })
        .collect()
}

/// Group amounts by key, keeping keys in first-seen order.
fn totals_first_seen<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
    key: impl Fn(&'a TransactionRecord) -> &'a str,
) -> Vec<RankedTotal> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<RankedTotal> = Vec::new();

    for record in records {
        let k = key(record);
        let slot = *index.entry(k).or_insert_with(|| {
            totals.push(RankedTotal {
                key: k.to_string(),
                total: 0.0,
                transactions: 0,
            });
            totals.len() - 1
        });
        totals[slot].total += record.amount;
        totals[slot].transactions += 1;
    }

    totals
}

/// Highest totals first; ties keep first-seen order.
fn top_n(mut totals: Vec<RankedTotal>, n: usize) -> Vec<RankedTotal> {
    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
    totals.truncate(n);
    totals
}

/// Distinct customers, average spend and the top `n` customers by spend.
pub fn customer_metrics(records: &[TransactionRecord], unknown_label: &str, n: usize) -> CustomerMetrics {
    let totals = totals_first_seen(records, |r| r.customer.as_str());

    let distinct_customers = totals.len();
    let average_spend_per_customer = if distinct_customers == 0 {
        0.0
    } else {
        total_sales(records) / distinct_customers as f64
    };
    let unattributed = totals.iter().find(|t| t.key == unknown_label);

    CustomerMetrics {
        distinct_customers,
        average_spend_per_customer,
        attributed_customers: distinct_customers - usize::from(unattributed.is_some()),
        unattributed_sales: unattributed.map_or(0.0, |t| t.total),
        top_customers: top_n(totals, n),
    }
}

/// The top `n` products by sales.
pub fn top_products(records: &[TransactionRecord], n: usize) -> Vec<RankedTotal> {
    top_n(totals_first_seen(records, |r| r.product.as_str()), n)
}

/// Year to compare: the configured one, else the latest year in the data.
pub fn resolve_current_year(records: &[TransactionRecord], configured: Option<i32>) -> Option<i32> {
    configured.or_else(|| records.iter().map(|r| r.date.year()).max())
}

/// Current year against the previous one. `None` for an empty table
/// without a configured year.
pub fn year_over_year(records: &[TransactionRecord], current_year: Option<i32>) -> Option<YearOverYear> {
    let current_year = resolve_current_year(records, current_year)?;
    let previous_year = current_year - 1;

    let in_year = |year: i32| records.iter().filter(move |r| r.date.year() == year);
    let sum = |year: i32, f: &dyn Fn(&TransactionRecord) -> Option<f64>| -> f64 {
        in_year(year).filter_map(f).sum()
    };

    let has_cost = records.iter().any(|r| r.cost.is_some());
    let has_quantity = records.iter().any(|r| r.quantity.is_some());

    Some(YearOverYear {
        current_year,
        previous_year,
        sales: Comparison::new(
            sum(current_year, &|r: &TransactionRecord| Some(r.amount)),
            sum(previous_year, &|r: &TransactionRecord| Some(r.amount)),
        ),
        profit: has_cost.then(|| {
            Comparison::new(
                sum(current_year, &|r: &TransactionRecord| r.profit()),
                sum(previous_year, &|r: &TransactionRecord| r.profit()),
            )
        }),
        quantity: has_quantity.then(|| {
            Comparison::new(
                sum(current_year, &|r: &TransactionRecord| r.quantity),
                sum(previous_year, &|r: &TransactionRecord| r.quantity),
            )
        }),
    })
}

/// Cost, profit and margin. `None` when no record carries a cost.
pub fn profitability(records: &[TransactionRecord]) -> Option<Profitability> {
    let costed: Vec<&TransactionRecord> = records.iter().filter(|r| r.cost.is_some()).collect();
    if costed.is_empty() {
        return None;
    }

    let sales: f64 = costed.iter().map(|r| r.amount).sum();
    let total_cost: f64 = costed.iter().filter_map(|r| r.cost).sum();
    let total_profit = sales - total_cost;

    Some(Profitability {
        costed_transactions: costed.len(),
        total_cost,
        total_profit,
        margin_pct: (sales != 0.0).then(|| total_profit / sales * 100.0),
    })
}

/// Compute the whole catalog.
pub fn compute_catalog(
    records: &[TransactionRecord],
    calendar: &[CalendarRow],
    config: &AnalyticsConfig,
) -> KpiCatalog {
    let top = config.measures.top_n;
    let current_year = config.measures.current_year;

    KpiCatalog {
        total_sales: total_sales(records),
        transaction_count: records.len(),
        average_transaction_value: average_transaction_value(records),
        sales_by_period: sales_by_period(records, calendar),
        period_growth: period_growth(records, calendar),
        sales_by_quarter: sales_by_quarter(records, calendar),
        sales_by_weekday: sales_by_weekday(records),
        customers: customer_metrics(records, &config.cleaning.unknown_label, top),
        top_products: top_products(records, top),
        year_over_year: year_over_year(records, current_year),
        profitability: profitability(records),
        by_product: measures_by_dimension(records, Dimension::Product, current_year),
        by_region: measures_by_dimension(records, Dimension::Region, current_year),
        by_customer: measures_by_dimension(records, Dimension::Customer, current_year),
    }
}
