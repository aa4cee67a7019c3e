//! Per-dimension measure tables (sales by product, by region, by customer).

use chrono::Datelike;
use serde::Serialize;
use std::collections::HashMap;

use super::{growth_rate, resolve_current_year};
use crate::models::TransactionRecord;

/// Attribute a measure table is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Product,
    Customer,
    Region,
}

impl Dimension {
    fn key<'a>(&self, record: &'a TransactionRecord) -> &'a str {
        match self {
            Dimension::Product => &record.product,
            Dimension::Customer => &record.customer,
            Dimension::Region => &record.region,
        }
    }
}

/// Current-year measures of one dimension member, against the previous year.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DimensionMeasures {
    pub key: String,
    pub sales_cy: f64,
    pub sales_py: f64,
    pub variance: f64,
    pub variance_pct: Option<f64>,
    /// Current-year profit, when any current-year record has a cost.
    pub profit_cy: Option<f64>,
    /// Previous-year profit, when any previous-year record has a cost.
    pub profit_py: Option<f64>,
    /// Current-year profit as a percentage of current-year sales.
    pub margin_pct: Option<f64>,
    /// Current-year quantity, when any current-year record has one.
    pub quantity_cy: Option<f64>,
    pub quantity_py: Option<f64>,
    pub transactions_cy: usize,
}

/// Measures per member of `dimension`, highest current-year sales first.
///
/// Members seen only outside the two compared years are left out. Ties keep
/// the order in which members first appear in `records`.
pub fn measures_by_dimension(
    records: &[TransactionRecord],
    dimension: Dimension,
    current_year: Option<i32>,
) -> Vec<DimensionMeasures> {
    let Some(cy) = resolve_current_year(records, current_year) else {
        return Vec::new();
    };
    let py = cy - 1;

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<DimensionMeasures> = Vec::new();

    for record in records {
        let year = record.date.year();
        if year != cy && year != py {
            continue;
        }

        let key = dimension.key(record);
        let slot = *index.entry(key).or_insert_with(|| {
            rows.push(DimensionMeasures {
                key: key.to_string(),
                ..Default::default()
            });
            rows.len() - 1
        });
        let row = &mut rows[slot];

        let (sales, profit, quantity) = if year == cy {
            row.transactions_cy += 1;
            (&mut row.sales_cy, &mut row.profit_cy, &mut row.quantity_cy)
        } else {
            (&mut row.sales_py, &mut row.profit_py, &mut row.quantity_py)
        };
        *sales += record.amount;
        if let Some(p) = record.profit() {
            *profit.get_or_insert(0.0) += p;
        }
        if let Some(q) = record.quantity {
            *quantity.get_or_insert(0.0) += q;
        }
    }

    for row in &mut rows {
        row.variance = row.sales_cy - row.sales_py;
        row.variance_pct = growth_rate(row.sales_cy, row.sales_py).map(|r| r * 100.0);
        row.margin_pct = row
            .profit_cy
            .filter(|_| row.sales_cy != 0.0)
            .map(|p| p / row.sales_cy * 100.0);
    }

    rows.sort_by(|a, b| b.sales_cy.total_cmp(&a.sales_cy));
    rows
}
