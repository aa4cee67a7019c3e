//! Run configuration.
//!
//! Everything the source workbook leaves to convention is configurable here:
//! which header names are recognized for each logical column, how dates are
//! parsed, which month starts the fiscal year, and how results are rendered.
//!
//! Configuration is read from a JSON file (validated against the embedded
//! schema), then overridden from the environment:
//!
//! | Variable                   | Field                          |
//! |----------------------------|--------------------------------|
//! | `SALES_FISCAL_START_MONTH` | `calendar.fiscal_start_month`  |
//! | `SALES_TOP_N`              | `measures.top_n`               |
//! | `SALES_CURRENT_YEAR`       | `measures.current_year`        |
//! | `SALES_CURRENCY`           | `report.currency_symbol`       |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::RangeInclusive;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::models::UNKNOWN;
use crate::validation::validate_config;

/// Complete configuration for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub columns: ColumnSynonyms,
    pub cleaning: CleaningConfig,
    pub calendar: CalendarConfig,
    pub measures: MeasureConfig,
    pub report: ReportConfig,
}

/// Accepted header names per logical column, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSynonyms {
    pub date: Vec<String>,
    pub product: Vec<String>,
    pub amount: Vec<String>,
    pub customer: Vec<String>,
    pub region: Vec<String>,
    pub quantity: Vec<String>,
    pub unit_price: Vec<String>,
    pub unit_cost: Vec<String>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnSynonyms {
    fn default() -> Self {
        Self {
            date: strings(&[
                "date",
                "transaction date",
                "order date",
                "orderdate",
                "sale date",
                "invoice date",
            ]),
            product: strings(&[
                "product",
                "product description",
                "product name",
                "service",
                "item",
                "sku",
            ]),
            amount: strings(&[
                "amount",
                "sale amount",
                "sales amount",
                "sales",
                "revenue",
                "total",
            ]),
            customer: strings(&[
                "customer",
                "customer name",
                "customer names",
                "client",
                "customer id",
            ]),
            region: strings(&[
                "region",
                "geography",
                "city",
                "country",
                "state",
                "delivery region",
            ]),
            quantity: strings(&["quantity", "order quantity", "qty", "units"]),
            unit_price: strings(&["unit price", "unit selling price", "price"]),
            unit_cost: strings(&["unit cost", "cost"]),
        }
    }
}

/// Row-level cleaning policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Drop rows whose every cell repeats an earlier row.
    pub drop_duplicates: bool,
    /// Label written into absent optional text fields.
    pub unknown_label: String,
    /// `chrono` format strings tried in order. Date-time formats are
    /// accepted and truncated to the date.
    pub date_formats: Vec<String>,
    /// Number of individual row warnings kept in the summary.
    pub max_warnings: usize,
    /// Earliest accepted transaction year.
    pub min_year: i32,
    /// Latest accepted transaction year.
    pub max_year: i32,
}

impl CleaningConfig {
    /// Years a parsed date must fall in to be kept.
    pub fn year_window(&self) -> RangeInclusive<i32> {
        self.min_year..=self.max_year
    }
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            drop_duplicates: true,
            unknown_label: UNKNOWN.to_string(),
            date_formats: strings(&[
                "%Y-%m-%d",
                "%Y-%m-%d %H:%M:%S",
                "%Y-%m-%dT%H:%M:%S",
                "%Y/%m/%d",
                "%d/%m/%Y",
                "%d.%m.%Y",
                "%d-%b-%Y",
                "%d/%m/%y",
                "%d.%m.%y",
            ]),
            max_warnings: 20,
            min_year: 1900,
            max_year: 2100,
        }
    }
}

/// Date dimension options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Month (1-12) in which the fiscal year starts. 1 = calendar year.
    pub fiscal_start_month: u32,
    /// Widen the date table by whole months on both sides. 0 keeps the
    /// table to exactly the span of the transactions.
    pub buffer_months: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            fiscal_start_month: 4,
            buffer_months: 0,
        }
    }
}

/// KPI options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    /// Length of the top customers / products rankings.
    pub top_n: usize,
    /// Year compared against the previous one. Defaults to the latest year
    /// present in the data.
    pub current_year: Option<i32>,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            current_year: None,
        }
    }
}

/// Output rendering options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub currency_symbol: String,
    /// Render `dashboard.svg`.
    pub dashboard: bool,
    pub dashboard_width: u32,
    pub dashboard_height: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "€".to_string(),
            dashboard: true,
            dashboard_width: 1600,
            dashboard_height: 1000,
        }
    }
}

impl AnalyticsConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        validate_config(&value).map_err(|errors| ConfigError::Schema { errors })?;
        let config: Self = serde_json::from_value(value)?;
        if config.cleaning.min_year > config.cleaning.max_year {
            return Err(ConfigError::Schema {
                errors: vec![format!(
                    "cleaning: min_year ({}) is after max_year ({})",
                    config.cleaning.min_year, config.cleaning.max_year
                )],
            });
        }
        Ok(config)
    }

    /// Read a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Load from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// [`AnalyticsConfig::load`]).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("SALES_FISCAL_START_MONTH") {
            let month = parse_override::<u32>("SALES_FISCAL_START_MONTH", &raw)?;
            if !(1..=12).contains(&month) {
                return Err(ConfigError::InvalidOverride {
                    var: "SALES_FISCAL_START_MONTH".into(),
                    message: format!("month must be 1-12, got {}", month),
                });
            }
            self.calendar.fiscal_start_month = month;
        }
        if let Some(raw) = lookup("SALES_TOP_N") {
            let top_n = parse_override::<usize>("SALES_TOP_N", &raw)?;
            if top_n == 0 {
                return Err(ConfigError::InvalidOverride {
                    var: "SALES_TOP_N".into(),
                    message: "must be at least 1".into(),
                });
            }
            self.measures.top_n = top_n;
        }
        if let Some(raw) = lookup("SALES_CURRENT_YEAR") {
            self.measures.current_year = Some(parse_override::<i32>("SALES_CURRENT_YEAR", &raw)?);
        }
        if let Some(raw) = lookup("SALES_CURRENCY") {
            self.report.currency_symbol = raw;
        }
        Ok(())
    }

    /// Pretty JSON of this configuration.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn parse_override<T: std::str::FromStr>(var: &str, raw: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidOverride {
        var: var.to_string(),
        message: format!("'{}': {}", raw, e),
    })
}
