//! End-to-end run: load, clean, build the calendar, compute the KPI catalog.
//!
//! # Example
//!
//! ```rust,ignore
//! use sales_analytics::{run_file, AnalyticsConfig, PipelineOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalyticsConfig::load(None)?;
//!     let options = PipelineOptions::for_input("data/Sales.xlsx");
//!     let result = run_file(&options, &config)?;
//!
//!     println!("Total sales: {:.2}", result.kpis.total_sales);
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::calendar::calendar_for_records;
use crate::clean::{clean_table, CleanedTable};
use crate::config::AnalyticsConfig;
use crate::error::RunResult;
use crate::logs::RunLog;
use crate::measures::{compute_catalog, KpiCatalog};
use crate::models::CalendarRow;
use crate::parser::{load_table, ParseResult, SourceFormat};
use crate::sample::{generate_sample, DEFAULT_SAMPLE_SIZE, DEFAULT_SEED};

/// Options for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOptions {
    /// Input workbook or CSV file.
    pub input: Option<PathBuf>,
    /// Worksheet to read (first sheet when unset).
    pub sheet: Option<String>,
    /// Directory receiving the exports.
    pub output_dir: PathBuf,
    /// Generate sample data instead of reading `input`.
    pub use_sample: bool,
    pub sample_size: usize,
    pub seed: u64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            input: None,
            sheet: None,
            output_dir: PathBuf::from("outputs"),
            use_sample: false,
            sample_size: DEFAULT_SAMPLE_SIZE,
            seed: DEFAULT_SEED,
        }
    }
}

impl PipelineOptions {
    pub fn for_input(path: impl Into<PathBuf>) -> Self {
        Self {
            input: Some(path.into()),
            ..Default::default()
        }
    }
}

/// Raw table information
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub path: Option<PathBuf>,
    pub format: SourceFormat,
    pub encoding: String,
    pub delimiter: char,
    pub sheet: Option<String>,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl SourceInfo {
    fn new(raw: &ParseResult, path: Option<&Path>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            format: raw.format,
            encoding: raw.encoding.clone(),
            delimiter: raw.delimiter,
            sheet: raw.sheet.clone(),
            headers: raw.headers.clone(),
            row_count: raw.records.len(),
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub source: SourceInfo,
    pub cleaned: CleanedTable,
    pub calendar: Vec<CalendarRow>,
    pub kpis: KpiCatalog,
    pub log: RunLog,
}

/// Run clean, calendar and measures over an already-loaded table.
///
/// Fails only when a required column cannot be matched. Row-level problems
/// end up in the cleaning summary.
pub fn run_pipeline(raw: ParseResult, config: &AnalyticsConfig) -> RunResult<PipelineResult> {
    run_parsed(raw, None, config, RunLog::new())
}

/// Load `options.input` (or generate sample data) and run the pipeline.
///
/// A missing input file falls back to sample data with a warning; an
/// unreadable one is an error.
pub fn run_file(options: &PipelineOptions, config: &AnalyticsConfig) -> RunResult<PipelineResult> {
    let mut log = RunLog::new();

    let input = options.input.as_deref().filter(|_| !options.use_sample);
    let (raw, path) = match input {
        Some(path) if path.exists() => {
            log.info(format!("📖 Reading {}", path.display()));
            (load_table(path, options.sheet.as_deref())?, Some(path))
        }
        missing => {
            if let Some(path) = missing {
                log.warning(format!("File not found: {}", path.display()));
            }
            log.info(format!(
                "Generating {} sample rows (seed {})",
                options.sample_size, options.seed
            ));
            (generate_sample(options.sample_size, options.seed), None)
        }
    };

    run_parsed(raw, path, config, log)
}

fn run_parsed(
    raw: ParseResult,
    path: Option<&Path>,
    config: &AnalyticsConfig,
    mut log: RunLog,
) -> RunResult<PipelineResult> {
    let source = SourceInfo::new(&raw, path);

    match source.format {
        SourceFormat::Csv => {
            log.success(format!("Detected encoding: {}", source.encoding));
            log.success(format!("Detected separator: '{}'", format_delimiter(source.delimiter)));
        }
        SourceFormat::Workbook => {
            if let Some(sheet) = &source.sheet {
                log.success(format!("Sheet: {}", sheet));
            }
        }
        SourceFormat::Sample => {}
    }
    log.success(format!("Read {} rows", source.row_count));
    log.info_indent(format!("Columns: {}", source.headers.join(", ")), 1);

    // Clean
    log.info("🧹 Cleaning rows...");
    let cleaned = clean_table(&raw, &config.cleaning, &config.columns)?;
    let columns = &cleaned.summary.columns;
    log.info_indent(
        format!(
            "date={}, product={}, amount={}",
            columns.date,
            columns.product,
            columns
                .amount
                .clone()
                .unwrap_or_else(|| "quantity x unit price".to_string())
        ),
        1,
    );
    cleaned.summary.log_to(&mut log);

    // Calendar
    log.info("📅 Building date table...");
    let calendar = calendar_for_records(&cleaned.records, &config.calendar);
    match (calendar.first(), calendar.last()) {
        (Some(first), Some(last)) => log.success(format!(
            "{} days from {} to {} (fiscal year starts in month {})",
            calendar.len(),
            first.date,
            last.date,
            config.calendar.fiscal_start_month
        )),
        _ => log.error("No valid rows: date table is empty"),
    }

    // Measures
    log.info("📈 Computing measures...");
    let kpis = compute_catalog(&cleaned.records, &calendar, config);
    log.success(format!(
        "{} transactions, {} periods, {} products",
        kpis.transaction_count,
        kpis.sales_by_period.len(),
        kpis.by_product.len()
    ));

    Ok(PipelineResult {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        source,
        cleaned,
        calendar,
        kpis,
        log,
    })
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DataFormatError, PipelineError};
    use crate::logs::LogLevel;
    use crate::parser::parse_string_with_metadata;

    #[test]
    fn test_run_pipeline_worked_example() {
        let raw = parse_string_with_metadata(
            "Date,Product,Amount\n2024-01-05,Widget,10\n2024-02-10,Gadget,20\n",
            ',',
            "utf-8".to_string(),
        )
        .unwrap();
        let result = run_pipeline(raw, &AnalyticsConfig::default()).unwrap();

        assert_eq!(result.source.row_count, 2);
        assert_eq!(result.cleaned.records.len(), 2);
        assert_eq!(result.calendar.len(), 37);
        assert_eq!(result.kpis.total_sales, 30.0);
        assert_eq!(result.kpis.period_growth[0].rate, Some(1.0));
        assert_eq!(result.log.problem_count(), 0);
    }

    #[test]
    fn test_short_year_date_keeps_calendar_bounded() {
        let raw = parse_string_with_metadata(
            "Date,Product,Amount\n05/01/2024,Widget,10\n06/01/24,Widget,5\n",
            ',',
            "utf-8".to_string(),
        )
        .unwrap();
        let result = run_pipeline(raw, &AnalyticsConfig::default()).unwrap();

        let dates: Vec<String> = result.cleaned.records.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, ["2024-01-05", "2024-01-06"]);
        assert_eq!(result.calendar.len(), 2);
        assert_eq!(result.kpis.sales_by_period.len(), 1);
        assert!(result.kpis.period_growth.is_empty());
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let raw = parse_string_with_metadata("Product,Amount\nWidget,10\n", ',', "utf-8".to_string()).unwrap();
        let err = run_pipeline(raw, &AnalyticsConfig::default()).unwrap_err();
        match err {
            PipelineError::DataFormat(DataFormatError::MissingColumn { column, .. }) => {
                assert_eq!(column, "date")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_all_rows_invalid_still_runs() {
        let raw = parse_string_with_metadata(
            "Date,Product,Amount\nnope,Widget,10\n2024-01-01,Gadget,abc\n",
            ',',
            "utf-8".to_string(),
        )
        .unwrap();
        let result = run_pipeline(raw, &AnalyticsConfig::default()).unwrap();
        assert!(result.cleaned.records.is_empty());
        assert!(result.calendar.is_empty());
        assert_eq!(result.kpis.total_sales, 0.0);
        assert_eq!(result.kpis.average_transaction_value, 0.0);
        assert!(result.log.problem_count() > 0);
        assert!(result
            .log
            .entries()
            .iter()
            .any(|e| e.level == LogLevel::Error && e.message.contains("No valid rows")));
    }

    #[test]
    fn test_run_file_falls_back_to_sample() {
        let options = PipelineOptions {
            input: Some(PathBuf::from("/definitely/not/here.xlsx")),
            sample_size: 300,
            ..Default::default()
        };
        let result = run_file(&options, &AnalyticsConfig::default()).unwrap();
        assert_eq!(result.source.format, SourceFormat::Sample);
        assert_eq!(result.source.row_count, 300);
        assert!(result.source.path.is_none());
        assert!(result.kpis.total_sales > 0.0);
    }
}
