//! # Sales Analytics - batch KPI pipeline for tabular sales data
//!
//! Loads a sales export (CSV in any common encoding/delimiter, or a
//! workbook), cleans it into typed transactions, builds a calendar
//! dimension over the covered dates, and computes a catalog of KPIs that is
//! exported as CSV, JSON, a text report and an SVG dashboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ CSV / XLSX  │────▶│   Loader    │────▶│  Calendar   │────▶│  Measures   │
//! │ (any enc.)  │     │  + Cleaner  │     │  (per day)  │     │ (KPI set)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                                    │
//!                                                                    ▼
//!                                                          report / dashboard
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sales_analytics::{run_file, write_outputs, AnalyticsConfig, PipelineOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalyticsConfig::load(None)?;
//!     let options = PipelineOptions::for_input("data/Sales.xlsx");
//!     let result = run_file(&options, &config)?;
//!     write_outputs(&result, &options.output_dir, &config.report)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`models`] - Typed tables (TransactionRecord, CalendarRow, period keys)
//! - [`config`] - Run configuration (JSON file + environment overrides)
//! - [`validation`] - Schema validation of configuration documents
//! - [`parser`] - CSV / workbook loading with auto-detection
//! - [`clean`] - Column resolution and row-level cleaning
//! - [`calendar`] - Date dimension builder
//! - [`measures`] - KPI catalog
//! - [`pipeline`] - End-to-end run
//! - [`sample`] - Synthetic input data
//! - [`report`] - Exports, text report and dashboard
//! - [`logs`] - Run log and tracing setup

// Core modules
pub mod error;
pub mod models;

// Configuration
pub mod config;
pub mod validation;

// Loading & cleaning
pub mod clean;
pub mod parser;

// Analytics
pub mod calendar;
pub mod measures;

// Orchestration
pub mod logs;
pub mod pipeline;
pub mod sample;

// Output
pub mod report;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ConfigResult, DataFormatError, DataResult, PipelineError, ReportError, ReportResult,
    RunResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{CalendarRow, TransactionRecord, YearMonth, YearQuarter, UNKNOWN};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{AnalyticsConfig, CalendarConfig, CleaningConfig, ColumnSynonyms, MeasureConfig, ReportConfig};

// =============================================================================
// Re-exports - Parsing & cleaning
// =============================================================================

pub use parser::{
    csv_to_json,
    decode_content,
    detect_delimiter,
    detect_encoding,
    load_table,
    parse_bytes_auto,
    parse_csv_file_auto,
    parse_workbook,
    ParseResult,
    SourceFormat,
};

pub use clean::{
    clean_table, parse_amount, parse_date, resolve_columns, CleanedTable, CleaningSummary, ColumnMapping,
    DropReason, RowValidationWarning,
};

// =============================================================================
// Re-exports - Calendar & measures
// =============================================================================

pub use calendar::{build_calendar, calendar_for_records, fiscal_period};

pub use measures::{
    compute_catalog, growth_rate, measures_by_dimension, Dimension, DimensionMeasures, KpiCatalog,
};

// =============================================================================
// Re-exports - Pipeline & output
// =============================================================================

pub use pipeline::{run_file, run_pipeline, PipelineOptions, PipelineResult, SourceInfo};

pub use sample::generate_sample;

pub use report::{render_dashboard, render_text_report, write_outputs, OutputFiles};

pub use logs::{init_logging, LogEntry, LogLevel, RunLog};
