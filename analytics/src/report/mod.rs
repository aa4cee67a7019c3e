//! Run outputs: CSV tables, KPI JSON, text report and SVG dashboard.
//!
//! [`write_outputs`] writes everything a run produces into one directory:
//!
//! | File                        | Content                              |
//! |-----------------------------|--------------------------------------|
//! | `sales_data_processed.csv`  | cleaned fact table                   |
//! | `date_table.csv`            | calendar dimension                   |
//! | `kpis.json`                 | run metadata, cleaning summary, KPIs |
//! | `report.txt`                | human-readable report                |
//! | `dashboard.svg`             | charts (unless disabled)             |

mod dashboard;
mod text;

pub use dashboard::render_dashboard;
pub use text::{format_count, format_currency, format_pct, render_summary, render_text_report};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::clean::CleaningSummary;
use crate::config::ReportConfig;
use crate::error::ReportResult;
use crate::measures::KpiCatalog;
use crate::models::{CalendarRow, TransactionRecord};
use crate::parser::ParseResult;
use crate::pipeline::{PipelineResult, SourceInfo};

pub const CLEANED_FILE: &str = "sales_data_processed.csv";
pub const CALENDAR_FILE: &str = "date_table.csv";
pub const KPI_FILE: &str = "kpis.json";
pub const REPORT_FILE: &str = "report.txt";
pub const DASHBOARD_FILE: &str = "dashboard.svg";

/// JSON document written to `kpis.json`.
#[derive(Debug, Serialize)]
pub struct KpiExport<'a> {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub source: &'a SourceInfo,
    pub cleaning: &'a CleaningSummary,
    pub kpis: &'a KpiCatalog,
}

impl<'a> KpiExport<'a> {
    pub fn new(result: &'a PipelineResult) -> Self {
        Self {
            run_id: result.run_id,
            generated_at: result.generated_at,
            source: &result.source,
            cleaning: &result.cleaned.summary,
            kpis: &result.kpis,
        }
    }
}

/// Paths written by [`write_outputs`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputFiles {
    pub cleaned: PathBuf,
    pub calendar: PathBuf,
    pub kpis: PathBuf,
    pub report: PathBuf,
    pub dashboard: Option<PathBuf>,
}

impl OutputFiles {
    pub fn all(&self) -> Vec<&Path> {
        let mut paths = vec![
            self.cleaned.as_path(),
            self.calendar.as_path(),
            self.kpis.as_path(),
            self.report.as_path(),
        ];
        if let Some(dashboard) = &self.dashboard {
            paths.push(dashboard.as_path());
        }
        paths
    }
}

/// Write the cleaned fact table as CSV.
pub fn write_cleaned_csv(records: &[TransactionRecord], path: &Path) -> ReportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the calendar dimension as CSV.
pub fn write_calendar_csv(calendar: &[CalendarRow], path: &Path) -> ReportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in calendar {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write an untyped table as CSV, columns in header order.
pub fn write_raw_csv(raw: &ParseResult, path: &Path) -> ReportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&raw.headers)?;
    for record in &raw.records {
        let cells = raw.headers.iter().map(|h| match record.get(h) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        });
        writer.write_record(cells)?;
    }
    writer.flush()?;
    Ok(())
}

/// Pretty JSON of the run metadata, cleaning summary and KPI catalog.
pub fn kpis_to_json(result: &PipelineResult) -> ReportResult<String> {
    Ok(serde_json::to_string_pretty(&KpiExport::new(result))?)
}

/// Write every output of a run into `dir`, creating it if needed.
pub fn write_outputs(result: &PipelineResult, dir: &Path, config: &ReportConfig) -> ReportResult<OutputFiles> {
    fs::create_dir_all(dir)?;

    let files = OutputFiles {
        cleaned: dir.join(CLEANED_FILE),
        calendar: dir.join(CALENDAR_FILE),
        kpis: dir.join(KPI_FILE),
        report: dir.join(REPORT_FILE),
        dashboard: config.dashboard.then(|| dir.join(DASHBOARD_FILE)),
    };

    write_cleaned_csv(&result.cleaned.records, &files.cleaned)?;
    write_calendar_csv(&result.calendar, &files.calendar)?;
    fs::write(&files.kpis, kpis_to_json(result)?)?;
    fs::write(&files.report, render_text_report(result, config))?;
    if let Some(path) = &files.dashboard {
        render_dashboard(&result.kpis, config, path)?;
    }

    tracing::debug!(dir = %dir.display(), "outputs written");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyticsConfig;
    use crate::parser::{parse_csv_file_auto, parse_string_with_metadata};
    use crate::pipeline::run_pipeline;

    fn example_result(config: &AnalyticsConfig) -> PipelineResult {
        let raw = parse_string_with_metadata(
            "Date,Product,Amount,Region\n2024-01-05,Widget,10,North\n2024-02-10,Gadget,20,South\n",
            ',',
            "utf-8".to_string(),
        )
        .unwrap();
        run_pipeline(raw, config).unwrap()
    }

    #[test]
    fn test_write_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let mut config = AnalyticsConfig::default();
        config.report.dashboard = false;
        let result = example_result(&config);

        let files = write_outputs(&result, &out, &config.report).unwrap();
        assert!(files.dashboard.is_none());
        assert_eq!(files.all().len(), 4);
        for path in files.all() {
            assert!(path.exists(), "{} missing", path.display());
        }

        let cleaned = fs::read_to_string(&files.cleaned).unwrap();
        let mut lines = cleaned.lines();
        assert_eq!(
            lines.next(),
            Some("source_row,date,product,amount,customer,region,quantity,cost")
        );
        assert_eq!(lines.next(), Some("1,2024-01-05,Widget,10.0,Unknown,North,,"));

        let calendar = fs::read_to_string(&files.calendar).unwrap();
        assert_eq!(calendar.lines().count(), 38);
        assert!(calendar.lines().nth(1).unwrap().starts_with("2024-01-05,2024,1,Q1,1,January"));
    }

    #[test]
    fn test_kpi_json_shape() {
        let config = AnalyticsConfig::default();
        let result = example_result(&config);
        let json: serde_json::Value = serde_json::from_str(&kpis_to_json(&result).unwrap()).unwrap();

        assert_eq!(json["run_id"], result.run_id.to_string());
        assert_eq!(json["kpis"]["total_sales"], 30.0);
        assert_eq!(json["kpis"]["sales_by_period"][1]["period"], "2024-02");
        assert_eq!(json["kpis"]["period_growth"][0]["rate"], 1.0);
        assert!(json["kpis"]["year_over_year"]["sales"]["variance_pct"].is_null());
        assert_eq!(json["cleaning"]["rows_kept"], 2);
        assert_eq!(json["source"]["format"], "csv");
    }

    #[test]
    fn test_raw_csv_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        let raw = parse_string_with_metadata(
            "Date;Product;Amount\n2024-01-05;Widget, large;10\n",
            ';',
            "utf-8".to_string(),
        )
        .unwrap();

        write_raw_csv(&raw, &path).unwrap();
        let reloaded = parse_csv_file_auto(&path).unwrap();
        assert_eq!(reloaded.headers, raw.headers);
        assert_eq!(reloaded.records, raw.records);
    }
}
