use sales_analytics::report::{CALENDAR_FILE, CLEANED_FILE, DASHBOARD_FILE, KPI_FILE, REPORT_FILE};
use sales_analytics::{
    run_file, write_outputs, AnalyticsConfig, DropReason, PipelineError, PipelineOptions, SourceFormat,
};
use std::fs;

const SALES_CSV: &str = "\u{feff}Order Date;Product Description;Customer Names;City;Sales Amount\n\
2023-03-15;Cookware;Avon Corp;Paris;1.250,00\n\
2023-11-02;Wall Clocks;Burke Ltd;Lyon;€ 80,50\n\
2024-01-05;Cookware;Avon Corp;Paris;1.500,00\n\
2024-01-05;Cookware;Avon Corp;Paris;1.500,00\n\
2024-02-10;Table Lamps;;Nice;200\n\
31/13/2024;Cookware;Avon Corp;Paris;10\n\
2024-04-01;Wall Clocks;Burke Ltd;Lyon;-5\n\
2024-04-20;Table Lamps;Cedar Partners;Lyon;abc\n";

fn write_input(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("sales.csv");
    fs::write(&path, SALES_CSV).unwrap();
    path
}

#[test]
fn test_csv_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let out = dir.path().join("outputs");

    let config = AnalyticsConfig::default();
    let mut options = PipelineOptions::for_input(&input);
    options.output_dir = out.clone();

    let result = run_file(&options, &config).unwrap();

    assert_eq!(result.source.format, SourceFormat::Csv);
    assert_eq!(result.source.delimiter, ';');
    assert_eq!(result.source.row_count, 8);

    let summary = &result.cleaned.summary;
    assert_eq!(summary.rows_kept, 4);
    assert_eq!(summary.dropped.get(&DropReason::Duplicate), Some(&1));
    assert_eq!(summary.dropped.get(&DropReason::InvalidDate), Some(&1));
    assert_eq!(summary.dropped.get(&DropReason::NegativeAmount), Some(&1));
    assert_eq!(summary.dropped.get(&DropReason::InvalidAmount), Some(&1));
    assert_eq!(summary.rows_kept + summary.rows_dropped(), summary.rows_in);

    let kpis = &result.kpis;
    assert!((kpis.total_sales - 3030.5).abs() < 1e-9);
    assert_eq!(kpis.transaction_count, 4);
    assert_eq!(kpis.customers.distinct_customers, 3);
    assert_eq!(kpis.customers.attributed_customers, 2);
    assert_eq!(kpis.customers.top_customers[0].key, "Avon Corp");
    assert_eq!(kpis.customers.unattributed_sales, 200.0);

    // 2023-03 .. 2024-02, zero-filled
    assert_eq!(kpis.sales_by_period.len(), 12);
    let period_sum: f64 = kpis.sales_by_period.iter().map(|p| p.total).sum();
    assert!((period_sum - kpis.total_sales).abs() < 1e-9);

    let yoy = kpis.year_over_year.as_ref().unwrap();
    assert_eq!(yoy.current_year, 2024);
    assert_eq!(yoy.sales.current, 1700.0);
    assert!((yoy.sales.previous - 1330.5).abs() < 1e-9);

    let files = write_outputs(&result, &out, &config.report).unwrap();
    for name in [CLEANED_FILE, CALENDAR_FILE, KPI_FILE, REPORT_FILE, DASHBOARD_FILE] {
        assert!(out.join(name).exists(), "{} missing", name);
    }
    assert_eq!(files.all().len(), 5);

    let report = fs::read_to_string(out.join(REPORT_FILE)).unwrap();
    assert!(report.contains("€3,030.50"));
    assert!(report.contains("negative amount"));
}

#[test]
fn test_config_file_and_fiscal_year() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let config_path = dir.path().join("config.json");
    fs::write(
        &config_path,
        r#"{
            "calendar": { "fiscal_start_month": 7 },
            "cleaning": { "drop_duplicates": false },
            "measures": { "top_n": 1, "current_year": 2023 },
            "report": { "currency_symbol": "$", "dashboard": false }
        }"#,
    )
    .unwrap();

    let config = AnalyticsConfig::from_file(&config_path).unwrap();
    let result = run_file(&PipelineOptions::for_input(&input), &config).unwrap();

    assert_eq!(result.cleaned.summary.rows_kept, 5);
    assert!(result.cleaned.summary.dropped.get(&DropReason::Duplicate).is_none());
    assert_eq!(result.kpis.customers.top_customers.len(), 1);
    assert_eq!(result.kpis.year_over_year.as_ref().unwrap().current_year, 2023);

    let first = &result.calendar[0];
    assert_eq!(first.date.to_string(), "2023-03-15");
    assert_eq!((first.fiscal_year, first.fiscal_quarter), (2022, 3));

    let out = dir.path().join("out");
    let files = write_outputs(&result, &out, &config.report).unwrap();
    assert!(files.dashboard.is_none());
    assert!(!out.join(DASHBOARD_FILE).exists());
}

#[test]
fn test_missing_date_column_names_column() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("nodate.csv");
    fs::write(&input, "Product,Amount\nWidget,10\n").unwrap();

    let err = run_file(&PipelineOptions::for_input(&input), &AnalyticsConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::DataFormat(_)));
    assert!(err.to_string().contains("date"));
}

#[test]
fn test_invalid_config_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, r#"{ "calendar": { "fiscal_start_month": 0 } }"#).unwrap();

    assert!(AnalyticsConfig::from_file(&config_path).is_err());
}
