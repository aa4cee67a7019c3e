//! Sales Analytics CLI - KPIs, report and dashboard from a sales export
//!
//! # Main Commands
//!
//! ```bash
//! sales-analytics run data/Sales.xlsx -o outputs   # Full pipeline
//! sales-analytics run --sample                     # Same, on generated data
//! ```
//!
//! # Utility Commands
//!
//! ```bash
//! sales-analytics clean input.csv -o clean.csv     # Load + clean only
//! sales-analytics calendar --from 2024-01-01 --to 2024-12-31
//! sales-analytics sample -n 1000 -o sample.csv     # Write synthetic data
//! sales-analytics config                           # Print effective config
//! ```

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sales_analytics::report::{render_summary, write_calendar_csv, write_cleaned_csv, write_raw_csv};
use sales_analytics::{
    build_calendar, clean_table, generate_sample, init_logging, load_table, run_file, write_outputs,
    AnalyticsConfig, PipelineOptions,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sales-analytics")]
#[command(about = "Clean sales data, build a date table and compute KPIs", long_about = None)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: load → clean → calendar → KPIs → outputs
    Run {
        /// Input CSV or workbook (sample data is generated when missing)
        input: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "outputs")]
        output: PathBuf,

        /// Worksheet to read (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Use generated sample data instead of the input file
        #[arg(long)]
        sample: bool,

        /// Rows of sample data
        #[arg(long, default_value = "5000")]
        sample_size: usize,

        /// Seed for sample data
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Skip the SVG dashboard
        #[arg(long)]
        no_dashboard: bool,
    },

    /// Load and clean a file, print the cleaning summary
    Clean {
        /// Input CSV or workbook
        input: PathBuf,

        /// Worksheet to read (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Write the cleaned table as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build a date table for a range
    Calendar {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write synthetic sales data as CSV
    Sample {
        /// Number of rows
        #[arg(short = 'n', long, default_value = "5000")]
        rows: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the effective configuration as JSON
    Config {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match AnalyticsConfig::load(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Run {
                input,
                output,
                sheet,
                sample,
                sample_size,
                seed,
                no_dashboard,
            } => {
                let options = PipelineOptions {
                    input,
                    sheet,
                    output_dir: output,
                    use_sample: sample,
                    sample_size,
                    seed,
                };
                cmd_run(&options, config, no_dashboard)
            }

            Commands::Clean { input, sheet, output } => {
                cmd_clean(&input, sheet.as_deref(), output.as_deref(), &config)
            }

            Commands::Calendar { from, to, output } => cmd_calendar(from, to, output.as_deref(), &config),

            Commands::Sample { rows, seed, output } => cmd_sample(rows, seed, &output),

            Commands::Config { output } => cmd_config(&config, output.as_deref()),
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_run(
    options: &PipelineOptions,
    mut config: AnalyticsConfig,
    no_dashboard: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if no_dashboard {
        config.report.dashboard = false;
    }

    eprintln!("🚀 Sales analytics run");
    let result = run_file(options, &config)?;

    eprintln!("\n📈 Key figures:");
    eprintln!("{}", render_summary(&result.kpis, &config.report));

    let files = write_outputs(&result, &options.output_dir, &config.report)?;
    eprintln!("\n📁 Files written to '{}':", options.output_dir.display());
    for path in files.all() {
        eprintln!("   - {}", path.file_name().and_then(|n| n.to_str()).unwrap_or_default());
    }

    if let Some((first, last)) = result.cleaned.date_range() {
        eprintln!("\n📊 Period: {} to {}", first, last);
    }
    let problems = result.log.problem_count();
    if problems > 0 {
        eprintln!("⚠️  {} warning(s), see report.txt", problems);
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_clean(
    input: &Path,
    sheet: Option<&str>,
    output: Option<&Path>,
    config: &AnalyticsConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🧹 Cleaning: {}", input.display());

    let raw = load_table(input, sheet)?;
    eprintln!("   Encoding: {}", raw.encoding);
    eprintln!("   Columns: {}", raw.headers.join(", "));

    let cleaned = clean_table(&raw, &config.cleaning, &config.columns)?;
    let summary = &cleaned.summary;
    eprintln!("   {}", summary.summary());
    for (reason, count) in &summary.dropped {
        eprintln!("     {}: {}", reason, count);
    }
    for warning in summary.warnings.iter().take(5) {
        eprintln!("     - {}", warning);
    }

    if let Some(path) = output {
        write_cleaned_csv(&cleaned.records, path)?;
        eprintln!("💾 Output written to: {}", path.display());
    }

    Ok(())
}

fn cmd_calendar(
    from: NaiveDate,
    to: NaiveDate,
    output: Option<&Path>,
    config: &AnalyticsConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if from > to {
        return Err(format!("--from ({}) is after --to ({})", from, to).into());
    }

    let calendar = build_calendar(from, to, config.calendar.fiscal_start_month);
    eprintln!("📅 {} days, fiscal year starting in month {}", calendar.len(), config.calendar.fiscal_start_month);

    match output {
        Some(path) => {
            write_calendar_csv(&calendar, path)?;
            eprintln!("💾 Output written to: {}", path.display());
        }
        None => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            for row in &calendar {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

fn cmd_sample(rows: usize, seed: u64, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let raw = generate_sample(rows, seed);
    write_raw_csv(&raw, output)?;
    eprintln!("💾 {} sample rows written to: {}", raw.records.len(), output.display());
    Ok(())
}

fn cmd_config(config: &AnalyticsConfig, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    write_output(&config.to_json()?, output)
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
