//! Plain-text report.

use crate::config::ReportConfig;
use crate::measures::{Comparison, DimensionMeasures, KpiCatalog, RankedTotal};
use crate::pipeline::PipelineResult;

const RULE: &str = "============================================================";
const TABLE_ROWS: usize = 10;

/// Format an amount with the currency symbol, thousands separators and two
/// decimals: `€1,234,567.89`, `-€12.50`.
pub fn format_currency(value: f64, symbol: &str) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}{}{}.{:02}", sign, symbol, group_thousands(cents / 100), cents % 100)
}

/// Signed percentage with one decimal, or `n/a` when undefined.
pub fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:+.1}%", v),
        None => "n/a".to_string(),
    }
}

/// Whole number with thousands separators (fractions rounded).
pub fn format_count(value: f64) -> String {
    let rounded = value.abs().round() as u64;
    let sign = if value < 0.0 && rounded > 0 { "-" } else { "" };
    format!("{}{}", sign, group_thousands(rounded))
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(format!("--- {} ---", title));
}

/// Render the full text report of a run.
pub fn render_text_report(result: &PipelineResult, config: &ReportConfig) -> String {
    let money = |v: f64| format_currency(v, &config.currency_symbol);
    let kpis = &result.kpis;
    let summary = &result.cleaned.summary;
    let mut lines: Vec<String> = Vec::new();

    lines.push(RULE.to_string());
    lines.push("📊 SALES ANALYTICS REPORT".to_string());
    lines.push(RULE.to_string());
    lines.push(format!("Run:        {}", result.run_id));
    lines.push(format!("Generated:  {}", result.generated_at.format("%Y-%m-%d %H:%M:%S UTC")));
    let source = match &result.source.path {
        Some(path) => path.display().to_string(),
        None => "sample data".to_string(),
    };
    lines.push(format!(
        "Source:     {} ({:?}, {} rows)",
        source, result.source.format, result.source.row_count
    ));
    if let Some((first, last)) = result.cleaned.date_range() {
        lines.push(format!("Period:     {} to {}", first, last));
    }

    // Cleaning
    section(&mut lines, "Cleaning");
    lines.push(summary.summary());
    for (reason, count) in &summary.dropped {
        lines.push(format!("   {:<20} {}", reason.to_string(), count));
    }
    if !summary.warnings.is_empty() {
        lines.push(format!("   First {} warnings:", summary.warnings.len()));
        for warning in &summary.warnings {
            lines.push(format!("      {}", warning));
        }
    }

    // Key figures
    section(&mut lines, "Key figures");
    lines.push(format!("Total sales:              {}", money(kpis.total_sales)));
    lines.push(format!("Transactions:             {}", format_count(kpis.transaction_count as f64)));
    lines.push(format!("Average transaction:      {}", money(kpis.average_transaction_value)));
    lines.push(format!("Distinct customers:       {}", kpis.customers.distinct_customers));
    lines.push(format!("Known customers:          {}", kpis.customers.attributed_customers));
    lines.push(format!(
        "Average spend/customer:   {}",
        money(kpis.customers.average_spend_per_customer)
    ));
    if kpis.customers.unattributed_sales > 0.0 {
        lines.push(format!(
            "Unattributed sales:       {}",
            money(kpis.customers.unattributed_sales)
        ));
    }
    if let Some(p) = &kpis.profitability {
        lines.push(format!("Total cost:               {}", money(p.total_cost)));
        lines.push(format!("Total profit:             {}", money(p.total_profit)));
        lines.push(format!(
            "Profit margin:            {}",
            p.margin_pct.map_or("n/a".to_string(), |m| format!("{:.1}%", m))
        ));
    }

    // Year over year
    if let Some(yoy) = &kpis.year_over_year {
        section(
            &mut lines,
            &format!("Year over year ({} vs {})", yoy.current_year, yoy.previous_year),
        );
        lines.push(format!(
            "{:<10} {:>16} {:>16} {:>16} {:>9}",
            "", "Current", "Previous", "Variance", "Var %"
        ));
        lines.push(comparison_line("Sales", &yoy.sales, &money));
        if let Some(profit) = &yoy.profit {
            lines.push(comparison_line("Profit", profit, &money));
        }
        if let Some(quantity) = &yoy.quantity {
            lines.push(comparison_line("Quantity", quantity, &format_count));
        }
    }

    // Periods
    section(&mut lines, "Sales by month");
    if kpis.sales_by_period.is_empty() {
        lines.push("(no sales)".to_string());
    }
    for (i, period) in kpis.sales_by_period.iter().enumerate() {
        // Growth entry i-1 ends at period i
        let growth = i
            .checked_sub(1)
            .and_then(|g| kpis.period_growth.get(g))
            .map(|g| format_pct(g.rate.map(|r| r * 100.0)))
            .unwrap_or_default();
        lines.push(format!(
            "{:<10} {:>16} {:>8} {:>9}",
            period.period.to_string(),
            money(period.total),
            period.transactions,
            growth
        ));
    }

    section(&mut lines, "Sales by quarter");
    for quarter in &kpis.sales_by_quarter {
        lines.push(format!("{:<10} {:>16}", quarter.period.to_string(), money(quarter.total)));
    }

    section(&mut lines, "Sales by weekday");
    for day in &kpis.sales_by_weekday {
        lines.push(format!("{:<10} {:>16} {:>8}", day.weekday, money(day.total), day.transactions));
    }

    // Rankings
    ranking(&mut lines, "Top customers", &kpis.customers.top_customers, &money);
    ranking(&mut lines, "Top products", &kpis.top_products, &money);
    dimension_table(&mut lines, "By product (CY vs PY)", &kpis.by_product, &money);
    dimension_table(&mut lines, "By region (CY vs PY)", &kpis.by_region, &money);
    dimension_table(&mut lines, "By customer (CY vs PY)", &kpis.by_customer, &money);

    // Run log
    section(&mut lines, "Run log");
    for entry in result.log.entries() {
        lines.push(entry.render());
    }

    lines.push(String::new());
    lines.join("\n")
}

fn comparison_line(label: &str, c: &Comparison, fmt: &dyn Fn(f64) -> String) -> String {
    format!(
        "{:<10} {:>16} {:>16} {:>16} {:>9}",
        label,
        fmt(c.current),
        fmt(c.previous),
        fmt(c.variance),
        format_pct(c.variance_pct)
    )
}

fn ranking(lines: &mut Vec<String>, title: &str, items: &[RankedTotal], money: &dyn Fn(f64) -> String) {
    section(lines, title);
    if items.is_empty() {
        lines.push("(none)".to_string());
    }
    for (rank, item) in items.iter().enumerate() {
        lines.push(format!(
            "{:>2}. {:<28} {:>16} {:>6} orders",
            rank + 1,
            item.key,
            money(item.total),
            item.transactions
        ));
    }
}

fn dimension_table(
    lines: &mut Vec<String>,
    title: &str,
    rows: &[DimensionMeasures],
    money: &dyn Fn(f64) -> String,
) {
    if rows.is_empty() {
        return;
    }
    section(lines, title);
    lines.push(format!(
        "{:<24} {:>16} {:>16} {:>9} {:>16} {:>16} {:>9}",
        "", "Sales CY", "Sales PY", "Var %", "Profit CY", "Profit PY", "Margin"
    ));
    for row in rows.iter().take(TABLE_ROWS) {
        lines.push(format!(
            "{:<24} {:>16} {:>16} {:>9} {:>16} {:>16} {:>9}",
            row.key,
            money(row.sales_cy),
            money(row.sales_py),
            format_pct(row.variance_pct),
            row.profit_cy.map_or("n/a".to_string(), money),
            row.profit_py.map_or("n/a".to_string(), money),
            row.margin_pct.map_or("n/a".to_string(), |m| format!("{:.1}%", m))
        ));
    }
    if rows.len() > TABLE_ROWS {
        lines.push(format!("... +{} more", rows.len() - TABLE_ROWS));
    }
}

/// KPI catalog summary printed by the CLI after a run.
pub fn render_summary(kpis: &KpiCatalog, config: &ReportConfig) -> String {
    let money = |v: f64| format_currency(v, &config.currency_symbol);
    let mut lines = vec![
        format!("   Total sales:         {}", money(kpis.total_sales)),
        format!("   Transactions:        {}", format_count(kpis.transaction_count as f64)),
        format!("   Average transaction: {}", money(kpis.average_transaction_value)),
        format!("   Customers:           {}", kpis.customers.distinct_customers),
    ];
    if let Some(yoy) = &kpis.year_over_year {
        lines.push(format!(
            "   Sales {} vs {}:   {}",
            yoy.current_year,
            yoy.previous_year,
            format_pct(yoy.sales.variance_pct)
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyticsConfig;
    use crate::parser::parse_string_with_metadata;
    use crate::pipeline::run_pipeline;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234567.891, "€"), "€1,234,567.89");
        assert_eq!(format_currency(0.0, "$"), "$0.00");
        assert_eq!(format_currency(999.999, "$"), "$1,000.00");
        assert_eq!(format_currency(-12.5, "£"), "-£12.50");
        assert_eq!(format_currency(-0.001, "£"), "£0.00");
    }

    #[test]
    fn test_format_pct_and_count() {
        assert_eq!(format_pct(Some(100.0)), "+100.0%");
        assert_eq!(format_pct(Some(-2.24)), "-2.2%");
        assert_eq!(format_pct(None), "n/a");
        assert_eq!(format_count(1234.0), "1,234");
        assert_eq!(format_count(12.0), "12");
    }

    #[test]
    fn test_report_contents() {
        let raw = parse_string_with_metadata(
            "Date,Product,Amount,Customer\n2024-01-05,Widget,10,Acme\n2024-02-10,Gadget,20,\nbad,Gadget,5,Acme\n",
            ',',
            "utf-8".to_string(),
        )
        .unwrap();
        let config = AnalyticsConfig::default();
        let result = run_pipeline(raw, &config).unwrap();
        let report = render_text_report(&result, &config.report);

        assert!(report.contains("SALES ANALYTICS REPORT"));
        assert!(report.contains("Total sales:              €30.00"));
        assert!(report.contains("invalid date"));
        assert!(report.contains("2024-02"));
        assert!(report.contains("+100.0%"));
        assert!(report.contains("Acme"));
        assert!(report.contains("Unattributed sales:       €20.00"));
        assert!(report.contains("Distinct customers:       2"));
        assert!(report.contains("Known customers:          1"));
        assert!(report.contains("--- By customer (CY vs PY) ---"));
        assert!(report.contains("--- Run log ---"));
        // No prior year in the data
        assert!(report.contains("n/a"));
    }
}
