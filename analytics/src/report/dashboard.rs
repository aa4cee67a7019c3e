//! SVG dashboard.
//!
//! Layout: a row of KPI cards on top, then a 2x2 grid with monthly sales,
//! sales by weekday, top products and top customers.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

use super::text::{format_count, format_currency, format_pct};
use crate::config::ReportConfig;
use crate::error::{ReportError, ReportResult};
use crate::measures::{KpiCatalog, RankedTotal};

const BACKGROUND: RGBColor = RGBColor(0x1a, 0x1a, 0x2e);
const SURFACE: RGBColor = RGBColor(0x16, 0x21, 0x3e);
const TEXT: RGBColor = RGBColor(0xea, 0xea, 0xea);
const MUTED: RGBColor = RGBColor(0x88, 0x88, 0x88);
const GRID: RGBColor = RGBColor(0x33, 0x33, 0x55);
const PRIMARY: RGBColor = RGBColor(0xff, 0x6b, 0x6b);
const SECONDARY: RGBColor = RGBColor(0x4e, 0xcd, 0xc4);
const ACCENT: RGBColor = RGBColor(0xff, 0xe6, 0x6d);

const FONT: &str = "sans-serif";
const MAX_LABEL_CHARS: usize = 22;

fn chart_err<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Chart(e.to_string())
}

/// Render the dashboard to `path`.
pub fn render_dashboard(kpis: &KpiCatalog, config: &ReportConfig, path: &Path) -> ReportResult<()> {
    let size = (config.dashboard_width, config.dashboard_height);
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&BACKGROUND).map_err(chart_err)?;

    let root = root
        .titled(
            "📊 SALES PERFORMANCE DASHBOARD",
            (FONT, 32).into_font().color(&TEXT),
        )
        .map_err(chart_err)?;

    let card_height = (config.dashboard_height as i32 * 16) / 100;
    let (cards, charts) = root.split_vertically(card_height);
    draw_kpi_cards(&cards, kpis, config)?;

    let panels = charts.split_evenly((2, 2));
    let money = |v: f64| format_currency(v, &config.currency_symbol);

    let months: Vec<(String, f64)> = kpis
        .sales_by_period
        .iter()
        .map(|p| (p.period.to_string(), p.total))
        .collect();
    draw_column_chart(&panels[0], "Sales by Month", &months, PRIMARY, &money)?;

    let weekdays: Vec<(String, f64)> = kpis
        .sales_by_weekday
        .iter()
        .map(|d| (d.weekday.clone(), d.total))
        .collect();
    draw_column_chart(&panels[1], "Sales by Weekday", &weekdays, ACCENT, &money)?;

    draw_ranking_chart(&panels[2], "Top Products", &kpis.top_products, SECONDARY, &money)?;
    draw_ranking_chart(
        &panels[3],
        "Top Customers",
        &kpis.customers.top_customers,
        PRIMARY,
        &money,
    )?;

    root.present().map_err(chart_err)?;
    tracing::info!(path = %path.display(), "dashboard rendered");
    Ok(())
}

fn draw_kpi_cards<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    kpis: &KpiCatalog,
    config: &ReportConfig,
) -> ReportResult<()> {
    let money = |v: f64| format_currency(v, &config.currency_symbol);

    let margin = kpis
        .profitability
        .as_ref()
        .and_then(|p| p.margin_pct)
        .map_or("n/a".to_string(), |m| format!("{:.1}%", m));
    let growth = kpis
        .year_over_year
        .as_ref()
        .map_or("n/a".to_string(), |y| format_pct(y.sales.variance_pct));

    let cards = [
        ("Total Sales", money(kpis.total_sales)),
        ("Transactions", format_count(kpis.transaction_count as f64)),
        ("Avg Transaction", money(kpis.average_transaction_value)),
        ("Customers", format_count(kpis.customers.distinct_customers as f64)),
        ("Profit Margin", margin),
        ("Sales YoY", growth),
    ];

    let title_style = TextStyle::from((FONT, 16).into_font())
        .color(&MUTED)
        .pos(Pos::new(HPos::Center, VPos::Center));
    let value_style = TextStyle::from((FONT, 28).into_font())
        .color(&TEXT)
        .pos(Pos::new(HPos::Center, VPos::Center));

    for (cell, (title, value)) in area.split_evenly((1, cards.len())).iter().zip(cards) {
        let (w, h) = cell.dim_in_pixel();
        let (w, h) = (w as i32, h as i32);
        cell.draw(&Rectangle::new([(8, 8), (w - 8, h - 8)], SURFACE.filled()))
            .map_err(chart_err)?;
        cell.draw_text(title, &title_style, (w / 2, h * 35 / 100))
            .map_err(chart_err)?;
        cell.draw_text(&value, &value_style, (w / 2, h * 65 / 100))
            .map_err(chart_err)?;
    }
    Ok(())
}

fn draw_empty<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, title: &str) -> ReportResult<()> {
    let (w, h) = area.dim_in_pixel();
    let style = TextStyle::from((FONT, 18).into_font())
        .color(&MUTED)
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw_text(&format!("{}: no data", title), &style, (w as i32 / 2, h as i32 / 2))
        .map_err(chart_err)
}

fn upper_bound(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0_f64, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn shorten(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        label.to_string()
    } else {
        let head: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
        format!("{}…", head)
    }
}

fn segment_label(labels: &[String], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => labels.get(*i).cloned().unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

/// Vertical bars, one per category, in the given order.
fn draw_column_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    data: &[(String, f64)],
    color: RGBColor,
    money: &dyn Fn(f64) -> String,
) -> ReportResult<()> {
    if data.is_empty() {
        return draw_empty(area, title);
    }

    let labels: Vec<String> = data.iter().map(|(l, _)| l.clone()).collect();
    let y_max = upper_bound(data.iter().map(|(_, v)| *v));

    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 22).into_font().color(&TEXT))
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(90)
        .build_cartesian_2d((0..data.len()).into_segmented(), 0f64..y_max)
        .map_err(chart_err)?;

    // Keep at most ~12 category labels on dense month axes
    let label_step = (data.len() / 12).max(1);
    let x_formatter = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) if i % label_step != 0 => String::new(),
        other => segment_label(&labels, other),
    };
    let y_formatter = |v: &f64| money(*v);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(GRID.stroke_width(1))
        .light_line_style(BACKGROUND.stroke_width(0))
        .axis_style(MUTED.stroke_width(1))
        .label_style((FONT, 13).into_font().color(&TEXT))
        .x_labels(data.len())
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter)
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(color.filled())
                .margin(4)
                .data(data.iter().enumerate().map(|(i, (_, v))| (i, *v))),
        )
        .map_err(chart_err)?;

    Ok(())
}

/// Horizontal bars, largest on top.
fn draw_ranking_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    items: &[RankedTotal],
    color: RGBColor,
    money: &dyn Fn(f64) -> String,
) -> ReportResult<()> {
    if items.is_empty() {
        return draw_empty(area, title);
    }

    // Bottom-up: the first-ranked item gets the highest index
    let labels: Vec<String> = items.iter().rev().map(|item| shorten(&item.key)).collect();
    let x_max = upper_bound(items.iter().map(|item| item.total));
    let n = items.len();

    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 22).into_font().color(&TEXT))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(180)
        .build_cartesian_2d(0f64..x_max, (0..n).into_segmented())
        .map_err(chart_err)?;

    let y_formatter = |v: &SegmentValue<usize>| segment_label(&labels, v);
    let x_formatter = |v: &f64| money(*v);

    chart
        .configure_mesh()
        .disable_y_mesh()
        .bold_line_style(GRID.stroke_width(1))
        .light_line_style(BACKGROUND.stroke_width(0))
        .axis_style(MUTED.stroke_width(1))
        .label_style((FONT, 13).into_font().color(&TEXT))
        .x_labels(5)
        .y_labels(n)
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter)
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(
            Histogram::horizontal(&chart)
                .style(color.filled())
                .margin(4)
                .data(items.iter().enumerate().map(|(i, item)| (n - 1 - i, item.total))),
        )
        .map_err(chart_err)?;

    Ok(())
}
