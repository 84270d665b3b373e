use colored::{control, Colorize};

use crate::core::cost::pricing::{PricingRule, PricingTable};
use crate::core::formatter::{
    format_bytes, format_cost, format_cost_precise, format_generated_at, format_share_bar,
};
use crate::core::models::cost::{Report, WorkflowTotal};
use crate::core::report::charts::{cost_breakdown, data_volume, ChartSeries};

const BAR_WIDTH: usize = 24;
const NAME_WIDTH: usize = 12;

/// Render the summary table, optionally followed by the two bar charts.
///
/// Layout:
/// ```text
///  Cost & Data Generation Summary
///   Workflow     Videos  Compute   Infra  Video Stor  Data Stor    Total       Data  Avg/Video
///   Frame Based      12    $0.42   $0.01       $0.03      $0.01    $0.47    1.2 GB   102.4 MB
///   ...
///   Total            20    $0.61   $0.02       $0.05      $0.02    $0.70    1.9 GB    97.3 MB
///   Generated 2026-10-16 14:05
/// ```
pub fn render_report(report: &Report, show_charts: bool, use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines: Vec<String> = Vec::new();
    lines.push(" Cost & Data Generation Summary".bold().to_string());

    if report.is_empty() {
        lines.push(format!("  {}", "No data available".dimmed()));
        return lines.join("\n");
    }

    let header = format!(
        "  {:<NAME_WIDTH$} {:>6} {:>8} {:>7} {:>11} {:>10} {:>8} {:>10} {:>10}",
        "Workflow", "Videos", "Compute", "Infra", "Video Stor", "Data Stor", "Total", "Data", "Avg/Video"
    );
    lines.push(header.cyan().to_string());

    for row in &report.rows {
        let line = format_row(row);
        if row.is_total_row() {
            lines.push(line.bold().to_string());
        } else {
            lines.push(line);
        }
    }
    lines.push(format!("  {}", format_generated_at(&report.generated_at).dimmed()));

    if show_charts {
        lines.push(String::new());
        lines.push(" Cost Breakdown".bold().to_string());
        let series = cost_breakdown(report);
        let max_total = report
            .workflow_rows()
            .map(|r| r.total_cost)
            .fold(0.0, f64::max);
        for row in report.workflow_rows() {
            lines.push(format!(
                "  {:<NAME_WIDTH$} {} {}",
                row.workflow_name,
                format_share_bar(row.total_cost, max_total, BAR_WIDTH).magenta(),
                format_cost(row.total_cost)
            ));
            let parts: Vec<String> = series
                .iter()
                .filter_map(|s| {
                    s.data
                        .iter()
                        .find(|p| p.x == row.workflow_name)
                        .map(|p| format!("{} {}", s.title, format_cost_precise(p.y)))
                })
                .collect();
            lines.push(format!("  {:<NAME_WIDTH$} {}", "", parts.join(", ").dimmed()));
        }

        lines.push(String::new());
        lines.push(" Data Generation Volume".bold().to_string());
        render_series(&mut lines, &data_volume(report), "GB");
    }

    lines.join("\n")
}

fn format_row(row: &WorkflowTotal) -> String {
    format!(
        "  {:<NAME_WIDTH$} {:>6} {:>8} {:>7} {:>11} {:>10} {:>8} {:>10} {:>10}",
        row.workflow_name,
        row.video_count,
        format_cost(row.compute_cost),
        format_cost(row.infra_cost),
        format_cost(row.source_video_storage_cost),
        format_cost(row.generated_data_storage_cost),
        format_cost(row.total_cost),
        format_bytes(row.data_size as f64),
        format_bytes(row.avg_data_size),
    )
}

fn render_series(lines: &mut Vec<String>, series: &ChartSeries, unit: &str) {
    let max = series.max();
    for point in &series.data {
        lines.push(format!(
            "  {:<NAME_WIDTH$} {} {:.2} {}",
            point.x,
            format_share_bar(point.y, max, BAR_WIDTH).magenta(),
            point.y,
            unit
        ));
    }
}

/// Render the resolved pricing table for one region.
pub fn render_pricing(table: &PricingTable, region: &str, use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines: Vec<String> = Vec::new();
    let header = match table.priced_region(region) {
        Some(priced) if priced != region => {
            format!(" Pricing ({}, using {} rates)", region, priced)
        }
        _ => format!(" Pricing ({})", region),
    };
    lines.push(header.bold().to_string());

    let entries = table.entries_for(region);
    if entries.is_empty() {
        lines.push(format!("  {}", "No pricing available".dimmed()));
        return lines.join("\n");
    }

    for (model, sub_type, rule) in entries {
        let rate = match rule {
            PricingRule::Token {
                price_per_1k_input_tokens,
                price_per_1k_output_tokens,
            } => format!(
                "${} in / ${} out per 1K tokens",
                price_per_1k_input_tokens, price_per_1k_output_tokens
            ),
            PricingRule::Image { price_per_image } => format!("${} per image", price_per_image),
            PricingRule::Second { price_per_second } => format!("${} per second", price_per_second),
        };
        lines.push(format!(
            "  {:<44} {:<9} {:<6} {}",
            model.cyan(),
            sub_type,
            rule.unit(),
            rate
        ));
    }

    lines.join("\n")
}

pub fn render_error(message: &str, use_color: bool) -> String {
    control::set_override(use_color);
    format!("{}\n  {}", " Failed to load data".bold(), message.red())
}
