use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::cli::output::{to_json, OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::core::config::AppConfig;
use crate::core::cost::normalizer::{infra_cost, normalize};
use crate::core::cost::pricing::PricingRule;
use crate::core::cost::storage::estimate_vector_bytes;
use crate::core::formatter::{format_bytes, format_cost_precise};
use crate::core::models::usage::{parse_usage_records, records_in_reply};
use crate::core::workflow::WorkflowType;

#[derive(Serialize)]
struct PricingRow<'a> {
    model: &'a str,
    sub_type: &'a str,
    #[serde(flatten)]
    rule: &'a PricingRule,
}

#[derive(Serialize)]
struct VectorFootprint {
    workflow: &'static str,
    dimension: u64,
    bytes_per_vector: u64,
}

/// List the pricing rules that apply in a region.
pub fn show(config: &AppConfig, region: Option<&str>, opts: &OutputOptions) -> Result<()> {
    let table = config
        .settings
        .pricing_table()
        .context("Failed to load pricing table")?;
    let region = region.unwrap_or(&config.settings.region);

    let footprints: Vec<VectorFootprint> = WorkflowType::all()
        .iter()
        .filter_map(|w| {
            w.vector_dimension().map(|dimension| VectorFootprint {
                workflow: w.display_name(),
                dimension,
                bytes_per_vector: estimate_vector_bytes(1, dimension),
            })
        })
        .collect();

    match opts.format {
        OutputFormat::Text => {
            println!("{}", renderer::render_pricing(&table, region, opts.use_color));
            println!();
            println!(" Vector storage per embedding");
            for f in &footprints {
                println!(
                    "  {:<12} {} ({} dims)",
                    f.workflow,
                    format_bytes(f.bytes_per_vector as f64),
                    f.dimension
                );
            }
        }
        OutputFormat::Json => {
            let rows: Vec<PricingRow> = table
                .entries_for(region)
                .into_iter()
                .map(|(model, sub_type, rule)| PricingRow {
                    model,
                    sub_type,
                    rule,
                })
                .collect();
            let payload = serde_json::json!({
                "region": region,
                "priced_region": table.priced_region(region),
                "pricing": rows,
                "vector_footprints": footprints,
            });
            println!("{}", to_json(&payload, opts)?);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct CostEstimate {
    region: String,
    records: usize,
    compute_cost: f64,
    infra_cost: f64,
}

/// Price a local JSON file of usage records, as the report would for one task.
/// The file holds either an array of records or a cost reply with
/// `usage_records` and `region`.
pub fn estimate(
    config: &AppConfig,
    path: &Path,
    region: Option<&str>,
    opts: &OutputOptions,
) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let records = if value.is_array() {
        parse_usage_records(&value)
    } else {
        records_in_reply(&value)
    };
    let file_region = value
        .get("region")
        .and_then(|r| r.as_str())
        .map(str::to_string);

    let region = region
        .map(str::to_string)
        .or(file_region)
        .unwrap_or_else(|| config.settings.region.clone());
    let table = config
        .settings
        .pricing_table()
        .context("Failed to load pricing table")?;

    let estimate = CostEstimate {
        compute_cost: normalize(Some(records.as_slice()), &region, &table),
        infra_cost: infra_cost(Some(records.as_slice()), config.settings.infra_rate_per_second),
        records: records.len(),
        region,
    };

    match opts.format {
        OutputFormat::Text => {
            println!(" Usage cost ({}, {} records)", estimate.region, estimate.records);
            println!("  Compute  {}", format_cost_precise(estimate.compute_cost));
            println!("  Infra    {}", format_cost_precise(estimate.infra_cost));
        }
        OutputFormat::Json => println!("{}", to_json(&estimate, opts)?),
    }
    Ok(())
}
