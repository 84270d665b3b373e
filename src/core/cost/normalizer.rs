use tracing::debug;

use crate::core::cost::pricing::{resolve_rule, PricingRule, PricingTable};
use crate::core::models::usage::UsageRecord;

/// Default flat infrastructure rate, dollars per wall-clock second of the
/// longest operation in a task.
pub const DEFAULT_INFRA_RATE_PER_SECOND: f64 = 0.0000166667;

/// Cost of a single record under a resolved rule.
pub fn record_cost(rule: &PricingRule, record: &UsageRecord) -> f64 {
    match rule {
        PricingRule::Token {
            price_per_1k_input_tokens,
            price_per_1k_output_tokens,
        } => {
            let input = record.input_tokens.unwrap_or(0) as f64;
            let output = record.output_tokens.unwrap_or(0) as f64;
            (input / 1000.0) * price_per_1k_input_tokens
                + (output / 1000.0) * price_per_1k_output_tokens
        }
        PricingRule::Image { price_per_image } => {
            record.number_of_image.unwrap_or(1) as f64 * price_per_image
        }
        PricingRule::Second { price_per_second } => {
            record.duration.unwrap_or(0.0) * price_per_second
        }
    }
}

/// Total usage cost of a task's records in `region`.
///
/// Never fails: no records, an unpriced region or an unpriced model all
/// contribute zero.
pub fn normalize(records: Option<&[UsageRecord]>, region: &str, table: &PricingTable) -> f64 {
    let records = match records {
        Some(r) if !r.is_empty() => r,
        _ => return 0.0,
    };
    let models = match table.region(region) {
        Some(m) => m,
        None => {
            debug!(region, "no pricing for region or default region");
            return 0.0;
        }
    };

    records
        .iter()
        .map(|record| {
            let rule = models.get(&record.model_id).and_then(|pricing| {
                resolve_rule(&record.model_id, record.usage_type.as_deref(), pricing)
            });
            match rule {
                Some(rule) => record_cost(rule, record),
                None => {
                    debug!(
                        model = %record.model_id,
                        usage_type = ?record.usage_type,
                        "no pricing rule, record contributes 0"
                    );
                    0.0
                }
            }
        })
        .sum()
}

/// Infrastructure cost of a task: the longest record duration times a flat
/// rate. Durations are not summed; processing time is bounded by the
/// slowest step.
pub fn infra_cost(records: Option<&[UsageRecord]>, rate_per_second: f64) -> f64 {
    let longest = records
        .unwrap_or_default()
        .iter()
        .filter_map(|r| r.duration)
        .filter(|d| d.is_finite() && *d > 0.0)
        .fold(0.0_f64, f64::max);
    longest * rate_per_second
}
