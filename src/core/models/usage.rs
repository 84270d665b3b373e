use serde::{Deserialize, Serialize};

/// One billable event tied to a task, in its canonical shape.
///
/// Backend variants disagree on field names; every known alias is folded in
/// here at deserialization so nothing downstream sees the raw shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    #[serde(alias = "modelId", alias = "model")]
    pub model_id: String,
    #[serde(
        rename = "type",
        alias = "usage_type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub usage_type: Option<String>,
    #[serde(alias = "inputTokens", default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(alias = "outputTokens", default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(
        alias = "image_count",
        alias = "number_of_images",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub number_of_image: Option<u64>,
    /// Seconds.
    #[serde(
        alias = "duration_s",
        alias = "duration_seconds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<f64>,
}

#[cfg(test)]
impl UsageRecord {
    pub fn tokens(model_id: &str, usage_type: &str, input: u64, output: u64) -> Self {
        Self {
            model_id: model_id.to_string(),
            usage_type: Some(usage_type.to_string()),
            input_tokens: Some(input),
            output_tokens: Some(output),
            ..Default::default()
        }
    }
}

/// Parse a raw JSON value into canonical records.
///
/// Anything that isn't an array yields an empty list. Individual entries that
/// fail to parse (e.g. no model id) are dropped.
pub fn parse_usage_records(value: &serde_json::Value) -> Vec<UsageRecord> {
    match value.as_array() {
        Some(items) => items
            .iter()
            .filter_map(|item| serde_json::from_value::<UsageRecord>(item.clone()).ok())
            .collect(),
        None => Vec::new(),
    }
}

/// Keys a cost reply may carry its usage records under, most common first.
pub const USAGE_RECORD_KEYS: [&str; 3] = ["usage_records", "usage", "records"];

/// Records from a cost reply object; empty when no known key holds an array.
pub fn records_in_reply(body: &serde_json::Value) -> Vec<UsageRecord> {
    USAGE_RECORD_KEYS
        .iter()
        .find_map(|k| body.get(*k))
        .map(parse_usage_records)
        .unwrap_or_default()
}
