use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

pub const DEFAULT_REGION: &str = "us-east-1";

/// Model id of the speech-to-text service. Its records are always priced
/// under [`TRANSCRIBE_SUB_KEY`], whatever `type` they carry.
pub const TRANSCRIBE_MODEL_ID: &str = "amazon.transcribe";
pub const TRANSCRIBE_SUB_KEY: &str = "standard";

#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Failed to read pricing file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse pricing file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// How a usage record is billed. The unit decides which rates exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum PricingRule {
    Token {
        price_per_1k_input_tokens: f64,
        price_per_1k_output_tokens: f64,
    },
    Image {
        price_per_image: f64,
    },
    Second {
        price_per_second: f64,
    },
}

impl PricingRule {
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Token { .. } => "token",
            Self::Image { .. } => "image",
            Self::Second { .. } => "second",
        }
    }
}

/// Flat form of one table cell; the on-disk pricing file is a list of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingEntry {
    pub region: String,
    pub model: String,
    pub sub_type: String,
    #[serde(flatten)]
    pub rule: PricingRule,
}

/// Sub-type -> rule for a single model.
pub type ModelPricing = HashMap<String, PricingRule>;

/// Region -> model -> sub-type -> rule.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    regions: HashMap<String, HashMap<String, ModelPricing>>,
}

impl PricingTable {
    pub fn from_entries(entries: impl IntoIterator<Item = PricingEntry>) -> Self {
        let mut regions: HashMap<String, HashMap<String, ModelPricing>> = HashMap::new();
        for entry in entries {
            regions
                .entry(entry.region)
                .or_default()
                .entry(entry.model)
                .or_default()
                .insert(entry.sub_type, entry.rule);
        }
        Self { regions }
    }

    /// Load a table from a JSON file holding an array of [`PricingEntry`].
    pub fn load(path: &Path) -> Result<Self, PricingError> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<PricingEntry> = serde_json::from_str(&content)?;
        Ok(Self::from_entries(entries))
    }

    /// The built-in table, constructed once per process.
    pub fn builtin() -> &'static PricingTable {
        static TABLE: OnceLock<PricingTable> = OnceLock::new();
        TABLE.get_or_init(|| Self::from_entries(builtin_entries()))
    }

    /// Models priced in `region`, or in the default region when `region` is
    /// unknown. `None` only if neither exists.
    pub fn region(&self, region: &str) -> Option<&HashMap<String, ModelPricing>> {
        self.priced_region(region)
            .and_then(|name| self.regions.get(name))
    }

    /// Name of the region whose rules [`PricingTable::region`] returns.
    pub fn priced_region<'a>(&self, region: &'a str) -> Option<&'a str> {
        if self.regions.contains_key(region) {
            Some(region)
        } else if self.regions.contains_key(DEFAULT_REGION) {
            Some(DEFAULT_REGION)
        } else {
            None
        }
    }

    /// Flattened, sorted view of one region, for listing.
    pub fn entries_for(&self, region: &str) -> Vec<(&str, &str, &PricingRule)> {
        let mut out: Vec<(&str, &str, &PricingRule)> = self
            .region(region)
            .into_iter()
            .flat_map(|models| {
                models.iter().flat_map(|(model, subs)| {
                    subs.iter()
                        .map(move |(sub, rule)| (model.as_str(), sub.as_str(), rule))
                })
            })
            .collect();
        out.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        out
    }
}

/// Pick the rule for one record:
///
/// 1. transcription records use [`TRANSCRIBE_SUB_KEY`];
/// 2. otherwise an exact `(model, type)` match;
/// 3. otherwise the model's only sub-type, if it has exactly one;
/// 4. otherwise no rule.
pub fn resolve_rule<'a>(
    model_id: &str,
    usage_type: Option<&str>,
    pricing: &'a ModelPricing,
) -> Option<&'a PricingRule> {
    if model_id == TRANSCRIBE_MODEL_ID {
        return pricing.get(TRANSCRIBE_SUB_KEY);
    }
    if let Some(rule) = usage_type.and_then(|t| pricing.get(t)) {
        return Some(rule);
    }
    if pricing.len() == 1 {
        return pricing.values().next();
    }
    None
}

fn token(region: &str, model: &str, sub: &str, input_1k: f64, output_1k: f64) -> PricingEntry {
    PricingEntry {
        region: region.to_string(),
        model: model.to_string(),
        sub_type: sub.to_string(),
        rule: PricingRule::Token {
            price_per_1k_input_tokens: input_1k,
            price_per_1k_output_tokens: output_1k,
        },
    }
}

fn image(region: &str, model: &str, sub: &str, per_image: f64) -> PricingEntry {
    PricingEntry {
        region: region.to_string(),
        model: model.to_string(),
        sub_type: sub.to_string(),
        rule: PricingRule::Image {
            price_per_image: per_image,
        },
    }
}

fn second(region: &str, model: &str, sub: &str, per_second: f64) -> PricingEntry {
    PricingEntry {
        region: region.to_string(),
        model: model.to_string(),
        sub_type: sub.to_string(),
        rule: PricingRule::Second {
            price_per_second: per_second,
        },
    }
}

fn builtin_entries() -> Vec<PricingEntry> {
    let mut entries = Vec::new();
    for region in ["us-east-1", "us-west-2"] {
        entries.extend([
            token(region, "amazon.nova-pro-v1:0", "text", 0.0008, 0.0032),
            token(region, "amazon.nova-lite-v1:0", "text", 0.00006, 0.00024),
            token(region, "amazon.nova-micro-v1:0", "text", 0.000035, 0.00014),
            token(
                region,
                "anthropic.claude-3-5-sonnet-20240620-v1:0",
                "text",
                0.003,
                0.015,
            ),
            token(
                region,
                "anthropic.claude-3-haiku-20240307-v1:0",
                "text",
                0.00025,
                0.00125,
            ),
            token(region, "amazon.titan-embed-image-v1", "text", 0.0008, 0.0),
            image(region, "amazon.titan-embed-image-v1", "image", 0.00006),
            image(region, "amazon.rekognition", "image", 0.001),
            second(region, TRANSCRIBE_MODEL_ID, TRANSCRIBE_SUB_KEY, 0.0004),
        ]);
    }
    // Non-US regions carry a surcharge on the Nova family.
    for region in ["eu-west-1", "ap-northeast-1"] {
        entries.extend([
            token(region, "amazon.nova-pro-v1:0", "text", 0.00105, 0.0042),
            token(region, "amazon.nova-lite-v1:0", "text", 0.000078, 0.000312),
            token(region, "amazon.titan-embed-image-v1", "text", 0.0008, 0.0),
            image(region, "amazon.titan-embed-image-v1", "image", 0.00006),
            image(region, "amazon.rekognition", "image", 0.0012),
            second(region, TRANSCRIBE_MODEL_ID, TRANSCRIBE_SUB_KEY, 0.0004),
        ]);
    }
    entries
}
