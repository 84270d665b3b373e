use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::core::cost::normalizer::DEFAULT_INFRA_RATE_PER_SECOND;
use crate::core::cost::pricing::{PricingError, PricingTable, DEFAULT_REGION};
use crate::core::workflow::{WorkflowType, EXTRACTION_SERVICE, NOVA_SERVICE, TLABS_SERVICE};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default = "default_color")]
    pub color: String,
    /// Region used when a task's cost reply doesn't name one.
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_infra_rate")]
    pub infra_rate_per_second: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// JSON pricing table replacing the built-in one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_file: Option<PathBuf>,
}

fn default_format() -> String {
    "text".to_string()
}
fn default_color() -> String {
    "auto".to_string()
}
fn default_region() -> String {
    DEFAULT_REGION.to_string()
}
fn default_infra_rate() -> f64 {
    DEFAULT_INFRA_RATE_PER_SECOND
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            color: default_color(),
            region: default_region(),
            infra_rate_per_second: default_infra_rate(),
            timeout_secs: default_timeout_secs(),
            pricing_file: None,
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The pricing file's table when one is set, the built-in one otherwise.
    pub fn pricing_table(&self) -> Result<Cow<'static, PricingTable>, PricingError> {
        match &self.pricing_file {
            Some(path) => PricingTable::load(path).map(Cow::Owned),
            None => Ok(Cow::Borrowed(PricingTable::builtin())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
    #[serde(default = "default_workflows")]
    pub workflows: Vec<WorkflowConfig>,
}

fn default_workflows() -> Vec<WorkflowConfig> {
    WorkflowType::all()
        .iter()
        .map(|w| WorkflowConfig {
            id: w.id().to_string(),
            enabled: true,
        })
        .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            services: [EXTRACTION_SERVICE, NOVA_SERVICE, TLABS_SERVICE]
                .iter()
                .map(|name| ServiceConfig {
                    name: name.to_string(),
                    base_url: String::new(),
                    api_key: None,
                })
                .collect(),
            workflows: default_workflows(),
        }
    }
}

impl AppConfig {
    /// Get the config file path, respecting XDG_CONFIG_HOME
    pub fn config_path() -> PathBuf {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("~"))
                    .join(".config")
            });
        config_dir.join("vidcost").join("config.toml")
    }

    /// Load config from the default path, falling back to defaults if not found
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Serialize and write this config to the config file path.
    pub fn save(&self) -> Result<PathBuf, std::io::Error> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Enabled workflows, in report order.
    pub fn enabled_workflows(&self) -> Vec<WorkflowType> {
        WorkflowType::all()
            .iter()
            .copied()
            .filter(|w| {
                self.workflows
                    .iter()
                    .any(|c| c.enabled && WorkflowType::from_id(&c.id) == Some(*w))
            })
            .collect()
    }

    /// Set a workflow's enabled flag, adding an entry if it has none.
    /// Returns false when the flag already had that value.
    pub fn set_workflow_enabled(&mut self, workflow: WorkflowType, enabled: bool) -> bool {
        match self
            .workflows
            .iter_mut()
            .find(|c| WorkflowType::from_id(&c.id) == Some(workflow))
        {
            Some(existing) if existing.enabled == enabled => false,
            Some(existing) => {
                existing.enabled = enabled;
                true
            }
            None => {
                self.workflows.push(WorkflowConfig {
                    id: workflow.id().to_string(),
                    enabled,
                });
                // A missing entry reads as disabled.
                enabled
            }
        }
    }

    /// Point every service at one base URL, e.g. a single API gateway.
    pub fn override_endpoint(&mut self, base_url: &str) {
        for name in [EXTRACTION_SERVICE, NOVA_SERVICE, TLABS_SERVICE] {
            if !self.services.iter().any(|s| s.name == name) {
                self.services.push(ServiceConfig {
                    name: name.to_string(),
                    base_url: String::new(),
                    api_key: None,
                });
            }
        }
        for service in &mut self.services {
            service.base_url = base_url.to_string();
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !["text", "json"].contains(&self.settings.default_format.as_str()) {
            issues.push(format!(
                "Invalid default_format: '{}' (must be 'text' or 'json')",
                self.settings.default_format
            ));
        }
        if !["auto", "always", "never"].contains(&self.settings.color.as_str()) {
            issues.push(format!(
                "Invalid color: '{}' (must be 'auto', 'always', or 'never')",
                self.settings.color
            ));
        }
        if self.settings.region.trim().is_empty() {
            issues.push("Region must not be empty".to_string());
        }
        if !self.settings.infra_rate_per_second.is_finite()
            || self.settings.infra_rate_per_second < 0.0
        {
            issues.push(format!(
                "Invalid infra_rate_per_second: {} (must be a non-negative number)",
                self.settings.infra_rate_per_second
            ));
        }
        if self.settings.timeout_secs == 0 {
            issues.push("timeout_secs must be greater than 0".to_string());
        }
        for s in &self.services {
            if s.base_url.is_empty() {
                issues.push(format!("Service '{}': base_url is not set", s.name));
            } else if !s.base_url.starts_with("https://") {
                issues.push(format!(
                    "Service '{}': base_url must use HTTPS, got '{}'",
                    s.name, s.base_url
                ));
            }
        }
        for w in &self.workflows {
            if WorkflowType::from_id(&w.id).is_none() {
                issues.push(format!("Unknown workflow ID: '{}'", w.id));
            }
        }
        issues
    }
}
