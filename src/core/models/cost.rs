use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TOTAL_ROW_NAME: &str = "Total";

/// Aggregated figures for one workflow type (or the synthesized Total row).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTotal {
    pub workflow_name: String,
    pub video_count: u64,
    /// Bytes
    pub source_video_size: u64,
    /// Bytes
    pub data_size: u64,
    pub compute_cost: f64,
    pub infra_cost: f64,
    pub source_video_storage_cost: f64,
    pub generated_data_storage_cost: f64,
    pub total_cost: f64,
    /// Bytes per video
    pub avg_data_size: f64,
}

impl WorkflowTotal {
    pub fn is_total_row(&self) -> bool {
        self.workflow_name == TOTAL_ROW_NAME
    }
}

/// Ordered workflow rows, ending with the Total row when non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<WorkflowTotal>,
}

impl Report {
    pub fn empty() -> Self {
        Self {
            generated_at: Utc::now(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows excluding the synthesized Total.
    pub fn workflow_rows(&self) -> impl Iterator<Item = &WorkflowTotal> {
        self.rows.iter().filter(|r| !r.is_total_row())
    }

    pub fn total(&self) -> Option<&WorkflowTotal> {
        self.rows.last().filter(|r| r.is_total_row())
    }
}

/// What the report view holds across a load cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ReportState {
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub report: Report,
}

impl ReportState {
    pub fn loaded(report: Report) -> Self {
        Self {
            loading: false,
            error: None,
            report,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            loading: false,
            error: Some(message.into()),
            report: Report::empty(),
        }
    }
}

#[cfg(test)]
impl ReportState {
    pub fn loading() -> Self {
        Self {
            loading: true,
            error: None,
            report: Report::empty(),
        }
    }
}
