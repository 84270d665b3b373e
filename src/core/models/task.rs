use serde::{Deserialize, Serialize};

use crate::core::models::status::TaskStatus;

/// One row of a task-search response.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRecord {
    #[serde(rename = "TaskId", alias = "task_id", alias = "taskId")]
    pub task_id: String,
    #[serde(rename = "Status", alias = "status", default)]
    pub status: String,
    #[serde(
        rename = "VideoSize",
        alias = "FileSize",
        alias = "SourceVideoSize",
        alias = "video_size",
        default
    )]
    pub video_size: Option<u64>,
    #[serde(rename = "Region", alias = "region", default)]
    pub region: Option<String>,
}

impl TaskRecord {
    pub fn status(&self) -> TaskStatus {
        TaskStatus::parse(&self.status)
    }
}

/// Per-task figures, derived during aggregation and then dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    pub task_id: String,
    pub status: TaskStatus,
    pub source_video_size: u64,
    pub data_size: u64,
    pub compute_cost: f64,
    pub infra_cost: f64,
}
