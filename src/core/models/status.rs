use serde::{Deserialize, Serialize};

/// Canonical processing state of a backend task.
///
/// Backends have shipped several spellings of the same state over time
/// ("COMPLETED", "COMPLETE", "completed"), so raw strings are always mapped
/// through [`TaskStatus::parse`] before any comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Unknown,
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "COMPLETED" | "COMPLETE" | "SUCCEEDED" | "SUCCESS" => Self::Completed,
            "PROCESSING" | "IN_PROGRESS" | "RUNNING" | "EXTRACTING" | "STARTED" => {
                Self::Processing
            }
            "PENDING" | "QUEUED" | "SUBMITTED" | "CREATED" => Self::Pending,
            "FAILED" | "ERROR" | "STOPPED" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Processing => write!(f, "Processing"),
            Self::Completed => write!(f, "Completed"),
            Self::Failed => write!(f, "Failed"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}
