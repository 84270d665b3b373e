use serde::{Deserialize, Serialize};

pub const EXTRACTION_SERVICE: &str = "ExtrService";
pub const NOVA_SERVICE: &str = "NovaService";
pub const TLABS_SERVICE: &str = "TlabsService";

pub const DATA_SIZE_PATH: &str = "/extraction/video/get-data-size";
pub const TOKEN_AND_COST_PATH: &str = "/extraction/video/get-token-and-cost";

/// Source shape of a workflow's costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowFamily {
    /// Compute and infra cost come from per-task usage records.
    Extraction,
    /// Billed elsewhere; only storage is attributed here.
    Embedding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    Frame,
    Clip,
    NovaMme,
    TlabsMme,
}

impl WorkflowType {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "frame" | "frame_based" | "frame-based" => Some(Self::Frame),
            "clip" | "shot" | "shot_based" | "shot-based" => Some(Self::Clip),
            "novamme" | "nova_mme" | "nova-mme" | "nova" => Some(Self::NovaMme),
            "tlabsmme" | "tlabs" | "twelvelabs" => Some(Self::TlabsMme),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Frame => "frame",
            Self::Clip => "clip",
            Self::NovaMme => "novamme",
            Self::TlabsMme => "tlabsmme",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Frame => "Frame Based",
            Self::Clip => "Shot Based",
            Self::NovaMme => "Nova MME",
            Self::TlabsMme => "TwelveLabs",
        }
    }

    pub fn family(&self) -> WorkflowFamily {
        match self {
            Self::Frame | Self::Clip => WorkflowFamily::Extraction,
            Self::NovaMme | Self::TlabsMme => WorkflowFamily::Embedding,
        }
    }

    /// Backend service that owns this workflow's tasks.
    pub fn service(&self) -> &'static str {
        match self {
            Self::Frame | Self::Clip => EXTRACTION_SERVICE,
            Self::NovaMme => NOVA_SERVICE,
            Self::TlabsMme => TLABS_SERVICE,
        }
    }

    pub fn search_path(&self) -> &'static str {
        match self {
            Self::Frame | Self::Clip => "/extraction/video/search-task",
            Self::NovaMme => "/nova/embedding/search-task",
            Self::TlabsMme => "/tlabs/embedding/search-task",
        }
    }

    /// `TaskType` filter sent to the search endpoint.
    pub fn task_type(&self) -> &'static str {
        self.id()
    }

    /// `workflow_type` understood by the data-size endpoint.
    pub fn data_size_type(&self) -> &'static str {
        match self {
            Self::Frame => "frame_based",
            Self::Clip => "shot_based",
            Self::NovaMme => "nova_mme",
            Self::TlabsMme => "tlabs",
        }
    }

    /// Embedding dimension of the vectors this workflow writes, if any.
    pub fn vector_dimension(&self) -> Option<u64> {
        match self {
            Self::Frame => None,
            Self::Clip | Self::NovaMme | Self::TlabsMme => Some(1024),
        }
    }

    /// All workflows in report order.
    pub fn all() -> &'static [WorkflowType] {
        &[
            WorkflowType::Frame,
            WorkflowType::Clip,
            WorkflowType::NovaMme,
            WorkflowType::TlabsMme,
        ]
    }
}

/// Which workflows a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowGroup {
    All,
    Only(WorkflowType),
}

impl WorkflowGroup {
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        WorkflowType::from_id(value).map(Self::Only)
    }

    /// Narrow `enabled` to this group, keeping its order.
    pub fn select(&self, enabled: &[WorkflowType]) -> Vec<WorkflowType> {
        match self {
            Self::All => enabled.to_vec(),
            Self::Only(w) => enabled.iter().copied().filter(|e| e == w).collect(),
        }
    }
}
