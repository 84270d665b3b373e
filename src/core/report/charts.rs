use serde::Serialize;

use crate::core::cost::storage::bytes_to_gib;
use crate::core::models::cost::{Report, WorkflowTotal};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: String,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub title: &'static str,
    pub data: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn max(&self) -> f64 {
        self.data.iter().map(|p| p.y).fold(0.0, f64::max)
    }
}

fn per_workflow(report: &Report, title: &'static str, f: fn(&WorkflowTotal) -> f64) -> ChartSeries {
    ChartSeries {
        title,
        data: report
            .workflow_rows()
            .map(|r| ChartPoint {
                x: r.workflow_name.clone(),
                y: f(r),
            })
            .collect(),
    }
}

/// Stacked compute / infra / storage cost per workflow. Total row excluded.
pub fn cost_breakdown(report: &Report) -> Vec<ChartSeries> {
    vec![
        per_workflow(report, "Compute Cost", |r| r.compute_cost),
        per_workflow(report, "Infra Cost", |r| r.infra_cost),
        per_workflow(report, "Storage Cost", |r| {
            r.source_video_storage_cost + r.generated_data_storage_cost
        }),
    ]
}

/// Generated data per workflow, GiB. Total row excluded.
pub fn data_volume(report: &Report) -> ChartSeries {
    per_workflow(report, "Data Size", |r| bytes_to_gib(r.data_size))
}
