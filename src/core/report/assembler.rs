use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use tracing::{error, info};

use crate::core::backend::Backend;
use crate::core::models::cost::{Report, ReportState, WorkflowTotal, TOTAL_ROW_NAME};
use crate::core::report::aggregator::{aggregate, CostContext};
use crate::core::workflow::WorkflowType;

/// Sum every field across `rows`; the average is recomputed from the sums.
pub fn total_row(rows: &[WorkflowTotal]) -> WorkflowTotal {
    let mut total = rows.iter().fold(
        WorkflowTotal {
            workflow_name: TOTAL_ROW_NAME.to_string(),
            ..Default::default()
        },
        |mut acc, r| {
            acc.video_count = acc.video_count.saturating_add(r.video_count);
            acc.source_video_size = acc.source_video_size.saturating_add(r.source_video_size);
            acc.data_size = acc.data_size.saturating_add(r.data_size);
            acc.compute_cost += r.compute_cost;
            acc.infra_cost += r.infra_cost;
            acc.source_video_storage_cost += r.source_video_storage_cost;
            acc.generated_data_storage_cost += r.generated_data_storage_cost;
            acc.total_cost += r.total_cost;
            acc
        },
    );
    total.avg_data_size = if total.video_count > 0 {
        total.data_size as f64 / total.video_count as f64
    } else {
        0.0
    };
    total
}

/// Aggregate `workflows` concurrently into a report. Workflows whose listing
/// fails are left out; the Total row is appended when any remain.
pub async fn assemble(
    backend: &dyn Backend,
    workflows: &[WorkflowType],
    ctx: CostContext<'_>,
) -> Result<Report> {
    let results = join_all(workflows.iter().map(|w| aggregate(backend, *w, ctx))).await;

    let mut rows = Vec::with_capacity(workflows.len() + 1);
    for result in results {
        if let Some(row) = result? {
            rows.push(row);
        }
    }
    info!(
        requested = workflows.len(),
        included = rows.len(),
        "report assembled"
    );

    if !rows.is_empty() {
        let total = total_row(&rows);
        rows.push(total);
    }

    Ok(Report {
        generated_at: Utc::now(),
        rows,
    })
}

/// Run one full load cycle. Any unexpected failure replaces the report with
/// an error message.
pub async fn load_report(
    backend: &dyn Backend,
    workflows: &[WorkflowType],
    ctx: CostContext<'_>,
) -> ReportState {
    match assemble(backend, workflows, ctx).await {
        Ok(report) => ReportState::loaded(report),
        Err(e) => {
            error!("report load failed: {:#}", e);
            ReportState::failed(format!("{:#}", e))
        }
    }
}
