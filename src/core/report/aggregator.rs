use anyhow::{Context, Result};
use futures::future::join_all;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::core::backend::Backend;
use crate::core::cost::normalizer::{infra_cost, normalize};
use crate::core::cost::pricing::PricingTable;
use crate::core::cost::storage::storage_cost;
use crate::core::models::cost::WorkflowTotal;
use crate::core::models::task::{TaskRecord, TaskSummary};
use crate::core::models::usage::{records_in_reply, UsageRecord};
use crate::core::workflow::{WorkflowFamily, WorkflowType, DATA_SIZE_PATH, TOKEN_AND_COST_PATH};

/// Most tasks requested per workflow.
pub const TASK_PAGE_SIZE: u64 = 1000;

/// Pricing inputs shared by every task in a report.
#[derive(Debug, Clone, Copy)]
pub struct CostContext<'a> {
    pub pricing: &'a PricingTable,
    /// Used when neither the cost reply nor the task names a region.
    pub default_region: &'a str,
    pub infra_rate_per_second: f64,
}

/// Usage reply for one task.
#[derive(Debug, Clone, Default)]
struct TaskUsage {
    records: Vec<UsageRecord>,
    region: Option<String>,
    /// Precomputed cost from backends that don't return records.
    reported_total: Option<f64>,
}

fn parse_task_usage(body: &Value) -> TaskUsage {
    TaskUsage {
        records: records_in_reply(body),
        region: body.get("region").and_then(Value::as_str).map(str::to_string),
        reported_total: body.get("total_cost").and_then(Value::as_f64),
    }
}

fn as_byte_count(value: Option<&Value>) -> u64 {
    match value {
        Some(v) => v
            .as_u64()
            .or_else(|| v.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        None => 0,
    }
}

/// Request the workflow's tasks. `Ok(None)` when the listing call fails or
/// answers non-200; `Err` only when a successful reply is malformed.
pub async fn list_tasks(
    backend: &dyn Backend,
    workflow: WorkflowType,
) -> Result<Option<Vec<TaskRecord>>> {
    let request = json!({ "TaskType": workflow.task_type(), "PageSize": TASK_PAGE_SIZE });
    let reply = match backend
        .post(workflow.service(), workflow.search_path(), request)
        .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!(workflow = workflow.id(), "task listing failed: {:#}", e);
            return Ok(None);
        }
    };
    if !reply.is_success() {
        warn!(
            workflow = workflow.id(),
            status = reply.status_code,
            "task listing returned non-success"
        );
        return Ok(None);
    }

    let tasks = match reply.body {
        Value::Null => Vec::new(),
        body => serde_json::from_value(body).with_context(|| {
            format!("Malformed task list for {}", workflow.display_name())
        })?,
    };
    Ok(Some(tasks))
}

/// Bytes generated for one task; 0 on any failure.
async fn fetch_data_size(backend: &dyn Backend, workflow: WorkflowType, task_id: &str) -> u64 {
    let request = json!({ "task_id": task_id, "workflow_type": workflow.data_size_type() });
    match backend
        .post(workflow.service(), DATA_SIZE_PATH, request)
        .await
    {
        Ok(reply) if reply.is_success() => as_byte_count(reply.body.get("total_size")),
        Ok(reply) => {
            debug!(task_id, status = reply.status_code, "data size unavailable");
            0
        }
        Err(e) => {
            debug!(task_id, "data size lookup failed: {:#}", e);
            0
        }
    }
}

/// Usage records and region for one task; empty on any failure.
async fn fetch_usage(backend: &dyn Backend, workflow: WorkflowType, task_id: &str) -> TaskUsage {
    match backend
        .post(workflow.service(), TOKEN_AND_COST_PATH, json!({ "task_id": task_id }))
        .await
    {
        Ok(reply) if reply.is_success() => parse_task_usage(&reply.body),
        Ok(reply) => {
            debug!(task_id, status = reply.status_code, "usage unavailable");
            TaskUsage::default()
        }
        Err(e) => {
            debug!(task_id, "usage lookup failed: {:#}", e);
            TaskUsage::default()
        }
    }
}

async fn summarize_task(
    backend: &dyn Backend,
    workflow: WorkflowType,
    task: &TaskRecord,
    ctx: CostContext<'_>,
) -> TaskSummary {
    let (data_size, compute_cost, infra) = match workflow.family() {
        WorkflowFamily::Extraction => {
            let (data_size, usage) = tokio::join!(
                fetch_data_size(backend, workflow, &task.task_id),
                fetch_usage(backend, workflow, &task.task_id),
            );
            let region = usage
                .region
                .as_deref()
                .or(task.region.as_deref())
                .unwrap_or(ctx.default_region);
            let compute = if usage.records.is_empty() {
                usage.reported_total.unwrap_or(0.0)
            } else {
                normalize(Some(usage.records.as_slice()), region, ctx.pricing)
            };
            let infra = infra_cost(Some(usage.records.as_slice()), ctx.infra_rate_per_second);
            (data_size, compute, infra)
        }
        WorkflowFamily::Embedding => {
            let data_size = fetch_data_size(backend, workflow, &task.task_id).await;
            (data_size, 0.0, 0.0)
        }
    };

    TaskSummary {
        task_id: task.task_id.clone(),
        status: task.status(),
        source_video_size: task.video_size.unwrap_or(0),
        data_size,
        compute_cost,
        infra_cost: infra,
    }
}

/// Fold per-task figures into one workflow row.
pub fn summarize(workflow_name: &str, tasks: &[TaskSummary]) -> WorkflowTotal {
    let video_count = tasks.len() as u64;
    let source_video_size = tasks
        .iter()
        .map(|t| t.source_video_size)
        .fold(0u64, u64::saturating_add);
    let data_size = tasks
        .iter()
        .map(|t| t.data_size)
        .fold(0u64, u64::saturating_add);
    let compute_cost: f64 = tasks.iter().map(|t| t.compute_cost).sum();
    let infra_cost: f64 = tasks.iter().map(|t| t.infra_cost).sum();
    let source_video_storage_cost = storage_cost(source_video_size);
    let generated_data_storage_cost = storage_cost(data_size);

    WorkflowTotal {
        workflow_name: workflow_name.to_string(),
        video_count,
        source_video_size,
        data_size,
        compute_cost,
        infra_cost,
        source_video_storage_cost,
        generated_data_storage_cost,
        total_cost: compute_cost
            + infra_cost
            + source_video_storage_cost
            + generated_data_storage_cost,
        avg_data_size: if video_count > 0 {
            data_size as f64 / video_count as f64
        } else {
            0.0
        },
    }
}

/// Aggregate one workflow. `Ok(None)` excludes it from the report.
pub async fn aggregate(
    backend: &dyn Backend,
    workflow: WorkflowType,
    ctx: CostContext<'_>,
) -> Result<Option<WorkflowTotal>> {
    let tasks = match list_tasks(backend, workflow).await? {
        Some(t) => t,
        None => return Ok(None),
    };

    let completed: Vec<&TaskRecord> = tasks
        .iter()
        .filter(|t| t.status().is_completed())
        .collect();
    debug!(
        workflow = workflow.id(),
        listed = tasks.len(),
        completed = completed.len(),
        "aggregating workflow"
    );

    let summaries = join_all(
        completed
            .iter()
            .map(|task| summarize_task(backend, workflow, task, ctx)),
    )
    .await;

    Ok(Some(summarize(workflow.display_name(), &summaries)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::testing::FakeBackend;
    use crate::core::cost::pricing::{PricingEntry, PricingRule};
    use crate::core::models::status::TaskStatus;

    const SEARCH: &str = "/extraction/video/search-task";

    fn pricing() -> PricingTable {
        PricingTable::from_entries(vec![PricingEntry {
            region: "us-east-1".into(),
            model: "m1".into(),
            sub_type: "text".into(),
            rule: PricingRule::Token {
                price_per_1k_input_tokens: 0.003,
                price_per_1k_output_tokens: 0.015,
            },
        }])
    }

    fn ctx(table: &PricingTable) -> CostContext<'_> {
        CostContext {
            pricing: table,
            default_region: "us-east-1",
            infra_rate_per_second: 0.01,
        }
    }

    fn usage_body() -> Value {
        json!({
            "usage_records": [
                { "model_id": "m1", "type": "text", "input_tokens": 1000, "output_tokens": 500 }
            ],
            "region": "us-east-1"
        })
    }

    #[test]
    fn parse_task_usage_aliases() {
        let u = parse_task_usage(&json!({ "usage": [{ "model_id": "m1" }], "total_cost": 1.5 }));
        assert_eq!(u.records.len(), 1);
        assert!(u.region.is_none());
        assert_eq!(u.reported_total, Some(1.5));

        let u = parse_task_usage(&json!({ "records": "not-an-array" }));
        assert!(u.records.is_empty());
    }

    #[test]
    fn byte_count_accepts_floats() {
        assert_eq!(as_byte_count(Some(&json!(42))), 42);
        assert_eq!(as_byte_count(Some(&json!(42.9))), 42);
        assert_eq!(as_byte_count(Some(&json!(-1))), 0);
        assert_eq!(as_byte_count(Some(&json!("big"))), 0);
        assert_eq!(as_byte_count(None), 0);
    }

    #[test]
    fn summarize_empty_has_zero_average() {
        let row = summarize("Frame Based", &[]);
        assert_eq!(row.video_count, 0);
        assert_eq!(row.avg_data_size, 0.0);
        assert_eq!(row.total_cost, 0.0);
    }

    #[test]
    fn summarize_sums_and_prices_storage() {
        let tasks = vec![
            TaskSummary {
                task_id: "a".into(),
                status: TaskStatus::Completed,
                source_video_size: 1 << 30,
                data_size: 1 << 30,
                compute_cost: 1.0,
                infra_cost: 0.5,
            },
            TaskSummary {
                task_id: "b".into(),
                status: TaskStatus::Completed,
                source_video_size: 1 << 30,
                data_size: 0,
                compute_cost: 2.0,
                infra_cost: 0.25,
            },
        ];
        let row = summarize("Shot Based", &tasks);
        assert_eq!(row.video_count, 2);
        assert_eq!(row.source_video_size, 2 << 30);
        assert!((row.compute_cost - 3.0).abs() < 1e-12);
        assert!((row.infra_cost - 0.75).abs() < 1e-12);
        assert!((row.source_video_storage_cost - 0.046).abs() < 1e-12);
        assert!((row.generated_data_storage_cost - 0.023).abs() < 1e-12);
        assert!((row.total_cost - (3.0 + 0.75 + 0.046 + 0.023)).abs() < 1e-12);
        assert!((row.avg_data_size - (1u64 << 29) as f64).abs() < 1e-6);
    }

    #[tokio::test]
    async fn two_frame_tasks_scenario() {
        let backend = FakeBackend::new()
            .respond(
                SEARCH,
                "frame",
                200,
                json!([
                    { "TaskId": "t1", "Status": "COMPLETED" },
                    { "TaskId": "t2", "Status": "COMPLETED" }
                ]),
            )
            .respond(TOKEN_AND_COST_PATH, "t1", 200, usage_body())
            .respond(TOKEN_AND_COST_PATH, "t2", 200, usage_body());
        let table = pricing();

        let row = aggregate(&backend, WorkflowType::Frame, ctx(&table))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.workflow_name, "Frame Based");
        assert_eq!(row.video_count, 2);
        assert!((row.compute_cost - 0.021).abs() < 1e-12);
        assert_eq!(row.infra_cost, 0.0);
        assert_eq!(row.data_size, 0);
    }

    #[tokio::test]
    async fn only_completed_tasks_are_counted() {
        let backend = FakeBackend::new()
            .respond(
                SEARCH,
                "clip",
                200,
                json!([
                    { "TaskId": "a", "Status": "COMPLETED", "VideoSize": 100 },
                    { "TaskId": "b", "Status": "complete", "VideoSize": 50 },
                    { "TaskId": "c", "Status": "PROCESSING", "VideoSize": 999 },
                    { "TaskId": "d", "Status": "FAILED" }
                ]),
            )
            .respond(DATA_SIZE_PATH, "a", 200, json!({ "total_size": 1000 }))
            .respond(DATA_SIZE_PATH, "b", 200, json!({ "total_size": 3000 }));
        let table = pricing();

        let row = aggregate(&backend, WorkflowType::Clip, ctx(&table))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.video_count, 2);
        assert_eq!(row.source_video_size, 150);
        assert_eq!(row.data_size, 4000);
        assert!((row.avg_data_size - 2000.0).abs() < 1e-9);
        assert!(!backend.calls().iter().any(|c| c.ends_with("#c")));
    }

    #[tokio::test]
    async fn per_task_failures_become_zero() {
        let backend = FakeBackend::new()
            .respond(
                SEARCH,
                "frame",
                200,
                json!([
                    { "TaskId": "ok", "Status": "COMPLETED" },
                    { "TaskId": "bad", "Status": "COMPLETED" }
                ]),
            )
            .respond(DATA_SIZE_PATH, "ok", 200, json!({ "total_size": 10 }))
            .respond(TOKEN_AND_COST_PATH, "ok", 200, usage_body())
            .reject(DATA_SIZE_PATH, "bad", "connection reset")
            .respond(TOKEN_AND_COST_PATH, "bad", 500, json!({ "error": "x" }));
        let table = pricing();

        let row = aggregate(&backend, WorkflowType::Frame, ctx(&table))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.video_count, 2);
        assert_eq!(row.data_size, 10);
        assert!((row.compute_cost - 0.0105).abs() < 1e-12);
    }

    #[tokio::test]
    async fn infra_cost_from_longest_record() {
        let backend = FakeBackend::new()
            .respond(SEARCH, "frame", 200, json!([{ "TaskId": "t", "Status": "COMPLETED" }]))
            .respond(
                TOKEN_AND_COST_PATH,
                "t",
                200,
                json!({ "usage_records": [
                    { "model_id": "x", "duration": 2 },
                    { "model_id": "x", "duration_s": 5 },
                    { "model_id": "x", "duration": 3 }
                ]}),
            );
        let table = pricing();

        let row = aggregate(&backend, WorkflowType::Frame, ctx(&table))
            .await
            .unwrap()
            .unwrap();
        assert!((row.infra_cost - 0.05).abs() < 1e-12);
        assert_eq!(row.compute_cost, 0.0);
    }

    #[tokio::test]
    async fn reported_total_used_without_records() {
        let backend = FakeBackend::new()
            .respond(SEARCH, "frame", 200, json!([{ "TaskId": "t", "Status": "COMPLETED" }]))
            .respond(TOKEN_AND_COST_PATH, "t", 200, json!({ "total_cost": 0.42 }));
        let table = pricing();

        let row = aggregate(&backend, WorkflowType::Frame, ctx(&table))
            .await
            .unwrap()
            .unwrap();
        assert!((row.compute_cost - 0.42).abs() < 1e-12);
    }

    #[tokio::test]
    async fn embedding_workflow_has_no_compute_cost() {
        let backend = FakeBackend::new()
            .respond(
                "/nova/embedding/search-task",
                "novamme",
                200,
                json!([{ "TaskId": "n1", "Status": "COMPLETED", "VideoSize": 1073741824u64 }]),
            )
            .respond(DATA_SIZE_PATH, "n1", 200, json!({ "total_size": 1073741824u64 }))
            .respond(TOKEN_AND_COST_PATH, "n1", 200, usage_body());
        let table = pricing();

        let row = aggregate(&backend, WorkflowType::NovaMme, ctx(&table))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.compute_cost, 0.0);
        assert_eq!(row.infra_cost, 0.0);
        assert!((row.source_video_storage_cost - 0.023).abs() < 1e-12);
        assert!((row.generated_data_storage_cost - 0.023).abs() < 1e-12);
        assert!(!backend
            .calls()
            .iter()
            .any(|c| c.contains(TOKEN_AND_COST_PATH)));
        assert!(backend
            .calls()
            .iter()
            .any(|c| c.starts_with("NovaService") && c.contains(DATA_SIZE_PATH)));
    }

    #[tokio::test]
    async fn oversized_data_sizes_saturate() {
        let backend = FakeBackend::new()
            .respond(
                SEARCH,
                "frame",
                200,
                json!([
                    { "TaskId": "huge", "Status": "COMPLETED", "VideoSize": u64::MAX },
                    { "TaskId": "small", "Status": "COMPLETED", "VideoSize": 10 }
                ]),
            )
            .respond(DATA_SIZE_PATH, "huge", 200, json!({ "total_size": 1.9e19 }))
            .respond(DATA_SIZE_PATH, "small", 200, json!({ "total_size": 10 }));
        let table = pricing();

        let row = aggregate(&backend, WorkflowType::Frame, ctx(&table))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.video_count, 2);
        assert_eq!(row.data_size, u64::MAX);
        assert_eq!(row.source_video_size, u64::MAX);
        assert!(row.total_cost.is_finite());
    }

    #[tokio::test]
    async fn non_json_listing_body_is_malformed() {
        let body = crate::core::backend::parse_body("<html>502 Bad Gateway</html>");
        let backend = FakeBackend::new().respond(SEARCH, "frame", 200, body);
        let table = pricing();
        let err = aggregate(&backend, WorkflowType::Frame, ctx(&table))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Malformed task list for Frame Based"));
    }

    #[tokio::test]
    async fn listing_failure_excludes_workflow() {
        let backend = FakeBackend::new().respond(SEARCH, "frame", 500, json!({ "error": "x" }));
        let table = pricing();
        let row = aggregate(&backend, WorkflowType::Frame, ctx(&table)).await.unwrap();
        assert!(row.is_none());

        let backend = FakeBackend::new().reject(SEARCH, "clip", "timeout");
        let row = aggregate(&backend, WorkflowType::Clip, ctx(&table)).await.unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn null_task_list_is_empty_workflow() {
        let backend = FakeBackend::new().respond(SEARCH, "frame", 200, Value::Null);
        let table = pricing();
        let row = aggregate(&backend, WorkflowType::Frame, ctx(&table))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.video_count, 0);
        assert_eq!(row.avg_data_size, 0.0);
    }

    #[tokio::test]
    async fn malformed_task_list_is_an_error() {
        let backend = FakeBackend::new().respond(SEARCH, "frame", 200, json!({ "tasks": 3 }));
        let table = pricing();
        let err = aggregate(&backend, WorkflowType::Frame, ctx(&table))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Malformed task list"));
    }
}
