//! Folds node results into an execution report.

use crate::execution::{ExecutionMetrics, ExecutionReport, ExecutionStatus, NodeResult, NodeStatus};
use crate::graph::WorkflowGraph;
use crate::node::NodeId;
use chrono::{DateTime, Utc};
use flowline_core::{ExecutionId, WorkflowId};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Identity and timing of the run being aggregated.
#[derive(Debug, Clone, Copy)]
pub struct RunInfo {
    pub execution_id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub cancelled: bool,
}

/// Builds execution reports. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAggregator;

impl ResultAggregator {
    /// Computes the metrics for a set of node results.
    #[must_use]
    pub fn metrics(results: &BTreeMap<NodeId, NodeResult>, execution_time_ms: u64) -> ExecutionMetrics {
        let count = |status: NodeStatus| results.values().filter(|r| r.status == status).count();

        let total_nodes = results.len();
        let completed_nodes = count(NodeStatus::Completed);
        let success_rate_percent = if total_nodes == 0 {
            0.0
        } else {
            completed_nodes as f64 / total_nodes as f64 * 100.0
        };

        ExecutionMetrics {
            total_nodes,
            completed_nodes,
            failed_nodes: count(NodeStatus::Failed),
            skipped_nodes: count(NodeStatus::Skipped),
            success_rate_percent,
            execution_time_ms,
        }
    }

    /// Builds the report for a finished run.
    ///
    /// The final output holds the outputs of every completed node whose type
    /// is output-bearing.
    #[must_use]
    pub fn aggregate(
        graph: &WorkflowGraph,
        results: BTreeMap<NodeId, NodeResult>,
        run: RunInfo,
    ) -> ExecutionReport {
        let execution_time_ms = u64::try_from((run.end_time - run.start_time).num_milliseconds())
            .unwrap_or(0);
        let metrics = Self::metrics(&results, execution_time_ms);

        let final_output: BTreeMap<NodeId, JsonValue> = results
            .values()
            .filter(|result| result.status.is_completed())
            .filter(|result| {
                graph
                    .node(result.node_id.as_str())
                    .is_some_and(|node| node.kind().is_output_bearing())
            })
            .filter_map(|result| Some((result.node_id.clone(), result.output.clone()?)))
            .collect();

        let status = if metrics.failed_nodes == 0 && !run.cancelled {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::Failed
        };

        ExecutionReport {
            execution_id: run.execution_id,
            workflow_id: run.workflow_id,
            status,
            cancelled: run.cancelled,
            start_time: run.start_time,
            end_time: run.end_time,
            node_results: results,
            final_output,
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use serde_json::json;

    fn run(cancelled: bool) -> RunInfo {
        let now = Utc::now();
        RunInfo {
            execution_id: ExecutionId::new(),
            workflow_id: WorkflowId::new(),
            start_time: now,
            end_time: now + chrono::Duration::milliseconds(25),
            cancelled,
        }
    }

    fn results(entries: Vec<NodeResult>) -> BTreeMap<NodeId, NodeResult> {
        entries
            .into_iter()
            .map(|result| (result.node_id.clone(), result))
            .collect()
    }

    fn graph() -> WorkflowGraph {
        WorkflowGraph::build(
            vec![
                Node::new("in", "input"),
                Node::new("gen", "LLM"),
                Node::new("out", "output"),
                Node::new("t", "transform"),
            ],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn empty_run_has_zero_success_rate() {
        let metrics = ResultAggregator::metrics(&BTreeMap::new(), 0);
        assert_eq!(metrics.total_nodes, 0);
        assert_eq!(metrics.success_rate_percent, 0.0);
    }

    #[test]
    fn success_rate_and_status() {
        let report = ResultAggregator::aggregate(
            &graph(),
            results(vec![
                NodeResult::completed(NodeId::from("in"), json!(1), 1),
                NodeResult::completed(NodeId::from("gen"), json!({"text": "hi"}), 1),
                NodeResult::failed(NodeId::from("t"), "HandlerError: x", 1),
                NodeResult::skipped(NodeId::from("out")),
            ]),
            run(false),
        );

        assert_eq!(report.status, ExecutionStatus::Failed);
        assert_eq!(report.metrics.completed_nodes, 2);
        assert_eq!(report.metrics.failed_nodes, 1);
        assert_eq!(report.metrics.skipped_nodes, 1);
        assert_eq!(report.metrics.success_rate_percent, 50.0);
        assert_eq!(report.metrics.execution_time_ms, 25);
    }

    #[test]
    fn final_output_keeps_completed_output_bearing_nodes() {
        let report = ResultAggregator::aggregate(
            &graph(),
            results(vec![
                NodeResult::completed(NodeId::from("in"), json!(1), 1),
                NodeResult::completed(NodeId::from("gen"), json!({"text": "hi"}), 1),
                NodeResult::completed(NodeId::from("out"), json!({"result": 1}), 1),
                NodeResult::completed(NodeId::from("t"), json!(2), 1),
            ]),
            run(false),
        );

        assert!(report.is_completed());
        let keys: Vec<&str> = report.final_output.keys().map(NodeId::as_str).collect();
        assert_eq!(keys, vec!["gen", "out"]);
    }

    #[test]
    fn cancelled_run_is_failed() {
        let report = ResultAggregator::aggregate(
            &graph(),
            results(vec![NodeResult::completed(NodeId::from("in"), json!(1), 1)]),
            run(true),
        );
        assert_eq!(report.status, ExecutionStatus::Failed);
        assert!(report.cancelled);
    }
}
