//! Execution results.
//!
//! Each node of a run ends in exactly one terminal state, recorded as a
//! [`NodeResult`]. The run as a whole is summarized by an
//! [`ExecutionReport`], which is immutable once produced.

use crate::node::NodeId;
use chrono::{DateTime, Utc};
use flowline_core::{ExecutionId, WorkflowId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// The terminal state of a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Handler returned an output.
    Completed,
    /// Handler failed, timed out, panicked, or was cancelled.
    Failed,
    /// Handler never ran.
    Skipped,
}

impl NodeStatus {
    /// Returns true if downstream nodes can consume this node's output.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// The outcome of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
    pub node_id: NodeId,
    pub status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time from dispatch to completion, zero for skipped nodes.
    pub execution_time_ms: u64,
}

impl NodeResult {
    /// A node whose handler returned an output.
    #[must_use]
    pub fn completed(node_id: NodeId, output: JsonValue, execution_time_ms: u64) -> Self {
        Self {
            node_id,
            status: NodeStatus::Completed,
            output: Some(output),
            error: None,
            execution_time_ms,
        }
    }

    /// A node whose handler failed.
    #[must_use]
    pub fn failed(node_id: NodeId, error: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            node_id,
            status: NodeStatus::Failed,
            output: None,
            error: Some(error.into()),
            execution_time_ms,
        }
    }

    /// A node whose handler never ran.
    #[must_use]
    pub fn skipped(node_id: NodeId) -> Self {
        Self {
            node_id,
            status: NodeStatus::Skipped,
            output: None,
            error: None,
            execution_time_ms: 0,
        }
    }
}

/// The overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// No node failed and the run was not cancelled.
    Completed,
    /// At least one node failed, or the run was cancelled.
    Failed,
}

/// Counts over a run's node results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetrics {
    pub total_nodes: usize,
    pub completed_nodes: usize,
    pub failed_nodes: usize,
    pub skipped_nodes: usize,
    /// `completed / total * 100`, or 0 for an empty workflow.
    pub success_rate_percent: f64,
    pub execution_time_ms: u64,
}

/// The aggregated result of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub execution_id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub status: ExecutionStatus,
    pub cancelled: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub node_results: BTreeMap<NodeId, NodeResult>,
    /// Outputs of completed `output` and `llm` nodes.
    pub final_output: BTreeMap<NodeId, JsonValue>,
    pub metrics: ExecutionMetrics,
}

impl ExecutionReport {
    /// Returns true if the run completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }

    /// Returns the result of one node.
    #[must_use]
    pub fn node_result(&self, node_id: &str) -> Option<&NodeResult> {
        self.node_results.get(node_id)
    }

    /// Returns the status of one node.
    #[must_use]
    pub fn node_status(&self, node_id: &str) -> Option<NodeStatus> {
        self.node_result(node_id).map(|result| result.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_result_serializes_camel_case() {
        let result = NodeResult::failed(NodeId::from("n"), "HandlerError: boom", 12);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            json!({
                "nodeId": "n",
                "status": "failed",
                "error": "HandlerError: boom",
                "executionTimeMs": 12
            })
        );
    }

    #[test]
    fn skipped_result_has_no_output_or_error() {
        let result = NodeResult::skipped(NodeId::from("n"));
        assert_eq!(result.status, NodeStatus::Skipped);
        assert!(result.output.is_none());
        assert!(result.error.is_none());
        assert!(!result.status.is_completed());
    }
}
