//! Level-by-level execution of a planned graph.
//!
//! The executor walks an [`ExecutionPlan`] one level at a time:
//! - Nodes whose predecessors all failed or were skipped are skipped
//! - Every other node runs as its own tokio task, bounded by a semaphore
//! - Each handler call runs under a timeout, with panics contained
//! - Outputs of a level reach the context only after the whole level is done
//!
//! A failing node never aborts the run. Cancellation fails the in-flight
//! nodes of the active level and skips every later level.

use crate::context::{ExecutionContext, MergedInput};
use crate::error::NodeExecutionError;
use crate::execution::NodeResult;
use crate::graph::WorkflowGraph;
use crate::handler::{HandlerRegistry, NodeHandler};
use crate::node::{Node, NodeId};
use crate::scheduler::ExecutionPlan;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Executor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Time budget for a single handler call.
    #[serde(default = "default_node_timeout_ms")]
    pub node_timeout_ms: u64,
    /// Maximum number of handlers running at once. Zero is treated as one.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_node_timeout_ms() -> u64 {
    30_000
}

fn default_max_concurrency() -> usize {
    8
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            node_timeout_ms: default_node_timeout_ms(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl ExecutorConfig {
    /// Sets the per-node timeout.
    #[must_use]
    pub fn with_node_timeout(mut self, timeout: Duration) -> Self {
        self.node_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the concurrency limit.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Returns the per-node timeout.
    #[must_use]
    pub fn node_timeout(&self) -> Duration {
        Duration::from_millis(self.node_timeout_ms)
    }
}

/// What one run of the executor produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    /// One terminal result per planned node.
    pub results: BTreeMap<NodeId, NodeResult>,
    /// True if cancellation cut the run short.
    pub cancelled: bool,
}

/// Runs planned graphs against a handler registry.
#[derive(Debug, Clone)]
pub struct Executor {
    registry: Arc<HandlerRegistry>,
    config: ExecutorConfig,
}

impl Executor {
    /// Creates an executor.
    #[must_use]
    pub fn new(registry: Arc<HandlerRegistry>, config: ExecutorConfig) -> Self {
        Self { registry, config }
    }

    /// Returns the executor's configuration.
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Executes every node of the plan.
    ///
    /// The plan must have been computed from `graph`.
    pub async fn run(
        &self,
        graph: &WorkflowGraph,
        plan: &ExecutionPlan,
        input: JsonValue,
        cancel: &CancellationToken,
    ) -> ExecutionOutcome {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut context = ExecutionContext::new(input);
        let mut results: BTreeMap<NodeId, NodeResult> = BTreeMap::new();
        let mut cancelled = false;

        for (level_index, level) in plan.levels.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                for node_id in level {
                    results.insert(node_id.clone(), NodeResult::skipped(node_id.clone()));
                }
                continue;
            }

            debug!(level = level_index, nodes = level.len(), "starting level");

            let mut tasks = JoinSet::new();
            let mut pending = BTreeSet::new();

            for node_id in level {
                let Some(node) = graph.node(node_id.as_str()) else {
                    continue;
                };

                let predecessors: Vec<NodeId> = graph
                    .predecessors(node_id.as_str())
                    .into_iter()
                    .map(|(pred, _)| pred.id.clone())
                    .collect();
                let runnable = predecessors.is_empty()
                    || predecessors
                        .iter()
                        .any(|pred| results.get(pred).is_some_and(|r| r.status.is_completed()));

                if !runnable {
                    debug!(node_id = %node_id, "skipping node with no completed predecessor");
                    results.insert(node_id.clone(), NodeResult::skipped(node_id.clone()));
                    continue;
                }

                let merged = context.merged_input(&predecessors);
                let handler = self.registry.resolve(&node.node_type);
                let node = node.clone();
                let semaphore = Arc::clone(&semaphore);
                let cancel = cancel.clone();
                let timeout = self.config.node_timeout();

                debug!(node_id = %node.id, node_type = %node.node_type, "dispatching node");

                pending.insert(node_id.clone());
                tasks.spawn(async move {
                    Self::run_node(handler, node, merged, semaphore, timeout, cancel).await
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(result) => {
                        pending.remove(&result.node_id);
                        results.insert(result.node_id.clone(), result);
                    }
                    Err(e) => warn!(error = %e, "node task did not finish"),
                }
            }

            for node_id in pending {
                let error = NodeExecutionError::handler("node task did not finish");
                results.insert(node_id.clone(), NodeResult::failed(node_id, error.to_string(), 0));
            }

            if cancel.is_cancelled() {
                cancelled = true;
            }

            for node_id in level {
                if let Some(output) = results.get(node_id).and_then(|r| r.output.clone()) {
                    context.record_output(node_id.clone(), output);
                }
            }
        }

        ExecutionOutcome { results, cancelled }
    }

    async fn run_node(
        handler: Arc<dyn NodeHandler>,
        node: Node,
        merged: MergedInput,
        semaphore: Arc<Semaphore>,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> NodeResult {
        let started = Instant::now();

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(NodeExecutionError::Cancelled),
            outcome = Self::invoke(handler.as_ref(), &node, &merged, &semaphore, timeout) => outcome,
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(output) => {
                debug!(node_id = %node.id, elapsed_ms, "node completed");
                NodeResult::completed(node.id, output, elapsed_ms)
            }
            Err(e) => {
                warn!(node_id = %node.id, error = %e, elapsed_ms, "node failed");
                NodeResult::failed(node.id, e.to_string(), elapsed_ms)
            }
        }
    }

    async fn invoke(
        handler: &dyn NodeHandler,
        node: &Node,
        merged: &MergedInput,
        semaphore: &Semaphore,
        timeout: Duration,
    ) -> Result<JsonValue, NodeExecutionError> {
        let _permit = semaphore
            .acquire()
            .await
            .map_err(|_| NodeExecutionError::handler("concurrency limiter closed"))?;

        let call = AssertUnwindSafe(handler.handle(node, merged)).catch_unwind();
        match tokio::time::timeout(timeout, call).await {
            Err(_) => Err(NodeExecutionError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            Ok(Err(panic)) => Err(NodeExecutionError::Panicked {
                message: panic_message(panic.as_ref()),
            }),
            Ok(Ok(result)) => result,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
