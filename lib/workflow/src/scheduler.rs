//! Execution ordering for workflow graphs.
//!
//! The scheduler turns a validated graph into an [`ExecutionPlan`]:
//! - `order` is a topological order (Kahn's algorithm with a FIFO queue)
//! - `levels` groups nodes by longest distance from a source node
//!
//! Nodes within one level share no path and may run concurrently. Ties are
//! always broken by declaration order, so the same graph always produces the
//! same plan.

use crate::error::GraphError;
use crate::graph::WorkflowGraph;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// A topological order of a graph, grouped into dependency levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Every node, in topological order.
    pub order: Vec<NodeId>,
    /// Nodes grouped by level, each level in plan order.
    pub levels: Vec<Vec<NodeId>>,
}

impl ExecutionPlan {
    /// Returns the number of scheduled nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if the plan schedules no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the level a node was scheduled in.
    #[must_use]
    pub fn level_of(&self, node_id: &str) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.iter().any(|id| id.as_str() == node_id))
    }
}

/// Computes execution plans.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    /// Computes the execution plan for a graph.
    ///
    /// # Errors
    ///
    /// Returns `CycleDetected` listing every node that could not be
    /// scheduled, in declaration order.
    pub fn plan(graph: &WorkflowGraph) -> Result<ExecutionPlan, GraphError> {
        let adjacency = graph.adjacency();
        let mut remaining = graph.in_degree();
        let mut levels_by_node: HashMap<NodeId, usize> = HashMap::with_capacity(graph.node_count());
        let mut order = Vec::with_capacity(graph.node_count());

        let mut ready: VecDeque<NodeId> = graph
            .source_nodes()
            .into_iter()
            .map(|node| node.id.clone())
            .collect();
        for source in &ready {
            levels_by_node.insert(source.clone(), 0);
        }

        while let Some(node_id) = ready.pop_front() {
            let level = levels_by_node.get(&node_id).copied().unwrap_or(0);
            let mut newly_ready = Vec::new();

            for (_, target) in adjacency.get(&node_id).map(Vec::as_slice).unwrap_or(&[]) {
                let target_level = levels_by_node.entry((*target).clone()).or_insert(0);
                *target_level = (*target_level).max(level + 1);

                if let Some(degree) = remaining.get_mut(*target) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        newly_ready.push((*target).clone());
                    }
                }
            }

            newly_ready.sort_by_key(|id| graph.position_of(id.as_str()));
            ready.extend(newly_ready);
            order.push(node_id);
        }

        if order.len() < graph.node_count() {
            let node_ids = graph
                .nodes()
                .filter(|node| remaining.get(&node.id).is_some_and(|degree| *degree > 0))
                .map(|node| node.id.clone())
                .collect();
            return Err(GraphError::CycleDetected { node_ids });
        }

        let mut levels: Vec<Vec<NodeId>> = Vec::new();
        for node_id in &order {
            let level = levels_by_node.get(node_id).copied().unwrap_or(0);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(node_id.clone());
        }

        Ok(ExecutionPlan { order, levels })
    }
}
