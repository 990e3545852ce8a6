//! Error types for the workflow crate.
//!
//! Errors are split by how far they propagate:
//! - `GraphError`: structural problems, detected before a run starts
//! - `NodeExecutionError`: one node's failure, contained in its result
//! - `StoreError`: definition store lookups
//! - `EngineError`: rejections surfaced to the caller (wrapped in a rootcause `Report`)

use crate::node::NodeId;
use flowline_core::WorkflowId;
use flowline_providers::ProviderError;
use std::fmt;

/// Structural errors in a workflow graph.
///
/// A graph with any of these never starts executing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A node has an empty id.
    EmptyNodeId { position: usize },
    /// Two nodes share the same id.
    DuplicateNodeId { node_id: NodeId },
    /// An edge references a node that does not exist.
    DanglingEdge { edge_id: String, node_id: NodeId },
    /// The graph contains at least one cycle.
    ///
    /// `node_ids` lists every node that could not be scheduled, in
    /// declaration order.
    CycleDetected { node_ids: Vec<NodeId> },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyNodeId { position } => {
                write!(f, "node at position {position} has an empty id")
            }
            Self::DuplicateNodeId { node_id } => write!(f, "duplicate node id: {node_id}"),
            Self::DanglingEdge { edge_id, node_id } => {
                write!(f, "edge '{edge_id}' references unknown node {node_id}")
            }
            Self::CycleDetected { node_ids } => {
                let ids: Vec<&str> = node_ids.iter().map(NodeId::as_str).collect();
                write!(f, "graph contains a cycle through: {}", ids.join(", "))
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// Errors from executing a single node.
///
/// These are recorded in the node's result and never abort the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeExecutionError {
    /// The node's parameters or merged input were not what the handler expects.
    InvalidInput { message: String },
    /// The handler failed.
    HandlerError { message: String },
    /// A capability provider failed.
    Provider { service: String, error: ProviderError },
    /// The handler did not finish within the configured budget.
    Timeout { timeout_ms: u64 },
    /// The run was cancelled while the node was executing.
    Cancelled,
    /// The handler panicked.
    Panicked { message: String },
}

impl NodeExecutionError {
    /// Creates a handler error from any message.
    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::HandlerError {
            message: message.into(),
        }
    }

    /// Creates an invalid input error from any message.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

impl fmt::Display for NodeExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { message } => write!(f, "HandlerError: invalid input: {message}"),
            Self::HandlerError { message } => write!(f, "HandlerError: {message}"),
            Self::Provider { service, error } => {
                write!(f, "HandlerError: {service} provider: {error}")
            }
            Self::Timeout { timeout_ms } => {
                write!(f, "NodeTimeout: no result within {timeout_ms} ms")
            }
            Self::Cancelled => write!(f, "Cancelled: run was cancelled"),
            Self::Panicked { message } => write!(f, "HandlerError: handler panicked: {message}"),
        }
    }
}

impl std::error::Error for NodeExecutionError {}

/// Errors from a definition store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No definition is stored under this id.
    NotFound { workflow_id: WorkflowId },
    /// The store could not be read.
    LoadFailed { message: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { workflow_id } => write!(f, "workflow not found: {workflow_id}"),
            Self::LoadFailed { message } => write!(f, "definition store load failed: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Reasons the engine rejects a run request.
///
/// A rejected request never mints an execution id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The graph is structurally invalid.
    InvalidGraph { error: GraphError },
    /// The workflow definition does not exist.
    WorkflowNotFound { workflow_id: WorkflowId },
    /// No definition store is configured.
    NoDefinitionStore,
    /// The definition store failed.
    Store { error: StoreError },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGraph { error } => write!(f, "invalid workflow graph: {error}"),
            Self::WorkflowNotFound { workflow_id } => {
                write!(f, "workflow not found: {workflow_id}")
            }
            Self::NoDefinitionStore => write!(f, "no definition store configured"),
            Self::Store { error } => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<GraphError> for EngineError {
    fn from(error: GraphError) -> Self {
        Self::InvalidGraph { error }
    }
}

impl From<StoreError> for EngineError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { workflow_id } => Self::WorkflowNotFound { workflow_id },
            error => Self::Store { error },
        }
    }
}
