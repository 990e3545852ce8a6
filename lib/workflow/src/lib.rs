//! Workflow execution engine for flowline.
//!
//! This crate runs directed graphs of typed processing nodes:
//!
//! - **Graph Model**: petgraph-backed graphs of nodes and data edges, validated on build
//! - **Scheduler**: deterministic topological order grouped into dependency levels
//! - **Handlers**: one handler per node type, resolved through a registry
//! - **Executor**: level-by-level concurrent execution with timeouts and cancellation
//! - **Aggregator**: per-node results folded into an execution report
//! - **Engine**: the entry point, with a definition store and plan cache

pub mod aggregator;
pub mod context;
pub mod definition;
pub mod edge;
pub mod engine;
pub mod error;
pub mod execution;
pub mod executor;
pub mod graph;
pub mod handler;
pub mod handlers;
pub mod node;
pub mod scheduler;

pub use aggregator::{ResultAggregator, RunInfo};
pub use context::{ExecutionContext, MergedInput};
pub use definition::{DefinitionStore, InMemoryDefinitionStore, Workflow, WorkflowMetadata};
pub use edge::Edge;
pub use engine::{Engine, PlanCache, PreparedWorkflow};
pub use error::{EngineError, GraphError, NodeExecutionError, StoreError};
pub use execution::{ExecutionMetrics, ExecutionReport, ExecutionStatus, NodeResult, NodeStatus};
pub use executor::{ExecutionOutcome, Executor, ExecutorConfig};
pub use graph::{GraphDefinition, WorkflowGraph};
pub use handler::{
    Capabilities, EchoHandler, HandlerRegistry, NodeHandler, SlowHandler, StaticHandler,
};
pub use node::{Node, NodeId, NodeKind};
pub use scheduler::{ExecutionPlan, Scheduler};
