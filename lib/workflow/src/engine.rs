//! The workflow engine.
//!
//! The engine is the entry point for running workflows:
//! 1. Validate the graph and compute its plan (rejections happen here)
//! 2. Mint an execution id
//! 3. Execute the plan level by level
//! 4. Aggregate the node results into a report
//!
//! A run that starts always produces a report, however many nodes fail.
//! Only structural problems and missing definitions are returned as errors.

use crate::aggregator::{ResultAggregator, RunInfo};
use crate::definition::DefinitionStore;
use crate::error::EngineError;
use crate::execution::ExecutionReport;
use crate::executor::{Executor, ExecutorConfig};
use crate::graph::{GraphDefinition, WorkflowGraph};
use crate::handler::HandlerRegistry;
use crate::scheduler::{ExecutionPlan, Scheduler};
use chrono::Utc;
use flowline_core::{ExecutionId, WorkflowId};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// A validated graph together with its plan.
#[derive(Debug, Clone)]
pub struct PreparedWorkflow {
    pub graph: Arc<WorkflowGraph>,
    pub plan: Arc<ExecutionPlan>,
}

impl PreparedWorkflow {
    /// Validates a graph definition and plans it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGraph` if the graph is malformed or cyclic.
    pub fn prepare(definition: GraphDefinition) -> flowline_core::Result<Self, EngineError> {
        let graph = definition.build().map_err(EngineError::from)?;
        let plan = Scheduler::plan(&graph).map_err(EngineError::from)?;
        Ok(Self {
            graph: Arc::new(graph),
            plan: Arc::new(plan),
        })
    }
}

/// Plans of stored workflows, keyed by workflow id and definition version.
#[derive(Debug, Default)]
pub struct PlanCache {
    entries: RwLock<HashMap<(WorkflowId, String), PreparedWorkflow>>,
}

impl PlanCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached plan for a workflow version.
    pub async fn get(&self, workflow_id: WorkflowId, version: &str) -> Option<PreparedWorkflow> {
        self.entries
            .read()
            .await
            .get(&(workflow_id, version.to_string()))
            .cloned()
    }

    /// Caches a plan for a workflow version.
    ///
    /// Plans for other versions of the same workflow are dropped.
    pub async fn insert(&self, workflow_id: WorkflowId, version: &str, prepared: PreparedWorkflow) {
        let mut entries = self.entries.write().await;
        entries.retain(|(id, _), _| *id != workflow_id);
        entries.insert((workflow_id, version.to_string()), prepared);
    }

    /// Returns the number of cached plans.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Runs workflows.
pub struct Engine {
    executor: Executor,
    store: Option<Arc<dyn DefinitionStore>>,
    plans: PlanCache,
}

impl Engine {
    /// Creates an engine with no definition store.
    #[must_use]
    pub fn new(registry: HandlerRegistry, config: ExecutorConfig) -> Self {
        Self {
            executor: Executor::new(Arc::new(registry), config),
            store: None,
            plans: PlanCache::new(),
        }
    }

    /// Sets the store used by [`Engine::execute_stored`].
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn DefinitionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Returns the executor configuration.
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        self.executor.config()
    }

    /// Returns the plan cache.
    #[must_use]
    pub fn plan_cache(&self) -> &PlanCache {
        &self.plans
    }

    /// Executes a workflow graph.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGraph` if the graph is malformed or cyclic. No
    /// execution id is minted and no handler runs in that case.
    pub async fn execute(
        &self,
        workflow_id: WorkflowId,
        definition: GraphDefinition,
        input: JsonValue,
    ) -> flowline_core::Result<ExecutionReport, EngineError> {
        self.execute_with_cancellation(workflow_id, definition, input, CancellationToken::new())
            .await
    }

    /// Executes a workflow graph until it finishes or `cancel` fires.
    ///
    /// # Errors
    ///
    /// See [`Engine::execute`].
    #[instrument(skip_all, fields(workflow_id = %workflow_id))]
    pub async fn execute_with_cancellation(
        &self,
        workflow_id: WorkflowId,
        definition: GraphDefinition,
        input: JsonValue,
        cancel: CancellationToken,
    ) -> flowline_core::Result<ExecutionReport, EngineError> {
        let prepared = PreparedWorkflow::prepare(definition)?;
        Ok(self.run(workflow_id, &prepared, input, &cancel).await)
    }

    /// Loads a workflow from the definition store and executes it.
    ///
    /// Plans are cached per workflow version.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No definition store is configured
    /// - The workflow does not exist or could not be loaded
    /// - The stored graph is malformed or cyclic
    #[instrument(skip_all, fields(workflow_id = %workflow_id))]
    pub async fn execute_stored(
        &self,
        workflow_id: WorkflowId,
        input: JsonValue,
    ) -> flowline_core::Result<ExecutionReport, EngineError> {
        let Some(store) = &self.store else {
            return Err(EngineError::NoDefinitionStore.into());
        };

        let workflow = store.load(workflow_id).await.map_err(EngineError::from)?;
        let version = workflow.version().to_string();
        debug!(name = workflow.name(), %version, "loaded workflow definition");

        let prepared = match self.plans.get(workflow_id, &version).await {
            Some(prepared) => {
                debug!(%version, "using cached plan");
                prepared
            }
            None => {
                let prepared = PreparedWorkflow::prepare(workflow.graph)?;
                self.plans
                    .insert(workflow_id, &version, prepared.clone())
                    .await;
                prepared
            }
        };

        Ok(self
            .run(workflow_id, &prepared, input, &CancellationToken::new())
            .await)
    }

    async fn run(
        &self,
        workflow_id: WorkflowId,
        prepared: &PreparedWorkflow,
        input: JsonValue,
        cancel: &CancellationToken,
    ) -> ExecutionReport {
        let execution_id = ExecutionId::new();
        let start_time = Utc::now();

        info!(
            %execution_id,
            nodes = prepared.plan.len(),
            levels = prepared.plan.levels.len(),
            "execution started"
        );

        let outcome = self
            .executor
            .run(&prepared.graph, &prepared.plan, input, cancel)
            .await;

        let report = ResultAggregator::aggregate(
            &prepared.graph,
            outcome.results,
            RunInfo {
                execution_id,
                workflow_id,
                start_time,
                end_time: Utc::now(),
                cancelled: outcome.cancelled,
            },
        );

        info!(
            %execution_id,
            status = ?report.status,
            completed = report.metrics.completed_nodes,
            failed = report.metrics.failed_nodes,
            skipped = report.metrics.skipped_nodes,
            "execution finished"
        );

        report
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("executor", &self.executor)
            .field("has_store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}
