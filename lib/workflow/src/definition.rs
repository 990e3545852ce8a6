//! Workflow definition types and the store the engine loads them from.
//!
//! A workflow definition is a named, versioned graph:
//! - Metadata (name, description, version, timestamps, author)
//! - The raw nodes and edges, validated only when executed
//!
//! The engine only ever reads definitions. Creating, updating and deleting
//! them belongs to whoever owns the store.

use crate::edge::Edge;
use crate::error::StoreError;
use crate::graph::GraphDefinition;
use crate::node::Node;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowline_core::WorkflowId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Metadata for a workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMetadata {
    /// Human-readable name for this workflow.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Definition version. Cached plans are keyed by it.
    #[serde(default = "default_version")]
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

fn default_version() -> String {
    "1".to_string()
}

impl WorkflowMetadata {
    /// Creates new metadata with default values.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: None,
            version: default_version(),
            created_at: now,
            updated_at: now,
            created_by: None,
        }
    }

    /// Sets the version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

/// A complete workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique identifier for this workflow.
    pub id: WorkflowId,
    /// Workflow metadata.
    pub metadata: WorkflowMetadata,
    /// The nodes and edges.
    #[serde(flatten)]
    pub graph: GraphDefinition,
}

impl Workflow {
    /// Creates an empty workflow with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(WorkflowId::new(), name)
    }

    /// Creates an empty workflow with a specific ID.
    #[must_use]
    pub fn with_id(id: WorkflowId, name: impl Into<String>) -> Self {
        Self {
            id,
            metadata: WorkflowMetadata::new(name),
            graph: GraphDefinition::default(),
        }
    }

    /// Replaces the nodes and edges.
    #[must_use]
    pub fn with_graph(mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        self.graph = GraphDefinition::new(nodes, edges);
        self
    }

    /// Returns the workflow name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Returns the definition version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.metadata.version
    }
}

/// Trait for loading workflow definitions.
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    /// Loads the definition with the given id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such definition exists.
    async fn load(&self, workflow_id: WorkflowId) -> Result<Workflow, StoreError>;
}

/// A definition store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDefinitionStore {
    workflows: RwLock<HashMap<WorkflowId, Workflow>>,
}

impl InMemoryDefinitionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a definition, returning the one it replaced.
    pub async fn insert(&self, workflow: Workflow) -> Option<Workflow> {
        self.workflows.write().await.insert(workflow.id, workflow)
    }

    /// Removes a definition.
    pub async fn remove(&self, workflow_id: WorkflowId) -> Option<Workflow> {
        self.workflows.write().await.remove(&workflow_id)
    }

    /// Returns the number of stored definitions.
    pub async fn len(&self) -> usize {
        self.workflows.read().await.len()
    }

    /// Returns true if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.workflows.read().await.is_empty()
    }
}

#[async_trait]
impl DefinitionStore for InMemoryDefinitionStore {
    async fn load(&self, workflow_id: WorkflowId) -> Result<Workflow, StoreError> {
        self.workflows
            .read()
            .await
            .get(&workflow_id)
            .cloned()
            .ok_or(StoreError::NotFound { workflow_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn workflow_json_is_flat() {
        let workflow = Workflow::new("Summarize")
            .with_graph(vec![Node::new("in", "input")], vec![]);
        let json = serde_json::to_value(&workflow).unwrap();

        assert_eq!(json["metadata"]["name"], "Summarize");
        assert_eq!(json["metadata"]["version"], "1");
        assert!(json["metadata"].get("createdAt").is_some());
        assert_eq!(json["nodes"][0]["id"], "in");
        assert_eq!(json["edges"], json!([]));

        let parsed: Workflow = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, workflow);
    }

    #[test]
    fn metadata_version_is_settable() {
        let mut workflow = Workflow::new("w");
        assert_eq!(workflow.version(), "1");

        workflow.metadata = workflow.metadata.with_version("7");
        assert_eq!(workflow.version(), "7");
        assert_eq!(workflow.name(), "w");
    }

    #[tokio::test]
    async fn store_insert_load_remove() {
        let store = InMemoryDefinitionStore::new();
        let workflow = Workflow::new("w");
        let id = workflow.id;

        assert!(store.insert(workflow.clone()).await.is_none());
        assert_eq!(store.load(id).await.unwrap(), workflow);
        assert_eq!(store.len().await, 1);

        store.remove(id).await;
        assert_eq!(
            store.load(id).await.unwrap_err(),
            StoreError::NotFound { workflow_id: id }
        );
        assert!(store.is_empty().await);
    }
}
