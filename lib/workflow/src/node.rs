//! Workflow node types.
//!
//! Nodes are the building blocks of workflows. Each node has:
//! - An id, unique within the workflow
//! - A type string selecting the handler that executes it
//! - Opaque layout metadata, ignored by the engine
//! - A `data` object of type-specific parameters
//!
//! The parameters are parsed into a typed struct by the handler that owns
//! the node type (see [`Node::params`]), so a malformed `llm` node fails in
//! the `llm` handler rather than at graph build time.

use crate::error::NodeExecutionError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::borrow::Borrow;
use std::fmt;

/// A node identifier, unique within one workflow.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the id is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The known node categories.
///
/// Anything else is `Other` and runs through the generic handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Passes the workflow input into the graph.
    Input,
    /// Collects upstream results as the workflow's final output.
    Output,
    /// Generates text with a language model.
    Llm,
    /// Performs an HTTP request (`http` or `api`).
    Http,
    /// Runs a database query.
    Database,
    /// Reshapes upstream data.
    Transform,
    /// Filters an upstream array.
    Filter,
    /// User-supplied code.
    Code,
    /// Evaluates a condition.
    Switch,
    /// Iterates over items or while a condition holds.
    Loop,
    /// Produces a vector embedding.
    Embedding,
    /// Unrecognized type, lower-cased.
    Other(String),
}

impl NodeKind {
    /// Classifies a node type string, ignoring case.
    #[must_use]
    pub fn from_type(node_type: &str) -> Self {
        match node_type.to_ascii_lowercase().as_str() {
            "input" => Self::Input,
            "output" => Self::Output,
            "llm" => Self::Llm,
            "http" | "api" => Self::Http,
            "database" => Self::Database,
            "transform" => Self::Transform,
            "filter" => Self::Filter,
            "code" => Self::Code,
            "switch" => Self::Switch,
            "loop" => Self::Loop,
            "embedding" => Self::Embedding,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the canonical type string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Llm => "llm",
            Self::Http => "http",
            Self::Database => "database",
            Self::Transform => "transform",
            Self::Filter => "filter",
            Self::Code => "code",
            Self::Switch => "switch",
            Self::Loop => "loop",
            Self::Embedding => "embedding",
            Self::Other(other) => other,
        }
    }

    /// Returns true if completed nodes of this kind contribute to the
    /// execution report's final output.
    #[must_use]
    pub fn is_output_bearing(&self) -> bool {
        matches!(self, Self::Output | Self::Llm)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A workflow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node within the workflow.
    pub id: NodeId,
    /// Handler key.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Editor layout metadata.
    #[serde(default, skip_serializing_if = "JsonValue::is_null")]
    pub position: JsonValue,
    /// Type-specific parameters.
    #[serde(default)]
    pub data: Map<String, JsonValue>,
}

impl Node {
    /// Creates a node with no parameters.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            position: JsonValue::Null,
            data: Map::new(),
        }
    }

    /// Sets a single parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Returns the node's category.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        NodeKind::from_type(&self.node_type)
    }

    /// Returns the editor label, if one was set.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.data.get("label").and_then(JsonValue::as_str)
    }

    /// Parses the node's parameters into a typed struct.
    ///
    /// A parameter set to `null` counts as absent, so it takes the field's
    /// default.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the parameters do not match `T`.
    pub fn params<T: DeserializeOwned>(&self) -> Result<T, NodeExecutionError> {
        let present: Map<String, JsonValue> = self
            .data
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        serde_json::from_value(JsonValue::Object(present)).map_err(|e| {
            NodeExecutionError::invalid_input(format!(
                "{} node '{}' parameters: {e}",
                self.kind(),
                self.id
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Params {
        url: String,
        #[serde(default)]
        retries: u32,
    }

    #[test]
    fn kind_is_case_insensitive() {
        assert_eq!(NodeKind::from_type("LLM"), NodeKind::Llm);
        assert_eq!(NodeKind::from_type("Api"), NodeKind::Http);
        assert_eq!(
            NodeKind::from_type("Webhook"),
            NodeKind::Other("webhook".to_string())
        );
    }

    #[test]
    fn only_output_and_llm_are_output_bearing() {
        assert!(NodeKind::Output.is_output_bearing());
        assert!(NodeKind::Llm.is_output_bearing());
        assert!(!NodeKind::Input.is_output_bearing());
        assert!(!NodeKind::Other("custom".to_string()).is_output_bearing());
    }

    #[test]
    fn params_parse_typed_struct() {
        let node = Node::new("n1", "http").with_param("url", json!("https://example.com"));
        let params: Params = node.params().unwrap();
        assert_eq!(params.url, "https://example.com");
        assert_eq!(params.retries, 0);
    }

    #[test]
    fn params_report_invalid_input() {
        let node = Node::new("n1", "http").with_param("retries", json!("many"));
        let err = node.params::<Params>().unwrap_err();
        match err {
            NodeExecutionError::InvalidInput { message } => {
                assert!(message.contains("http node 'n1'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn null_params_take_defaults() {
        let node = Node::new("n1", "http")
            .with_param("url", json!("https://example.com"))
            .with_param("retries", JsonValue::Null);
        let params: Params = node.params().unwrap();
        assert_eq!(params.retries, 0);
    }

    #[test]
    fn null_required_param_is_missing() {
        let node = Node::new("n1", "http").with_param("url", JsonValue::Null);
        let err = node.params::<Params>().unwrap_err();
        assert!(err.to_string().contains("missing field `url`"));
    }

    #[test]
    fn node_deserializes_editor_json() {
        let node: Node = serde_json::from_value(json!({
            "id": "llm-1",
            "type": "llm",
            "position": {"x": 10.0, "y": 20.0},
            "data": {"label": "Summarize", "model": "gpt-4o"}
        }))
        .unwrap();

        assert_eq!(node.id.as_str(), "llm-1");
        assert_eq!(node.kind(), NodeKind::Llm);
        assert_eq!(node.label(), Some("Summarize"));
    }
}
