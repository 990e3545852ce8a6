//! Edge types for workflow graphs.
//!
//! An edge is a directed data dependency: the target node receives the
//! source node's output. Handles name sub-ports on either end; an absent
//! handle means the default port.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Edge identifier.
    pub id: String,
    /// The upstream node.
    pub source: NodeId,
    /// The downstream node.
    pub target: NodeId,
    /// Output port on the source node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// Input port on the target node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Edge {
    /// Creates an edge between the default ports of two nodes.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    /// Creates an edge whose id is derived from its endpoints.
    #[must_use]
    pub fn between(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        let source = source.into();
        let target = target.into();
        Self::new(format!("{source}->{target}"), source, target)
    }

    /// Sets the source handle.
    #[must_use]
    pub fn with_source_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    /// Sets the target handle.
    #[must_use]
    pub fn with_target_handle(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }

    /// Returns true if both ends use the default port.
    #[must_use]
    pub fn uses_default_ports(&self) -> bool {
        self.source_handle.is_none() && self.target_handle.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn between_derives_id() {
        let edge = Edge::between("a", "b");
        assert_eq!(edge.id, "a->b");
        assert!(edge.uses_default_ports());
    }

    #[test]
    fn handles_use_camel_case_on_the_wire() {
        let edge: Edge = serde_json::from_value(json!({
            "id": "e1",
            "source": "switch",
            "target": "yes",
            "sourceHandle": "true"
        }))
        .unwrap();

        assert_eq!(edge.source_handle.as_deref(), Some("true"));
        assert_eq!(edge.target_handle, None);
        assert!(!edge.uses_default_ports());

        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["sourceHandle"], "true");
        assert!(json.get("targetHandle").is_none());
    }
}
