//! Per-run execution state.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// The data a handler receives.
///
/// For a node with no incoming edges `upstream` is empty and the handler
/// sees exactly the top-level input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedInput {
    /// The run's top-level input.
    pub input: JsonValue,
    /// Outputs of completed predecessors, keyed by predecessor id.
    #[serde(default)]
    pub upstream: BTreeMap<NodeId, JsonValue>,
}

impl MergedInput {
    /// Creates a merged input with no upstream outputs.
    #[must_use]
    pub fn from_input(input: JsonValue) -> Self {
        Self {
            input,
            upstream: BTreeMap::new(),
        }
    }

    /// Adds one predecessor's output.
    #[must_use]
    pub fn with_upstream(mut self, node_id: impl Into<NodeId>, output: JsonValue) -> Self {
        self.upstream.insert(node_id.into(), output);
        self
    }

    /// Returns true if no predecessor output was merged in.
    #[must_use]
    pub fn is_source(&self) -> bool {
        self.upstream.is_empty()
    }

    /// Returns the output of one predecessor.
    #[must_use]
    pub fn upstream_output(&self, node_id: &str) -> Option<&JsonValue> {
        self.upstream.get(node_id)
    }

    /// Returns the upstream outputs as a JSON object.
    #[must_use]
    pub fn upstream_json(&self) -> JsonValue {
        JsonValue::Object(
            self.upstream
                .iter()
                .map(|(id, output)| (id.to_string(), output.clone()))
                .collect::<Map<String, JsonValue>>(),
        )
    }

    /// Returns the document JSON pointers resolve against:
    /// `{"input": ..., "upstream": {...}}`.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut doc = Map::new();
        doc.insert("input".to_string(), self.input.clone());
        doc.insert("upstream".to_string(), self.upstream_json());
        JsonValue::Object(doc)
    }
}

/// Outputs accumulated over one run.
///
/// Written only by the executor, between levels.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    input: JsonValue,
    node_outputs: BTreeMap<NodeId, JsonValue>,
}

impl ExecutionContext {
    /// Creates a context for a run with the given top-level input.
    #[must_use]
    pub fn new(input: JsonValue) -> Self {
        Self {
            input,
            node_outputs: BTreeMap::new(),
        }
    }

    /// Records a completed node's output.
    pub fn record_output(&mut self, node_id: NodeId, output: JsonValue) {
        self.node_outputs.insert(node_id, output);
    }

    /// Builds the merged input for a node from the given predecessors.
    ///
    /// Predecessors with no recorded output are left out.
    pub fn merged_input<'a>(&self, predecessors: impl IntoIterator<Item = &'a NodeId>) -> MergedInput {
        let upstream = predecessors
            .into_iter()
            .filter_map(|id| Some((id.clone(), self.node_outputs.get(id)?.clone())))
            .collect();
        MergedInput {
            input: self.input.clone(),
            upstream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merged_input_skips_missing_outputs() {
        let mut ctx = ExecutionContext::new(json!({"q": 1}));
        ctx.record_output(NodeId::from("a"), json!("A"));

        let preds = [NodeId::from("a"), NodeId::from("failed")];
        let merged = ctx.merged_input(&preds);

        assert_eq!(merged.upstream.len(), 1);
        assert_eq!(merged.upstream_output("a"), Some(&json!("A")));
        assert_eq!(merged.input, json!({"q": 1}));
    }

    #[test]
    fn source_sees_only_input() {
        let ctx = ExecutionContext::new(json!({"q": 1}));
        let preds: [NodeId; 0] = [];
        let merged = ctx.merged_input(&preds);
        assert!(merged.is_source());
        assert_eq!(merged, MergedInput::from_input(json!({"q": 1})));
    }

    #[test]
    fn to_json_shape() {
        let merged = MergedInput::from_input(json!(5)).with_upstream("a", json!({"x": 1}));
        assert_eq!(
            merged.to_json(),
            json!({"input": 5, "upstream": {"a": {"x": 1}}})
        );
        assert_eq!(merged.to_json().pointer("/upstream/a/x"), Some(&json!(1)));
    }
}
