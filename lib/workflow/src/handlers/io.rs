//! Input and output nodes.

use crate::context::MergedInput;
use crate::error::NodeExecutionError;
use crate::handler::NodeHandler;
use crate::node::Node;
use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};

/// Passes the top-level input into the graph as `{"data": input}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputHandler;

#[async_trait]
impl NodeHandler for InputHandler {
    async fn handle(
        &self,
        _node: &Node,
        input: &MergedInput,
    ) -> Result<JsonValue, NodeExecutionError> {
        Ok(json!({ "data": input.input }))
    }
}

/// Collects upstream outputs as `{"result": ...}`.
///
/// An output node with no completed predecessor reports the top-level input.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputHandler;

#[async_trait]
impl NodeHandler for OutputHandler {
    async fn handle(
        &self,
        _node: &Node,
        input: &MergedInput,
    ) -> Result<JsonValue, NodeExecutionError> {
        let result = if input.is_source() {
            input.input.clone()
        } else {
            input.upstream_json()
        };
        Ok(json!({ "result": result }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn input_wraps_top_level_input() {
        let output = InputHandler
            .handle(&Node::new("in", "input"), &MergedInput::from_input(json!({"q": "hi"})))
            .await
            .unwrap();
        assert_eq!(output, json!({"data": {"q": "hi"}}));
    }

    #[tokio::test]
    async fn output_collects_upstream() {
        let input = MergedInput::from_input(json!("ignored")).with_upstream("llm", json!({"text": "t"}));
        let output = OutputHandler
            .handle(&Node::new("out", "output"), &input)
            .await
            .unwrap();
        assert_eq!(output, json!({"result": {"llm": {"text": "t"}}}));
    }

    #[tokio::test]
    async fn lone_output_reports_input() {
        let output = OutputHandler
            .handle(&Node::new("out", "output"), &MergedInput::from_input(json!(7)))
            .await
            .unwrap();
        assert_eq!(output, json!({"result": 7}));
    }
}
