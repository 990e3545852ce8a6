//! Fallback for node types with no registered handler.

use crate::context::MergedInput;
use crate::error::NodeExecutionError;
use crate::handler::NodeHandler;
use crate::node::Node;
use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};

/// Reports which node type it processed.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericHandler;

#[async_trait]
impl NodeHandler for GenericHandler {
    async fn handle(
        &self,
        node: &Node,
        _input: &MergedInput,
    ) -> Result<JsonValue, NodeExecutionError> {
        Ok(json!({
            "processed": format!("Data processed by {} node", node.kind()),
        }))
    }
}
