//! Control nodes: `switch` and `loop`.
//!
//! Conditions are JSON pointers into the merged input. A condition that
//! does not resolve evaluates as false.

use super::{is_truthy, resolve};
use crate::context::MergedInput;
use crate::error::NodeExecutionError;
use crate::handler::NodeHandler;
use crate::node::Node;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

fn evaluate(document: &JsonValue, pointer: &str) -> bool {
    document.pointer(pointer).is_some_and(is_truthy)
}

#[derive(Debug, Deserialize)]
struct SwitchParams {
    condition: String,
}

/// Evaluates a condition and reports the branch taken.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchHandler;

#[async_trait]
impl NodeHandler for SwitchHandler {
    async fn handle(
        &self,
        node: &Node,
        input: &MergedInput,
    ) -> Result<JsonValue, NodeExecutionError> {
        let params: SwitchParams = node.params()?;
        let evaluated = evaluate(&input.to_json(), &params.condition);
        let branch = if evaluated { "true" } else { "false" };
        Ok(json!({
            "condition": params.condition,
            "evaluated": evaluated,
            "branch": branch,
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoopParams {
    #[serde(default = "default_loop_type")]
    loop_type: String,
    #[serde(default)]
    items: Option<String>,
    #[serde(default)]
    while_condition: Option<String>,
    #[serde(default = "default_max_iterations")]
    max_iterations: u64,
}

fn default_loop_type() -> String {
    "foreach".to_string()
}

fn default_max_iterations() -> u64 {
    1
}

/// Counts the iterations a loop would make.
///
/// `foreach` iterates the array at `items` (the top-level input when no
/// pointer is given). `while` iterates `maxIterations` times if its
/// condition holds, otherwise not at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopHandler;

#[async_trait]
impl NodeHandler for LoopHandler {
    async fn handle(
        &self,
        node: &Node,
        input: &MergedInput,
    ) -> Result<JsonValue, NodeExecutionError> {
        let params: LoopParams = node.params()?;
        let document = input.to_json();

        match params.loop_type.as_str() {
            "foreach" => {
                let items = match &params.items {
                    Some(pointer) => resolve(&document, pointer)?,
                    None => &input.input,
                };
                let Some(items) = items.as_array() else {
                    return Err(NodeExecutionError::handler("foreach items are not an array"));
                };
                Ok(json!({
                    "type": "foreach",
                    "iterations": items.len(),
                    "completed": true,
                    "itemsProcessed": items.len(),
                }))
            }
            "while" => {
                let condition = params.while_condition.unwrap_or_default();
                let iterations = if evaluate(&document, &condition) {
                    params.max_iterations
                } else {
                    0
                };
                Ok(json!({
                    "type": "while",
                    "condition": condition,
                    "iterations": iterations,
                    "completed": true,
                }))
            }
            other => Err(NodeExecutionError::invalid_input(format!(
                "unknown loop type '{other}'"
            ))),
        }
    }
}
