//! Embedding nodes.

use crate::context::MergedInput;
use crate::error::NodeExecutionError;
use crate::handler::NodeHandler;
use crate::node::Node;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

#[derive(Debug, Deserialize)]
struct EmbeddingParams {
    #[serde(default = "default_model")]
    model: String,
    #[serde(default)]
    text: Option<String>,
}

fn default_model() -> String {
    "text-embedding-ada-002".to_string()
}

/// Reports the embedding a model would produce.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddingHandler;

impl EmbeddingHandler {
    fn dimensions(model: &str) -> u32 {
        if model.contains("small") {
            768
        } else if model.contains("large") {
            1536
        } else {
            1024
        }
    }
}

#[async_trait]
impl NodeHandler for EmbeddingHandler {
    async fn handle(
        &self,
        node: &Node,
        _input: &MergedInput,
    ) -> Result<JsonValue, NodeExecutionError> {
        let params: EmbeddingParams = node.params()?;
        let mut output = json!({
            "model": params.model,
            "dimensions": Self::dimensions(&params.model),
            "normalized": true,
        });
        if let Some(text) = params.text {
            output["textLength"] = json!(text.chars().count());
        }
        Ok(output)
    }
}
