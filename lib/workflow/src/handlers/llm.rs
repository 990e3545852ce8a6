//! Language model nodes.

use crate::context::MergedInput;
use crate::error::NodeExecutionError;
use crate::handler::NodeHandler;
use crate::node::Node;
use async_trait::async_trait;
use flowline_providers::{ModelParams, TextGenerator};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmParams {
    #[serde(default = "default_model")]
    model: String,
    #[serde(default = "default_prompt")]
    prompt: String,
    #[serde(default = "default_temperature")]
    temperature: f64,
    #[serde(default)]
    max_tokens: Option<u32>,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_prompt() -> String {
    "Default system prompt".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

/// Generates text through a [`TextGenerator`].
pub struct LlmHandler {
    generator: Arc<dyn TextGenerator>,
}

impl LlmHandler {
    /// Creates a handler backed by the given generator.
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl NodeHandler for LlmHandler {
    async fn handle(
        &self,
        node: &Node,
        _input: &MergedInput,
    ) -> Result<JsonValue, NodeExecutionError> {
        let params: LlmParams = node.params()?;

        let mut model_params = ModelParams::new(&params.model).with_temperature(params.temperature);
        if let Some(max_tokens) = params.max_tokens {
            model_params = model_params.with_max_tokens(max_tokens);
        }

        debug!(node_id = %node.id, model = %params.model, "generating text");

        let generated = self
            .generator
            .generate_text(&params.prompt, &model_params)
            .await
            .map_err(|error| NodeExecutionError::Provider {
                service: "text".to_string(),
                error,
            })?;

        Ok(json!({
            "text": generated.text,
            "model": generated.model,
            "settings": {
                "temperature": params.temperature,
                "promptLength": params.prompt.chars().count(),
            },
            "usage": generated.usage,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowline_providers::SimulatedTextGenerator;

    fn handler() -> LlmHandler {
        LlmHandler::new(Arc::new(SimulatedTextGenerator))
    }

    #[tokio::test]
    async fn defaults_apply() {
        let output = handler()
            .handle(&Node::new("llm", "llm"), &MergedInput::default())
            .await
            .unwrap();

        assert_eq!(output["model"], "gpt-4o-mini");
        assert_eq!(output["settings"]["temperature"], 0.7);
        assert_eq!(output["settings"]["promptLength"], 21);
        assert_eq!(output["usage"]["promptTokens"], 5);
        assert!(
            output["text"]
                .as_str()
                .unwrap()
                .contains("Based on prompt: Default system prompt")
        );
    }

    #[tokio::test]
    async fn null_params_fall_back_to_defaults() {
        let node = Node::new("llm", "llm")
            .with_param("model", JsonValue::Null)
            .with_param("prompt", JsonValue::Null)
            .with_param("temperature", JsonValue::Null)
            .with_param("maxTokens", JsonValue::Null);
        let output = handler().handle(&node, &MergedInput::default()).await.unwrap();

        assert_eq!(output["model"], "gpt-4o-mini");
        assert_eq!(output["settings"]["temperature"], 0.7);
        assert_eq!(output["settings"]["promptLength"], 21);
    }

    #[tokio::test]
    async fn configured_model_and_prompt() {
        let node = Node::new("llm", "llm")
            .with_param("model", json!("gemini-pro"))
            .with_param("prompt", json!("Classify this"))
            .with_param("temperature", json!(0.2));
        let output = handler().handle(&node, &MergedInput::default()).await.unwrap();

        let text = output["text"].as_str().unwrap();
        assert!(text.starts_with("[gemini-pro]"));
        assert!(text.contains("comprehensive and analytical"));
        assert!(text.contains("very consistent and conservative"));
    }

    #[tokio::test]
    async fn provider_rejection_is_a_node_error() {
        let node = Node::new("llm", "llm").with_param("temperature", json!(9.0));
        let err = handler().handle(&node, &MergedInput::default()).await.unwrap_err();
        assert!(matches!(err, NodeExecutionError::Provider { .. }));
    }

    #[tokio::test]
    async fn malformed_params_are_invalid_input() {
        let node = Node::new("llm", "llm").with_param("temperature", json!("hot"));
        let err = handler().handle(&node, &MergedInput::default()).await.unwrap_err();
        assert!(matches!(err, NodeExecutionError::InvalidInput { .. }));
    }
}
