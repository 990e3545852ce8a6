//! Data shaping nodes: `transform`, `filter` and `code`.

use super::{is_truthy, preview, resolve};
use crate::context::MergedInput;
use crate::error::NodeExecutionError;
use crate::handler::NodeHandler;
use crate::node::Node;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue, json};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransformParams {
    #[serde(default)]
    mapping: Option<BTreeMap<String, String>>,
    #[serde(default)]
    transform_code: Option<String>,
}

/// Builds a new object from JSON pointers into the merged input.
///
/// Without a mapping the node passes its upstream outputs through (or the
/// top-level input for a source node).
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformHandler;

#[async_trait]
impl NodeHandler for TransformHandler {
    async fn handle(
        &self,
        node: &Node,
        input: &MergedInput,
    ) -> Result<JsonValue, NodeExecutionError> {
        let params: TransformParams = node.params()?;

        let transformed = match params.mapping {
            Some(mapping) => {
                let document = input.to_json();
                let mut object = Map::with_capacity(mapping.len());
                for (key, pointer) in mapping {
                    object.insert(key, resolve(&document, &pointer)?.clone());
                }
                JsonValue::Object(object)
            }
            None if input.is_source() => input.input.clone(),
            None => input.upstream_json(),
        };

        let mut output = Map::new();
        output.insert("transformedData".to_string(), transformed);
        if let Some(code) = params.transform_code {
            output.insert("code".to_string(), JsonValue::String(preview(&code)));
        }
        Ok(JsonValue::Object(output))
    }
}

#[derive(Debug, Deserialize)]
struct FilterParams {
    items: String,
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    equals: Option<JsonValue>,
}

/// Keeps the items of an array that match a condition.
///
/// An item matches when its `field` (or the item itself) equals `equals`,
/// or is truthy when no `equals` is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterHandler;

impl FilterHandler {
    fn matches(item: &JsonValue, field: Option<&str>, equals: Option<&JsonValue>) -> bool {
        let value = match field {
            Some(field) => item.get(field).unwrap_or(&JsonValue::Null),
            None => item,
        };
        match equals {
            Some(expected) => value == expected,
            None => is_truthy(value),
        }
    }
}

#[async_trait]
impl NodeHandler for FilterHandler {
    async fn handle(
        &self,
        node: &Node,
        input: &MergedInput,
    ) -> Result<JsonValue, NodeExecutionError> {
        let params: FilterParams = node.params()?;

        let document = input.to_json();
        let Some(items) = resolve(&document, &params.items)?.as_array() else {
            return Err(NodeExecutionError::handler(format!(
                "filter target '{}' is not an array",
                params.items
            )));
        };

        let total = items.len();
        let passed: Vec<&JsonValue> = items
            .iter()
            .filter(|item| Self::matches(item, params.field.as_deref(), params.equals.as_ref()))
            .collect();

        Ok(json!({
            "filter": {
                "totalItems": total,
                "passedItems": passed.len(),
                "filteredItems": total - passed.len(),
            },
            "items": passed,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct CodeParams {
    #[serde(default = "default_code")]
    code: String,
    #[serde(default = "default_language")]
    language: String,
}

fn default_code() -> String {
    "// Custom code here".to_string()
}

fn default_language() -> String {
    "javascript".to_string()
}

/// Describes user code without running it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeHandler;

#[async_trait]
impl NodeHandler for CodeHandler {
    async fn handle(
        &self,
        node: &Node,
        _input: &MergedInput,
    ) -> Result<JsonValue, NodeExecutionError> {
        let params: CodeParams = node.params()?;
        Ok(json!({
            "execution": {
                "code": preview(&params.code),
                "language": params.language,
                "result": "not executed: no code runtime configured",
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream() -> MergedInput {
        MergedInput::from_input(json!({"user": "ada"})).with_upstream(
            "fetch",
            json!({"items": [
                {"name": "a", "active": true},
                {"name": "b", "active": false},
                {"name": "c", "active": true},
            ]}),
        )
    }

    #[tokio::test]
    async fn transform_resolves_mapping() {
        let node = Node::new("t", "transform").with_param(
            "mapping",
            json!({"who": "/input/user", "first": "/upstream/fetch/items/0/name"}),
        );
        let output = TransformHandler.handle(&node, &upstream()).await.unwrap();
        assert_eq!(output, json!({"transformedData": {"who": "ada", "first": "a"}}));
    }

    #[tokio::test]
    async fn transform_fails_on_unresolved_pointer() {
        let node = Node::new("t", "transform").with_param("mapping", json!({"x": "/upstream/missing"}));
        let err = TransformHandler.handle(&node, &upstream()).await.unwrap_err();
        assert!(matches!(err, NodeExecutionError::HandlerError { .. }));
    }

    #[tokio::test]
    async fn transform_without_mapping_passes_through() {
        let node = Node::new("t", "transform").with_param("transformCode", json!("x => x"));
        let output = TransformHandler
            .handle(&node, &MergedInput::from_input(json!([1, 2])))
            .await
            .unwrap();
        assert_eq!(output, json!({"transformedData": [1, 2], "code": "x => x"}));
    }

    #[tokio::test]
    async fn filter_by_truthy_field() {
        let node = Node::new("f", "filter")
            .with_param("items", json!("/upstream/fetch/items"))
            .with_param("field", json!("active"));
        let output = FilterHandler.handle(&node, &upstream()).await.unwrap();

        assert_eq!(
            output["filter"],
            json!({"totalItems": 3, "passedItems": 2, "filteredItems": 1})
        );
        assert_eq!(output["items"][1]["name"], "c");
    }

    #[tokio::test]
    async fn filter_by_equality() {
        let node = Node::new("f", "filter")
            .with_param("items", json!("/upstream/fetch/items"))
            .with_param("field", json!("name"))
            .with_param("equals", json!("b"));
        let output = FilterHandler.handle(&node, &upstream()).await.unwrap();
        assert_eq!(output["filter"]["passedItems"], 1);
    }

    #[tokio::test]
    async fn filter_rejects_non_array() {
        let node = Node::new("f", "filter").with_param("items", json!("/input/user"));
        let err = FilterHandler.handle(&node, &upstream()).await.unwrap_err();
        assert_eq!(err.to_string(), "HandlerError: filter target '/input/user' is not an array");
    }

    #[tokio::test]
    async fn code_null_params_use_defaults() {
        let node = Node::new("c", "code")
            .with_param("code", JsonValue::Null)
            .with_param("language", JsonValue::Null);
        let output = CodeHandler.handle(&node, &MergedInput::default()).await.unwrap();

        assert_eq!(output["execution"]["code"], "// Custom code here");
        assert_eq!(output["execution"]["language"], "javascript");
    }

    #[tokio::test]
    async fn code_is_described_not_run() {
        let code = "function main(input) { return input.items.map(i => i.name); }";
        let node = Node::new("c", "code").with_param("code", json!(code));
        let output = CodeHandler.handle(&node, &MergedInput::default()).await.unwrap();

        assert_eq!(output["execution"]["language"], "javascript");
        assert_eq!(
            output["execution"]["code"],
            format!("{}...", &code[..50])
        );
        assert_eq!(
            output["execution"]["result"],
            "not executed: no code runtime configured"
        );
    }
}
