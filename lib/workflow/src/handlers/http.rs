//! HTTP nodes (`http` and its alias `api`).

use crate::context::MergedInput;
use crate::error::NodeExecutionError;
use crate::handler::NodeHandler;
use crate::node::Node;
use async_trait::async_trait;
use flowline_providers::{HttpRequest, HttpRequester};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct HttpParams {
    url: String,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    body: Option<JsonValue>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Performs a request through an [`HttpRequester`].
///
/// Responses with a status of 400 or above fail the node.
pub struct HttpHandler {
    requester: Arc<dyn HttpRequester>,
}

impl HttpHandler {
    /// Creates a handler backed by the given requester.
    #[must_use]
    pub fn new(requester: Arc<dyn HttpRequester>) -> Self {
        Self { requester }
    }
}

#[async_trait]
impl NodeHandler for HttpHandler {
    async fn handle(
        &self,
        node: &Node,
        _input: &MergedInput,
    ) -> Result<JsonValue, NodeExecutionError> {
        let params: HttpParams = node.params()?;

        let mut request = HttpRequest::new(params.method, params.url);
        for (name, value) in params.headers {
            request = request.with_header(name, value);
        }
        if let Some(body) = params.body {
            request = request.with_body(body);
        }

        debug!(node_id = %node.id, method = %request.method, url = %request.url, "performing request");

        let response = self
            .requester
            .perform_request(&request)
            .await
            .map_err(|error| NodeExecutionError::Provider {
                service: "http".to_string(),
                error,
            })?;

        if !response.is_success() {
            return Err(NodeExecutionError::handler(format!(
                "{} {} returned status {}",
                request.method, request.url, response.status
            )));
        }

        Ok(json!({
            "request": request,
            "response": response,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowline_providers::{HttpResponse, SimulatedHttpRequester};

    #[tokio::test]
    async fn performs_request_with_defaults() {
        let handler = HttpHandler::new(Arc::new(SimulatedHttpRequester::new()));
        let node = Node::new("fetch", "api").with_param("url", json!("https://api.example.com/v1/items"));

        let output = handler.handle(&node, &MergedInput::default()).await.unwrap();

        assert_eq!(output["request"]["method"], "GET");
        assert_eq!(output["response"]["status"], 200);
        assert_eq!(
            output["response"]["data"]["message"],
            "Simulated GET response from api.example.com"
        );
        assert_eq!(output["response"]["headers"]["content-type"], "application/json");
    }

    #[tokio::test]
    async fn null_method_and_headers_use_defaults() {
        let handler = HttpHandler::new(Arc::new(SimulatedHttpRequester::new()));
        let node = Node::new("fetch", "http")
            .with_param("url", json!("https://api.example.com/v1"))
            .with_param("method", JsonValue::Null)
            .with_param("headers", JsonValue::Null)
            .with_param("body", JsonValue::Null);

        let output = handler.handle(&node, &MergedInput::default()).await.unwrap();

        assert_eq!(output["request"]["method"], "GET");
        assert_eq!(output["request"]["headers"], json!({}));
        assert!(output["request"].get("body").is_none());
    }

    #[tokio::test]
    async fn headers_and_body_are_forwarded() {
        let handler = HttpHandler::new(Arc::new(SimulatedHttpRequester::new()));
        let node = Node::new("push", "http")
            .with_param("url", json!("https://api.example.com/items"))
            .with_param("method", json!("post"))
            .with_param("headers", json!({"x-trace": "abc"}))
            .with_param("body", json!({"name": "widget"}));

        let output = handler.handle(&node, &MergedInput::default()).await.unwrap();

        assert_eq!(output["request"]["headers"]["x-trace"], "abc");
        assert_eq!(output["request"]["body"], json!({"name": "widget"}));
    }

    #[tokio::test]
    async fn error_status_fails_node() {
        let requester = SimulatedHttpRequester::new().with_response(
            "https://example.com/gone",
            HttpResponse::with_status(410, json!({})),
        );
        let handler = HttpHandler::new(Arc::new(requester));
        let node = Node::new("fetch", "http")
            .with_param("url", json!("https://example.com/gone"))
            .with_param("method", json!("delete"));

        let err = handler.handle(&node, &MergedInput::default()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "HandlerError: DELETE https://example.com/gone returned status 410"
        );
    }

    #[tokio::test]
    async fn missing_url_is_invalid_input() {
        let handler = HttpHandler::new(Arc::new(SimulatedHttpRequester::new()));
        let err = handler
            .handle(&Node::new("fetch", "http"), &MergedInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NodeExecutionError::InvalidInput { .. }));
    }
}
