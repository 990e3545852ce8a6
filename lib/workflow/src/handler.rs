//! Node handlers and the registry that resolves them.
//!
//! A handler executes one node type. The registry maps type strings to
//! handlers, case-insensitively, and falls back to the generic handler for
//! types it does not know, so an unrecognized node type never fails a run.
//!
//! Handlers that reach external services are constructed with explicit
//! [`Capabilities`]; nothing is looked up from global state.

use crate::context::MergedInput;
use crate::error::NodeExecutionError;
use crate::handlers::{
    CodeHandler, DatabaseHandler, EmbeddingHandler, FilterHandler, GenericHandler, HttpHandler,
    InputHandler, LlmHandler, LoopHandler, OutputHandler, SwitchHandler, TransformHandler,
};
use crate::node::Node;
use async_trait::async_trait;
use flowline_providers::{
    HttpRequester, QueryRunner, SimulatedHttpRequester, SimulatedQueryRunner,
    SimulatedTextGenerator, TextGenerator,
};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Trait for executing one node type.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    /// Executes a node with the given merged input.
    ///
    /// # Errors
    ///
    /// Returns an error if the node's parameters are invalid or the work
    /// itself fails. The error is recorded in the node's result.
    async fn handle(&self, node: &Node, input: &MergedInput)
    -> Result<JsonValue, NodeExecutionError>;
}

/// External services available to handlers.
#[derive(Clone)]
pub struct Capabilities {
    /// Text generation for `llm` nodes.
    pub text: Arc<dyn TextGenerator>,
    /// HTTP client for `http` nodes.
    pub http: Arc<dyn HttpRequester>,
    /// Query runner for `database` nodes.
    pub query: Arc<dyn QueryRunner>,
}

impl Capabilities {
    /// Wires the deterministic simulated providers.
    #[must_use]
    pub fn simulated() -> Self {
        Self {
            text: Arc::new(SimulatedTextGenerator),
            http: Arc::new(SimulatedHttpRequester::new()),
            query: Arc::new(SimulatedQueryRunner::default()),
        }
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}

/// Maps node types to handlers.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn NodeHandler>>,
    fallback: Arc<dyn NodeHandler>,
}

impl HandlerRegistry {
    /// Creates a registry with no registered types.
    ///
    /// Every type resolves to the generic handler until registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Arc::new(GenericHandler),
        }
    }

    /// Creates a registry with all built-in node types registered.
    #[must_use]
    pub fn builtin(capabilities: Capabilities) -> Self {
        let http: Arc<dyn NodeHandler> = Arc::new(HttpHandler::new(capabilities.http));

        let mut registry = Self::new();
        registry.register("input", Arc::new(InputHandler));
        registry.register("output", Arc::new(OutputHandler));
        registry.register("llm", Arc::new(LlmHandler::new(capabilities.text)));
        registry.register("http", Arc::clone(&http));
        registry.register("api", http);
        registry.register("database", Arc::new(DatabaseHandler::new(capabilities.query)));
        registry.register("transform", Arc::new(TransformHandler));
        registry.register("filter", Arc::new(FilterHandler));
        registry.register("code", Arc::new(CodeHandler));
        registry.register("switch", Arc::new(SwitchHandler));
        registry.register("loop", Arc::new(LoopHandler));
        registry.register("embedding", Arc::new(EmbeddingHandler));
        registry
    }

    /// Registers a handler for a node type, replacing any previous one.
    pub fn register(&mut self, node_type: &str, handler: Arc<dyn NodeHandler>) {
        self.handlers.insert(node_type.to_ascii_lowercase(), handler);
    }

    /// Returns a copy of the registry with one more handler registered.
    #[must_use]
    pub fn with_handler(mut self, node_type: &str, handler: Arc<dyn NodeHandler>) -> Self {
        self.register(node_type, handler);
        self
    }

    /// Returns the handler for a node type.
    ///
    /// Unknown types resolve to the generic handler.
    #[must_use]
    pub fn resolve(&self, node_type: &str) -> Arc<dyn NodeHandler> {
        self.handlers
            .get(&node_type.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    /// Returns true if a handler is registered for this type.
    #[must_use]
    pub fn is_registered(&self, node_type: &str) -> bool {
        self.handlers.contains_key(&node_type.to_ascii_lowercase())
    }

    /// Returns the registered node types, sorted.
    #[must_use]
    pub fn registered_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("types", &self.registered_types())
            .finish_non_exhaustive()
    }
}

/// A handler that returns its merged input as JSON (for testing).
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

#[async_trait]
impl NodeHandler for EchoHandler {
    async fn handle(
        &self,
        _node: &Node,
        input: &MergedInput,
    ) -> Result<JsonValue, NodeExecutionError> {
        Ok(input.to_json())
    }
}

/// A handler that always succeeds or always fails, counting its calls.
#[derive(Debug, Default)]
pub struct StaticHandler {
    /// If set, every call fails with this error.
    pub fail_with: Option<NodeExecutionError>,
    /// The output returned on success.
    pub output: JsonValue,
    calls: AtomicUsize,
}

impl StaticHandler {
    /// Creates a handler that succeeds with the given output.
    #[must_use]
    pub fn succeeding(output: JsonValue) -> Self {
        Self {
            fail_with: None,
            output,
            calls: AtomicUsize::new(0),
        }
    }

    /// Creates a handler that fails with the given error.
    #[must_use]
    pub fn failing(error: NodeExecutionError) -> Self {
        Self {
            fail_with: Some(error),
            output: JsonValue::Null,
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns how many times the handler ran.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeHandler for StaticHandler {
    async fn handle(
        &self,
        _node: &Node,
        _input: &MergedInput,
    ) -> Result<JsonValue, NodeExecutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(self.output.clone()),
        }
    }
}

/// A handler that sleeps before succeeding (for timeout and cancellation tests).
#[derive(Debug, Clone)]
pub struct SlowHandler {
    /// How long each call takes.
    pub delay: Duration,
    /// The output returned after the delay.
    pub output: JsonValue,
}

impl SlowHandler {
    /// Creates a handler that succeeds with `output` after `delay`.
    #[must_use]
    pub fn new(delay: Duration, output: JsonValue) -> Self {
        Self { delay, output }
    }
}

#[async_trait]
impl NodeHandler for SlowHandler {
    async fn handle(
        &self,
        _node: &Node,
        _input: &MergedInput,
    ) -> Result<JsonValue, NodeExecutionError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn resolve_is_case_insensitive() {
        let registry = HandlerRegistry::new()
            .with_handler("Custom", Arc::new(StaticHandler::succeeding(json!("hit"))));

        assert!(registry.is_registered("CUSTOM"));
        let handler = registry.resolve("custom");
        let output = handler
            .handle(&Node::new("n", "custom"), &MergedInput::default())
            .await
            .unwrap();
        assert_eq!(output, json!("hit"));
    }

    #[tokio::test]
    async fn unknown_type_falls_back_to_generic() {
        let registry = HandlerRegistry::builtin(Capabilities::simulated());
        assert!(!registry.is_registered("webhook"));

        let output = registry
            .resolve("webhook")
            .handle(&Node::new("n", "webhook"), &MergedInput::default())
            .await
            .unwrap();
        assert_eq!(output, json!({"processed": "Data processed by webhook node"}));
    }

    #[test]
    fn builtin_registers_every_category() {
        let registry = HandlerRegistry::builtin(Capabilities::simulated());
        assert_eq!(
            registry.registered_types(),
            vec![
                "api",
                "code",
                "database",
                "embedding",
                "filter",
                "http",
                "input",
                "llm",
                "loop",
                "output",
                "switch",
                "transform",
            ]
        );
    }

    #[tokio::test]
    async fn static_handler_counts_calls() {
        let handler = StaticHandler::failing(NodeExecutionError::handler("nope"));
        let node = Node::new("n", "x");
        assert!(handler.handle(&node, &MergedInput::default()).await.is_err());
        assert!(handler.handle(&node, &MergedInput::default()).await.is_err());
        assert_eq!(handler.calls(), 2);
    }

    #[tokio::test]
    async fn echo_handler_returns_merged_input() {
        let input = MergedInput::from_input(json!(1)).with_upstream("a", json!(2));
        let output = EchoHandler.handle(&Node::new("n", "echo"), &input).await.unwrap();
        assert_eq!(output, json!({"input": 1, "upstream": {"a": 2}}));
    }
}
