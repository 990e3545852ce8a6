//! Database nodes.

use crate::context::MergedInput;
use crate::error::NodeExecutionError;
use crate::handler::NodeHandler;
use crate::node::Node;
use async_trait::async_trait;
use flowline_providers::{QueryOutcome, QueryRunner};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct DatabaseParams {
    query: String,
    #[serde(default)]
    parameters: Vec<JsonValue>,
}

/// Runs a query through a [`QueryRunner`].
pub struct DatabaseHandler {
    runner: Arc<dyn QueryRunner>,
}

impl DatabaseHandler {
    /// Creates a handler backed by the given runner.
    #[must_use]
    pub fn new(runner: Arc<dyn QueryRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl NodeHandler for DatabaseHandler {
    async fn handle(
        &self,
        node: &Node,
        _input: &MergedInput,
    ) -> Result<JsonValue, NodeExecutionError> {
        let params: DatabaseParams = node.params()?;

        debug!(node_id = %node.id, parameters = params.parameters.len(), "running query");

        let outcome = self
            .runner
            .run_query(&params.query, &params.parameters)
            .await
            .map_err(|error| NodeExecutionError::Provider {
                service: "query".to_string(),
                error,
            })?;

        Ok(match outcome {
            QueryOutcome::Rows { rows } => json!({
                "query": params.query,
                "rowCount": rows.len(),
                "data": rows,
            }),
            QueryOutcome::Affected { count } => json!({
                "query": params.query,
                "affectedRows": count,
                "success": true,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowline_providers::SimulatedQueryRunner;

    fn handler() -> DatabaseHandler {
        DatabaseHandler::new(Arc::new(SimulatedQueryRunner::default().with_affected(4)))
    }

    #[tokio::test]
    async fn select_returns_rows() {
        let node = Node::new("db", "database").with_param("query", json!("SELECT * FROM users"));
        let output = handler().handle(&node, &MergedInput::default()).await.unwrap();

        assert_eq!(output["rowCount"], 2);
        assert_eq!(output["data"][1]["column_3"], "value_1_3");
    }

    #[tokio::test]
    async fn write_reports_affected_rows() {
        let node = Node::new("db", "database")
            .with_param("query", json!("UPDATE users SET active = ?"))
            .with_param("parameters", json!([true]));
        let output = handler().handle(&node, &MergedInput::default()).await.unwrap();

        assert_eq!(
            output,
            json!({"query": "UPDATE users SET active = ?", "affectedRows": 4, "success": true})
        );
    }

    #[tokio::test]
    async fn empty_query_fails() {
        let node = Node::new("db", "database").with_param("query", json!(""));
        let err = handler().handle(&node, &MergedInput::default()).await.unwrap_err();
        assert!(err.to_string().starts_with("HandlerError: query provider"));
    }
}
