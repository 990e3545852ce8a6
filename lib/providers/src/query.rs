//! Database query capability.

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The result of running a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// A read returned rows.
    Rows { rows: Vec<JsonValue> },
    /// A write affected some number of rows.
    Affected { count: u64 },
}

/// Trait for query backends.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Runs a query with positional parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the query could not be executed.
    async fn run_query(
        &self,
        query: &str,
        params: &[JsonValue],
    ) -> Result<QueryOutcome, ProviderError>;
}
