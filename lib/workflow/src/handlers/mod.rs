//! Built-in node handlers.
//!
//! One handler per node category. Each parses the node's `data` into its own
//! parameter struct, so parameter validation stays with the handler that
//! owns the type.
//!
//! Handlers that inspect data address it with JSON pointers resolved against
//! the merged input document `{"input": ..., "upstream": {...}}`, for example
//! `/upstream/fetch/response/data/items`.

mod control;
mod data;
mod embedding;
mod generic;
mod http;
mod io;
mod llm;
mod query;

pub use control::{LoopHandler, SwitchHandler};
pub use data::{CodeHandler, FilterHandler, TransformHandler};
pub use embedding::EmbeddingHandler;
pub use generic::GenericHandler;
pub use http::HttpHandler;
pub use io::{InputHandler, OutputHandler};
pub use llm::LlmHandler;
pub use query::DatabaseHandler;

use crate::error::NodeExecutionError;
use serde_json::Value as JsonValue;

/// Characters of code or condition text echoed back in outputs.
const PREVIEW_CHARS: usize = 50;

/// Resolves a JSON pointer against a merged input document, failing if
/// nothing is there.
///
/// Handlers build the document once per call with
/// [`MergedInput::to_json`](crate::context::MergedInput::to_json).
fn resolve<'a>(document: &'a JsonValue, pointer: &str) -> Result<&'a JsonValue, NodeExecutionError> {
    document
        .pointer(pointer)
        .ok_or_else(|| NodeExecutionError::handler(format!("pointer '{pointer}' did not resolve")))
}

/// JSON truthiness: null, false, zero, and empty strings or collections are false.
fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(map) => !map.is_empty(),
    }
}

/// Truncates text for display, appending `...` when cut.
fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
