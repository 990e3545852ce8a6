//! Capability interfaces for flowline node handlers.
//!
//! The workflow engine never talks to a language model, an HTTP server or a
//! database itself. Handlers for `llm`, `http` and `database` nodes are
//! constructed with explicit capability objects implementing the traits in
//! this crate:
//!
//! - **Text generation**: [`TextGenerator`]
//! - **HTTP requests**: [`HttpRequester`]
//! - **Queries**: [`QueryRunner`]
//!
//! Real implementations live outside this workspace. The [`simulated`]
//! module provides deterministic stand-ins used by the CLI and in tests.

pub mod error;
pub mod http;
pub mod query;
pub mod simulated;
pub mod text;

pub use error::ProviderError;
pub use http::{HttpRequest, HttpRequester, HttpResponse};
pub use query::{QueryOutcome, QueryRunner};
pub use simulated::{SimulatedHttpRequester, SimulatedQueryRunner, SimulatedTextGenerator};
pub use text::{GeneratedText, ModelParams, TextGenerator, TokenUsage};
