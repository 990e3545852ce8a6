//! Deterministic simulated providers.
//!
//! These stand in for real model APIs, HTTP clients and database drivers.
//! Every response is a pure function of the request, so workflow runs that
//! use them are reproducible.

use crate::error::ProviderError;
use crate::http::{HttpRequest, HttpRequester, HttpResponse};
use crate::query::{QueryOutcome, QueryRunner};
use crate::text::{GeneratedText, ModelParams, TextGenerator, TokenUsage};
use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use std::collections::HashMap;
use tracing::debug;

/// Maximum number of prompt characters echoed back in simulated text.
const PROMPT_PREVIEW_CHARS: usize = 100;

/// Simulated text generator.
///
/// Describes the response it would have produced, based on the model name
/// and temperature.
#[derive(Debug, Clone, Default)]
pub struct SimulatedTextGenerator;

impl SimulatedTextGenerator {
    fn quality(model: &str) -> &'static str {
        if model.contains("gpt-4") {
            "detailed and nuanced"
        } else if model.contains("gemini") {
            "comprehensive and analytical"
        } else if model.contains("claude") {
            "thoughtful and clear"
        } else {
            "helpful and informative"
        }
    }

    fn variability(temperature: f64) -> &'static str {
        if temperature < 0.3 {
            "very consistent and conservative"
        } else if temperature < 0.7 {
            "balanced and reliable"
        } else {
            "creative and diverse"
        }
    }
}

#[async_trait]
impl TextGenerator for SimulatedTextGenerator {
    async fn generate_text(
        &self,
        prompt: &str,
        params: &ModelParams,
    ) -> Result<GeneratedText, ProviderError> {
        if !(0.0..=2.0).contains(&params.temperature) {
            return Err(ProviderError::InvalidRequest {
                reason: format!("temperature {} out of range", params.temperature),
            });
        }

        let preview: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
        let ellipsis = if prompt.chars().count() > PROMPT_PREVIEW_CHARS {
            "..."
        } else {
            ""
        };
        let text = format!(
            "[{model}] Generated a {quality} response that is {variability}.\n\nBased on prompt: {preview}{ellipsis}",
            model = params.model,
            quality = Self::quality(&params.model),
            variability = Self::variability(params.temperature),
        );

        let prompt_tokens = u32::try_from(prompt.len() / 4).unwrap_or(u32::MAX);
        let mut completion_tokens = u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX);
        if let Some(max) = params.max_tokens {
            completion_tokens = completion_tokens.min(max);
        }

        debug!(model = %params.model, prompt_tokens, "simulated text generation");

        Ok(GeneratedText {
            text,
            model: params.model.clone(),
            usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
            },
        })
    }
}

/// Simulated HTTP client.
///
/// Returns canned responses registered per URL, and a generic 200 response
/// for everything else.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHttpRequester {
    responses: HashMap<String, HttpResponse>,
}

impl SimulatedHttpRequester {
    /// Creates a requester with no canned responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the response returned for `url`.
    #[must_use]
    pub fn with_response(mut self, url: impl Into<String>, response: HttpResponse) -> Self {
        self.responses.insert(url.into(), response);
        self
    }
}

#[async_trait]
impl HttpRequester for SimulatedHttpRequester {
    async fn perform_request(&self, request: &HttpRequest) -> Result<HttpResponse, ProviderError> {
        if let Some(response) = self.responses.get(&request.url) {
            return Ok(response.clone());
        }

        let url = request.parsed_url()?;
        let host = url.host_str().unwrap_or_default();

        debug!(method = %request.method, %host, "simulated http request");

        Ok(HttpResponse::ok(json!({
            "message": format!("Simulated {} response from {host}", request.method),
        })))
    }
}

/// Simulated query runner.
///
/// `SELECT` statements return the configured rows; `INSERT`, `UPDATE` and
/// `DELETE` report the configured affected count; anything else affects
/// zero rows.
#[derive(Debug, Clone)]
pub struct SimulatedQueryRunner {
    rows: Vec<JsonValue>,
    affected: u64,
}

impl SimulatedQueryRunner {
    /// Creates a runner returning the given rows for reads.
    #[must_use]
    pub fn with_rows(rows: Vec<JsonValue>) -> Self {
        Self { rows, affected: 1 }
    }

    /// Sets the count reported for writes.
    #[must_use]
    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }
}

impl Default for SimulatedQueryRunner {
    fn default() -> Self {
        let rows = (0..2)
            .map(|row| {
                json!({
                    "column_1": format!("value_{row}_1"),
                    "column_2": format!("value_{row}_2"),
                    "column_3": format!("value_{row}_3"),
                })
            })
            .collect();
        Self::with_rows(rows)
    }
}

#[async_trait]
impl QueryRunner for SimulatedQueryRunner {
    async fn run_query(
        &self,
        query: &str,
        params: &[JsonValue],
    ) -> Result<QueryOutcome, ProviderError> {
        let statement = query.trim_start().to_ascii_lowercase();
        if statement.is_empty() {
            return Err(ProviderError::InvalidRequest {
                reason: "empty query".to_string(),
            });
        }

        debug!(params = params.len(), "simulated query");

        if statement.starts_with("select") {
            Ok(QueryOutcome::Rows {
                rows: self.rows.clone(),
            })
        } else if ["insert", "update", "delete"]
            .iter()
            .any(|verb| statement.starts_with(verb))
        {
            Ok(QueryOutcome::Affected {
                count: self.affected,
            })
        } else {
            Ok(QueryOutcome::Affected { count: 0 })
        }
    }
}
