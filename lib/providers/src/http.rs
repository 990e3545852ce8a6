//! HTTP request capability.
//!
//! Provides the interface `http` (and `api`) nodes use to reach a remote
//! endpoint.

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use url::Url;

/// An outgoing HTTP request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// Target URL.
    pub url: String,
    /// HTTP method, upper-cased.
    pub method: String,
    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Optional JSON body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<JsonValue>,
}

impl HttpRequest {
    /// Creates a GET request for the given URL.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Creates a request with the given method and URL.
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into().to_ascii_uppercase(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Parses the target URL.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the URL is not absolute or has no host.
    pub fn parsed_url(&self) -> Result<Url, ProviderError> {
        let url = Url::parse(&self.url).map_err(|e| ProviderError::InvalidRequest {
            reason: format!("invalid URL '{}': {e}", self.url),
        })?;
        if url.host_str().is_none() {
            return Err(ProviderError::InvalidRequest {
                reason: format!("URL '{}' has no host", self.url),
            });
        }
        Ok(url)
    }

    /// Returns the host part of the URL, if it has one.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        self.parsed_url().ok()?.host_str().map(str::to_string)
    }
}

/// A response to an [`HttpRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body, decoded as JSON where possible.
    pub data: JsonValue,
}

impl HttpResponse {
    /// Creates a 200 response carrying a JSON body.
    #[must_use]
    pub fn ok(data: JsonValue) -> Self {
        Self::with_status(200, data)
    }

    /// Creates a response with the given status carrying a JSON body.
    #[must_use]
    pub fn with_status(status: u16, data: JsonValue) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            status,
            headers,
            data,
        }
    }

    /// Returns true for 2xx and 3xx status codes.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

/// Trait for HTTP clients.
#[async_trait]
pub trait HttpRequester: Send + Sync {
    /// Performs the request and returns the response.
    ///
    /// A non-success status is still an `Ok` response; only transport
    /// failures are errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be completed.
    async fn perform_request(&self, request: &HttpRequest) -> Result<HttpResponse, ProviderError>;
}
