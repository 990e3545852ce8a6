//! Error type shared by all capability providers.

use std::fmt;

/// Errors reported by a capability provider.
///
/// Handlers convert these into node execution errors; they never abort a
/// workflow run on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider is unavailable.
    Unavailable { provider: String, reason: String },
    /// The request was rejected before it was sent.
    InvalidRequest { reason: String },
    /// The request was sent but failed.
    RequestFailed { reason: String },
    /// The provider's response could not be interpreted.
    InvalidResponse { reason: String },
    /// Rate limit exceeded.
    RateLimited { retry_after_secs: Option<u64> },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { provider, reason } => {
                write!(f, "provider '{provider}' unavailable: {reason}")
            }
            Self::InvalidRequest { reason } => write!(f, "invalid request: {reason}"),
            Self::RequestFailed { reason } => write!(f, "request failed: {reason}"),
            Self::InvalidResponse { reason } => write!(f, "invalid response: {reason}"),
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "rate limited, retry after {secs}s")
                } else {
                    write!(f, "rate limited")
                }
            }
        }
    }
}

impl std::error::Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_display() {
        let err = ProviderError::Unavailable {
            provider: "openai".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("openai"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn rate_limited_display() {
        let err = ProviderError::RateLimited {
            retry_after_secs: Some(30),
        };
        assert_eq!(err.to_string(), "rate limited, retry after 30s");
        let err = ProviderError::RateLimited {
            retry_after_secs: None,
        };
        assert_eq!(err.to_string(), "rate limited");
    }
}
