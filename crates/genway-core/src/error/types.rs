//! Core error types and traits

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Unified error trait implemented by gateway errors.
///
/// Gives the HTTP surface and the stream encoder one place to ask for a
/// machine-readable code, a human-readable message and retry guidance.
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Get the human-readable error message
    fn message(&self) -> String;

    /// Check if this error is retryable by the caller
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Stable machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    RateLimited,
    TierNotPermitted,
    ProviderUnavailable,
    AllProvidersExhausted,
    UpstreamFailure,
    UpstreamMidStreamFailure,
    DecodeError,
    Timeout,
    Cancelled,
    ConfigError,
    Internal,
}

impl ErrorCode {
    /// Wire representation of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::RateLimited => "rate_limited",
            Self::TierNotPermitted => "tier_not_permitted",
            Self::ProviderUnavailable => "provider_unavailable",
            Self::AllProvidersExhausted => "all_providers_exhausted",
            Self::UpstreamFailure => "upstream_failure",
            Self::UpstreamMidStreamFailure => "upstream_mid_stream_failure",
            Self::DecodeError => "decode_error",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::ConfigError => "config_error",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the gateway
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// Malformed or missing request fields; rejected before admission
    #[error("Invalid request: {message}")]
    InvalidRequest {
        message: String,
        field: Option<String>,
    },

    /// Admission denied by the rate limiter
    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The caller's plan does not cover the requested quality tier
    #[error("Plan '{plan}' is not entitled to the '{tier}' tier")]
    TierNotPermitted { plan: String, tier: String },

    /// A provider has no credentials configured
    #[error("Provider '{provider}' is not configured")]
    ProviderUnavailable { provider: String },

    /// Every candidate failed to produce content
    #[error("All providers exhausted after {attempts} attempt(s)")]
    AllProvidersExhausted {
        attempts: usize,
        last_error: Option<String>,
    },

    /// A single upstream call failed (transport or non-success status)
    #[error("Upstream error from {provider}: {message}")]
    Upstream {
        provider: String,
        message: String,
        status_code: Option<u16>,
    },

    /// An upstream stream broke after tokens were relayed
    #[error("Upstream stream from {provider} failed mid-stream: {message}")]
    UpstreamMidStream { provider: String, message: String },

    /// An upstream payload did not match its provider schema
    #[error("Failed to decode {provider} response: {message}")]
    Decode { provider: String, message: String },

    /// A call or the cumulative deadline elapsed
    #[error("Timed out after {elapsed_ms}ms")]
    Timeout {
        elapsed_ms: u64,
        context: Option<String>,
    },

    /// The caller went away
    #[error("Request was cancelled")]
    Cancelled,

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// Unexpected internal failures
    #[error("Internal error: {message}")]
    Internal { message: String },
}
