//! Constructor methods for GatewayError

use super::types::GatewayError;
use std::time::Duration;

impl GatewayError {
    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid request error pointing at a field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a rate limited error
    pub const fn rate_limited(retry_after_secs: u64) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Create a tier entitlement error
    pub fn tier_not_permitted(plan: impl Into<String>, tier: impl Into<String>) -> Self {
        Self::TierNotPermitted {
            plan: plan.into(),
            tier: tier.into(),
        }
    }

    /// Create a provider unavailable error
    pub fn provider_unavailable(provider: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
        }
    }

    /// Create an exhaustion error
    pub fn exhausted(attempts: usize, last_error: Option<&GatewayError>) -> Self {
        Self::AllProvidersExhausted {
            attempts,
            last_error: last_error.map(|e| e.to_string()),
        }
    }

    /// Create an upstream error
    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider: provider.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create an upstream error with the HTTP status the provider returned
    pub fn upstream_status(
        provider: impl Into<String>,
        status_code: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            provider: provider.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a mid-stream failure
    pub fn mid_stream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamMidStream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(elapsed: Duration) -> Self {
        Self::Timeout {
            elapsed_ms: elapsed.as_millis() as u64,
            context: None,
        }
    }

    /// Create a timeout error with context
    pub fn timeout_with_context(elapsed: Duration, context: impl Into<String>) -> Self {
        Self::Timeout {
            elapsed_ms: elapsed.as_millis() as u64,
            context: Some(context.into()),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
