//! UnifiedError trait implementation for GatewayError

use super::types::{ErrorCode, GatewayError, UnifiedError};

impl GatewayError {
    /// Stable code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            Self::RateLimited { .. } => ErrorCode::RateLimited,
            Self::TierNotPermitted { .. } => ErrorCode::TierNotPermitted,
            Self::ProviderUnavailable { .. } => ErrorCode::ProviderUnavailable,
            Self::AllProvidersExhausted { .. } => ErrorCode::AllProvidersExhausted,
            Self::Upstream { .. } => ErrorCode::UpstreamFailure,
            Self::UpstreamMidStream { .. } => ErrorCode::UpstreamMidStreamFailure,
            Self::Decode { .. } => ErrorCode::DecodeError,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::Config { .. } => ErrorCode::ConfigError,
            Self::Internal { .. } => ErrorCode::Internal,
        }
    }

    /// Seconds the caller should wait before retrying, when known
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            Self::AllProvidersExhausted { .. } => Some(5),
            _ => None,
        }
    }
}

impl UnifiedError for GatewayError {
    fn error_code(&self) -> &str {
        self.code().as_str()
    }

    fn message(&self) -> String {
        match self {
            Self::InvalidRequest {
                message,
                field: Some(field),
            } => format!("{}: {}", field, message),
            Self::Timeout {
                context: Some(context),
                ..
            } => format!("{} ({})", self, context),
            Self::Config {
                message,
                context: Some(context),
            } => format!("{} ({})", message, context),
            _ => self.to_string(),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::AllProvidersExhausted { .. }
                | Self::Upstream { .. }
                | Self::UpstreamMidStream { .. }
                | Self::Timeout { .. }
        )
    }
}
