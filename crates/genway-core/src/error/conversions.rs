//! From trait implementations for GatewayError conversions

use super::types::GatewayError;

impl From<std::io::Error> for GatewayError {
    fn from(error: std::io::Error) -> Self {
        Self::internal(format!("IO error: {}", error))
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", error))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        let provider = error
            .url()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        if error.is_timeout() {
            return Self::timeout_with_context(std::time::Duration::ZERO, error.to_string());
        }
        Self::Upstream {
            provider,
            message: error.to_string(),
            status_code: error.status().map(|s| s.as_u16()),
        }
    }
}
