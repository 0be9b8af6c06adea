//! Identity, plan and admission types

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Commercial plan of the caller, supplied by the identity layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Anonymous,
    Free,
    Pro,
}

impl PlanTier {
    pub const ALL: [PlanTier; 3] = [PlanTier::Anonymous, PlanTier::Free, PlanTier::Pro];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anonymous" => Ok(Self::Anonymous),
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            other => Err(GatewayError::invalid_field(
                "plan",
                format!("unknown plan '{}'", other),
            )),
        }
    }
}

/// Who is being rate limited
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Authenticated account id
    Account(String),
    /// Anonymized caller key, usually derived from the peer address
    Caller(String),
}

impl Identity {
    pub fn account(id: impl Into<String>) -> Self {
        Self::Account(id.into())
    }

    pub fn caller(key: impl Into<String>) -> Self {
        Self::Caller(key.into())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(id) => write!(f, "account:{}", id),
            Self::Caller(key) => write!(f, "caller:{}", key),
        }
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied { retry_after_secs: u64 },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Convert a denial into the caller-facing error
    pub fn into_result(self) -> Result<(), GatewayError> {
        match self {
            Self::Allowed => Ok(()),
            Self::Denied { retry_after_secs } => Err(GatewayError::rate_limited(retry_after_secs)),
        }
    }
}
