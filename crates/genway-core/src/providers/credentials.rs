//! Credential lookup
//!
//! Keys are looked up on every call so that rotating or adding a key in
//! the environment takes effect without a restart.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::env;

/// Source of provider API keys, keyed by variable name
pub trait CredentialSource: Send + Sync {
    /// Current value for `var`; empty values count as absent
    fn api_key(&self, var: &str) -> Option<String>;
}

/// Reads the process environment on every lookup
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn api_key(&self, var: &str) -> Option<String> {
        env::var(var).ok().filter(|value| !value.trim().is_empty())
    }
}

/// In-memory credentials that can be changed at runtime
#[derive(Debug, Default)]
pub struct StaticCredentials {
    keys: RwLock<HashMap<String, String>>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, var: impl Into<String>, key: impl Into<String>) -> Self {
        self.set(var, key);
        self
    }

    pub fn set(&self, var: impl Into<String>, key: impl Into<String>) {
        self.keys.write().insert(var.into(), key.into());
    }

    pub fn remove(&self, var: &str) {
        self.keys.write().remove(var);
    }
}

impl CredentialSource for StaticCredentials {
    fn api_key(&self, var: &str) -> Option<String> {
        self.keys
            .read()
            .get(var)
            .filter(|value| !value.trim().is_empty())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_credentials_change_at_runtime() {
        let creds = StaticCredentials::new().with("OPENAI_API_KEY", "sk-test");
        assert_eq!(creds.api_key("OPENAI_API_KEY").as_deref(), Some("sk-test"));

        creds.remove("OPENAI_API_KEY");
        assert_eq!(creds.api_key("OPENAI_API_KEY"), None);

        creds.set("GROQ_API_KEY", "   ");
        assert_eq!(creds.api_key("GROQ_API_KEY"), None);
    }

    #[test]
    fn test_env_credentials_missing_var() {
        assert_eq!(EnvCredentials.api_key("GENWAY_TEST_SURELY_UNSET_KEY"), None);
    }
}
