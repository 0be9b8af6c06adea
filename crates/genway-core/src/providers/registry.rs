//! Provider table with live configuration checks

use super::credentials::{CredentialSource, EnvCredentials};
use super::entry::{ProviderEntry, TierModels, WireFormat};
use super::upstream::UpstreamCall;
use crate::error::{GatewayError, GatewayResult};
use crate::request::PromptEnvelope;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Snapshot of one provider for display
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub id: String,
    pub configured: bool,
    pub base_url: String,
    pub wire: WireFormat,
    pub models: TierModels,
}

/// Static provider table.
///
/// The table itself never changes at runtime, but whether an entry is
/// configured is decided by asking the credential source on each call.
#[derive(Clone)]
pub struct ProviderRegistry {
    entries: Vec<ProviderEntry>,
    credentials: Arc<dyn CredentialSource>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl ProviderRegistry {
    pub fn new(entries: Vec<ProviderEntry>, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            entries,
            credentials,
        }
    }

    /// Registry over the process environment
    pub fn from_env(entries: Vec<ProviderEntry>) -> Self {
        Self::new(entries, Arc::new(EnvCredentials))
    }

    pub fn entries(&self) -> &[ProviderEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&ProviderEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Whether `id` exists and its credential, if required, is present now
    pub fn is_configured(&self, id: &str) -> bool {
        self.get(id)
            .is_some_and(|entry| self.api_key_for(entry).is_ok())
    }

    pub fn status(&self) -> Vec<ProviderStatus> {
        self.entries
            .iter()
            .map(|entry| ProviderStatus {
                id: entry.id.clone(),
                configured: self.api_key_for(entry).is_ok(),
                base_url: entry.base_url.clone(),
                wire: entry.wire,
                models: entry.models.clone(),
            })
            .collect()
    }

    /// Build the call for `provider`/`model`.
    ///
    /// Fails with `ProviderUnavailable` if the provider vanished from the
    /// table or lost its credential since resolution.
    pub fn prepare_call(
        &self,
        provider: &str,
        model: &str,
        envelope: &PromptEnvelope,
    ) -> GatewayResult<UpstreamCall> {
        let entry = self
            .get(provider)
            .ok_or_else(|| GatewayError::provider_unavailable(provider))?;
        let api_key = self.api_key_for(entry)?;

        Ok(UpstreamCall {
            provider: entry.id.clone(),
            model: model.to_string(),
            base_url: entry.base_url.clone(),
            wire: entry.wire,
            api_key,
            envelope: envelope.clone(),
        })
    }

    fn api_key_for(&self, entry: &ProviderEntry) -> GatewayResult<Option<String>> {
        let key = entry
            .api_key_env
            .as_deref()
            .and_then(|var| self.credentials.api_key(var));

        if entry.requires_api_key && key.is_none() {
            return Err(GatewayError::provider_unavailable(&entry.id));
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::StaticCredentials;

    fn entries() -> Vec<ProviderEntry> {
        vec![
            ProviderEntry::new("openai", "https://api.openai.com/v1", WireFormat::OpenAiChat)
                .with_api_key_env("OPENAI_API_KEY"),
            ProviderEntry::new("local", "http://127.0.0.1:11434/v1", WireFormat::OpenAiChat)
                .without_api_key(),
        ]
    }

    fn envelope() -> PromptEnvelope {
        PromptEnvelope {
            system: String::new(),
            user: "hi".into(),
        }
    }

    #[test]
    fn test_configuration_follows_credentials() {
        let creds = Arc::new(StaticCredentials::new());
        let registry = ProviderRegistry::new(entries(), creds.clone());

        assert!(!registry.is_configured("openai"));
        assert!(registry.is_configured("local"));
        assert!(!registry.is_configured("missing"));

        creds.set("OPENAI_API_KEY", "sk-live");
        assert!(registry.is_configured("openai"));
    }

    #[test]
    fn test_prepare_call_carries_key() {
        let creds = Arc::new(StaticCredentials::new().with("OPENAI_API_KEY", "sk-live"));
        let registry = ProviderRegistry::new(entries(), creds);

        let call = registry.prepare_call("openai", "gpt-4o", &envelope()).unwrap();
        assert_eq!(call.api_key.as_deref(), Some("sk-live"));
        assert_eq!(call.model, "gpt-4o");
        assert!(!format!("{:?}", call).contains("sk-live"));

        let local = registry.prepare_call("local", "llama3.1", &envelope()).unwrap();
        assert_eq!(local.api_key, None);
    }

    #[test]
    fn test_prepare_call_unconfigured() {
        let registry = ProviderRegistry::new(entries(), Arc::new(StaticCredentials::new()));
        let err = registry.prepare_call("openai", "gpt-4o", &envelope()).unwrap_err();
        assert_eq!(err, GatewayError::provider_unavailable("openai"));
    }

    #[test]
    fn test_status_snapshot() {
        let registry = ProviderRegistry::new(entries(), Arc::new(StaticCredentials::new()));
        let status = registry.status();
        assert_eq!(status.len(), 2);
        assert!(!status[0].configured);
        assert!(status[1].configured);
    }
}
