//! Provider table entries

use crate::request::QualityTier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream request/response dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// `/chat/completions` as spoken by OpenAI, Groq, OpenRouter and Ollama
    OpenAiChat,
    /// Anthropic `/messages`
    AnthropicMessages,
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAiChat => write!(f, "openai_chat"),
            Self::AnthropicMessages => write!(f, "anthropic_messages"),
        }
    }
}

/// Model exposed by a provider for each quality tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierModels {
    pub fast: Option<String>,
    pub smart: Option<String>,
    pub quality: Option<String>,
}

impl TierModels {
    pub fn get(&self, tier: QualityTier) -> Option<&str> {
        match tier {
            QualityTier::Fast => self.fast.as_deref(),
            QualityTier::Smart => self.smart.as_deref(),
            QualityTier::Quality => self.quality.as_deref(),
        }
    }
}

/// One row of the provider table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub id: String,
    pub base_url: String,
    pub wire: WireFormat,
    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_requires_api_key")]
    pub requires_api_key: bool,
    #[serde(default)]
    pub models: TierModels,
}

fn default_requires_api_key() -> bool {
    true
}

impl ProviderEntry {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>, wire: WireFormat) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            wire,
            api_key_env: None,
            requires_api_key: true,
            models: TierModels::default(),
        }
    }

    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = Some(var.into());
        self
    }

    pub fn with_models(mut self, models: TierModels) -> Self {
        self.models = models;
        self
    }

    /// Local providers such as Ollama need no credential
    pub fn without_api_key(mut self) -> Self {
        self.requires_api_key = false;
        self
    }

    pub fn model_for(&self, tier: QualityTier) -> Option<&str> {
        self.models.get(tier)
    }
}
