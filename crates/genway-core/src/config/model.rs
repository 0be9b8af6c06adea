//! Configuration model

use super::timeouts::TimeoutConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::providers::{ProviderEntry, TierModels, WireFormat};
use crate::rate_limiter::PlanTier;
use crate::request::QualityTier;
use crate::resolver::{CandidateSpec, PreferenceTable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub limits: RequestLimits,
    pub rate_limit: RateLimitSettings,
    pub entitlements: Entitlements,
    pub timeouts: TimeoutConfig,
    pub providers: Vec<ProviderEntry>,
    pub preferences: PreferenceTable,
    pub baseline: CandidateSpec,
    pub logging: LoggingConfig,
    pub recorder: RecorderConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            limits: RequestLimits::default(),
            rate_limit: RateLimitSettings::default(),
            entitlements: Entitlements::default(),
            timeouts: TimeoutConfig::default(),
            providers: default_providers(),
            preferences: PreferenceTable::default(),
            baseline: CandidateSpec::new("ollama", Some("llama3.1")),
            logging: LoggingConfig::default(),
            recorder: RecorderConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Check cross-section consistency.
    ///
    /// Every provider named by the preference table or the baseline must be
    /// registered, limits must be positive and timeouts non-zero.
    pub fn validate(&self) -> GatewayResult<()> {
        if self.limits.max_prompt_chars == 0 {
            return Err(GatewayError::config("limits.max_prompt_chars must be > 0"));
        }
        if self.rate_limit.window.is_zero() {
            return Err(GatewayError::config("rate_limit.window must be > 0"));
        }
        if self.rate_limit.max_identities == 0 {
            return Err(GatewayError::config(
                "rate_limit.max_identities must be > 0",
            ));
        }
        for plan in PlanTier::ALL {
            if self.rate_limit.limits.limit_for(plan) == Some(0) {
                return Err(GatewayError::config_with_context(
                    "rate limit must be at least 1 or null for unlimited",
                    format!("rate_limit.limits.{}", plan),
                ));
            }
        }
        self.timeouts
            .validate()
            .map_err(|e| GatewayError::config_with_context(e, "timeouts"))?;

        let known = |id: &str| self.providers.iter().any(|p| p.id == id);
        for tier in QualityTier::ALL {
            for spec in self.preferences.candidates_for(tier) {
                if !known(&spec.provider) {
                    return Err(GatewayError::config_with_context(
                        format!("unknown provider '{}'", spec.provider),
                        format!("preferences.{}", tier),
                    ));
                }
            }
        }
        if !known(&self.baseline.provider) {
            return Err(GatewayError::config_with_context(
                format!("unknown provider '{}'", self.baseline.provider),
                "baseline",
            ));
        }
        Ok(())
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
        }
    }
}

/// Size bounds enforced at request validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestLimits {
    pub max_prompt_chars: usize,
    pub max_prior_output_chars: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_prompt_chars: 8_000,
            max_prior_output_chars: 60_000,
        }
    }
}

/// Sliding-window admission settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    #[serde(
        default = "RateLimitSettings::default_window",
        with = "humantime_serde"
    )]
    pub window: Duration,
    #[serde(default)]
    pub limits: PlanLimits,
    #[serde(default = "RateLimitSettings::default_max_identities")]
    pub max_identities: usize,
    #[serde(
        default = "RateLimitSettings::default_sweep_interval",
        with = "humantime_serde"
    )]
    pub sweep_interval: Duration,
}

impl RateLimitSettings {
    const fn default_window() -> Duration {
        Duration::from_secs(60)
    }

    const fn default_max_identities() -> usize {
        100_000
    }

    const fn default_sweep_interval() -> Duration {
        Duration::from_secs(300)
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            window: Self::default_window(),
            limits: PlanLimits::default(),
            max_identities: Self::default_max_identities(),
            sweep_interval: Self::default_sweep_interval(),
        }
    }
}

/// Requests allowed per window for each plan; `None` means unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanLimits {
    pub anonymous: Option<u32>,
    pub free: Option<u32>,
    pub pro: Option<u32>,
}

impl PlanLimits {
    pub fn limit_for(&self, plan: PlanTier) -> Option<u32> {
        match plan {
            PlanTier::Anonymous => self.anonymous,
            PlanTier::Free => self.free,
            PlanTier::Pro => self.pro,
        }
    }
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            anonymous: Some(3),
            free: Some(20),
            pro: None,
        }
    }
}

/// Quality tiers each plan may request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entitlements {
    pub anonymous: Vec<QualityTier>,
    pub free: Vec<QualityTier>,
    pub pro: Vec<QualityTier>,
}

impl Entitlements {
    pub fn allows(&self, plan: PlanTier, tier: QualityTier) -> bool {
        let allowed = match plan {
            PlanTier::Anonymous => &self.anonymous,
            PlanTier::Free => &self.free,
            PlanTier::Pro => &self.pro,
        };
        allowed.contains(&tier)
    }
}

impl Default for Entitlements {
    fn default() -> Self {
        Self {
            anonymous: vec![QualityTier::Fast, QualityTier::Smart],
            free: vec![QualityTier::Fast, QualityTier::Smart],
            pro: QualityTier::ALL.to_vec(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Job record sink
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Append one JSON line per job to this file; logs only when unset
    pub jsonl_path: Option<PathBuf>,
}

fn default_providers() -> Vec<ProviderEntry> {
    let models = |fast: &str, smart: &str, quality: &str| TierModels {
        fast: Some(fast.to_string()),
        smart: Some(smart.to_string()),
        quality: Some(quality.to_string()),
    };

    vec![
        ProviderEntry::new("openai", "https://api.openai.com/v1", WireFormat::OpenAiChat)
            .with_api_key_env("OPENAI_API_KEY")
            .with_models(models("gpt-4o-mini", "gpt-4o-mini", "gpt-4o")),
        ProviderEntry::new(
            "anthropic",
            "https://api.anthropic.com/v1",
            WireFormat::AnthropicMessages,
        )
        .with_api_key_env("ANTHROPIC_API_KEY")
        .with_models(models(
            "claude-3-5-haiku-latest",
            "claude-3-5-haiku-latest",
            "claude-sonnet-4-20250514",
        )),
        ProviderEntry::new(
            "groq",
            "https://api.groq.com/openai/v1",
            WireFormat::OpenAiChat,
        )
        .with_api_key_env("GROQ_API_KEY")
        .with_models(models(
            "llama-3.1-8b-instant",
            "llama-3.3-70b-versatile",
            "llama-3.3-70b-versatile",
        )),
        ProviderEntry::new("ollama", "http://127.0.0.1:11434/v1", WireFormat::OpenAiChat)
            .without_api_key()
            .with_models(models("llama3.1", "llama3.1", "llama3.1")),
    ]
}
