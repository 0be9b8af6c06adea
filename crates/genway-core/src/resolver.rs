//! Provider resolution
//!
//! A declarative per-tier preference table plus a pure resolution step.
//! The baseline candidate is always appended, so the result is never empty.

use crate::providers::ProviderRegistry;
use crate::request::QualityTier;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A preference table row: a provider and, optionally, a model override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub provider: String,
    /// Falls back to the provider's model for the requested tier when unset
    #[serde(default)]
    pub model: Option<String>,
}

impl CandidateSpec {
    pub fn new(provider: impl Into<String>, model: Option<&str>) -> Self {
        Self {
            provider: provider.into(),
            model: model.map(str::to_string),
        }
    }
}

impl Default for CandidateSpec {
    fn default() -> Self {
        Self::new("ollama", Some("llama3.1"))
    }
}

/// Ordered preferences per quality tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceTable {
    pub fast: Vec<CandidateSpec>,
    pub smart: Vec<CandidateSpec>,
    pub quality: Vec<CandidateSpec>,
}

impl PreferenceTable {
    pub fn candidates_for(&self, tier: QualityTier) -> &[CandidateSpec] {
        match tier {
            QualityTier::Fast => &self.fast,
            QualityTier::Smart => &self.smart,
            QualityTier::Quality => &self.quality,
        }
    }
}

impl Default for PreferenceTable {
    fn default() -> Self {
        let spec = |provider: &str| CandidateSpec::new(provider, None);
        Self {
            // Low-latency provider first, then whatever serves "smart"
            fast: vec![spec("groq"), spec("openai"), spec("anthropic")],
            smart: vec![spec("openai"), spec("anthropic")],
            quality: vec![spec("anthropic"), spec("openai")],
        }
    }
}

/// A resolved provider and model with its place in the fallback order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderCandidate {
    pub provider: String,
    pub model: String,
    pub position: usize,
}

/// Computes candidate order for a tier from the current registry state
#[derive(Debug, Clone)]
pub struct ProviderResolver {
    registry: Arc<ProviderRegistry>,
    preferences: PreferenceTable,
    baseline: CandidateSpec,
}

impl ProviderResolver {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        preferences: PreferenceTable,
        baseline: CandidateSpec,
    ) -> Self {
        Self {
            registry,
            preferences,
            baseline,
        }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Ordered candidates for `tier`.
    ///
    /// Unconfigured providers are skipped silently, duplicates keep their
    /// first position, and the baseline closes the list. Configuration is
    /// consulted on every call.
    pub fn resolve(&self, tier: QualityTier) -> Vec<ProviderCandidate> {
        let mut candidates: Vec<ProviderCandidate> = Vec::new();

        for spec in self.preferences.candidates_for(tier) {
            if !self.registry.is_configured(&spec.provider) {
                debug!(provider = %spec.provider, %tier, "skipping unconfigured provider");
                continue;
            }
            if let Some(model) = self.model_for(spec, tier) {
                push_unique(&mut candidates, &spec.provider, model);
            }
        }

        let baseline_model = self
            .model_for(&self.baseline, tier)
            .unwrap_or_else(|| self.baseline.provider.clone());
        push_unique(&mut candidates, &self.baseline.provider, baseline_model);

        candidates
    }

    fn model_for(&self, spec: &CandidateSpec, tier: QualityTier) -> Option<String> {
        spec.model.clone().or_else(|| {
            self.registry
                .get(&spec.provider)
                .and_then(|entry| entry.model_for(tier))
                .map(str::to_string)
        })
    }
}

fn push_unique(candidates: &mut Vec<ProviderCandidate>, provider: &str, model: String) {
    let duplicate = candidates
        .iter()
        .any(|c| c.provider == provider && c.model == model);
    if !duplicate {
        candidates.push(ProviderCandidate {
            provider: provider.to_string(),
            model,
            position: candidates.len(),
        });
    }
}
