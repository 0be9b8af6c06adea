//! Generation request types and boundary validation
//!
//! Inbound requests arrive as loosely typed [`GenerateParams`] and are
//! validated once into an immutable [`GenerationRequest`]. Nothing past the
//! boundary sees an unvalidated request.

use crate::config::RequestLimits;
use crate::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Structural category of the output to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// UI markup for a self-contained component
    Component,
    /// A single headline line
    Headline,
    /// Spoken-word narration script
    Narration,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Headline => "headline",
            Self::Narration => "narration",
        }
    }

    /// Instruction sent as the system message for this kind
    fn system_instruction(&self) -> &'static str {
        match self {
            Self::Component => {
                "You generate self-contained UI component markup. Reply with the markup only, \
                 using accessible HTML and utility classes."
            }
            Self::Headline => {
                "You write headlines. Reply with exactly one headline on a single line and nothing else."
            }
            Self::Narration => {
                "You write narration scripts meant to be read aloud. Reply with plain spoken prose, \
                 no markup, no lists, no stage directions."
            }
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "component" => Ok(Self::Component),
            "headline" => Ok(Self::Headline),
            "narration" => Ok(Self::Narration),
            other => Err(GatewayError::invalid_field(
                "kind",
                format!("unknown content kind '{}'", other),
            )),
        }
    }
}

/// Speed/quality preference that drives candidate ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Lowest latency
    Fast,
    /// Balanced default
    #[default]
    Smart,
    /// Highest fidelity, slower
    Quality,
}

impl QualityTier {
    pub const ALL: [QualityTier; 3] = [Self::Fast, Self::Smart, Self::Quality];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Smart => "smart",
            Self::Quality => "quality",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "smart" => Ok(Self::Smart),
            "quality" => Ok(Self::Quality),
            other => Err(GatewayError::invalid_field(
                "tier",
                format!("unknown tier '{}'", other),
            )),
        }
    }
}

/// Raw inbound request as received from the transport
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateParams {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub prior_output: Option<String>,
    #[serde(default)]
    pub refinement_instruction: Option<String>,
}

impl GenerateParams {
    pub fn new(prompt: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_tier(mut self, tier: impl Into<String>) -> Self {
        self.tier = Some(tier.into());
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_refinement(
        mut self,
        prior_output: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        self.prior_output = Some(prior_output.into());
        self.refinement_instruction = Some(instruction.into());
        self
    }
}

/// Prior output plus the edit to apply to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refinement {
    pub prior_output: String,
    pub instruction: String,
}

/// System and user text handed to a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptEnvelope {
    pub system: String,
    pub user: String,
}

/// Validated, immutable description of one generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    kind: ContentKind,
    tier: QualityTier,
    wants_stream: bool,
    refinement: Option<Refinement>,
}

impl GenerationRequest {
    /// Validate inbound parameters against the configured limits.
    ///
    /// Kind and tier must be known values; the prompt may only be empty when
    /// a complete refinement pair is supplied.
    pub fn validate(params: GenerateParams, limits: &RequestLimits) -> GatewayResult<Self> {
        if params.kind.trim().is_empty() {
            return Err(GatewayError::invalid_field("kind", "is required"));
        }
        let kind: ContentKind = params.kind.parse()?;
        let tier = match params.tier.as_deref().map(str::trim) {
            None | Some("") => QualityTier::default(),
            Some(raw) => raw.parse()?,
        };

        let prior = non_empty(params.prior_output);
        let instruction = non_empty(params.refinement_instruction);
        let refinement = match (prior, instruction) {
            (Some(prior_output), Some(instruction)) => Some(Refinement {
                prior_output,
                instruction,
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(GatewayError::invalid_field(
                    "refinementInstruction",
                    "is required when priorOutput is present",
                ));
            }
            (None, Some(_)) => {
                return Err(GatewayError::invalid_field(
                    "priorOutput",
                    "is required when refinementInstruction is present",
                ));
            }
        };

        let prompt = params.prompt.trim().to_string();
        if prompt.is_empty() && refinement.is_none() {
            return Err(GatewayError::invalid_field("prompt", "must not be empty"));
        }
        if prompt.chars().count() > limits.max_prompt_chars {
            return Err(GatewayError::invalid_field(
                "prompt",
                format!("exceeds {} characters", limits.max_prompt_chars),
            ));
        }
        if let Some(refinement) = &refinement {
            if refinement.instruction.chars().count() > limits.max_prompt_chars {
                return Err(GatewayError::invalid_field(
                    "refinementInstruction",
                    format!("exceeds {} characters", limits.max_prompt_chars),
                ));
            }
            if refinement.prior_output.chars().count() > limits.max_prior_output_chars {
                return Err(GatewayError::invalid_field(
                    "priorOutput",
                    format!("exceeds {} characters", limits.max_prior_output_chars),
                ));
            }
        }

        Ok(Self {
            prompt,
            kind,
            tier,
            wants_stream: params.stream,
            refinement,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    pub fn wants_stream(&self) -> bool {
        self.wants_stream
    }

    pub fn refinement(&self) -> Option<&Refinement> {
        self.refinement.as_ref()
    }

    /// Render the provider-facing prompt text
    pub fn envelope(&self) -> PromptEnvelope {
        let user = match &self.refinement {
            None => self.prompt.clone(),
            Some(refinement) => {
                let mut user = String::new();
                if !self.prompt.is_empty() {
                    user.push_str("Original request:\n");
                    user.push_str(&self.prompt);
                    user.push_str("\n\n");
                }
                user.push_str("Previous output:\n");
                user.push_str(&refinement.prior_output);
                user.push_str("\n\nRevise the previous output as follows:\n");
                user.push_str(&refinement.instruction);
                user
            }
        };

        PromptEnvelope {
            system: self.kind.system_instruction().to_string(),
            user,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> RequestLimits {
        RequestLimits {
            max_prompt_chars: 20,
            max_prior_output_chars: 100,
        }
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let err = GenerationRequest::validate(GenerateParams::new("", "headline"), &limits())
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::invalid_field("prompt", "must not be empty")
        );
    }

    #[test]
    fn test_whitespace_prompt_rejected() {
        let result = GenerationRequest::validate(GenerateParams::new("   ", "headline"), &limits());
        assert!(matches!(result, Err(GatewayError::InvalidRequest { .. })));
    }

    #[test]
    fn test_defaults_to_smart_tier() {
        let request =
            GenerationRequest::validate(GenerateParams::new("launch day", "headline"), &limits())
                .unwrap();
        assert_eq!(request.tier(), QualityTier::Smart);
        assert_eq!(request.kind(), ContentKind::Headline);
        assert!(!request.wants_stream());
    }

    #[test]
    fn test_unknown_kind_and_tier() {
        let bad_kind = GenerationRequest::validate(GenerateParams::new("x", "poem"), &limits());
        assert!(matches!(
            bad_kind,
            Err(GatewayError::InvalidRequest { field: Some(f), .. }) if f == "kind"
        ));

        let bad_tier = GenerationRequest::validate(
            GenerateParams::new("x", "component").with_tier("turbo"),
            &limits(),
        );
        assert!(matches!(
            bad_tier,
            Err(GatewayError::InvalidRequest { field: Some(f), .. }) if f == "tier"
        ));
    }

    #[test]
    fn test_missing_kind() {
        let result = GenerationRequest::validate(GenerateParams::new("x", ""), &limits());
        assert!(matches!(result, Err(GatewayError::InvalidRequest { .. })));
    }

    #[test]
    fn test_prompt_too_long() {
        let long = "a".repeat(21);
        let result = GenerationRequest::validate(GenerateParams::new(long, "headline"), &limits());
        assert!(matches!(result, Err(GatewayError::InvalidRequest { .. })));

        let exact = "a".repeat(20);
        assert!(GenerationRequest::validate(GenerateParams::new(exact, "headline"), &limits()).is_ok());
    }

    #[test]
    fn test_refinement_needs_both_halves() {
        let mut params = GenerateParams::new("x", "component");
        params.prior_output = Some("<div></div>".into());
        let result = GenerationRequest::validate(params, &limits());
        assert!(matches!(
            result,
            Err(GatewayError::InvalidRequest { field: Some(f), .. }) if f == "refinementInstruction"
        ));

        let mut params = GenerateParams::new("x", "component");
        params.refinement_instruction = Some("make it blue".into());
        params.prior_output = Some("  ".into());
        let result = GenerationRequest::validate(params, &limits());
        assert!(matches!(
            result,
            Err(GatewayError::InvalidRequest { field: Some(f), .. }) if f == "priorOutput"
        ));
    }

    #[test]
    fn test_refinement_allows_empty_prompt() {
        let params =
            GenerateParams::new("", "component").with_refinement("<div>hi</div>", "add a title");
        let request = GenerationRequest::validate(params, &limits()).unwrap();
        let envelope = request.envelope();
        assert!(envelope.user.contains("<div>hi</div>"));
        assert!(envelope.user.contains("add a title"));
        assert!(!envelope.user.contains("Original request"));
    }

    #[test]
    fn test_prior_output_limit() {
        let params = GenerateParams::new("x", "component").with_refinement("a".repeat(101), "fix");
        assert!(GenerationRequest::validate(params, &limits()).is_err());
    }

    #[test]
    fn test_envelope_uses_kind_instruction() {
        let request =
            GenerationRequest::validate(GenerateParams::new("a card", "component"), &limits())
                .unwrap();
        let envelope = request.envelope();
        assert!(envelope.system.contains("markup"));
        assert_eq!(envelope.user, "a card");
    }

    #[test]
    fn test_params_deserialize_camel_case() {
        let params: GenerateParams = serde_json::from_str(
            r#"{"prompt":"p","kind":"component","tier":"fast","stream":true,
                "priorOutput":"old","refinementInstruction":"new"}"#,
        )
        .unwrap();
        assert!(params.stream);
        assert_eq!(params.tier.as_deref(), Some("fast"));
        assert_eq!(params.prior_output.as_deref(), Some("old"));
    }
}
