//! Non-streaming fallback loop

use crate::config::TimeoutConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::postprocess::{self, Hint};
use crate::providers::{ProviderRegistry, UpstreamClient};
use crate::request::GenerationRequest;
use crate::resolver::ProviderCandidate;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Output of a successful generation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub content: String,
    pub model_used: String,
    pub duration_ms: u64,
    pub hints: Vec<Hint>,
    #[serde(skip)]
    pub provider: String,
    /// Upstream calls issued, including the successful one
    #[serde(skip)]
    pub attempts: usize,
}

/// Walks the candidate list in order until one returns usable content
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    upstream: Arc<dyn UpstreamClient>,
    timeouts: TimeoutConfig,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        upstream: Arc<dyn UpstreamClient>,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            registry,
            upstream,
            timeouts,
        }
    }

    /// Try each candidate exactly once, in order.
    ///
    /// Transport failures, error statuses, schema mismatches, timeouts and
    /// empty content all move on to the next candidate. The whole loop is
    /// bounded by the total deadline and stops at once when `cancel` fires.
    #[instrument(
        skip_all,
        fields(kind = %request.kind(), tier = %request.tier(), candidates = candidates.len())
    )]
    pub async fn dispatch(
        &self,
        request: &GenerationRequest,
        candidates: &[ProviderCandidate],
        cancel: &CancellationToken,
    ) -> GatewayResult<GenerationResult> {
        let started = Instant::now();
        let deadline = started + self.timeouts.total;
        let envelope = request.envelope();
        let mut attempts = 0;
        let mut last_error: Option<GatewayError> = None;

        for candidate in candidates {
            if cancel.is_cancelled() {
                return Err(GatewayError::Cancelled);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(
                    total_ms = self.timeouts.total.as_millis() as u64,
                    "total deadline reached before all candidates were tried"
                );
                last_error = Some(GatewayError::timeout_with_context(
                    self.timeouts.total,
                    "total dispatch deadline",
                ));
                break;
            }

            let call = match self
                .registry
                .prepare_call(&candidate.provider, &candidate.model, &envelope)
            {
                Ok(call) => call,
                Err(e) => {
                    debug!(provider = %candidate.provider, "candidate unavailable, skipping");
                    last_error = Some(e);
                    continue;
                }
            };

            attempts += 1;
            let budget = self.timeouts.request.min(remaining);
            debug!(
                provider = %candidate.provider,
                model = %candidate.model,
                position = candidate.position,
                budget_ms = budget.as_millis() as u64,
                "calling candidate"
            );

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                result = tokio::time::timeout(budget, self.upstream.complete(&call)) => {
                    result.unwrap_or_else(|_| Err(timeout_error(budget, &candidate.provider)))
                }
            };

            match outcome {
                Ok(raw) => {
                    let (content, hints) = postprocess::finalize(request.kind(), &raw);
                    if content.trim().is_empty() {
                        warn!(
                            provider = %candidate.provider,
                            model = %candidate.model,
                            "candidate returned empty content, trying next"
                        );
                        last_error = Some(GatewayError::upstream(
                            &candidate.provider,
                            "empty content",
                        ));
                        continue;
                    }

                    let duration_ms = started.elapsed().as_millis() as u64;
                    if candidate.position > 0 {
                        info!(provider = %candidate.provider, "served by fallback candidate");
                    }
                    info!(
                        provider = %candidate.provider,
                        model = %candidate.model,
                        duration_ms,
                        hints = hints.len(),
                        "generation completed"
                    );
                    return Ok(GenerationResult {
                        content,
                        model_used: candidate.model.clone(),
                        duration_ms,
                        hints,
                        provider: candidate.provider.clone(),
                        attempts,
                    });
                }
                Err(e) => {
                    warn!(
                        provider = %candidate.provider,
                        model = %candidate.model,
                        error = %e,
                        "candidate failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        warn!(attempts, "all candidates exhausted");
        Err(GatewayError::exhausted(attempts, last_error.as_ref()))
    }
}

fn timeout_error(budget: Duration, provider: &str) -> GatewayError {
    GatewayError::timeout_with_context(budget, format!("{} call", provider))
}
