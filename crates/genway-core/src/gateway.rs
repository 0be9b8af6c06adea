//! End-to-end request orchestration
//!
//! validate → entitlement → admission → resolution → dispatch or relay →
//! post-processing → job record. Validation, entitlement and admission
//! failures are returned before any provider is contacted.

use crate::config::{Entitlements, GatewayConfig, RequestLimits};
use crate::dispatcher::{Dispatcher, GenerationResult};
use crate::error::{GatewayError, GatewayResult};
use crate::providers::{HttpUpstream, ProviderRegistry, UpstreamClient};
use crate::rate_limiter::{Identity, PlanTier, SlidingWindowLimiter};
use crate::recorder::{self, JobOutcome, JobRecord, JobRecorder};
use crate::relay::{EventStream, RelayHandle, StreamingRelay};
use crate::request::{GenerateParams, GenerationRequest};
use crate::resolver::{ProviderCandidate, ProviderResolver};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Who is calling, as established by the identity layer in front of us
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub identity: Identity,
    pub plan: PlanTier,
}

impl CallerContext {
    pub fn new(identity: Identity, plan: PlanTier) -> Self {
        Self { identity, plan }
    }
}

/// The generation gateway
pub struct Gateway {
    limits: RequestLimits,
    entitlements: Entitlements,
    limiter: Arc<SlidingWindowLimiter>,
    resolver: ProviderResolver,
    dispatcher: Dispatcher,
    relay: StreamingRelay,
    recorder: Arc<dyn JobRecorder>,
}

impl Gateway {
    /// Assemble a gateway from explicit collaborators
    pub fn new(
        config: &GatewayConfig,
        registry: Arc<ProviderRegistry>,
        upstream: Arc<dyn UpstreamClient>,
        recorder: Arc<dyn JobRecorder>,
    ) -> Self {
        Self {
            limits: config.limits,
            entitlements: config.entitlements.clone(),
            limiter: Arc::new(SlidingWindowLimiter::new(config.rate_limit.clone())),
            resolver: ProviderResolver::new(
                Arc::clone(&registry),
                config.preferences.clone(),
                config.baseline.clone(),
            ),
            dispatcher: Dispatcher::new(Arc::clone(&registry), Arc::clone(&upstream), config.timeouts),
            relay: StreamingRelay::new(registry, upstream, config.timeouts),
            recorder,
        }
    }

    /// Production wiring: environment credentials, HTTP upstream and the
    /// configured recorder
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        let registry = Arc::new(ProviderRegistry::from_env(config.providers.clone()));
        let upstream = Arc::new(HttpUpstream::new(config.timeouts.connect)?);
        let recorder = recorder::from_config(&config.recorder);
        Ok(Self::new(config, registry, upstream, recorder))
    }

    pub fn resolver(&self) -> &ProviderResolver {
        &self.resolver
    }

    pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
        &self.limiter
    }

    /// Start periodic rate-limit eviction
    pub fn spawn_maintenance(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        self.limiter.spawn_sweeper(shutdown)
    }

    /// Generate the complete output for one request
    #[instrument(skip_all, fields(identity = %caller.identity, plan = %caller.plan))]
    pub async fn generate(
        &self,
        caller: &CallerContext,
        params: GenerateParams,
        cancel: &CancellationToken,
    ) -> GatewayResult<GenerationResult> {
        let (request, candidates) = self.admit(caller, params)?;
        let result = self.dispatcher.dispatch(&request, &candidates, cancel).await;

        let mut record = job_record(caller, &request);
        match &result {
            Ok(generated) => {
                record.provider = Some(generated.provider.clone());
                record.model = Some(generated.model_used.clone());
                record.duration_ms = generated.duration_ms;
                record.hint_count = generated.hints.len();
            }
            Err(e) => fail_record(&mut record, e),
        }
        recorder::record_in_background(Arc::clone(&self.recorder), record);

        result
    }

    /// Start a streamed generation.
    ///
    /// Boundary failures are returned directly; everything after admission
    /// is reported through the returned event stream.
    #[instrument(skip_all, fields(identity = %caller.identity, plan = %caller.plan))]
    pub fn generate_stream(
        &self,
        caller: &CallerContext,
        params: GenerateParams,
        cancel: CancellationToken,
    ) -> GatewayResult<EventStream> {
        let (request, candidates) = self.admit(caller, params)?;
        let RelayHandle { events, summary } = self.relay.open_stream(&request, candidates, cancel);

        let mut record = job_record(caller, &request);
        record.streamed = true;
        let sink = Arc::clone(&self.recorder);
        tokio::spawn(async move {
            let Ok(summary) = summary.await else {
                return;
            };
            record.provider = summary.provider;
            record.model = summary.model;
            record.duration_ms = summary.duration.as_millis() as u64;
            record.hint_count = summary.hints;
            if let Some(e) = &summary.error {
                fail_record(&mut record, e);
            }
            recorder::record_in_background(sink, record);
        });

        Ok(events)
    }

    /// Boundary checks shared by both paths; nothing here talks to a provider
    fn admit(
        &self,
        caller: &CallerContext,
        params: GenerateParams,
    ) -> GatewayResult<(GenerationRequest, Vec<ProviderCandidate>)> {
        let request = GenerationRequest::validate(params, &self.limits).inspect_err(|e| {
            debug!(error = %e, "request rejected at validation");
        })?;

        if !self.entitlements.allows(caller.plan, request.tier()) {
            info!(tier = %request.tier(), "tier not permitted for plan");
            return Err(GatewayError::tier_not_permitted(
                caller.plan.as_str(),
                request.tier().as_str(),
            ));
        }

        self.limiter
            .admit(&caller.identity, caller.plan)
            .into_result()
            .inspect_err(|e| info!(error = %e, "request rate limited"))?;

        let candidates = self.resolver.resolve(request.tier());
        debug!(
            tier = %request.tier(),
            order = ?candidates.iter().map(|c| c.provider.as_str()).collect::<Vec<_>>(),
            "resolved candidates"
        );
        Ok((request, candidates))
    }
}

fn job_record(caller: &CallerContext, request: &GenerationRequest) -> JobRecord {
    let mut record = JobRecord::new(caller.identity.to_string(), caller.plan.as_str());
    record.kind = request.kind().to_string();
    record.tier = request.tier().to_string();
    record
}

fn fail_record(record: &mut JobRecord, error: &GatewayError) {
    record.outcome = if matches!(error, GatewayError::Cancelled) {
        JobOutcome::Cancelled
    } else {
        JobOutcome::Failed
    };
    record.error_code = Some(error.code().to_string());
}
