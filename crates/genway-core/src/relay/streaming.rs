//! Relay task

use super::event::StreamEvent;
use super::state::{RelayState, RelaySummary};
use crate::config::TimeoutConfig;
use crate::error::GatewayError;
use crate::postprocess;
use crate::providers::wire::{self, StreamDelta};
use crate::providers::{ProviderRegistry, UpstreamClient, UpstreamStream, WireFormat};
use crate::request::{ContentKind, GenerationRequest, PromptEnvelope};
use crate::resolver::ProviderCandidate;
use crate::sse_decoder::{SseDecoder, SseEvent};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

const EVENT_BUFFER: usize = 64;

/// Events of one relayed stream, in emission order
pub type EventStream = ReceiverStream<StreamEvent>;

/// A running relay
pub struct RelayHandle {
    pub events: EventStream,
    /// Resolves once the relay task has finished
    pub summary: oneshot::Receiver<RelaySummary>,
}

/// Opens upstream streams and relays them as [`StreamEvent`]s
#[derive(Clone)]
pub struct StreamingRelay {
    registry: Arc<ProviderRegistry>,
    upstream: Arc<dyn UpstreamClient>,
    timeouts: TimeoutConfig,
}

impl StreamingRelay {
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

    /// Spawn a relay for `request` over `candidates`.
    ///
    /// Cancelling `cancel` or dropping the returned event stream stops the
    /// relay promptly and releases the upstream connection; no further
    /// events are emitted after that.
    pub fn open_stream(
        &self,
        request: &GenerationRequest,
        candidates: Vec<ProviderCandidate>,
        cancel: CancellationToken,
    ) -> RelayHandle {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let (summary_tx, summary_rx) = oneshot::channel();

        let task = RelayTask {
            registry: Arc::clone(&self.registry),
            upstream: Arc::clone(&self.upstream),
            timeouts: self.timeouts,
            kind: request.kind(),
            envelope: request.envelope(),
            candidates,
            cancel,
            tx,
            state: RelayState::Connecting,
            started: Instant::now(),
            provider: None,
            model: None,
            tokens: 0,
            hints: 0,
        };

        let span = info_span!("relay", kind = %request.kind(), tier = %request.tier());
        tokio::spawn(
            async move {
                let summary = task.run().await;
                let _ = summary_tx.send(summary);
            }
            .instrument(span),
        );

        RelayHandle {
            events: ReceiverStream::new(rx),
            summary: summary_rx,
        }
    }
}

/// How the connected phase ended
enum Ended {
    Completed(String),
    Failed(GatewayError),
    Cancelled,
}

struct RelayTask {
    registry: Arc<ProviderRegistry>,
    upstream: Arc<dyn UpstreamClient>,
    timeouts: TimeoutConfig,
    kind: ContentKind,
    envelope: PromptEnvelope,
    candidates: Vec<ProviderCandidate>,
    cancel: CancellationToken,
    tx: mpsc::Sender<StreamEvent>,
    state: RelayState,
    started: Instant,
    provider: Option<String>,
    model: Option<String>,
    tokens: usize,
    hints: usize,
}

impl RelayTask {
    async fn run(mut self) -> RelaySummary {
        let ended = match self.connect().await {
            Ok((candidate, wire, stream)) => {
                self.provider = Some(candidate.provider.clone());
                self.model = Some(candidate.model.clone());
                let meta = StreamEvent::Meta {
                    model: candidate.model.clone(),
                };
                if self.emit(meta).await {
                    self.transition(RelayState::Relaying);
                    self.relay(&candidate.provider, wire, stream).await
                } else {
                    Ended::Cancelled
                }
            }
            Err(ended) => ended,
        };

        let error = match ended {
            Ended::Completed(text) => {
                self.finish(&text).await;
                None
            }
            Ended::Cancelled => {
                debug!(tokens = self.tokens, "caller went away, relay stopped");
                self.transition(RelayState::Closed);
                Some(GatewayError::Cancelled)
            }
            Ended::Failed(err) => {
                warn!(error = %err, tokens = self.tokens, "relay failed");
                self.transition(RelayState::Errored);
                if self.emit(StreamEvent::error(&err)).await {
                    self.emit(StreamEvent::Done).await;
                }
                Some(err)
            }
        };

        RelaySummary {
            provider: self.provider,
            model: self.model,
            duration: self.started.elapsed(),
            tokens: self.tokens,
            hints: self.hints,
            final_state: self.state,
            cancelled: matches!(error, Some(GatewayError::Cancelled)),
            error,
        }
    }

    /// Open the first candidate that accepts a connection
    async fn connect(&self) -> Result<(ProviderCandidate, WireFormat, UpstreamStream), Ended> {
        let deadline = self.started + self.timeouts.total;
        let mut attempts = 0;
        let mut last_error: Option<GatewayError> = None;

        for candidate in &self.candidates {
            if self.cancel.is_cancelled() {
                return Err(Ended::Cancelled);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                last_error = Some(GatewayError::timeout_with_context(
                    self.timeouts.total,
                    "total connect deadline",
                ));
                break;
            }

            let call = match self.registry.prepare_call(
                &candidate.provider,
                &candidate.model,
                &self.envelope,
            ) {
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
                "opening upstream stream"
            );

            let opened = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Ended::Cancelled),
                _ = self.tx.closed() => return Err(Ended::Cancelled),
                result = tokio::time::timeout(budget, self.upstream.open_stream(&call)) => {
                    result.unwrap_or_else(|_| {
                        Err(GatewayError::timeout_with_context(
                            budget,
                            format!("{} stream connect", candidate.provider),
                        ))
                    })
                }
            };

            match opened {
                Ok(stream) => {
                    info!(
                        provider = %candidate.provider,
                        model = %candidate.model,
                        position = candidate.position,
                        "upstream stream connected"
                    );
                    return Ok((candidate.clone(), call.wire, stream));
                }
                Err(e) => {
                    warn!(
                        provider = %candidate.provider,
                        model = %candidate.model,
                        error = %e,
                        "stream connect failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(Ended::Failed(GatewayError::exhausted(
            attempts,
            last_error.as_ref(),
        )))
    }

    /// Forward tokens until the upstream finishes, fails or the caller leaves
    async fn relay(&mut self, provider: &str, wire: WireFormat, mut upstream: UpstreamStream) -> Ended {
        let mut decoder = SseDecoder::new();
        let mut text = String::new();
        let idle = self.timeouts.stream_idle;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ended::Cancelled,
                _ = self.tx.closed() => return Ended::Cancelled,
                next = tokio::time::timeout(idle, upstream.next()) => next,
            };

            let (events, upstream_ended) = match next {
                Err(_) => {
                    return Ended::Failed(GatewayError::mid_stream(
                        provider,
                        format!("no data for {}ms", idle.as_millis()),
                    ));
                }
                Ok(Some(Err(e))) => {
                    return Ended::Failed(match e {
                        GatewayError::UpstreamMidStream { .. } => e,
                        other => GatewayError::mid_stream(provider, other.to_string()),
                    });
                }
                Ok(Some(Ok(chunk))) => (decoder.feed(&chunk), false),
                Ok(None) => (decoder.finish().into_iter().collect(), true),
            };

            for event in &events {
                if let Some(ended) = self.apply(provider, wire, event, &mut text).await {
                    return ended;
                }
            }
            if upstream_ended {
                return Ended::Completed(text);
            }
        }
    }

    async fn apply(
        &mut self,
        provider: &str,
        wire: WireFormat,
        event: &SseEvent,
        text: &mut String,
    ) -> Option<Ended> {
        match wire::decode_stream_event(wire, provider, event) {
            Ok(StreamDelta::Token(token)) => {
                text.push_str(&token);
                self.tokens += 1;
                if self.emit(StreamEvent::Token(token)).await {
                    None
                } else {
                    Some(Ended::Cancelled)
                }
            }
            Ok(StreamDelta::Finished) => Some(Ended::Completed(std::mem::take(text))),
            Ok(StreamDelta::Failed(message)) => {
                Some(Ended::Failed(GatewayError::mid_stream(provider, message)))
            }
            Ok(StreamDelta::Ignored) => None,
            Err(e) => {
                debug!(error = %e, "skipping malformed upstream event");
                None
            }
        }
    }

    async fn finish(&mut self, text: &str) {
        self.transition(RelayState::Finalizing);
        let (_, hints) = postprocess::finalize(self.kind, text);
        self.hints = hints.len();

        let delivered = hints.is_empty() || self.emit(StreamEvent::Hints(hints)).await;
        if delivered && self.emit(StreamEvent::Done).await {
            info!(
                provider = self.provider.as_deref().unwrap_or_default(),
                model = self.model.as_deref().unwrap_or_default(),
                tokens = self.tokens,
                hints = self.hints,
                duration_ms = self.started.elapsed().as_millis() as u64,
                "stream completed"
            );
        }
        self.transition(RelayState::Closed);
    }

    /// Send one event; false when the caller is gone
    async fn emit(&self, event: StreamEvent) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(event) => sent.is_ok(),
        }
    }

    fn transition(&mut self, next: RelayState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal relay transition {} -> {}",
            self.state,
            next
        );
        debug!(from = %self.state, to = %next, "relay state");
        self.state = next;
    }
}
