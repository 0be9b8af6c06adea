//! reqwest-backed upstream transport

use super::entry::WireFormat;
use super::error_utils::error_from_response;
use super::upstream::{UpstreamCall, UpstreamClient, UpstreamStream};
use super::wire;
use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Talks to real providers over HTTP.
///
/// Only the connect timeout lives here; per-call and idle deadlines are
/// enforced by the dispatcher and relay so they can honor cancellation.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(connect_timeout: Duration) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("genway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                GatewayError::config_with_context(
                    format!("Failed to build HTTP client: {}", e),
                    "HttpUpstream::new",
                )
            })?;
        Ok(Self { client })
    }

    fn request(&self, call: &UpstreamCall, stream: bool) -> GatewayResult<reqwest::RequestBuilder> {
        let body = wire::request_body(call.wire, &call.model, &call.envelope, stream)?;
        let mut builder = self
            .client
            .post(wire::endpoint(call.wire, &call.base_url))
            .json(&body);

        match (call.wire, call.api_key.as_deref()) {
            (WireFormat::OpenAiChat, Some(key)) => builder = builder.bearer_auth(key),
            (WireFormat::AnthropicMessages, Some(key)) => {
                builder = builder
                    .header("x-api-key", key)
                    .header("anthropic-version", wire::ANTHROPIC_VERSION);
            }
            (WireFormat::AnthropicMessages, None) => {
                builder = builder.header("anthropic-version", wire::ANTHROPIC_VERSION);
            }
            (WireFormat::OpenAiChat, None) => {}
        }
        if stream {
            builder = builder.header(reqwest::header::ACCEPT, "text/event-stream");
        }
        Ok(builder)
    }

    async fn send(&self, call: &UpstreamCall, stream: bool) -> GatewayResult<reqwest::Response> {
        let response = self
            .request(call, stream)?
            .send()
            .await
            .map_err(|e| GatewayError::upstream(&call.provider, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(error_from_response(response, &call.provider).await);
        }
        Ok(response)
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    #[instrument(skip(self, call), fields(provider = %call.provider, model = %call.model))]
    async fn complete(&self, call: &UpstreamCall) -> GatewayResult<String> {
        let response = self.send(call, false).await?;
        let body = response.bytes().await.map_err(|e| {
            GatewayError::upstream(&call.provider, format!("reading body failed: {}", e))
        })?;
        debug!(bytes = body.len(), "upstream body received");
        wire::decode_completion(call.wire, &call.provider, &body)
    }

    #[instrument(skip(self, call), fields(provider = %call.provider, model = %call.model))]
    async fn open_stream(&self, call: &UpstreamCall) -> GatewayResult<UpstreamStream> {
        let response = self.send(call, true).await?;
        let provider = call.provider.clone();
        let stream = response.bytes_stream().map(move |chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| GatewayError::mid_stream(&provider, e.to_string()))
        });
        Ok(Box::pin(stream))
    }
}
