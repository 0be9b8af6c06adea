//! The seam between fallback loops and the network

use super::entry::WireFormat;
use crate::error::GatewayResult;
use crate::request::PromptEnvelope;
use async_trait::async_trait;
use futures::Stream;
use std::fmt;
use std::pin::Pin;

/// Raw body chunks of an open upstream stream
pub type UpstreamStream = Pin<Box<dyn Stream<Item = GatewayResult<Vec<u8>>> + Send>>;

/// Everything needed to issue one call to one candidate
#[derive(Clone)]
pub struct UpstreamCall {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub wire: WireFormat,
    pub api_key: Option<String>,
    pub envelope: PromptEnvelope,
}

impl fmt::Debug for UpstreamCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamCall")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("wire", &self.wire)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Transport for upstream calls
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Issue a non-streaming call and return the generated text
    async fn complete(&self, call: &UpstreamCall) -> GatewayResult<String>;

    /// Open a streaming call.
    ///
    /// Returning `Ok` means the connection was established and the upstream
    /// accepted the request; failures after that point arrive through the
    /// stream itself.
    async fn open_stream(&self, call: &UpstreamCall) -> GatewayResult<UpstreamStream>;
}
