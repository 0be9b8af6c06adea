//! Scripted upstream used by unit tests

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::providers::{
    ProviderRegistry, StaticCredentials, UpstreamCall, UpstreamClient, UpstreamStream,
};
use crate::resolver::ProviderCandidate;
use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// What a provider does when called
#[derive(Clone)]
pub(crate) enum Script {
    Complete(GatewayResult<String>),
    Stream(Vec<GatewayResult<Vec<u8>>>),
    /// Sends the chunks, then never finishes
    StreamThenHang(Vec<GatewayResult<Vec<u8>>>),
    ConnectFail(GatewayError),
    Hang,
}

pub(crate) struct ReleaseFlag(Arc<AtomicBool>);

impl Drop for ReleaseFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct ScriptedUpstream {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<(String, String)>>,
    released: Arc<AtomicBool>,
}

impl ScriptedUpstream {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(self, provider: &str, script: Script) -> Self {
        self.scripts.lock().insert(provider.to_string(), script);
        self
    }

    /// Providers called so far, in call order
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(p, _)| p.clone()).collect()
    }

    /// Whether an opened stream has been dropped
    pub(crate) fn stream_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    fn take(&self, call: &UpstreamCall) -> Option<Script> {
        self.calls
            .lock()
            .push((call.provider.clone(), call.model.clone()));
        self.scripts.lock().get(&call.provider).cloned()
    }

    fn wrap(&self, stream: UpstreamStream) -> UpstreamStream {
        self.released.store(false, Ordering::SeqCst);
        let flag = ReleaseFlag(Arc::clone(&self.released));
        Box::pin(stream.map(move |chunk| {
            let _ = &flag;
            chunk
        }))
    }
}

#[async_trait]
impl UpstreamClient for ScriptedUpstream {
    async fn complete(&self, call: &UpstreamCall) -> GatewayResult<String> {
        match self.take(call) {
            Some(Script::Complete(result)) => result,
            Some(Script::ConnectFail(err)) => Err(err),
            Some(Script::Hang) => futures::future::pending().await,
            Some(_) => Err(GatewayError::internal("script is for streaming")),
            None => Err(GatewayError::upstream(&call.provider, "connection refused")),
        }
    }

    async fn open_stream(&self, call: &UpstreamCall) -> GatewayResult<UpstreamStream> {
        match self.take(call) {
            Some(Script::Stream(chunks)) => Ok(self.wrap(Box::pin(futures::stream::iter(chunks)))),
            Some(Script::StreamThenHang(chunks)) => Ok(self.wrap(Box::pin(
                futures::stream::iter(chunks).chain(futures::stream::pending()),
            ))),
            Some(Script::ConnectFail(err)) => Err(err),
            Some(Script::Hang) => futures::future::pending().await,
            Some(Script::Complete(_)) => Err(GatewayError::internal("script is not streaming")),
            None => Err(GatewayError::upstream(&call.provider, "connection refused")),
        }
    }
}

/// OpenAI-style event stream carrying `tokens`, terminated by `[DONE]`
pub(crate) fn openai_events(tokens: &[&str]) -> Vec<GatewayResult<Vec<u8>>> {
    let mut chunks: Vec<GatewayResult<Vec<u8>>> = tokens
        .iter()
        .map(|token| {
            let payload = serde_json::json!({"choices": [{"delta": {"content": token}}]});
            Ok(format!("data: {}\n\n", payload).into_bytes())
        })
        .collect();
    chunks.push(Ok(b"data: [DONE]\n\n".to_vec()));
    chunks
}

/// Registry over the default provider table with every credential present
pub(crate) fn registry() -> Arc<ProviderRegistry> {
    let creds = StaticCredentials::new()
        .with("OPENAI_API_KEY", "sk-test")
        .with("ANTHROPIC_API_KEY", "sk-ant-test")
        .with("GROQ_API_KEY", "gsk-test");
    Arc::new(ProviderRegistry::new(
        GatewayConfig::default().providers,
        Arc::new(creds),
    ))
}

pub(crate) fn candidates(pairs: &[(&str, &str)]) -> Vec<ProviderCandidate> {
    pairs
        .iter()
        .enumerate()
        .map(|(position, (provider, model))| ProviderCandidate {
            provider: provider.to_string(),
            model: model.to_string(),
            position,
        })
        .collect()
}
