//! Genway Core Library
//!
//! Rate-limited, provider-agnostic generation: admission control, provider
//! resolution with ordered fallback, a streaming relay and post-generation
//! analysis.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod postprocess;
pub mod providers;
pub mod rate_limiter;
pub mod recorder;
pub mod relay;
pub mod request;
pub mod resolver;
pub mod sse_decoder;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{GatewayConfig, TimeoutConfig, load_config};
pub use dispatcher::{Dispatcher, GenerationResult};
pub use error::{ErrorCode, GatewayError, GatewayResult, UnifiedError};
pub use gateway::{CallerContext, Gateway};
pub use postprocess::{Hint, analyze, normalize};
pub use providers::{
    CredentialSource, EnvCredentials, HttpUpstream, ProviderEntry, ProviderRegistry,
    StaticCredentials, UpstreamClient, WireFormat,
};
pub use rate_limiter::{Admission, Identity, PlanTier, SlidingWindowLimiter};
pub use recorder::{JobRecord, JobRecorder, JsonlRecorder, TracingRecorder};
pub use relay::{EventStream, StreamEvent, StreamingRelay};
pub use request::{ContentKind, GenerateParams, GenerationRequest, QualityTier};
pub use resolver::{CandidateSpec, PreferenceTable, ProviderCandidate, ProviderResolver};
