//! Upstream inference providers
//!
//! The registry holds the static provider table and answers configuration
//! presence on every lookup. Wire schemas describe the two upstream
//! dialects explicitly, and [`UpstreamClient`] is the seam between the
//! fallback loops and the network.

mod credentials;
mod entry;
pub mod error_utils;
mod http;
mod registry;
mod upstream;
pub mod wire;

pub use credentials::{CredentialSource, EnvCredentials, StaticCredentials};
pub use entry::{ProviderEntry, TierModels, WireFormat};
pub use http::HttpUpstream;
pub use registry::{ProviderRegistry, ProviderStatus};
pub use upstream::{UpstreamCall, UpstreamClient, UpstreamStream};
