//! Gateway configuration
//!
//! Configuration is read once at start-up from a JSON, TOML or YAML file,
//! then overlaid with `GENWAY_*` environment variables. Provider credentials
//! are never part of the file; see [`crate::providers::CredentialSource`].

mod env_loader;
mod file_loader;
mod model;
mod timeouts;

pub use env_loader::{apply_env_overrides, load_from_env};
pub use file_loader::load_from_file;
pub use model::{
    Entitlements, GatewayConfig, LoggingConfig, PlanLimits, RateLimitSettings, RecorderConfig,
    RequestLimits, ServerConfig,
};
pub use timeouts::TimeoutConfig;

use crate::error::GatewayResult;
use std::path::Path;

/// Load configuration from an optional file plus the process environment.
///
/// A missing file yields the defaults. The merged result is validated.
pub fn load_config(path: Option<&Path>) -> GatewayResult<GatewayConfig> {
    let mut config = match path {
        Some(path) => load_from_file(path)?,
        None => GatewayConfig::default(),
    };
    load_from_env(&mut config)?;
    config.validate()?;
    Ok(config)
}
