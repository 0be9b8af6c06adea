//! Environment variable overlay
//!
//! `GENWAY_*` variables override values from the configuration file.
//! Provider credentials are not read here; they are looked up per request.

use super::model::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use std::env;
use std::time::Duration;

/// Apply `GENWAY_*` overrides from the process environment
pub fn load_from_env(config: &mut GatewayConfig) -> GatewayResult<()> {
    apply_env_overrides(config, |key| env::var(key).ok())
}

/// Apply overrides using an arbitrary variable lookup
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> GatewayResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(bind) = lookup("GENWAY_BIND") {
        config.server.bind = bind;
    }

    if let Some(raw) = lookup("GENWAY_RATE_WINDOW_SECS") {
        let secs: u64 = parse_var("GENWAY_RATE_WINDOW_SECS", &raw)?;
        config.rate_limit.window = Duration::from_secs(secs);
    }

    if let Some(raw) = lookup("GENWAY_MAX_PROMPT_CHARS") {
        config.limits.max_prompt_chars = parse_var("GENWAY_MAX_PROMPT_CHARS", &raw)?;
    }

    if let Some(level) = lookup("GENWAY_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Some(format) = lookup("GENWAY_LOG_FORMAT") {
        config.logging.format = format;
    }

    if let Some(path) = lookup("GENWAY_RECORD_PATH") {
        config.recorder.jsonl_path = Some(path.into());
    }

    Ok(())
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> GatewayResult<T> {
    raw.trim().parse().map_err(|_| {
        GatewayError::config_with_context(
            format!("Invalid {} value", name),
            format!("Parsing '{}'", raw),
        )
    })
}
