//! File-based configuration loading

use super::model::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use std::fs;
use std::path::Path;

/// Load configuration from a file
///
/// Supports JSON, TOML, and YAML formats based on file extension.
/// Returns default config if file doesn't exist.
pub fn load_from_file(path: &Path) -> GatewayResult<GatewayConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(GatewayConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        GatewayError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let config: GatewayConfig = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| {
            GatewayError::config_with_context(
                format!("Failed to parse TOML config: {}", e),
                format!("Deserializing TOML configuration from '{}'", path.display()),
            )
        })?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
            GatewayError::config_with_context(
                format!("Failed to parse YAML config: {}", e),
                format!("Deserializing YAML configuration from '{}'", path.display()),
            )
        })?,
        _ => serde_json::from_str(&content).map_err(|e| {
            GatewayError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
    };

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limiter::PlanTier;
    use crate::request::QualityTier;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_from_file(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8787");
    }

    #[test]
    fn test_load_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("genway.json");
        fs::write(
            &config_path,
            r#"{
                "server": { "bind": "0.0.0.0:9000" },
                "rate_limit": {
                    "window": "30s",
                    "limits": { "anonymous": 5, "pro": null }
                }
            }"#,
        )
        .unwrap();

        let config = load_from_file(&config_path).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.rate_limit.window, Duration::from_secs(30));
        assert_eq!(config.rate_limit.limits.limit_for(PlanTier::Anonymous), Some(5));
        // Unmentioned plans keep their defaults
        assert_eq!(config.rate_limit.limits.limit_for(PlanTier::Free), Some(20));
        assert_eq!(config.rate_limit.limits.limit_for(PlanTier::Pro), None);
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("genway.toml");
        fs::write(
            &config_path,
            r#"
[limits]
max_prompt_chars = 500

[timeouts]
request = "15s"

[[preferences.quality]]
provider = "openai"
model = "gpt-4o"

[baseline]
provider = "ollama"
"#,
        )
        .unwrap();

        let config = load_from_file(&config_path).unwrap();
        assert_eq!(config.limits.max_prompt_chars, 500);
        assert_eq!(config.timeouts.request, Duration::from_secs(15));
        let quality = config.preferences.candidates_for(QualityTier::Quality);
        assert_eq!(quality.len(), 1);
        assert_eq!(quality[0].provider, "openai");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("genway.yaml");
        fs::write(&config_path, "logging:\n  level: debug\n  format: json\n").unwrap();

        let config = load_from_file(&config_path).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_invalid_json_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.json");
        fs::write(&config_path, "{ not json").unwrap();

        let err = load_from_file(&config_path).unwrap_err();
        match err {
            GatewayError::Config { message, context } => {
                assert!(message.contains("JSON"));
                assert!(context.unwrap().contains("broken.json"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
