//! Sanitizing upstream error bodies before they reach logs or callers

use crate::error::GatewayError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const MAX_ERROR_BODY_CHARS: usize = 1_024;
const REDACTED: &str = "[REDACTED]";

static BEARER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bBearer\s+[A-Za-z0-9._\-+/=]{8,}").expect("valid bearer regex")
});

static SECRET_PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(api[_-]?key|x-api-key|access[_-]?token|token|secret|password|authorization)\b\s*[:=]\s*["']?[^"',\s}]+"#,
    )
    .expect("valid secret pair regex")
});

static KEY_LIKE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bsk-[A-Za-z0-9_\-]{8,}").expect("valid key-like regex"));

/// Redact secrets from an upstream error body and bound its length
pub fn sanitize_error_body(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "<empty error body>".to_string();
    }

    let cleaned = match serde_json::from_str::<Value>(trimmed) {
        Ok(mut json) => {
            redact_value(&mut json);
            serde_json::to_string(&json).unwrap_or_else(|_| "<unprintable error body>".into())
        }
        Err(_) => redact_text(trimmed),
    };
    truncate(cleaned)
}

/// Turn a non-success response into an upstream error carrying its status
pub async fn error_from_response(response: reqwest::Response, provider: &str) -> GatewayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    GatewayError::upstream_status(
        provider,
        status.as_u16(),
        format!("HTTP {}: {}", status, sanitize_error_body(&body)),
    )
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if is_secret_key(key) {
                    *val = Value::String(REDACTED.to_string());
                } else {
                    redact_value(val);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_value),
        Value::String(s) => *s = redact_text(s),
        _ => {}
    }
}

fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase().replace(['-', ' '], "_");
    ["api_key", "token", "secret", "password", "authorization", "cookie"]
        .iter()
        .any(|needle| key.contains(needle))
}

fn redact_text(input: &str) -> String {
    let step = BEARER_RE.replace_all(input, "Bearer [REDACTED]");
    let step = SECRET_PAIR_RE.replace_all(&step, "$1=[REDACTED]");
    KEY_LIKE_RE.replace_all(&step, REDACTED).into_owned()
}

fn truncate(input: String) -> String {
    let count = input.chars().count();
    if count <= MAX_ERROR_BODY_CHARS {
        return input;
    }
    let head: String = input.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!("{}... [truncated {} chars]", head, count - MAX_ERROR_BODY_CHARS)
}
