//! Caller-facing stream events and their wire encoding

use crate::error::{ErrorCode, GatewayError, UnifiedError};
use serde_json::json;

/// Terminal marker of every stream
pub const DONE_MARKER: &str = "[DONE]";

/// One event of a relayed stream.
///
/// A stream is `Meta, Token*, Hints?, Done` on success and ends with
/// `Error, Done` on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Meta { model: String },
    Token(String),
    Hints(Vec<String>),
    Error { message: String, code: ErrorCode },
    Done,
}

impl StreamEvent {
    pub fn error(err: &GatewayError) -> Self {
        Self::Error {
            message: err.message(),
            code: err.code(),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Payload of one event record: a JSON object, or the done marker
    pub fn to_wire(&self) -> String {
        match self {
            Self::Meta { model } => json!({ "model": model }).to_string(),
            Self::Token(text) => json!({ "token": text }).to_string(),
            Self::Hints(hints) => json!({ "hints": hints }).to_string(),
            Self::Error { message, code } => {
                json!({ "error": message, "code": code.as_str() }).to_string()
            }
            Self::Done => DONE_MARKER.to_string(),
        }
    }

    /// One `text/event-stream` frame
    pub fn to_sse_frame(&self) -> String {
        format!("data: {}\n\n", self.to_wire())
    }
}
