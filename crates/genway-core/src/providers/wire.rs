//! Explicit upstream schemas
//!
//! Each wire format has typed request and response shapes. A body that does
//! not match its schema is a decode error; nothing is probed dynamically.

use super::entry::WireFormat;
use crate::error::{GatewayError, GatewayResult};
use crate::request::PromptEnvelope;
use crate::sse_decoder::SseEvent;
use serde::{Deserialize, Serialize};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const MAX_OUTPUT_TOKENS: u32 = 4_096;

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
    stream: bool,
}

/// Request path relative to the provider base URL
pub fn endpoint(wire: WireFormat, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    match wire {
        WireFormat::OpenAiChat => format!("{}/chat/completions", base),
        WireFormat::AnthropicMessages => format!("{}/messages", base),
    }
}

/// JSON body for one call
pub fn request_body(
    wire: WireFormat,
    model: &str,
    envelope: &PromptEnvelope,
    stream: bool,
) -> serde_json::Result<serde_json::Value> {
    match wire {
        WireFormat::OpenAiChat => serde_json::to_value(ChatRequest {
            model,
            messages: [
                Message {
                    role: "system",
                    content: &envelope.system,
                },
                Message {
                    role: "user",
                    content: &envelope.user,
                },
            ],
            stream,
        }),
        WireFormat::AnthropicMessages => serde_json::to_value(MessagesRequest {
            model,
            max_tokens: MAX_OUTPUT_TOKENS,
            system: &envelope.system,
            messages: [Message {
                role: "user",
                content: &envelope.user,
            }],
            stream,
        }),
    }
}

// OpenAI-style chat completions

#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// OpenRouter and some proxies report failures inside the stream
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

// Anthropic messages

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagesEvent {
    ContentBlockDelta {
        delta: BlockDelta,
    },
    MessageStop,
    Error {
        error: ApiErrorBody,
    },
    /// message_start, ping, content_block_start and friends
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockDelta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl ApiErrorBody {
    fn describe(&self) -> String {
        match &self.kind {
            Some(kind) => format!("{}: {}", kind, self.message),
            None => self.message.clone(),
        }
    }
}

/// Extract the generated text from a complete response body
pub fn decode_completion(wire: WireFormat, provider: &str, body: &[u8]) -> GatewayResult<String> {
    let schema_error =
        |e: serde_json::Error| GatewayError::decode(provider, format!("{} body: {}", wire, e));

    match wire {
        WireFormat::OpenAiChat => {
            let completion: ChatCompletion = serde_json::from_slice(body).map_err(schema_error)?;
            let choice = completion
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| GatewayError::decode(provider, "response has no choices"))?;
            Ok(choice.message.content.unwrap_or_default())
        }
        WireFormat::AnthropicMessages => {
            let response: MessagesResponse =
                serde_json::from_slice(body).map_err(schema_error)?;
            Ok(response
                .content
                .into_iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text),
                    ContentBlock::Other => None,
                })
                .collect())
        }
    }
}

/// What a single upstream stream event means to the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamDelta {
    Token(String),
    Finished,
    Failed(String),
    Ignored,
}

/// Interpret one decoded stream event
pub fn decode_stream_event(
    wire: WireFormat,
    provider: &str,
    event: &SseEvent,
) -> GatewayResult<StreamDelta> {
    let schema_error =
        |e: serde_json::Error| GatewayError::decode(provider, format!("{} event: {}", wire, e));

    match wire {
        WireFormat::OpenAiChat => {
            if event.is_done() {
                return Ok(StreamDelta::Finished);
            }
            let chunk: ChatChunk = serde_json::from_str(&event.data).map_err(schema_error)?;
            if let Some(error) = chunk.error {
                return Ok(StreamDelta::Failed(error.describe()));
            }
            Ok(chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .filter(|text| !text.is_empty())
                .map_or(StreamDelta::Ignored, StreamDelta::Token))
        }
        WireFormat::AnthropicMessages => {
            let parsed: MessagesEvent = serde_json::from_str(&event.data).map_err(schema_error)?;
            Ok(match parsed {
                MessagesEvent::ContentBlockDelta {
                    delta: BlockDelta::TextDelta { text },
                } if !text.is_empty() => StreamDelta::Token(text),
                MessagesEvent::MessageStop => StreamDelta::Finished,
                MessagesEvent::Error { error } => StreamDelta::Failed(error.describe()),
                _ => StreamDelta::Ignored,
            })
        }
    }
}
