//! Buffered decoder for upstream event streams
//!
//! Network chunks arrive at arbitrary boundaries: an event, a line or even
//! a multi-byte character may be split across two reads. The decoder keeps
//! whatever is incomplete and only hands out events whose terminating blank
//! line has been seen.

mod event;

pub use event::SseEvent;

/// Incremental event-stream decoder
///
/// ```text
/// event: content_block_delta
/// data: {"type":"content_block_delta", ...}
///
/// data: {"choices":[...]}
///
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Decoded text not yet terminated by a blank line
    buffer: String,
    /// Trailing bytes of a character split across chunks
    pending_utf8: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw chunk and return every event it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut bytes = std::mem::take(&mut self.pending_utf8);
        bytes.extend_from_slice(chunk);

        let (text, rest) = split_utf8(&bytes);
        self.buffer.push_str(&text);
        self.pending_utf8 = rest;

        let mut events = Vec::new();
        while let Some((end, delimiter_len)) = self.next_boundary() {
            let block: String = self.buffer.drain(..end).collect();
            self.buffer.drain(..delimiter_len);
            if let Some(event) = parse_block(&block) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a final event the upstream closed without a blank line
    pub fn finish(&mut self) -> Option<SseEvent> {
        let block = std::mem::take(&mut self.buffer);
        self.pending_utf8.clear();
        parse_block(&block)
    }

    /// Whether undecoded input is buffered
    pub fn has_remaining(&self) -> bool {
        !self.buffer.trim().is_empty() || !self.pending_utf8.is_empty()
    }

    fn next_boundary(&self) -> Option<(usize, usize)> {
        let lf = self.buffer.find("\n\n").map(|pos| (pos, 2));
        let crlf = self.buffer.find("\r\n\r\n").map(|pos| (pos, 4));
        match (lf, crlf) {
            (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
            (a, b) => a.or(b),
        }
    }
}

/// Parse one blank-line-delimited block; blocks without data are dropped
fn parse_block(block: &str) -> Option<SseEvent> {
    let mut event_type = None;
    let mut data: Vec<&str> = Vec::new();

    for line in block.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        } else if let Some(value) = line.strip_prefix("event:") {
            event_type = Some(value.trim().to_string());
        }
        // id:, retry: and unknown fields carry nothing a relay needs
    }

    if data.is_empty() {
        return None;
    }

    Some(SseEvent {
        event_type,
        data: data.join("\n"),
    })
}

/// Split `bytes` into the longest valid UTF-8 prefix and an incomplete tail.
///
/// Invalid sequences in the middle are replaced rather than carried forward.
fn split_utf8(bytes: &[u8]) -> (String, Vec<u8>) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), Vec::new()),
        Err(err) if err.error_len().is_none() => {
            let valid = err.valid_up_to();
            (
                String::from_utf8_lossy(&bytes[..valid]).into_owned(),
                bytes[valid..].to_vec(),
            )
        }
        Err(err) => {
            tracing::warn!(
                position = err.valid_up_to(),
                "invalid UTF-8 in upstream stream, replacing"
            );
            (String::from_utf8_lossy(bytes).into_owned(), Vec::new())
        }
    }
}
