//! Streaming relay
//!
//! Opens an upstream stream with connect-time fallback, re-emits decoded
//! tokens as [`StreamEvent`]s and finishes with post-processing hints.
//! Once tokens have started flowing, an upstream failure ends the stream
//! with an error event; it never switches provider mid-output.

mod event;
mod state;
mod streaming;


pub use event::{DONE_MARKER, StreamEvent};
pub use state::{RelayState, RelaySummary};
pub use streaming::{EventStream, RelayHandle, StreamingRelay};
