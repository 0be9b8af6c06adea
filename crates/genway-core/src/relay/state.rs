//! Relay lifecycle

use crate::error::GatewayError;
use std::fmt;
use std::time::Duration;

/// Where a relay is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Connecting,
    Relaying,
    Finalizing,
    Closed,
    Errored,
}

impl RelayState {
    /// Whether moving to `next` is a legal transition
    pub fn can_transition_to(self, next: RelayState) -> bool {
        use RelayState::*;
        matches!(
            (self, next),
            (Connecting, Relaying)
                | (Connecting, Errored)
                | (Connecting, Closed)
                | (Relaying, Finalizing)
                | (Relaying, Errored)
                | (Relaying, Closed)
                | (Finalizing, Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RelayState::Closed | RelayState::Errored)
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Relaying => "relaying",
            Self::Finalizing => "finalizing",
            Self::Closed => "closed",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// What happened during one relay, reported once it ends
#[derive(Debug, Clone)]
pub struct RelaySummary {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub duration: Duration,
    pub tokens: usize,
    pub hints: usize,
    pub final_state: RelayState,
    pub error: Option<GatewayError>,
    /// The caller went away before the stream finished
    pub cancelled: bool,
}
