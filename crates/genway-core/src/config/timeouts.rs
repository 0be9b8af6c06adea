//! Timeout configuration for upstream calls

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeouts applied to every upstream interaction.
///
/// - **connect**: establishing a connection or an upstream stream
/// - **request**: one complete non-streaming candidate call
/// - **total**: cumulative budget for the whole fallback loop
/// - **stream_idle**: maximum silence between two upstream stream chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "TimeoutConfig::default_connect", with = "humantime_serde")]
    pub connect: Duration,

    #[serde(default = "TimeoutConfig::default_request", with = "humantime_serde")]
    pub request: Duration,

    #[serde(default = "TimeoutConfig::default_total", with = "humantime_serde")]
    pub total: Duration,

    #[serde(default = "TimeoutConfig::default_stream_idle", with = "humantime_serde")]
    pub stream_idle: Duration,
}

impl TimeoutConfig {
    const fn default_connect() -> Duration {
        Duration::from_secs(10)
    }

    const fn default_request() -> Duration {
        Duration::from_secs(60)
    }

    const fn default_total() -> Duration {
        Duration::from_secs(120)
    }

    const fn default_stream_idle() -> Duration {
        Duration::from_secs(30)
    }

    /// Short timeouts for tests and local models
    pub fn quick() -> Self {
        Self {
            connect: Duration::from_secs(1),
            request: Duration::from_secs(2),
            total: Duration::from_secs(5),
            stream_idle: Duration::from_secs(2),
        }
    }

    pub fn with_request(mut self, request: Duration) -> Self {
        self.request = request;
        self
    }

    pub fn with_total(mut self, total: Duration) -> Self {
        self.total = total;
        self
    }

    pub fn with_stream_idle(mut self, stream_idle: Duration) -> Self {
        self.stream_idle = stream_idle;
        self
    }

    /// Validate timeout configuration
    ///
    /// Returns an error if any timeout is zero.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("connect", self.connect),
            ("request", self.request),
            ("total", self.total),
            ("stream_idle", self.stream_idle),
        ] {
            if value.is_zero() {
                return Err(format!("{} timeout must be greater than 0", name));
            }
        }
        Ok(())
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Self::default_connect(),
            request: Self::default_request(),
            total: Self::default_total(),
            stream_idle: Self::default_stream_idle(),
        }
    }
}
