//! Error types for the generation gateway
//!
//! Every failure the gateway can surface is a [`GatewayError`]. Each variant
//! maps to a stable [`ErrorCode`] for programmatic handling and reports
//! whether the caller may retry.

mod constructors;
mod conversions;
mod types;
mod unified_error;

pub use types::{ErrorCode, GatewayError, GatewayResult, UnifiedError};
