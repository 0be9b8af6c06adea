//! Per-identity admission control
//!
//! Implements a sliding-window limiter: every identity keeps the instants of
//! its admitted requests inside the trailing window, and a request is
//! admitted only while fewer than the plan's limit remain.

mod limiter;
mod types;

#[cfg(test)]
mod tests;

pub use limiter::SlidingWindowLimiter;
pub use types::{Admission, Identity, PlanTier};
