//! CLI commands

pub mod generate;
pub mod providers;
pub mod resolve;
pub mod serve;
