//! # Contracts
//!
//! Shared interface contracts: the level mask, the sink capability trait,
//! the telemetry envelope model, configuration types and the error type.
//! Every other crate in the workspace depends on this one, never the
//! reverse.

mod client;
mod config;
mod error;
mod level;
mod sink;

pub use client::*;
pub use config::*;
pub use error::*;
pub use level::*;
pub use sink::*;
