//! # Leadwire Relay
//!
//! The engine that ties the transports together: new sheet rows become
//! Telegram notifications with a claim button, button taps become sheet
//! write-backs. Two independent loops, both built to outlive any single
//! failed tick.

pub mod claims;
pub mod engine;
pub mod format;

pub use claims::{ClaimBook, PendingClaim};
pub use engine::{RelayEngine, run_detection_loop, run_inbound_loop};
