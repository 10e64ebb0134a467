//! # Leadwire Core
//!
//! Shared foundation for the Leadwire relay: the error taxonomy, the TOML
//! configuration system, and the stored OAuth credential model. No network
//! I/O lives here; transports build on top of this crate.

pub mod config;
pub mod credential;
pub mod error;

pub use config::LeadwireConfig;
pub use credential::StoredCredential;
pub use error::{LeadwireError, Result};
