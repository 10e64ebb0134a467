//! Leadwire error taxonomy.
//!
//! Loop bodies catch all of these at the tick boundary; only `Config` (at
//! startup) and an unrecoverable `Auth` (failed bootstrap) abort the process.

use thiserror::Error;

/// All errors produced by Leadwire crates.
#[derive(Error, Debug)]
pub enum LeadwireError {
    /// Bad or missing configuration. Fatal at startup.
    #[error("Config error: {0}")]
    Config(String),

    /// Credential invalid, expired and unrefreshable, or rejected upstream.
    /// Callers skip the tick and re-bootstrap when this persists.
    #[error("Auth error: {0}")]
    Auth(String),

    /// Telegram transport failure. Transient, scoped to one tick.
    #[error("Telegram error: {0}")]
    Telegram(String),

    /// Google Sheets transport failure. Transient, scoped to one tick.
    #[error("Sheets error: {0}")]
    Sheets(String),

    /// Unexpected payload shape from an external API. The event is dropped.
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// The watched range shrank or reordered. Logged loudly, diff treated
    /// as empty instead of slicing blindly.
    #[error("Anomalous sheet state: {0}")]
    Anomaly(String),

    /// Persistence failure (config dir, token file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across Leadwire crates.
pub type Result<T> = std::result::Result<T, LeadwireError>;

impl LeadwireError {
    /// Whether the error is worth retrying on the next tick as-is.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Telegram(_) | Self::Sheets(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_context() {
        let e = LeadwireError::Sheets("HTTP 503: backend unavailable".into());
        assert!(e.to_string().contains("503"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(LeadwireError::Telegram("timeout".into()).is_transient());
        assert!(LeadwireError::Sheets("reset".into()).is_transient());
        assert!(!LeadwireError::Auth("revoked".into()).is_transient());
        assert!(!LeadwireError::Config("missing token".into()).is_transient());
    }

    #[test]
    fn test_io_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no token.json");
        let e: LeadwireError = io.into();
        assert!(matches!(e, LeadwireError::Io(_)));
    }
}
