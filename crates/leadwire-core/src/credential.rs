//! Stored OAuth credential, the one piece of state that must survive
//! restarts. Persisted as pretty JSON next to the config; every newly
//! issued token hits disk before it is used.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Access/refresh token pair with an absolute expiry instant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredCredential {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds, UTC. Expired iff now >= expires_at.
    pub expires_at: i64,
}

impl StoredCredential {
    /// Build a credential expiring `expires_in` seconds from now.
    pub fn issued_now(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: chrono::Utc::now().timestamp() + expires_in,
        }
    }

    /// Pure expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// Expiry check against the canonical clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }

    /// Load from disk. `None` when the file is absent or holds no usable
    /// access token; expiry is not validated here.
    pub fn load(path: &Path) -> Option<Self> {
        let json = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str::<Self>(&json) {
            Ok(cred) if !cred.access_token.is_empty() => Some(cred),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("⚠️ Failed to parse {}: {e}", path.display());
                None
            }
        }
    }

    /// Persist to disk immediately.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::LeadwireError::Config(format!("Serialize credential: {e}")))?;
        std::fs::write(path, json)?;
        tracing::debug!("💾 Credential saved to {}", path.display());
        Ok(())
    }
}
