//! OAuth2 credential lifecycle: device-flow bootstrap plus proactive
//! refresh against Google's token endpoint.
//!
//! A credential starts from the device flow, goes stale as its expiry
//! passes, and comes back via the refresh grant. A rejected refresh means
//! the stored grant is dead and the caller re-runs the device flow. Every
//! state change hits disk immediately.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use leadwire_core::config::GoogleConfig;
use leadwire_core::credential::StoredCredential;
use leadwire_core::error::{LeadwireError, Result};

const DEVICE_CODE_URL: &str = "https://oauth2.googleapis.com/device/code";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEVICE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Manages the stored credential and both OAuth grants. Cheap to clone;
/// clones share one credential slot, so a refresh in either loop is seen
/// by both.
#[derive(Clone)]
pub struct TokenManager {
    client_id: String,
    client_secret: String,
    scope: String,
    token_path: PathBuf,
    http: reqwest::Client,
    credential: Arc<Mutex<Option<StoredCredential>>>,
}

impl TokenManager {
    pub fn new(google: &GoogleConfig, token_path: PathBuf) -> Self {
        Self {
            client_id: google.client_id.clone(),
            client_secret: google.client_secret.clone(),
            scope: google.scope.clone(),
            token_path,
            http: reqwest::Client::new(),
            credential: Arc::new(Mutex::new(None)),
        }
    }

    /// Load a persisted credential. Returns whether a usable one was found;
    /// expiry is not validated here.
    pub async fn load(&self) -> bool {
        match StoredCredential::load(&self.token_path) {
            Some(cred) => {
                *self.credential.lock().await = Some(cred);
                true
            }
            None => false,
        }
    }

    /// Whether the current credential is past its expiry. No credential
    /// counts as expired.
    pub async fn is_expired(&self) -> bool {
        match self.credential.lock().await.as_ref() {
            Some(cred) => cred.is_expired(),
            None => true,
        }
    }

    /// Current access token for the Authorization header.
    pub async fn bearer(&self) -> Result<String> {
        self.credential
            .lock()
            .await
            .as_ref()
            .map(|c| c.access_token.clone())
            .ok_or_else(|| LeadwireError::Auth("Not authenticated; run `leadwire login`".into()))
    }

    /// Copy of the current credential, for status display.
    pub async fn snapshot(&self) -> Option<StoredCredential> {
        self.credential.lock().await.clone()
    }

    /// Exchange the refresh token for a fresh access token.
    ///
    /// `Ok(false)` means the endpoint rejected the grant (credential is
    /// dead, prior state left untouched); `Err` means the exchange itself
    /// could not be carried out and is worth retrying next tick. The
    /// credential lock is held across the whole check-and-swap, so a second
    /// caller waiting here finds an already-fresh token and returns without
    /// a second round trip.
    pub async fn refresh(&self) -> Result<bool> {
        let mut guard = self.credential.lock().await;
        let Some(cred) = guard.as_ref() else {
            return Ok(false);
        };
        if !cred.is_expired() {
            return Ok(true);
        }

        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", cred.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| LeadwireError::Auth(format!("Token refresh failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("⚠️ Refresh rejected ({status}): {body}");
            return Ok(false);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| LeadwireError::Malformed(format!("Invalid token response: {e}")))?;

        let refresh_token = token
            .refresh_token
            .unwrap_or_else(|| cred.refresh_token.clone());
        let fresh = StoredCredential::issued_now(token.access_token, refresh_token, token.expires_in);
        fresh.save(&self.token_path)?;
        *guard = Some(fresh);
        info!("🔄 Access token refreshed");
        Ok(true)
    }

    /// Run the device authorization grant end to end: obtain a user code,
    /// surface it for out-of-band approval, then poll the token endpoint at
    /// the server-given interval until a token pair is issued or the device
    /// code itself expires.
    pub async fn login_device_flow(&self) -> Result<()> {
        let response = self
            .http
            .post(DEVICE_CODE_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| LeadwireError::Auth(format!("Device code request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LeadwireError::Auth(format!(
                "Device code request rejected ({status}): {body}"
            )));
        }

        let device: DeviceCodeResponse = response
            .json()
            .await
            .map_err(|e| LeadwireError::Malformed(format!("Invalid device code response: {e}")))?;

        println!("🔑 Google authorization required");
        println!("   Visit:  {}", device.verification_url);
        println!("   Code:   {}", device.user_code);
        info!(
            "Waiting for authorization (code {} valid {}s)",
            device.user_code, device.expires_in
        );

        let deadline = tokio::time::Instant::now() + Duration::from_secs(device.expires_in);
        let mut wait = Duration::from_secs(device.interval.max(1));

        loop {
            tokio::time::sleep(wait).await;
            if tokio::time::Instant::now() >= deadline {
                return Err(LeadwireError::Auth(
                    "Device code expired before authorization".into(),
                ));
            }

            let response = self
                .http
                .post(TOKEN_URL)
                .form(&[
                    ("client_id", self.client_id.as_str()),
                    ("client_secret", self.client_secret.as_str()),
                    ("device_code", device.device_code.as_str()),
                    ("grant_type", DEVICE_GRANT),
                ])
                .send()
                .await
                .map_err(|e| LeadwireError::Auth(format!("Device poll failed: {e}")))?;

            let body: serde_json::Value = response
                .json()
                .await
                .map_err(|e| LeadwireError::Malformed(format!("Invalid device poll response: {e}")))?;

            if let Some(error) = body.get("error").and_then(|v| v.as_str()) {
                match poll_backoff(error, wait) {
                    Some(next) => {
                        wait = next;
                        continue;
                    }
                    None => {
                        return Err(LeadwireError::Auth(format!(
                            "Device authorization failed: {error}"
                        )));
                    }
                }
            }

            let token: TokenResponse = serde_json::from_value(body)
                .map_err(|e| LeadwireError::Malformed(format!("Invalid token payload: {e}")))?;
            let refresh_token = token
                .refresh_token
                .ok_or_else(|| LeadwireError::Auth("Token reply carried no refresh_token".into()))?;

            let cred =
                StoredCredential::issued_now(token.access_token, refresh_token, token.expires_in);
            cred.save(&self.token_path)?;
            *self.credential.lock().await = Some(cred);
            info!("✅ Google authorization complete");
            return Ok(());
        }
    }
}

/// Next poll delay for a device-flow error, `None` when the error is fatal.
/// `slow_down` doubles the wait per RFC 8628; `authorization_pending` keeps it.
fn poll_backoff(error: &str, wait: Duration) -> Option<Duration> {
    match error {
        "authorization_pending" => Some(wait),
        "slow_down" => Some(wait * 2),
        _ => None,
    }
}

// ── Wire types ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    /// Google sends `verification_url`; RFC 8628 calls it `verification_uri`.
    #[serde(alias = "verification_uri")]
    verification_url: String,
    expires_in: u64,
    #[serde(default = "default_poll_interval")]
    interval: u64,
}

fn default_poll_interval() -> u64 { 5 }

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_backoff() {
        let base = Duration::from_secs(5);
        assert_eq!(poll_backoff("authorization_pending", base), Some(base));
        assert_eq!(poll_backoff("slow_down", base), Some(Duration::from_secs(10)));
        assert_eq!(poll_backoff("access_denied", base), None);
        assert_eq!(poll_backoff("expired_token", base), None);
    }

    #[test]
    fn test_token_response_decode() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "T2",
            "expires_in": 3600,
            "refresh_token": "R2",
            "scope": "https://www.googleapis.com/auth/spreadsheets",
            "token_type": "Bearer"
        }))
        .unwrap();
        assert_eq!(token.access_token, "T2");
        assert_eq!(token.expires_in, 3600);
        assert_eq!(token.refresh_token.as_deref(), Some("R2"));
    }

    #[test]
    fn test_refresh_reply_may_omit_refresh_token() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "T3",
            "expires_in": 3599
        }))
        .unwrap();
        assert!(token.refresh_token.is_none());
    }

    #[test]
    fn test_device_code_decode_accepts_both_field_names() {
        let google_style: DeviceCodeResponse = serde_json::from_value(serde_json::json!({
            "device_code": "d",
            "user_code": "ABCD-EFGH",
            "verification_url": "https://www.google.com/device",
            "expires_in": 1800,
            "interval": 5
        }))
        .unwrap();
        assert_eq!(google_style.verification_url, "https://www.google.com/device");
        assert_eq!(google_style.interval, 5);

        let rfc_style: DeviceCodeResponse = serde_json::from_value(serde_json::json!({
            "device_code": "d",
            "user_code": "ABCD-EFGH",
            "verification_uri": "https://example.com/activate",
            "expires_in": 900
        }))
        .unwrap();
        assert_eq!(rfc_style.verification_url, "https://example.com/activate");
        // interval falls back when the server omits it
        assert_eq!(rfc_style.interval, 5);
    }
}
