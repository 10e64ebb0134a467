//! Leadwire configuration system.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{LeadwireError, Result};

/// Root configuration, loaded from ~/.leadwire/config.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LeadwireConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub sheet: SheetConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl LeadwireConfig {
    /// Load config from the default path (~/.leadwire/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LeadwireError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| LeadwireError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| LeadwireError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Leadwire home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".leadwire")
    }

    /// Where the OAuth credential is persisted.
    pub fn token_path() -> PathBuf {
        Self::home_dir().join("token.json")
    }

    /// Reject configs that cannot possibly run.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            return Err(LeadwireError::Config("telegram.bot_token is empty".into()));
        }
        if self.telegram.default_chat.is_empty() {
            return Err(LeadwireError::Config("telegram.default_chat is empty".into()));
        }
        if self.google.client_id.is_empty() || self.google.client_secret.is_empty() {
            return Err(LeadwireError::Config(
                "google.client_id / client_secret are required for the device flow".into(),
            ));
        }
        if self.google.spreadsheet_id.is_empty() {
            return Err(LeadwireError::Config("google.spreadsheet_id is empty".into()));
        }
        if self.sheet.start_row == 0 || self.sheet.last_row < self.sheet.start_row {
            return Err(LeadwireError::Config(format!(
                "sheet rows out of order: start_row={} last_row={}",
                self.sheet.start_row, self.sheet.last_row
            )));
        }
        Ok(())
    }
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token from @BotFather.
    #[serde(default)]
    pub bot_token: String,
    /// Chat that receives leads with no routing match.
    #[serde(default)]
    pub default_chat: String,
    /// Seconds between inbound update polls.
    #[serde(default = "default_inbound_interval")]
    pub poll_interval_secs: u64,
}

fn default_inbound_interval() -> u64 { 1 }

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            default_chat: String::new(),
            poll_interval_secs: default_inbound_interval(),
        }
    }
}

/// Google OAuth client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Spreadsheet id from the sheet URL.
    #[serde(default)]
    pub spreadsheet_id: String,
}

fn default_scope() -> String { "https://www.googleapis.com/auth/spreadsheets".into() }

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            scope: default_scope(),
            spreadsheet_id: String::new(),
        }
    }
}

/// Watched sheet geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    #[serde(default = "default_sheet_name")]
    pub name: String,
    /// First data row (1-based, row 1 is usually the header).
    #[serde(default = "default_start_row")]
    pub start_row: u32,
    #[serde(default = "default_first_column")]
    pub first_column: String,
    #[serde(default = "default_last_column")]
    pub last_column: String,
    #[serde(default = "default_last_row")]
    pub last_row: u32,
    /// Column that receives the claimant's name on claim.
    #[serde(default = "default_manager_column")]
    pub manager_column: String,
    /// 0-based index of the locality cell within a row, used for routing.
    #[serde(default = "default_locality_index")]
    pub locality_index: usize,
    /// Seconds between new-row detection polls.
    #[serde(default = "default_detect_interval")]
    pub poll_interval_secs: u64,
}

fn default_sheet_name() -> String { "LEADS".into() }
fn default_start_row() -> u32 { 2 }
fn default_first_column() -> String { "A".into() }
fn default_last_column() -> String { "E".into() }
fn default_last_row() -> u32 { 600 }
fn default_manager_column() -> String { "E".into() }
fn default_locality_index() -> usize { 3 }
fn default_detect_interval() -> u64 { 5 }

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            name: default_sheet_name(),
            start_row: default_start_row(),
            first_column: default_first_column(),
            last_column: default_last_column(),
            last_row: default_last_row(),
            manager_column: default_manager_column(),
            locality_index: default_locality_index(),
            poll_interval_secs: default_detect_interval(),
        }
    }
}

/// Locality → chat id routing table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RoutingConfig {
    /// Exact-match locality names mapped to chat ids. Unmatched localities
    /// fall back to telegram.default_chat.
    #[serde(default)]
    pub chats: HashMap<String, String>,
}

impl RoutingConfig {
    /// Resolve a locality cell to a chat id, if mapped.
    pub fn chat_for(&self, locality: &str) -> Option<&str> {
        self.chats.get(locality.trim()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LeadwireConfig::default();
        assert_eq!(config.sheet.name, "LEADS");
        assert_eq!(config.sheet.start_row, 2);
        assert_eq!(config.sheet.manager_column, "E");
        assert_eq!(config.telegram.poll_interval_secs, 1);
        assert_eq!(config.sheet.poll_interval_secs, 5);
        assert!(config.google.scope.contains("spreadsheets"));
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [telegram]
            bot_token = "123:abc"
            default_chat = "-1001234"

            [google]
            client_id = "id.apps.googleusercontent.com"
            client_secret = "secret"
            spreadsheet_id = "1AbC"

            [sheet]
            name = "SIGNUPS"
            start_row = 3

            [routing.chats]
            "Київ" = "-1002222"
            "Львів" = "-1003333"
        "#;

        let config: LeadwireConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.sheet.name, "SIGNUPS");
        assert_eq!(config.sheet.start_row, 3);
        // untouched fields keep defaults
        assert_eq!(config.sheet.last_row, 600);
        assert_eq!(config.routing.chat_for("Львів"), Some("-1003333"));
        assert_eq!(config.routing.chat_for(" Київ "), Some("-1002222"));
        assert_eq!(config.routing.chat_for("Одеса"), None);
        config.validate().unwrap();
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: LeadwireConfig = toml::from_str("").unwrap();
        assert_eq!(config.sheet.first_column, "A");
        assert_eq!(config.sheet.locality_index, 3);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_rows() {
        let mut config: LeadwireConfig = toml::from_str(
            r#"
            [telegram]
            bot_token = "t"
            default_chat = "c"
            [google]
            client_id = "i"
            client_secret = "s"
            spreadsheet_id = "x"
        "#,
        )
        .unwrap();
        config.sheet.last_row = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_home_dir() {
        let home = LeadwireConfig::home_dir();
        assert!(home.to_string_lossy().contains("leadwire"));
    }
}
