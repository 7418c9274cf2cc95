//! Configuration management
//!
//! Reads and writes the settings.json shared with other Bankline surfaces:
//! ```json
//! {
//!   "app": { "demoMode": false, "apiUrl": "http://localhost:3000" }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Environment variable overriding demo mode (for CI/testing)
pub const DEMO_MODE_ENV: &str = "BANKLINE_DEMO_MODE";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    demo_mode: bool,
    #[serde(default)]
    api_url: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Bankline configuration, the slice of settings.json this client reads
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub demo_mode: bool,
    /// Remote ledger store base URL; `None` falls back to the client default
    pub api_url: Option<String>,
    // The full settings document, carried so save() can write back fields
    // this client never touches
    _raw_settings: SettingsFile,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load config from the bankline directory.
    ///
    /// `BANKLINE_DEMO_MODE` overrides the settings file, and
    /// `BANKLINE_API_URL` wins over `app.apiUrl`; both fall through to the
    /// file and then the built-in defaults.
    pub fn load(bankline_dir: &Path) -> Result<Self> {
        let settings_path = bankline_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let demo_mode = std::env::var(DEMO_MODE_ENV)
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or(raw.app.demo_mode);

        let api_url = std::env::var(crate::adapters::http::API_URL_ENV)
            .ok()
            .or_else(|| raw.app.api_url.clone());

        Ok(Self {
            demo_mode,
            api_url,
            _raw_settings: raw,
        })
    }

    /// Write the managed fields back to settings.json, leaving everything
    /// another surface put there intact
    pub fn save(&self, bankline_dir: &Path) -> Result<()> {
        let settings_path = bankline_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.app.demo_mode = self.demo_mode;

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Enable demo mode
    pub fn enable_demo_mode(&mut self) {
        self.demo_mode = true;
    }

    /// Disable demo mode
    pub fn disable_demo_mode(&mut self) {
        self.demo_mode = false;
    }
}
