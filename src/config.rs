//! Application configuration
//!
//! Settings come from a TOML file (default location under the platform
//! config directory) with environment-variable overrides for secrets, so
//! tokens never need to live on disk. Collaborators that are not
//! configured (Slack, Gemini) are disabled rather than failing the run.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::FolioError;

const CONFIG_FILENAME: &str = "config.toml";

fn default_range() -> String {
    "Sheet1".to_string()
}

fn default_symbol_column() -> String {
    "symbol".to_string()
}

fn default_quantity_column() -> String {
    "quantity".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_slack_channel() -> String {
    "#investment-advice".to_string()
}

fn default_usd_jpy_fallback() -> Decimal {
    Decimal::from(150)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub fx: FxConfig,
}

/// Google Sheets holdings source settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub spreadsheet_id: Option<String>,
    pub api_key: Option<String>,
    /// A1-notation range to read, header row first
    pub range: String,
    pub symbol_column: String,
    pub quantity_column: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            api_key: None,
            range: default_range(),
            symbol_column: default_symbol_column(),
            quantity_column: default_quantity_column(),
        }
    }
}

/// Gemini narrative generator settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
        }
    }
}

/// Slack delivery settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub bot_token: Option<String>,
    pub channel: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            channel: default_slack_channel(),
        }
    }
}

/// Currency conversion settings for snapshot assembly
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FxConfig {
    /// USD/JPY rate used when the live rate cannot be fetched
    pub usd_jpy_fallback: Decimal,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            usd_jpy_fallback: default_usd_jpy_fallback(),
        }
    }
}

/// Fully resolved settings for the Sheets fetcher
#[derive(Debug, Clone)]
pub struct SheetsSettings {
    pub spreadsheet_id: String,
    pub api_key: String,
    pub range: String,
    pub symbol_column: String,
    pub quantity_column: String,
}

/// Fully resolved settings for the Gemini client
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
}

/// Fully resolved settings for the Slack notifier
#[derive(Debug, Clone)]
pub struct SlackSettings {
    pub bot_token: String,
    pub channel: String,
}

impl Config {
    /// Load from the given path, or the default config-dir location.
    /// A missing file is not an error; env overrides still apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path.map(PathBuf::from).or_else(Self::default_path) {
            Some(p) if p.exists() => {
                let raw = fs::read_to_string(&p)
                    .with_context(|| format!("Failed to read config file {}", p.display()))?;
                Self::from_toml(&raw)
                    .with_context(|| format!("Failed to parse config file {}", p.display()))?
            }
            _ => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Invalid TOML configuration")
    }

    pub fn default_path() -> Option<PathBuf> {
        dir_spec::config_home().map(|dir| dir.join("folio").join(CONFIG_FILENAME))
    }

    /// Environment variables win over file values so tokens can be kept
    /// out of the config file entirely
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SPREADSHEET_ID") {
            self.sheets.spreadsheet_id = Some(v);
        }
        if let Ok(v) = env::var("GOOGLE_SHEETS_API_KEY") {
            self.sheets.api_key = Some(v);
        }
        if let Ok(v) = env::var("GOOGLE_API_KEY") {
            self.gemini.api_key = Some(v);
        }
        if let Ok(v) = env::var("GEMINI_MODEL") {
            self.gemini.model = v;
        }
        if let Ok(v) = env::var("SLACK_BOT_TOKEN") {
            self.slack.bot_token = Some(v);
        }
        if let Ok(v) = env::var("SLACK_CHANNEL") {
            self.slack.channel = v;
        }
    }

    /// The Sheets source is mandatory for online runs; name the missing
    /// settings so the error is actionable
    pub fn require_sheets(&self) -> Result<SheetsSettings> {
        let mut missing = Vec::new();
        if self.sheets.spreadsheet_id.is_none() {
            missing.push("SPREADSHEET_ID ([sheets].spreadsheet_id)");
        }
        if self.sheets.api_key.is_none() {
            missing.push("GOOGLE_SHEETS_API_KEY ([sheets].api_key)");
        }
        if !missing.is_empty() {
            return Err(FolioError::Config(format!(
                "missing holdings source settings: {}",
                missing.join(", ")
            ))
            .into());
        }

        Ok(SheetsSettings {
            spreadsheet_id: self.sheets.spreadsheet_id.clone().unwrap_or_default(),
            api_key: self.sheets.api_key.clone().unwrap_or_default(),
            range: self.sheets.range.clone(),
            symbol_column: self.sheets.symbol_column.clone(),
            quantity_column: self.sheets.quantity_column.clone(),
        })
    }

    /// Gemini is optional; None disables the narrative stage
    pub fn gemini_settings(&self) -> Option<GeminiSettings> {
        self.gemini.api_key.as_ref().map(|key| GeminiSettings {
            api_key: key.clone(),
            model: self.gemini.model.clone(),
        })
    }

    /// Slack is optional; None disables delivery
    pub fn slack_settings(&self) -> Option<SlackSettings> {
        self.slack.bot_token.as_ref().map(|token| SlackSettings {
            bot_token: token.clone(),
            channel: self.slack.channel.clone(),
        })
    }
}
