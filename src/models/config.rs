//! Application configuration structures.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Upstream disclosure service settings
    #[serde(default)]
    pub mops: MopsConfig,

    /// Input and output file locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Matching and dedup behavior
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Push notification channels
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or `None` when the file does not exist.
    ///
    /// A file that exists but does not parse is an error, never a silent
    /// fallback: its `[paths]` may name a ledger other than the default one.
    pub fn load_if_present(path: impl AsRef<Path>) -> Result<Option<Self>> {
        match Self::load(path) {
            Ok(config) => Ok(Some(config)),
            Err(AppError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fill notification credentials from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Fill notification credentials from an arbitrary lookup.
    ///
    /// Empty values are ignored so an unset secret in CI does not wipe a
    /// value from the config file.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("TELEGRAM_BOT_TOKEN") {
            self.notify.telegram.bot_token = v;
        }
        if let Some(v) = get("TELEGRAM_CHAT_ID") {
            self.notify.telegram.chat_id = v;
        }
        if let Some(v) = get("LINE_CHANNEL_ACCESS_TOKEN") {
            self.notify.line.channel_access_token = v;
        }
        if let Some(v) = get("LINE_TO") {
            self.notify.line.to = v;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.mops.user_agent.trim().is_empty() {
            return Err(AppError::validation("mops.user_agent is empty"));
        }
        if self.mops.timeout_secs == 0 {
            return Err(AppError::validation("mops.timeout_secs must be > 0"));
        }
        if self.notify.timeout_secs == 0 {
            return Err(AppError::validation("notify.timeout_secs must be > 0"));
        }
        if self.notify.preview_limit == 0 {
            return Err(AppError::validation("notify.preview_limit must be > 0"));
        }
        for (name, value) in [
            ("mops.base_url", &self.mops.base_url),
            ("notify.telegram.api_base", &self.notify.telegram.api_base),
            ("notify.line.api_base", &self.notify.line.api_base),
        ] {
            Url::parse(value)
                .map_err(|e| AppError::validation(format!("{name} is not a URL: {e}")))?;
        }
        Ok(())
    }
}

/// Upstream MOPS endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MopsConfig {
    /// API root; the listing and detail endpoints are joined onto it
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// `Origin` header sent with every request
    #[serde(default = "defaults::origin")]
    pub origin: String,

    /// `Referer` header sent with every request
    #[serde(default = "defaults::referer")]
    pub referer: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for MopsConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            origin: defaults::origin(),
            referer: defaults::referer(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// File locations used by a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Keyword list, one per line
    #[serde(default = "defaults::keywords_path")]
    pub keywords: PathBuf,

    /// Structured JSON output
    #[serde(default = "defaults::out_json_path")]
    pub out_json: PathBuf,

    /// Flattened CSV output
    #[serde(default = "defaults::out_csv_path")]
    pub out_csv: PathBuf,

    /// Dedup ledger
    #[serde(default = "defaults::state_path")]
    pub state: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            keywords: defaults::keywords_path(),
            out_json: defaults::out_json_path(),
            out_csv: defaults::out_csv_path(),
            state: defaults::state_path(),
        }
    }
}

/// Matching and dedup behavior.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Skip rows whose detail parameters lack any identity field instead of
    /// keying them with empty tokens
    #[serde(default)]
    pub require_identity_fields: bool,
}

/// Push notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Maximum number of items listed in a digest
    #[serde(default = "defaults::preview_limit")]
    pub preview_limit: usize,

    /// Request timeout in seconds for each channel
    #[serde(default = "defaults::notify_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub line: LineConfig,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            preview_limit: defaults::preview_limit(),
            timeout_secs: defaults::notify_timeout(),
            telegram: TelegramConfig::default(),
            line: LineConfig::default(),
        }
    }
}

/// Telegram bot credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "defaults::telegram_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::telegram_api_base(),
            bot_token: String::new(),
            chat_id: String::new(),
        }
    }
}

/// LINE Messaging API credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    #[serde(default = "defaults::line_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub channel_access_token: String,
    /// User, group or room id to push to
    #[serde(default)]
    pub to: String,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::line_api_base(),
            channel_access_token: String::new(),
            to: String::new(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // MOPS defaults
    pub fn base_url() -> String {
        "https://mops.twse.com.tw/mops/api".into()
    }
    pub fn origin() -> String {
        "https://mops.twse.com.tw".into()
    }
    pub fn referer() -> String {
        "https://mops.twse.com.tw/mops/web/t05st02".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; mops-watch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Path defaults
    pub fn keywords_path() -> PathBuf {
        "keywords.txt".into()
    }
    pub fn out_json_path() -> PathBuf {
        "public/data.json".into()
    }
    pub fn out_csv_path() -> PathBuf {
        "public/data.csv".into()
    }
    pub fn state_path() -> PathBuf {
        "public/state.json".into()
    }

    // Notify defaults
    pub fn preview_limit() -> usize {
        10
    }
    pub fn notify_timeout() -> u64 {
        20
    }
    pub fn telegram_api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn line_api_base() -> String {
        "https://api.line.me".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.mops.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_preview() {
        let mut config = Config::default();
        config.notify.preview_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.mops.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [paths]
            state = "data/seen.json"

            [notify.telegram]
            chat_id = "42"
            "#,
        )
        .unwrap();

        assert_eq!(config.paths.state, PathBuf::from("data/seen.json"));
        assert_eq!(config.paths.keywords, PathBuf::from("keywords.txt"));
        assert_eq!(config.notify.telegram.chat_id, "42");
        assert_eq!(config.notify.telegram.api_base, "https://api.telegram.org");
        assert_eq!(config.mops.timeout_secs, 30);
        assert!(!config.pipeline.require_identity_fields);
    }

    #[test]
    fn env_overrides_ignore_empty_values() {
        let mut config = Config::default();
        config.notify.line.to = "U123".to_string();

        config.apply_env_with(|name| match name {
            "TELEGRAM_BOT_TOKEN" => Some("bot-token".to_string()),
            "LINE_TO" => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(config.notify.telegram.bot_token, "bot-token");
        assert_eq!(config.notify.line.to, "U123");
        assert!(config.notify.telegram.chat_id.is_empty());
    }

    #[test]
    fn load_fails_on_missing_file() {
        assert!(Config::load("/nonexistent/mops-watch.toml").is_err());
    }

    #[test]
    fn load_if_present_missing_file_is_none() {
        let config = Config::load_if_present("/nonexistent/mops-watch.toml").unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn load_if_present_reads_custom_ledger_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[paths]\nstate = \"data/seen.json\"\n").unwrap();

        let config = Config::load_if_present(&path).unwrap().unwrap();
        assert_eq!(config.paths.state, PathBuf::from("data/seen.json"));
    }

    #[test]
    fn load_if_present_rejects_malformed_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            "[paths]\nstate = \"data/seen.json\"\n\n[mops]\ntimeout_secs = \"30\"\n",
        )
        .unwrap();

        let err = Config::load_if_present(&path).unwrap_err();
        assert!(matches!(err, AppError::Toml(_)));

        fs::write(&path, "[paths\nstate = ").unwrap();
        assert!(Config::load_if_present(&path).is_err());
    }
}
