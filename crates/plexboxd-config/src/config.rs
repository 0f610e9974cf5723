use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::credentials::CredentialStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub plex: PlexConfig,
    #[serde(default)]
    pub letterboxd: LetterboxdConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required (set it with a flag, environment variable or config file)")]
    Missing(&'static str),
    #[error("invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlexConfig {
    /// Server base URL, e.g. http://127.0.0.1:32400
    #[serde(default)]
    pub url: String,
    /// Normally kept in credentials.toml, merged in at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterboxdConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default)]
    pub waits: WaitsConfig,
}

/// How the importer synchronizes with server-side processing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WaitPolicyKind {
    /// Sleep for the configured interval
    #[default]
    Fixed,
    /// Poll for a page condition, the interval becomes an upper bound
    Poll,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitsConfig {
    #[serde(default)]
    pub policy: WaitPolicyKind,
    #[serde(default = "default_login_settle_secs")]
    pub login_settle_secs: u64,
    #[serde(default = "default_processing_secs")]
    pub processing_secs: u64,
    #[serde(default = "default_completion_secs")]
    pub completion_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Zone used to turn last-viewed epoch seconds into a calendar date
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeZonePolicy {
    #[default]
    Local,
    Utc,
}

impl std::str::FromStr for TimeZonePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(TimeZonePolicy::Local),
            "utc" => Ok(TimeZonePolicy::Utc),
            other => Err(ConfigError::Invalid {
                field: "export.timezone",
                message: format!("'{}' (expected 'local' or 'utc')", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub timezone: TimeZonePolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Chromium binary; discovered on the system or downloaded when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Values collected from CLI flags and environment variables.
/// `None` leaves the value from the config file untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub plex_url: Option<String>,
    pub plex_token: Option<String>,
    pub letterboxd_username: Option<String>,
    pub letterboxd_password: Option<String>,
    pub headless: Option<bool>,
    pub export_path: Option<PathBuf>,
    pub timezone: Option<TimeZonePolicy>,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://letterboxd.com".to_string()
}

fn default_login_settle_secs() -> u64 {
    5
}

fn default_processing_secs() -> u64 {
    20
}

fn default_completion_secs() -> u64 {
    20
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_export_path() -> PathBuf {
    PathBuf::from("letterboxd.csv")
}

impl Default for LetterboxdConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: None,
            base_url: default_base_url(),
            headless: default_true(),
            waits: WaitsConfig::default(),
        }
    }
}

impl Default for WaitsConfig {
    fn default() -> Self {
        Self {
            policy: WaitPolicyKind::default(),
            login_settle_secs: default_login_settle_secs(),
            processing_secs: default_processing_secs(),
            completion_secs: default_completion_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: default_export_path(),
            timezone: TimeZonePolicy::default(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Fill secrets that were not provided explicitly from the credentials file
    pub fn merge_credentials(&mut self, store: &CredentialStore) {
        if self.plex.token.is_none() {
            self.plex.token = store.plex_token().map(str::to_string);
        }
        if self.letterboxd.password.is_none() {
            self.letterboxd.password = store.letterboxd_password().map(str::to_string);
        }
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.plex_url {
            self.plex.url = url;
        }
        if let Some(token) = overrides.plex_token {
            self.plex.token = Some(token);
        }
        if let Some(username) = overrides.letterboxd_username {
            self.letterboxd.username = username;
        }
        if let Some(password) = overrides.letterboxd_password {
            self.letterboxd.password = Some(password);
        }
        if let Some(headless) = overrides.headless {
            self.letterboxd.headless = headless;
        }
        if let Some(path) = overrides.export_path {
            self.export.path = path;
        }
        if let Some(timezone) = overrides.timezone {
            self.export.timezone = timezone;
        }
    }

    /// Check everything the Plex extraction needs
    pub fn validate_for_extract(&self) -> Result<(), ConfigError> {
        let url = self.plex.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Missing("PLEX_URL"));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                field: "plex.url",
                message: format!("'{}' must start with http:// or https://", url),
            });
        }
        if self.plex.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(ConfigError::Missing("PLEX_TOKEN"));
        }
        Ok(())
    }

    /// Check everything the Letterboxd import needs
    pub fn validate_for_import(&self) -> Result<(), ConfigError> {
        if self.letterboxd.username.trim().is_empty() {
            return Err(ConfigError::Missing("LETTERBOXD_USERNAME"));
        }
        if self.letterboxd.password.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::Missing("LETTERBOXD_PASSWORD"));
        }
        if self.letterboxd.waits.policy == WaitPolicyKind::Poll && self.letterboxd.waits.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "letterboxd.waits.poll_interval_ms",
                message: "must be greater than zero when policy = \"poll\"".to_string(),
            });
        }
        Ok(())
    }

    /// Copy of the config safe to print
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        masked.plex.token = masked.plex.token.as_deref().map(mask_secret);
        masked.letterboxd.password = masked.letterboxd.password.as_deref().map(mask_secret);
        masked
    }
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(2).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}
