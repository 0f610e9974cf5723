pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{
    BrowserSettings, Config, ConfigError, ConfigOverrides, ExportConfig, LetterboxdConfig,
    LoggingConfig, PlexConfig, TimeZonePolicy, WaitPolicyKind, WaitsConfig,
};
pub use credentials::CredentialStore;
pub use paths::PathManager;
