use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "plex2letterboxd";

/// Locations of config, credentials, downloaded browser and logs
pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    /// Platform config directory, e.g. ~/.config/plex2letterboxd on Linux
    pub fn platform() -> Result<Self> {
        let config_root = dirs::config_dir().context("no platform config directory for this user")?;
        Ok(Self::from_base(config_root.join(APP_DIR)))
    }

    /// Everything under one directory (PLEX2LETTERBOXD_HOME, containers)
    pub fn from_base(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
        }
    }

    /// Explicit home wins, then the platform directory, then ./.plex2letterboxd
    pub fn resolve(home: Option<PathBuf>) -> Self {
        match home {
            Some(base) => Self::from_base(base),
            None => Self::platform().unwrap_or_else(|_| Self::from_base(PathBuf::from(".").join(format!(".{}", APP_DIR)))),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.config_dir.join("credentials.toml")
    }

    /// Where `init` downloads Chromium when none is installed
    pub fn browser_dir(&self) -> PathBuf {
        self.data_dir.join("chromium")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir, &self.log_dir] {
            std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
        }
        Ok(())
    }
}
