use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Secrets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plex_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    letterboxd_password: Option<String>,
}

/// Secrets kept out of config.toml, in credentials.toml next to it
pub struct CredentialStore {
    path: PathBuf,
    secrets: Secrets,
}

impl CredentialStore {
    /// Empty store bound to `path`; nothing is read
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            secrets: Secrets::default(),
        }
    }

    /// Read the store at `path`. A missing file is an empty store.
    pub fn open(path: PathBuf) -> Result<Self> {
        let secrets = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)
                .with_context(|| format!("{} is not valid TOML", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Secrets::default(),
            Err(e) => return Err(e).with_context(|| format!("cannot read {}", path.display())),
        };
        Ok(Self { path, secrets })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Written owner-only on unix
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string_pretty(&self.secrets)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    pub fn plex_token(&self) -> Option<&str> {
        self.secrets.plex_token.as_deref()
    }

    pub fn set_plex_token(&mut self, token: impl Into<String>) {
        self.secrets.plex_token = Some(token.into());
    }

    pub fn letterboxd_password(&self) -> Option<&str> {
        self.secrets.letterboxd_password.as_deref()
    }

    pub fn set_letterboxd_password(&mut self, password: impl Into<String>) {
        self.secrets.letterboxd_password = Some(password.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_secrets_survive_save_and_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.toml");

        let mut store = CredentialStore::new(path.clone());
        store.set_plex_token("plex_token_value");
        store.set_letterboxd_password("boxd_password");
        store.save().unwrap();

        let reopened = CredentialStore::open(path.clone()).unwrap();
        assert_eq!(reopened.path(), path.as_path());
        assert_eq!(reopened.plex_token(), Some("plex_token_value"));
        assert_eq!(reopened.letterboxd_password(), Some("boxd_password"));
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::open(dir.path().join("absent.toml")).unwrap();
        assert_eq!(store.plex_token(), None);
        assert_eq!(store.letterboxd_password(), None);
    }

    #[test]
    fn test_unset_secret_is_not_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        let mut store = CredentialStore::new(path.clone());
        store.set_plex_token("t");
        store.save().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("plex_token"));
        assert!(!content.contains("letterboxd_password"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "plex_token = ").unwrap();
        assert!(CredentialStore::open(path).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.toml");
        let mut store = CredentialStore::new(path.clone());
        store.set_plex_token("t");
        store.save().unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
