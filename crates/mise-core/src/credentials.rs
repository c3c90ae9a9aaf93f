//! User-level credential file (`~/.mise/credentials.yaml`).
//!
//! A flat `name: value` YAML map. Values are never logged; display code
//! goes through [`mask_secret`].

use crate::error::{MiseError, Result};
use crate::io;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment override for the credential file location.
pub const CREDENTIALS_ENV: &str = "MISE_CREDENTIALS";

const MASK_MIN_LEN: usize = 12;
const MASK_PREFIX: usize = 3;
const MASK_SUFFIX: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialFile {
    entries: BTreeMap<String, String>,
}

impl CredentialFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        io::atomic_write(path, content.as_bytes())?;
        restrict_permissions(path)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.entries.insert(name.to_string(), value.to_string());
    }

    /// Returns `true` if an entry was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }
}

/// `$MISE_CREDENTIALS` if set, else `~/.mise/credentials.yaml`.
pub fn default_credentials_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(CREDENTIALS_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    paths::user_mise_dir()
        .map(|d| d.join(paths::CREDENTIALS_FILE))
        .ok_or(MiseError::HomeNotFound)
}

/// Obfuscated display form of a secret: `sk-…wxyz` for long values,
/// `••••` otherwise. Never more than seven visible characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.trim().chars().collect();
    if chars.len() < MASK_MIN_LEN {
        return "\u{2022}\u{2022}\u{2022}\u{2022}".to_string();
    }
    let head: String = chars[..MASK_PREFIX].iter().collect();
    let tail: String = chars[chars.len() - MASK_SUFFIX..].iter().collect();
    format!("{head}\u{2026}{tail}")
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let creds = CredentialFile::load(&dir.path().join("nope.yaml")).unwrap();
        assert!(creds.get("openAiApiKey").is_none());
    }

    #[test]
    fn set_save_load_remove() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/credentials.yaml");
        let mut creds = CredentialFile::default();
        creds.set("openAiApiKey", "sk-test-1234567890");
        creds.save(&path).unwrap();

        let mut loaded = CredentialFile::load(&path).unwrap();
        assert_eq!(loaded.get("openAiApiKey"), Some("sk-test-1234567890"));
        assert!(loaded.remove("openAiApiKey"));
        assert!(!loaded.remove("openAiApiKey"));
        loaded.save(&path).unwrap();
        assert!(CredentialFile::load(&path).unwrap().get("openAiApiKey").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.yaml");
        CredentialFile::default().save(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn mask_never_contains_full_secret() {
        let key = "sk-proj-abcdefghijklmnopqrstuvwxyz";
        let hint = mask_secret(key);
        assert_eq!(hint, "sk-\u{2026}wxyz");
        assert!(!hint.contains(key));
        assert!(hint.chars().filter(|c| *c != '\u{2026}').count() <= 7);
    }

    #[test]
    fn short_secrets_are_fully_masked() {
        assert_eq!(mask_secret("abc"), "\u{2022}\u{2022}\u{2022}\u{2022}");
        assert_eq!(mask_secret("12345678901"), "\u{2022}\u{2022}\u{2022}\u{2022}");
        assert_eq!(mask_secret(""), "\u{2022}\u{2022}\u{2022}\u{2022}");
    }
}
