use async_trait::async_trait;
use mise_core::credentials::{self, CredentialFile};
use mise_core::{MiseError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Fixed secret-store key for the OpenAI credential.
pub const API_KEY_SECRET: &str = "openAiApiKey";

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn store(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileSecretStore
// ---------------------------------------------------------------------------

/// Secrets persisted in the user credential file.
pub struct FileSecretStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileSecretStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Store at `$MISE_CREDENTIALS` or `~/.mise/credentials.yaml`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(credentials::default_credentials_path()?))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut CredentialFile) + Send + 'static,
    {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut file = CredentialFile::load(&path)?;
            f(&mut file);
            file.save(&path)
        })
        .await
        .map_err(join_error)?
    }
}

fn join_error(e: tokio::task::JoinError) -> MiseError {
    MiseError::Io(std::io::Error::other(e))
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let file = CredentialFile::load(&path)?;
            Ok(file.get(&key).map(str::to_string))
        })
        .await
        .map_err(join_error)?
    }

    async fn store(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.update(move |file| file.set(&key, &value)).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.update(move |file| {
            file.remove(&key);
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// MemorySecretStore
// ---------------------------------------------------------------------------

/// Process-local store; nothing survives a restart.
#[derive(Default)]
pub struct MemorySecretStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        store
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn store(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
