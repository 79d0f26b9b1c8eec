// Token persistence. The token pair lives in the OS keychain (macOS
// Keychain, Windows Credential Manager, Linux Secret Service) and falls back
// to a private JSON file when no keychain can be reached.

use crate::constants::{ACCOUNT_NAME, SERVICE_NAME};
use crate::error::{CliError, Result};
use crate::secure_fs;
use keyring::{Entry, Error as KeyringError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Secret storage addressed by service and account name.
pub trait CredentialStore {
    fn get(&self, service: &str, account: &str) -> Result<Option<String>>;
    fn set(&self, service: &str, account: &str, secret: &str) -> Result<()>;
    /// Deleting a secret that does not exist is not an error.
    fn delete(&self, service: &str, account: &str) -> Result<()>;
}

/// Access and refresh token returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// The OS keychain, through the `keyring` crate.
#[derive(Debug, Default)]
pub struct KeyringStore;

impl KeyringStore {
    fn entry(service: &str, account: &str) -> Result<Entry> {
        Entry::new(service, account).map_err(map_keyring_error)
    }
}

fn map_keyring_error(e: KeyringError) -> CliError {
    match e {
        KeyringError::PlatformFailure(_) | KeyringError::NoStorageAccess(_) => {
            CliError::StoreUnavailable(e.to_string())
        }
        other => CliError::Credentials(other.to_string()),
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, service: &str, account: &str) -> Result<Option<String>> {
        match Self::entry(service, account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(KeyringError::NoEntry) => Ok(None),
            Err(e) => Err(map_keyring_error(e)),
        }
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> Result<()> {
        Self::entry(service, account)?
            .set_password(secret)
            .map_err(map_keyring_error)
    }

    fn delete(&self, service: &str, account: &str) -> Result<()> {
        match Self::entry(service, account)?.delete_password() {
            Ok(()) | Err(KeyringError::NoEntry) => Ok(()),
            Err(e) => Err(map_keyring_error(e)),
        }
    }
}

/// Plain JSON file of `service/account -> secret`, readable only by the owner.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn key(service: &str, account: &str) -> String {
        format!("{}/{}", service, account)
    }

    fn read(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, secrets: &BTreeMap<String, String>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(secrets)?;
        let mut file = secure_fs::create_private(&self.path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn get(&self, service: &str, account: &str) -> Result<Option<String>> {
        Ok(self.read()?.remove(&Self::key(service, account)))
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> Result<()> {
        let mut secrets = self.read()?;
        secrets.insert(Self::key(service, account), secret.to_string());
        self.write(&secrets)
    }

    fn delete(&self, service: &str, account: &str) -> Result<()> {
        let mut secrets = self.read()?;
        if secrets.remove(&Self::key(service, account)).is_some() {
            self.write(&secrets)?;
        }
        Ok(())
    }
}

/// Uses `primary` and switches to `fallback` whenever the primary store
/// reports that it is unavailable.
pub struct FallbackStore<P, F> {
    primary: P,
    fallback: F,
}

impl<P: CredentialStore, F: CredentialStore> FallbackStore<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: CredentialStore, F: CredentialStore> CredentialStore for FallbackStore<P, F> {
    fn get(&self, service: &str, account: &str) -> Result<Option<String>> {
        match self.primary.get(service, account) {
            Ok(Some(secret)) => Ok(Some(secret)),
            Ok(None) => self.fallback.get(service, account),
            Err(CliError::StoreUnavailable(reason)) => {
                warn!("OS keychain unavailable ({}), using credential file", reason);
                self.fallback.get(service, account)
            }
            Err(e) => Err(e),
        }
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> Result<()> {
        match self.primary.set(service, account, secret) {
            Err(CliError::StoreUnavailable(reason)) => {
                warn!("OS keychain unavailable ({}), using credential file", reason);
                self.fallback.set(service, account, secret)
            }
            other => other,
        }
    }

    fn delete(&self, service: &str, account: &str) -> Result<()> {
        // Clear the file first so a keychain failure cannot leave it behind.
        self.fallback.delete(service, account)?;
        match self.primary.delete(service, account) {
            Ok(()) | Err(CliError::StoreUnavailable(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Saves, loads and clears the token pair under the CLI's service/account.
pub struct TokenStore {
    backend: Box<dyn CredentialStore>,
    fallback_path: Option<PathBuf>,
}

impl TokenStore {
    pub fn new(backend: Box<dyn CredentialStore>) -> Self {
        Self {
            backend,
            fallback_path: None,
        }
    }

    /// OS keychain with a credential file in `dir` as fallback.
    pub fn system(dir: &Path) -> Self {
        let fallback = FileStore::new(dir.join(crate::constants::CREDENTIALS_FILE_NAME));
        let fallback_path = fallback.path().to_path_buf();
        Self {
            backend: Box::new(FallbackStore::new(KeyringStore, fallback)),
            fallback_path: Some(fallback_path),
        }
    }

    /// File the token pair goes to when the OS keychain is unreachable.
    pub fn fallback_path(&self) -> Option<&Path> {
        self.fallback_path.as_deref()
    }

    pub fn save(&self, tokens: &TokenPair) -> Result<()> {
        let payload = serde_json::to_string(tokens)?;
        self.backend.set(SERVICE_NAME, ACCOUNT_NAME, &payload)?;
        debug!("Stored token pair for {}/{}", SERVICE_NAME, ACCOUNT_NAME);
        Ok(())
    }

    pub fn load(&self) -> Result<Option<TokenPair>> {
        match self.backend.get(SERVICE_NAME, ACCOUNT_NAME)? {
            Some(payload) => {
                let tokens = serde_json::from_str(&payload).map_err(|e| {
                    CliError::Credentials(format!("stored token pair is unreadable: {}", e))
                })?;
                Ok(Some(tokens))
            }
            None => Ok(None),
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.backend.delete(SERVICE_NAME, ACCOUNT_NAME)?;
        debug!("Removed token pair for {}/{}", SERVICE_NAME, ACCOUNT_NAME);
        Ok(())
    }
}
