use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::InkpadError;

use super::token::StoredCredential;

/// Holds the current access token for the whole process.
///
/// Reads after a `set` in the same process must observe the new value.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<String>;

    fn set(&self, token: &str);

    fn clear(&self);

    /// Long-lived token sent to the refresh endpoint, when the server issues one.
    fn refresh_token(&self) -> Option<String> {
        None
    }

    fn set_refresh_token(&self, _token: Option<&str>) {}
}

impl std::fmt::Debug for dyn CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("has_token", &self.get().is_some())
            .finish()
    }
}

/// In-process store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    current: RwLock<Option<StoredCredential>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            current: RwLock::new(Some(StoredCredential::new(token))),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self) -> Option<String> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map(|c| c.access_token.clone())
    }

    fn set(&self, token: &str) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        replace_access_token(&mut guard, token);
    }

    fn clear(&self) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    fn refresh_token(&self) -> Option<String> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().and_then(|c| c.refresh_token.clone())
    }

    fn set_refresh_token(&self, token: Option<&str>) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        if let Some(cred) = guard.as_mut() {
            cred.refresh_token = token.map(str::to_string);
        }
    }
}

/// A new access token keeps the refresh token it was issued alongside.
fn replace_access_token(slot: &mut Option<StoredCredential>, token: &str) {
    match slot {
        Some(cred) => {
            cred.access_token = token.to_string();
            cred.saved_at = chrono::Utc::now();
        }
        None => *slot = Some(StoredCredential::new(token)),
    }
}

/// Store backed by a JSON file, with an in-memory copy as the source of truth
/// for reads. Disk failures are logged and never surface to callers.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    current: RwLock<Option<StoredCredential>>,
}

impl FileStore {
    /// Open the store at `path`, loading whatever credential is already there.
    /// An unreadable or corrupt file counts as "logged out".
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match load_credential(&path) {
            Ok(cred) => cred,
            Err(e) => {
                tracing::warn!("Ignoring unreadable credential file {}: {e}", path.display());
                None
            }
        };
        Self {
            path,
            current: RwLock::new(current),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The full record, including when it was written.
    pub fn credential(&self) -> Option<StoredCredential> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    fn persist(&self, cred: Option<&StoredCredential>) {
        let result = match cred {
            Some(cred) => save_credential(&self.path, cred),
            None => remove_credential(&self.path),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to update credential file {}: {e}", self.path.display());
        }
    }
}

impl CredentialStore for FileStore {
    fn get(&self) -> Option<String> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map(|c| c.access_token.clone())
    }

    fn set(&self, token: &str) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        replace_access_token(&mut guard, token);
        self.persist(guard.as_ref());
    }

    fn clear(&self) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        self.persist(None);
    }

    fn refresh_token(&self) -> Option<String> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().and_then(|c| c.refresh_token.clone())
    }

    fn set_refresh_token(&self, token: Option<&str>) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        if let Some(cred) = guard.as_mut() {
            cred.refresh_token = token.map(str::to_string);
            self.persist(guard.as_ref());
        }
    }
}

pub fn load_credential(path: &Path) -> Result<Option<StoredCredential>, InkpadError> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let cred = serde_json::from_str(&data).map_err(|e| {
        InkpadError::ProtocolError(format!("Invalid credential file {}: {e}", path.display()))
    })?;
    Ok(Some(cred))
}

pub fn save_credential(path: &Path, cred: &StoredCredential) -> Result<(), InkpadError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(cred).map_err(|e| {
        InkpadError::ProtocolError(format!("Failed to serialize credential: {e}"))
    })?;

    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(data.as_bytes())?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, data)?;
    }

    tracing::debug!("Credential saved to {}", path.display());
    Ok(())
}

fn remove_credential(path: &Path) -> Result<(), InkpadError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
