use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Errors from the durable token storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine data directory")]
    NoDataDir,
}

/// Durable key-value persistence for the session token.
///
/// Implementations only store and retrieve; trimming and empty-as-absent
/// normalization happen in [`CredentialStore`].
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Result<Option<String>, StoreError>;
    fn save(&self, token: &str) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Token storage in a plain file under the user data directory.
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default location: `<data dir>/taskpulse/token`.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let dir = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
        Ok(dir.join("taskpulse").join("token"))
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory token storage, for tests and ephemeral sessions.
struct MemoryTokenStorage {
    inner: Mutex<Option<String>>,
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.inner.lock().expect("token storage lock poisoned").clone())
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        *self.inner.lock().expect("token storage lock poisoned") = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.inner.lock().expect("token storage lock poisoned") = None;
        Ok(())
    }
}

/// The current session token, backed by durable storage.
///
/// Durable storage is the source of truth: `get` re-reads it whenever the
/// in-memory cache is absent, and `set` writes through before the cache is
/// updated, so the cache can never report a token the storage does not hold.
/// Whitespace-only stored values are treated as absent.
///
/// Cloning yields a shared handle over the same storage and cache.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn TokenStorage>,
    cached: Arc<Mutex<Option<String>>>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self {
            storage,
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Open over the default token file location.
    pub fn open_default() -> Result<Self, StoreError> {
        let path = FileTokenStorage::default_path()?;
        Ok(Self::new(Arc::new(FileTokenStorage::new(path))))
    }

    /// Open over in-memory storage.
    pub fn open_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStorage {
            inner: Mutex::new(None),
        }))
    }

    /// The current token, if any.
    ///
    /// A durable-storage read error is reported as an absent token: a token
    /// we cannot read is a token we cannot present.
    pub fn get(&self) -> Option<String> {
        let mut cached = self.cached.lock().expect("token cache lock poisoned");
        if cached.is_some() {
            return cached.clone();
        }
        let loaded = match self.storage.load() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("failed to read token storage: {}", e);
                None
            }
        };
        let token = loaded
            .map(|raw| raw.trim().to_string())
            .filter(|t| !t.is_empty());
        *cached = token.clone();
        token
    }

    /// Store a new token, writing through to durable storage first.
    pub fn set(&self, token: &str) -> Result<(), StoreError> {
        self.storage.save(token)?;
        *self.cached.lock().expect("token cache lock poisoned") = Some(token.to_string());
        Ok(())
    }

    /// Drop the token from durable storage and the cache.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.storage.clear()?;
        *self.cached.lock().expect("token cache lock poisoned") = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_trims_whitespace_from_stored_token() {
        let store = CredentialStore::open_memory();
        store.storage.save("  tok-1\n").unwrap();
        assert_eq!(store.get(), Some("tok-1".to_string()));
    }

    #[test]
    fn whitespace_only_token_is_absent() {
        let store = CredentialStore::open_memory();
        store.storage.save("   \n").unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = CredentialStore::open_memory();
        store.set("tok-2").unwrap();
        assert_eq!(store.get(), Some("tok-2".to_string()));
        store.clear().unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn clones_share_state() {
        let store = CredentialStore::open_memory();
        let other = store.clone();
        store.set("tok-3").unwrap();
        assert_eq!(other.get(), Some("tok-3".to_string()));
        other.clear().unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn file_storage_persists_across_stores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");

        let store = CredentialStore::new(Arc::new(FileTokenStorage::new(path.clone())));
        store.set("tok-4").unwrap();

        // A fresh store over the same file sees the token.
        let reopened = CredentialStore::new(Arc::new(FileTokenStorage::new(path.clone())));
        assert_eq!(reopened.get(), Some("tok-4".to_string()));

        reopened.clear().unwrap();
        let after_clear = CredentialStore::new(Arc::new(FileTokenStorage::new(path)));
        assert_eq!(after_clear.get(), None);
    }

    #[test]
    fn file_storage_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::new(dir.path().join("token"));
        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
    }
}
