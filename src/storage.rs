//! Client-side key/value storage. It plays the role browser local storage plays
//! for the web frontend: one key holds the bearer credential and another the
//! theme preference. The file-backed store rewrites the whole document on each
//! change and restricts it to the owner, since it holds a bearer credential.

use crate::client::AppError;
use crate::session::Credential;
use std::{
    collections::BTreeMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use thiserror::Error;
use tracing::{debug, instrument};

/// Storage key for the bearer credential.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key for the light/dark preference.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err.to_string())
    }
}

/// Minimal string key/value store.
pub trait ClientStorage: Send + Sync {
    /// # Errors
    /// Returns an error if the backing store cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process store, used by tests and short-lived sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.remove(key);
        Ok(())
    }
}

/// JSON document on disk mapping keys to string values.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_document(&self, document: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        write_private(&tmp, &serde_json::to_vec_pretty(document)?)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), "storage document written");
        Ok(())
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut document = self.read_document()?;
        apply(&mut document);
        self.write_document(&document)
    }
}

impl ClientStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.read_document()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|document| {
            document.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.update(|document| {
            document.remove(key);
        })
    }
}

/// Writes `contents` to a file that is owner-only from the moment it exists.
fn write_private(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // `mode` only applies on creation; a leftover file keeps its old bits.
    restrict_permissions(path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), StorageError> {
    Ok(())
}

/// Default location of the storage document: `$HOME/.instipass/storage.json`.
#[must_use]
pub fn default_store_path() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(".instipass")
        .join("storage.json")
}

/// The single credential slot shared by the gate and the verifier.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn ClientStorage>,
}

impl CredentialStore {
    #[must_use]
    pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
        Self { storage }
    }

    /// Reads the stored credential; blank values count as absent.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be read.
    #[instrument(skip(self))]
    pub fn load(&self) -> Result<Option<Credential>, StorageError> {
        Ok(self
            .storage
            .get_item(ACCESS_TOKEN_KEY)?
            .and_then(Credential::new))
    }

    /// # Errors
    /// Returns an error if the backing store cannot be written.
    #[instrument(skip(self, credential))]
    pub fn save(&self, credential: &Credential) -> Result<(), StorageError> {
        self.storage.set_item(ACCESS_TOKEN_KEY, credential.expose())
    }

    /// # Errors
    /// Returns an error if the backing store cannot be written.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove_item(ACCESS_TOKEN_KEY)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_roundtrip_and_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("k").unwrap(), None);
        storage.set_item("k", "v").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
        storage.remove_item("k").unwrap();
        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn file_storage_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("storage.json"));
        assert_eq!(storage.get_item(ACCESS_TOKEN_KEY).unwrap(), None);
        storage.remove_item(ACCESS_TOKEN_KEY).unwrap();
    }

    #[test]
    fn file_storage_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let storage = FileStorage::new(&path);

        storage.set_item(THEME_KEY, "dark").unwrap();
        storage.set_item(ACCESS_TOKEN_KEY, "abc").unwrap();
        storage.remove_item(ACCESS_TOKEN_KEY).unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get_item(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert_eq!(reopened.get_item(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn file_storage_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        FileStorage::new(&path).set_item(ACCESS_TOKEN_KEY, "abc").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn file_storage_tightens_leftover_temp_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, "stale").unwrap();
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o644)).unwrap();

        FileStorage::new(&path).set_item(ACCESS_TOKEN_KEY, "abc").unwrap();

        assert!(!tmp.exists());
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(
            FileStorage::new(&path).get_item(ACCESS_TOKEN_KEY).unwrap().as_deref(),
            Some("abc")
        );
    }

    #[cfg(unix)]
    #[test]
    fn write_private_creates_owner_only_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.tmp");
        write_private(&path, b"{}").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn file_storage_rejects_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let result = FileStorage::new(&path).get_item(ACCESS_TOKEN_KEY);
        assert!(matches!(result, Err(StorageError::Json(_))));
    }

    #[test]
    fn credential_store_treats_blank_as_absent() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(ACCESS_TOKEN_KEY, "   ").unwrap();
        let store = CredentialStore::new(storage);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn credential_store_save_and_clear() {
        let store = CredentialStore::new(Arc::new(MemoryStorage::new()));
        let credential = Credential::new("bearer-123".to_string()).unwrap();

        store.save(&credential).unwrap();
        assert_eq!(store.load().unwrap().unwrap().expose(), "bearer-123");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
