//! Key-value blob storage for the persisted cart.
//!
//! The cart is persisted the way a browser would keep it in local storage: a
//! single string key mapped to the JSON-encoded cart, read once at startup
//! and overwritten wholesale after every successful mutation.
//!
//! - [`MemoryBlobStore`] - process-local map, shared by clones
//! - [`FileBlobStore`] - JSON object of key → string in one file, replaced atomically
//! - [`CartPersistence`] - binds a blob store and key to (de)serialization of [`CartState`]

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rocketshoes_core::CartState;
use thiserror::Error;

/// Errors raised by blob stores.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Encoding the blob failed.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A previous writer panicked while holding the lock.
    #[error("Blob store lock poisoned")]
    Poisoned,
}

/// String-keyed blob storage.
pub trait BlobStore: Send + Sync {
    /// Read the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written. The
    /// previous value is kept in that case.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory blob store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Blob store backed by a single JSON file.
///
/// The whole file is loaded on open. Each `set` writes a temporary sibling
/// and renames it over the original, so a crash mid-write never leaves a
/// truncated file behind.
#[derive(Debug)]
pub struct FileBlobStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileBlobStore {
    /// Open (or lazily create) a blob file.
    ///
    /// A missing file is an empty store. A file that is not a JSON object of
    /// strings is logged and treated as empty; it is replaced on the next write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Blob file is corrupt, starting empty"
                );
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let body = serde_json::to_string_pretty(entries)?;
        let tmp = temp_path(&self.path);
        let written = fs::write(&tmp, body).and_then(|()| fs::rename(&tmp, &self.path));

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(io_err(e));
        }
        Ok(())
    }
}

/// Hidden sibling used while replacing `path`: `dir/cart.json` -> `dir/.cart.json.tmp`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    name.push(path.file_name().unwrap_or_else(|| path.as_os_str()));
    name.push(".tmp");
    path.with_file_name(name)
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;

        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.write_file(&next)?;

        *entries = next;
        Ok(())
    }
}

/// Persistence adapter: the cart, JSON-encoded under one key of a blob store.
#[derive(Clone)]
pub struct CartPersistence {
    blobs: Arc<dyn BlobStore>,
    key: String,
}

impl CartPersistence {
    /// Bind a blob store and key.
    pub fn new(blobs: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self {
            blobs,
            key: key.into(),
        }
    }

    /// Key the cart is stored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Rehydrate the persisted cart.
    ///
    /// A missing key yields an empty cart. A blob that does not decode to a
    /// valid cart (bad JSON, zero amounts, duplicate ids) is discarded with a
    /// warning and an empty cart is returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if the blob store itself cannot be read.
    pub fn load(&self) -> Result<CartState, StorageError> {
        let Some(raw) = self.blobs.get(&self.key)? else {
            return Ok(CartState::new());
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key = %self.key, error = %e, "Discarding invalid persisted cart");
            CartState::new()
        }))
    }

    /// Overwrite the persisted cart.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the blob write fails.
    pub fn save(&self, cart: &CartState) -> Result<(), StorageError> {
        let raw = serde_json::to_string(cart)?;
        self.blobs.set(&self.key, &raw)
    }
}

impl std::fmt::Debug for CartPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartPersistence")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rocketshoes_core::{CatalogProduct, Price, ProductId};

    use super::*;

    fn cart_with(ids: &[i32]) -> CartState {
        let mut cart = CartState::new();
        for &id in ids {
            cart.insert_new(CatalogProduct {
                id: ProductId::new(id),
                title: format!("Tenis {id}"),
                price: Price::from_cents(13990),
                image: format!("https://cdn.example.com/{id}.jpg"),
            });
        }
        cart
    }

    #[test]
    fn test_memory_store_clones_share_entries() {
        let store = MemoryBlobStore::new();
        let other = store.clone();
        store.set("cart", "[]").unwrap();
        assert_eq!(other.get("cart").unwrap().as_deref(), Some("[]"));
        assert!(other.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::open(dir.path().join("nested/cart.json")).unwrap();
        assert!(store.get("cart").unwrap().is_none());
    }

    #[test]
    fn test_file_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/blobs.json");

        let store = FileBlobStore::open(&path).unwrap();
        store.set("cart", "[1]").unwrap();
        store.set("theme", "dark").unwrap();
        drop(store);

        let reopened = FileBlobStore::open(&path).unwrap();
        assert_eq!(reopened.get("cart").unwrap().as_deref(), Some("[1]"));
        assert_eq!(reopened.get("theme").unwrap().as_deref(), Some("dark"));
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_file_store_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blobs.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileBlobStore::open(&path).unwrap();
        assert!(store.get("cart").unwrap().is_none());

        store.set("cart", "[]").unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"cart\""));
    }

    #[test]
    fn test_file_store_failed_write_keeps_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("sub");
        let store = FileBlobStore::open(parent.join("blobs.json")).unwrap();

        // Parent "directory" is now a regular file, so every write fails.
        fs::write(&parent, "plain file").unwrap();
        let err = store.set("cart", "[]").unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
        assert!(store.get("cart").unwrap().is_none());
    }

    #[test]
    fn test_temp_path_keeps_full_file_name() {
        let dir = Path::new("/var/lib/rocketshoes");
        assert_eq!(
            temp_path(&dir.join("cart.json")),
            dir.join(".cart.json.tmp")
        );
        assert_ne!(
            temp_path(&dir.join("cart.json")),
            temp_path(&dir.join("cart.yaml"))
        );
    }

    #[test]
    fn test_file_store_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        let store = FileBlobStore::open(&path).unwrap();

        // A non-empty directory now sits where the file should go.
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let err = store.set("cart", "[]").unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
        assert!(!temp_path(&path).exists());
        assert!(store.get("cart").unwrap().is_none());
    }

    #[test]
    fn test_persistence_missing_key_is_empty_cart() {
        let persistence = CartPersistence::new(Arc::new(MemoryBlobStore::new()), "cart");
        assert!(persistence.load().unwrap().is_empty());
    }

    #[test]
    fn test_persistence_save_then_load() {
        let blobs = MemoryBlobStore::new();
        let persistence = CartPersistence::new(Arc::new(blobs.clone()), "cart");
        let cart = cart_with(&[1, 5]);

        persistence.save(&cart).unwrap();

        assert_eq!(persistence.load().unwrap(), cart);
        let raw = blobs.get("cart").unwrap().unwrap();
        assert!(raw.starts_with('['));
    }

    #[test]
    fn test_persistence_discards_invalid_blob() {
        let blobs = MemoryBlobStore::new();
        blobs
            .set(
                "cart",
                r#"[{"id":1,"title":"A","price":10.5,"image":"a","amount":0}]"#,
            )
            .unwrap();
        let persistence = CartPersistence::new(Arc::new(blobs), "cart");
        assert!(persistence.load().unwrap().is_empty());
    }
}
