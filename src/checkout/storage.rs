//! Key-value persistence for checkout progress.

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind as IoErrorKind,
    path::{Path, PathBuf},
};

use parking_lot::{Mutex, RwLock};

use crate::error::{Error, Result};

/// Key holding the shipping form.
pub const SHIPPING_KEY: &str = "storefront.checkout.shipping";

/// Key holding the non-sensitive payment fields.
pub const PAYMENT_KEY: &str = "storefront.checkout.payment";

/// String key-value storage, the local-storage equivalent.
pub trait KeyValueStore: Send + Sync {
    /// Reads `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`; deleting a missing key succeeds.
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
///
/// Every write rewrites the file through a temporary sibling and a rename, so
/// a crash never leaves a half-written file behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Uses `path`; the file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                Error::invalid_response(format!(
                    "unreadable store file {}: {}",
                    self.path.display(),
                    e
                ))
                .with_source(e)
            }),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn KeyValueStore) {
        assert_eq!(store.get(SHIPPING_KEY).unwrap(), None);
        store.set(SHIPPING_KEY, "{\"city\":\"Oslo\"}").unwrap();
        store.set(PAYMENT_KEY, "{}").unwrap();
        assert_eq!(
            store.get(SHIPPING_KEY).unwrap().as_deref(),
            Some("{\"city\":\"Oslo\"}")
        );
        store.remove(SHIPPING_KEY).unwrap();
        store.remove(SHIPPING_KEY).unwrap();
        assert_eq!(store.get(SHIPPING_KEY).unwrap(), None);
        assert_eq!(store.get(PAYMENT_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        exercise(&store);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("checkout.json");

        exercise(&FileStore::new(&path));
        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get(PAYMENT_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkout.json");
        fs::write(&path, "not json").unwrap();

        let err = FileStore::new(&path).get(SHIPPING_KEY).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidResponse);
    }
}
