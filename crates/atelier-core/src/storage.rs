use crate::config::StorageConfig;
use crate::error::{CoreError, CoreResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Durable client-side string storage, shaped like the browser's.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> CoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;
    fn remove(&self, key: &str) -> CoreResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Key-value store persisted as a single JSON object on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    pub fn open(path: PathBuf) -> CoreResult<Self> {
        let entries = if path.exists() {
            let data = fs::read_to_string(&path)?;
            if data.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    /// The in-memory view only changes once the file write succeeded.
    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        let mut entries = self.entries.lock();
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

/// Builds the store described by `cfg`, in memory when no path is set.
pub fn open_store(cfg: &StorageConfig) -> CoreResult<Arc<dyn KeyValueStore>> {
    match &cfg.path {
        Some(path) => {
            let store = JsonFileStore::open(path.clone()).map_err(|err| {
                CoreError::Storage(format!("cannot open {}: {err}", path.display()))
            })?;
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(MemoryStore::new())),
    }
}
