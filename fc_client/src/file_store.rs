//! File-backed local store.
//!
//! Keeps the whole key/value map in memory and rewrites a single JSON file on
//! every change, which is plenty for a handful of flags and one cached
//! profile.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use fortune_cookie::store::{LocalStore, StoreResult};

/// JSON map file implementing [`LocalStore`]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating it on first write
    ///
    /// # Errors
    ///
    /// Returns a store error if the file exists but cannot be read or parsed
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        log::debug!("Local store at {} holds {} keys", path.display(), entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `change` to a copy and keep it only once it is on disk
    fn update<F>(&self, change: F) -> StoreResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let mut entries = self.entries();
        let mut next = entries.clone();
        if change(&mut next) {
            self.persist(&next)?;
            *entries = next;
        }
        Ok(())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(entries)?;

        // Atomic replace
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.update(|entries| entries.remove(key).is_some())
    }

    fn keys(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }
}
