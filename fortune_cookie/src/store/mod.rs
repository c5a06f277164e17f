//! Persisted client-local key/value state.
//!
//! Everything a client keeps between page loads lives
//! behind [`LocalStore`]: profile cache entries, the legacy backend identity,
//! and the short-lived guard flags that must survive a same-tab redirect.
//! Writes are last-write-wins; there is no cross-key atomicity.

pub mod keys;

use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};
use thiserror::Error;

pub use keys::Flag;

/// Local store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing file could not be read or written
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be (de)serialized
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for local store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// String key/value storage shared by every component of a client.
pub trait LocalStore: Send + Sync {
    /// Read a raw value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a raw value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a key; removing a missing key is not an error
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// All keys currently present
    fn keys(&self) -> Vec<String>;
}

/// Read and decode a JSON value. Undecodable entries are treated as absent.
pub fn get_json<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Discarding undecodable value under '{}': {}", key, e);
            None
        }
    }
}

/// Encode and write a JSON value
pub fn set_json<T: Serialize>(store: &dyn LocalStore, key: &str, value: &T) -> StoreResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// Remove every key starting with `prefix`, returning how many were removed
pub fn remove_prefixed(store: &dyn LocalStore, prefix: &str) -> StoreResult<usize> {
    let mut removed = 0;
    for key in store.keys().into_iter().filter(|k| k.starts_with(prefix)) {
        store.remove(&key)?;
        removed += 1;
    }
    Ok(removed)
}

/// Whether a guard flag is currently raised
pub fn flag_is_set(store: &dyn LocalStore, flag: Flag) -> bool {
    matches!(store.get(flag.key()).as_deref(), Some("true"))
}

/// Whether the callback flow checked this user's login; a marker left for
/// anyone else does not count
pub fn login_checked_for(store: &dyn LocalStore, user_id: &str) -> bool {
    !user_id.is_empty()
        && store.get(Flag::AuthCheckCompleted.key()).as_deref() == Some(user_id)
}

/// Record that the callback flow checked this user's login
pub fn mark_login_checked(store: &dyn LocalStore, user_id: &str) -> StoreResult<()> {
    store.set(Flag::AuthCheckCompleted.key(), user_id)
}

/// In-memory store, used by tests and by short-lived CLI runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }
}
