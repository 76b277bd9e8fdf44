//! In-memory key/value store.

use std::{collections::HashMap, sync::Mutex};

use super::{error::StorageError, traits::KeyValueStore, StorageResult};

/// A [`KeyValueStore`] backed by a mutex-guarded map.
///
/// This is the default ephemeral (tab-scoped) store and the test double
/// for the durable one. Hosts embedding the SDK supply their own durable
/// implementation over whatever the platform persists.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("store mutex poisoned".to_string()))?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Backend("store mutex poisoned".to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Backend("store mutex poisoned".to_string()))?
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove_round_trip() {
        let store = MemoryStore::new();
        assert!(store.get("k").expect("get").is_none());

        store.set("k", "v1").expect("set");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v1"));

        store.set("k", "v2").expect("overwrite");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v2"));

        store.remove("k").expect("remove");
        assert!(store.get("k").expect("get").is_none());

        // removing an absent key is fine
        store.remove("k").expect("remove absent");
    }
}
