//! In-memory substrate for testing and embedding.
//!
//! [`InMemoryKv`] stores all entries in a `HashMap` protected by a
//! `RwLock`. Every primitive takes the lock once, so `create_if_absent` is
//! atomic with respect to every other call on the same instance. Share one
//! instance between several stores with `Arc<InMemoryKv>`.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{KvError, KvResult};
use crate::pattern::glob_match;
use crate::traits::KvSubstrate;

/// An in-memory implementation of [`KvSubstrate`].
///
/// Data is lost when the substrate is dropped.
pub struct InMemoryKv {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryKv {
    /// Create a new empty substrate.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> KvResult<RwLockReadGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .read()
            .map_err(|e| KvError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> KvResult<RwLockWriteGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .write()
            .map_err(|e| KvError::LockPoisoned(e.to_string()))
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Returns `true` if the substrate holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of every key.
    pub fn keys(&self) -> KvResult<Vec<String>> {
        let mut keys: Vec<String> = self.read()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl Default for InMemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl KvSubstrate for InMemoryKv {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> KvResult<()> {
        self.write()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> KvResult<u64> {
        Ok(u64::from(self.write()?.remove(key).is_some()))
    }

    fn create_if_absent(&self, key: &str, value: &[u8]) -> KvResult<bool> {
        let mut entries = self.write()?;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_vec());
        Ok(true)
    }

    fn scan_keys(&self, pattern: &str) -> KvResult<Vec<String>> {
        Ok(self
            .read()?
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect())
    }
}

impl std::fmt::Debug for InMemoryKv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKv")
            .field("entry_count", &self.len())
            .finish()
    }
}
