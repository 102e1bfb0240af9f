//! The [`KvSubstrate`] trait defining the substrate contract.

use std::sync::Arc;

use crate::error::KvResult;

/// A flat key-value namespace.
///
/// Implementations must be thread-safe (`Send + Sync`). Each call is one
/// independent round trip; no ordering is promised between calls made by
/// different clients, except that [`create_if_absent`] has exactly one
/// winner per key.
///
/// [`create_if_absent`]: KvSubstrate::create_if_absent
pub trait KvSubstrate: Send + Sync {
    /// Read the value at `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>>;

    /// Write `value` at `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> KvResult<()>;

    /// Remove `key`. Returns the number of entries removed (0 or 1).
    fn delete(&self, key: &str) -> KvResult<u64>;

    /// Atomically write `value` at `key` only if the key does not exist.
    ///
    /// Returns `Ok(true)` if this call created the entry. Of any number of
    /// concurrent calls for the same absent key, exactly one returns `true`.
    fn create_if_absent(&self, key: &str, value: &[u8]) -> KvResult<bool>;

    /// List every key matching a glob `pattern` (see [`crate::pattern`]).
    ///
    /// Order is unspecified.
    fn scan_keys(&self, pattern: &str) -> KvResult<Vec<String>>;
}

impl<T: KvSubstrate + ?Sized> KvSubstrate for Arc<T> {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> KvResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> KvResult<u64> {
        (**self).delete(key)
    }

    fn create_if_absent(&self, key: &str, value: &[u8]) -> KvResult<bool> {
        (**self).create_if_absent(key, value)
    }

    fn scan_keys(&self, pattern: &str) -> KvResult<Vec<String>> {
        (**self).scan_keys(pattern)
    }
}

impl<T: KvSubstrate + ?Sized> KvSubstrate for Box<T> {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> KvResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> KvResult<u64> {
        (**self).delete(key)
    }

    fn create_if_absent(&self, key: &str, value: &[u8]) -> KvResult<bool> {
        (**self).create_if_absent(key, value)
    }

    fn scan_keys(&self, pattern: &str) -> KvResult<Vec<String>> {
        (**self).scan_keys(pattern)
    }
}
