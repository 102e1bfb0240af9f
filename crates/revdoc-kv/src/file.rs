//! Single-file JSON substrate.
//!
//! [`FileKv`] keeps the whole key space in memory and mirrors it to one
//! JSON object file. Every mutation rewrites the file through a temporary
//! file in the same directory followed by a rename, so a crash leaves either
//! the old or the new key space on disk, never a torn one.
//!
//! Atomicity of `create_if_absent` holds within one process only. Values
//! must be UTF-8, which every value the document store writes is.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{KvError, KvResult};
use crate::pattern::glob_match;
use crate::traits::KvSubstrate;

type Entries = BTreeMap<String, String>;

/// A [`KvSubstrate`] persisted to a JSON file.
#[derive(Debug)]
pub struct FileKv {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl FileKv {
    /// Open the key space stored at `path`. A missing file is an empty key
    /// space; the file is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> KvResult<Self> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => Entries::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| KvError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Entries::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), entries = entries.len(), "opened file substrate");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> KvResult<MutexGuard<'_, Entries>> {
        self.entries
            .lock()
            .map_err(|e| KvError::LockPoisoned(e.to_string()))
    }

    /// Apply `f` to a copy of the key space, persist the copy, then make it
    /// current. The file and the in-memory state change together or not at
    /// all.
    fn mutate<R>(&self, f: impl FnOnce(&mut Entries) -> (R, bool)) -> KvResult<R> {
        let mut entries = self.lock()?;
        let mut next = entries.clone();
        let (result, changed) = f(&mut next);
        if changed {
            self.persist(&next)?;
            *entries = next;
        }
        Ok(result)
    }

    fn persist(&self, entries: &Entries) -> KvResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, entries).map_err(std::io::Error::from)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| KvError::Io(e.error))?;
        Ok(())
    }
}

fn utf8(key: &str, value: &[u8]) -> KvResult<String> {
    String::from_utf8(value.to_vec()).map_err(|e| KvError::UnsupportedValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

impl KvSubstrate for FileKv {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        Ok(self.lock()?.get(key).map(|v| v.clone().into_bytes()))
    }

    fn set(&self, key: &str, value: &[u8]) -> KvResult<()> {
        let value = utf8(key, value)?;
        self.mutate(|entries| {
            let changed = entries.get(key) != Some(&value);
            entries.insert(key.to_string(), value);
            ((), changed)
        })
    }

    fn delete(&self, key: &str) -> KvResult<u64> {
        self.mutate(|entries| {
            let removed = entries.remove(key).is_some();
            (u64::from(removed), removed)
        })
    }

    fn create_if_absent(&self, key: &str, value: &[u8]) -> KvResult<bool> {
        let value = utf8(key, value)?;
        self.mutate(|entries| {
            if entries.contains_key(key) {
                return (false, false);
            }
            entries.insert(key.to_string(), value);
            (true, true)
        })
    }

    fn scan_keys(&self, pattern: &str) -> KvResult<Vec<String>> {
        Ok(self
            .lock()?
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn data_path(dir: &TempDir) -> PathBuf {
        dir.path().join("revdoc.json")
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let kv = FileKv::open(data_path(&dir)).unwrap();
        assert!(kv.scan_keys("*").unwrap().is_empty());
        assert!(!data_path(&dir).exists());
    }

    #[test]
    fn writes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let kv = FileKv::open(data_path(&dir)).unwrap();
            kv.set("workitems/wi0", b"1").unwrap();
            assert!(kv.create_if_absent("workitems/wi0/1", b"{\"a\":1}").unwrap());
            kv.set("msgs/m1", b"{}").unwrap();
            assert_eq!(kv.delete("msgs/m1").unwrap(), 1);
        }

        let kv = FileKv::open(data_path(&dir)).unwrap();
        assert_eq!(kv.get("workitems/wi0").unwrap(), Some(b"1".to_vec()));
        assert_eq!(
            kv.get("workitems/wi0/1").unwrap(),
            Some(b"{\"a\":1}".to_vec())
        );
        assert_eq!(kv.get("msgs/m1").unwrap(), None);
    }

    #[test]
    fn create_if_absent_keeps_first_value() {
        let dir = TempDir::new().unwrap();
        let kv = FileKv::open(data_path(&dir)).unwrap();
        assert!(kv.create_if_absent("k", b"first").unwrap());
        assert!(!kv.create_if_absent("k", b"second").unwrap());
        assert_eq!(kv.get("k").unwrap(), Some(b"first".to_vec()));
    }

    #[test]
    fn delete_missing_key_does_not_touch_file() {
        let dir = TempDir::new().unwrap();
        let kv = FileKv::open(data_path(&dir)).unwrap();
        assert_eq!(kv.delete("ghost").unwrap(), 0);
        assert!(!data_path(&dir).exists());
    }

    #[test]
    fn non_utf8_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let kv = FileKv::open(data_path(&dir)).unwrap();
        let err = kv.set("k", &[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, KvError::UnsupportedValue { .. }));
        assert_eq!(kv.get("k").unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(data_path(&dir), b"not json").unwrap();
        let err = FileKv::open(data_path(&dir)).unwrap_err();
        assert!(matches!(err, KvError::Corrupt { .. }));
    }

    #[test]
    fn scan_uses_glob_patterns() {
        let dir = TempDir::new().unwrap();
        let kv = FileKv::open(data_path(&dir)).unwrap();
        kv.set("workitems/wi0", b"1").unwrap();
        kv.set("workitems/wi0/1", b"{}").unwrap();
        kv.set("expressions/0_0", b"1").unwrap();
        assert_eq!(
            kv.scan_keys("workitems/*").unwrap(),
            vec!["workitems/wi0", "workitems/wi0/1"]
        );
    }
}
