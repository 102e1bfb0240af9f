//! Fault-injecting substrate for store tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use revdoc_kv::{InMemoryKv, KvError, KvResult, KvSubstrate};

type Hook = Box<dyn FnOnce() + Send>;

/// Wraps an [`InMemoryKv`] and lets a test fail primitives or run code
/// at a chosen point inside a store operation.
#[derive(Default)]
pub(crate) struct ScriptedKv {
    inner: Arc<InMemoryKv>,
    fail_all: AtomicBool,
    fail_deletes: AtomicBool,
    before_create: Mutex<Option<Hook>>,
}

impl ScriptedKv {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The wrapped substrate, for rival stores that bypass the faults.
    pub(crate) fn inner(&self) -> &Arc<InMemoryKv> {
        &self.inner
    }

    pub(crate) fn fail_all(&self, on: bool) {
        self.fail_all.store(on, Ordering::SeqCst);
    }

    pub(crate) fn fail_deletes(&self, on: bool) {
        self.fail_deletes.store(on, Ordering::SeqCst);
    }

    /// Run `hook` once, just before the next `create_if_absent` reaches
    /// the wrapped substrate.
    pub(crate) fn before_next_create(&self, hook: impl FnOnce() + Send + 'static) {
        *self.before_create.lock().unwrap() = Some(Box::new(hook));
    }

    fn check(&self) -> KvResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable("injected failure".into()));
        }
        Ok(())
    }
}

impl KvSubstrate for ScriptedKv {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        self.check()?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> KvResult<()> {
        self.check()?;
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> KvResult<u64> {
        self.check()?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable("injected delete failure".into()));
        }
        self.inner.delete(key)
    }

    fn create_if_absent(&self, key: &str, value: &[u8]) -> KvResult<bool> {
        self.check()?;
        let hook = self.before_create.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        self.inner.create_if_absent(key, value)
    }

    fn scan_keys(&self, pattern: &str) -> KvResult<Vec<String>> {
        self.check()?;
        self.inner.scan_keys(pattern)
    }
}
