use revdoc_kv::KvSubstrate;
use revdoc_types::{validate_doc_id, validate_type_name, Document};
use tracing::warn;

use crate::codec;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

/// Versioned document storage over a key-value substrate.
///
/// The store owns nothing but the substrate handle and its configuration:
/// no locks, no caches. Any number of threads may call it concurrently, and
/// any number of stores (in this process or others) may share one
/// substrate. Conflicting writes are detected by the optimistic protocol in
/// [`DocumentStore::put`], never prevented by mutual exclusion.
///
/// Operations are grouped by concern:
/// - revisioned documents: `reserve`, `put`, `get`, `delete`, history
/// - unversioned entries (`msgs`, `schedules`): `put_msg`, `put_schedule`, ...
/// - enumeration: `ids`, `get_many`, `count`
/// - administration: configuration bootstrap, `purge_type`, `purge`
pub struct DocumentStore<S: KvSubstrate> {
    pub(crate) kv: S,
    pub(crate) config: StoreConfig,
}

impl<S: KvSubstrate> DocumentStore<S> {
    /// Open a store with the default configuration.
    pub fn new(kv: S) -> StoreResult<Self> {
        Self::open(kv, StoreConfig::default())
    }

    /// Open a store, bootstrapping the engine configuration document unless
    /// disabled in `config`.
    pub fn open(kv: S, config: StoreConfig) -> StoreResult<Self> {
        let store = Self { kv, config };
        if store.config.bootstrap_configuration {
            store.put_configuration()?;
        }
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The underlying substrate.
    pub fn substrate(&self) -> &S {
        &self.kv
    }

    /// Host lifecycle hook. The store holds no resources of its own.
    pub fn shutdown(&self) {}

    /// Host lifecycle hook. Types need no registration.
    pub fn add_type(&self, _doc_type: &str) {}

    /// Read and decode the entry at `key`. Undecodable entries read as
    /// absent so that one corrupt payload cannot wedge a document.
    pub(crate) fn read_entry(&self, key: &str) -> StoreResult<Option<Document>> {
        let Some(bytes) = self.kv.get(key)? else {
            return Ok(None);
        };
        match codec::decode(&bytes) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                warn!(key, error = %e, "ignoring undecodable entry");
                Ok(None)
            }
        }
    }

    /// Current revision named by a pointer key, 0 if there is none.
    pub(crate) fn read_pointer(&self, key: &str) -> StoreResult<u64> {
        match self.kv.get(key)? {
            Some(bytes) => codec::decode_rev(key, &bytes),
            None => Ok(0),
        }
    }

    /// Best-effort delete. A failure leaves litter that readers already
    /// ignore, so it is logged and dropped.
    pub(crate) fn discard(&self, key: &str) {
        if let Err(e) = self.kv.delete(key) {
            warn!(key, error = %e, "failed to clean up superseded entry");
        }
    }
}

/// Reject revisioned operations on unversioned types, whose entries hold
/// documents rather than pointers.
pub(crate) fn require_revisioned(doc: &Document) -> StoreResult<()> {
    doc.validate()?;
    if doc.doc_type.is_unversioned() {
        return Err(StoreError::InvalidArgument(format!(
            "{} documents are unversioned; use the message and schedule operations",
            doc.doc_type
        )));
    }
    Ok(())
}

/// `true` if `doc_type` and `id` can name a stored document. Reads of
/// names that could never have been written simply find nothing.
pub(crate) fn readable(doc_type: &str, id: Option<&str>) -> bool {
    validate_type_name(doc_type).is_ok() && id.map_or(true, |id| validate_doc_id(id).is_ok())
}
