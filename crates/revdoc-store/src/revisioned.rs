//! Revisioned documents: the optimistic concurrency protocol.
//!
//! A revisioned document `(type, id)` is stored as a pointer entry
//! `type/id` holding the current revision number `r`, and a revision entry
//! `type/id/r` holding the document. Writers never overwrite a revision
//! entry: a put creates `type/id/(r+1)` with create-if-absent, and only the
//! writer whose create succeeded advances the pointer. Two writers starting
//! from the same revision therefore race on one key, and the substrate
//! picks exactly one winner.
//!
//! Ordering within a successful put:
//! 1. create the new revision entry (the commit point)
//! 2. advance the pointer
//! 3. best-effort delete the superseded revision entry
//!
//! Readers follow the pointer, so they see either the old or the new
//! revision, never a partial write. A crash between 1 and 2 leaves an
//! orphan revision above the pointer; the next writer from the pointer's
//! revision loses the race on that key and must re-read, which is the
//! same situation as a live concurrent writer.

use revdoc_kv::KvSubstrate;
use revdoc_types::{pointer_key, revision_key, revisions_pattern, Document, ParsedKey};
use tracing::debug;

use crate::codec;
use crate::error::{StoreError, StoreResult};
use crate::outcome::{ConflictReason, DeleteOutcome, PutOptions, PutOutcome};
use crate::store::{readable, require_revisioned, DocumentStore};

impl<S: KvSubstrate> DocumentStore<S> {
    /// Delete the pointer entry for `doc`, invalidating whatever revision
    /// it named. Returns `true` if an entry was removed, so among several
    /// callers reserving the same document only one observes `true`.
    pub fn reserve(&self, doc: &Document) -> StoreResult<bool> {
        doc.validate()?;
        Ok(self.kv.delete(&doc.pointer_key())? > 0)
    }

    /// Store `doc` as the revision after `doc.rev`.
    ///
    /// `doc.rev` is the revision the caller last read (`None` or 0 for a
    /// new document). If the store has moved on, nothing is written and the
    /// outcome says why; the caller re-reads and retries. The store itself
    /// never retries.
    pub fn put(&self, doc: &mut Document, options: PutOptions) -> StoreResult<PutOutcome> {
        require_revisioned(doc)?;

        let expected = doc.rev.unwrap_or(0);
        let pointer = doc.pointer_key();
        let current = self.read_pointer(&pointer)?;

        if current == 0 && expected > 0 {
            debug!(key = %pointer, expected, "put conflict: document no longer exists");
            return Ok(PutOutcome::Conflict(ConflictReason::Stale));
        }

        if expected != current {
            debug!(key = %pointer, expected, current, "put conflict: revision moved on");
            let latest = self.read_entry(&doc.revision_key(Some(current)))?;
            return Ok(match latest {
                Some(latest) => PutOutcome::ConflictWith(Box::new(latest)),
                None => PutOutcome::Conflict(ConflictReason::Vanished),
            });
        }

        let next = expected + 1;
        let payload = codec::encode(doc, Some(next))?;
        if !self.kv.create_if_absent(&doc.revision_key(Some(next)), &payload)? {
            debug!(key = %pointer, rev = next, "put conflict: lost create race");
            return Ok(PutOutcome::Conflict(ConflictReason::Race));
        }

        self.kv.set(&pointer, &codec::encode_rev(next))?;
        if expected > 0 {
            self.discard(&doc.revision_key(Some(expected)));
        }

        if options.update_rev {
            doc.rev = Some(next);
        }
        debug!(key = %pointer, rev = next, "stored revision");
        Ok(PutOutcome::Stored { rev: next })
    }

    /// Current revision of `(doc_type, id)`, or `None` if it does not exist.
    ///
    /// Unversioned types are read from their direct entry.
    pub fn get(&self, doc_type: &str, id: &str) -> StoreResult<Option<Document>> {
        if !readable(doc_type, Some(id)) {
            return Ok(None);
        }
        let pointer = pointer_key(doc_type, id);
        if revdoc_types::DocType::is_unversioned_name(doc_type) {
            return self.read_entry(&pointer);
        }

        let current = self.read_pointer(&pointer)?;
        if current == 0 {
            return Ok(None);
        }
        // The entry may be gone if a delete raced this read.
        self.read_entry(&revision_key(doc_type, id, current))
    }

    /// Delete `doc`, which must carry the revision the caller last read.
    ///
    /// Fails with [`StoreError::InvalidArgument`] if `doc.rev` is missing.
    pub fn delete(&self, doc: &Document) -> StoreResult<DeleteOutcome> {
        require_revisioned(doc)?;
        let Some(rev) = doc.rev else {
            return Err(StoreError::InvalidArgument(format!(
                "no _rev for {}",
                doc.pointer_key()
            )));
        };

        let pointer = doc.pointer_key();
        let current = self.read_pointer(&pointer)?;
        if rev != current {
            debug!(key = %pointer, rev, current, "delete conflict: stale revision");
            return Ok(DeleteOutcome::Conflict);
        }

        // While the pointer still names `current`, no writer can create a
        // revision below it, so older litter is safe to sweep now. Left in
        // place it would surface in listings, and block re-creation at
        // revision 1 once the pointer is gone.
        self.sweep_below(doc.doc_type.as_str(), &doc.id, current);

        if self.kv.delete(&doc.revision_key(Some(current)))? == 0 {
            debug!(key = %pointer, rev, "delete conflict: revision already removed");
            return Ok(DeleteOutcome::Conflict);
        }
        self.kv.delete(&pointer)?;
        debug!(key = %pointer, rev, "deleted document");
        Ok(DeleteOutcome::Deleted)
    }

    /// Revision numbers currently retained for `(doc_type, id)`, ascending.
    ///
    /// Normally just the current one; older revisions linger only when a
    /// cleanup delete failed or a writer is mid-put.
    pub fn revisions(&self, doc_type: &str, id: &str) -> StoreResult<Vec<u64>> {
        if !readable(doc_type, Some(id)) {
            return Ok(Vec::new());
        }
        let mut revs: Vec<u64> = self
            .kv
            .scan_keys(&revisions_pattern(doc_type, id))?
            .iter()
            .filter_map(|key| match ParsedKey::parse(key)? {
                ParsedKey::Revision { id: found, rev, .. } if found == id => Some(rev),
                _ => None,
            })
            .collect();
        revs.sort_unstable();
        Ok(revs)
    }

    /// A specific retained revision, current or not.
    pub fn get_revision(
        &self,
        doc_type: &str,
        id: &str,
        rev: u64,
    ) -> StoreResult<Option<Document>> {
        if !readable(doc_type, Some(id)) {
            return Ok(None);
        }
        self.read_entry(&revision_key(doc_type, id, rev))
    }

    fn sweep_below(&self, doc_type: &str, id: &str, current: u64) {
        let revs = match self.revisions(doc_type, id) {
            Ok(revs) => revs,
            Err(e) => {
                tracing::warn!(doc_type, id, error = %e, "could not list stale revisions");
                return;
            }
        };
        for rev in revs.into_iter().filter(|&rev| rev < current) {
            self.discard(&revision_key(doc_type, id, rev));
        }
    }
}
