use revdoc_types::Document;

/// Options for [`crate::DocumentStore::put`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// On success, set the caller's `_rev` to the new revision so the same
    /// document can be put again without re-reading it.
    pub update_rev: bool,
}

impl PutOptions {
    pub fn update_rev() -> Self {
        Self { update_rev: true }
    }
}

/// Why a put did not store anything and has no fresher document to offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictReason {
    /// The caller holds a revision of a document the store has no record
    /// of (deleted, or never stored at that revision).
    Stale,
    /// Another writer created the next revision first.
    Race,
    /// The current revision entry disappeared between reading the pointer
    /// and fetching it.
    Vanished,
}

/// Result of [`crate::DocumentStore::put`].
#[derive(Clone, Debug, PartialEq)]
pub enum PutOutcome {
    /// The document was stored at `rev`.
    Stored { rev: u64 },
    /// Nothing was stored; re-read and retry.
    Conflict(ConflictReason),
    /// Nothing was stored; this is the current document to merge with and
    /// retry from.
    ConflictWith(Box<Document>),
}

impl PutOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }

    pub fn is_conflict(&self) -> bool {
        !self.is_stored()
    }

    /// The current document handed back by a conflict, if any.
    pub fn into_current(self) -> Option<Document> {
        match self {
            Self::ConflictWith(doc) => Some(*doc),
            _ => None,
        }
    }
}

/// Result of [`crate::DocumentStore::delete`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The revision was stale, or a concurrent delete got there first.
    Conflict,
}

impl DeleteOutcome {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}

/// Options for [`crate::DocumentStore::get_many`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GetManyOptions {
    /// Return at most this many documents. Applied before fetching.
    pub limit: Option<usize>,
    /// Skip this many entries before applying `limit`.
    pub skip: usize,
    /// Sort by id before skip/limit.
    pub sorted: bool,
    /// Reverse the order (after sorting, if requested).
    pub descending: bool,
}

impl GetManyOptions {
    pub fn limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn sorted() -> Self {
        Self {
            sorted: true,
            ..Self::default()
        }
    }
}
