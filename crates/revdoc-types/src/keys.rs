//! Substrate key scheme.
//!
//! Revisioned documents occupy two key families: the pointer key
//! `type/id`, whose value is the current revision number, and one revision
//! key `type/id/rev` per stored revision, whose value is the serialized
//! document. Unversioned documents use only the `type/id` shape and store
//! the document there directly.

/// Separator between key segments.
pub const KEY_SEPARATOR: char = '/';

/// Pointer key for `(doc_type, id)`: `type/id`.
pub fn pointer_key(doc_type: &str, id: &str) -> String {
    format!("{doc_type}{KEY_SEPARATOR}{id}")
}

/// Revision key for `(doc_type, id, rev)`: `type/id/rev`.
pub fn revision_key(doc_type: &str, id: &str, rev: u64) -> String {
    format!("{doc_type}{KEY_SEPARATOR}{id}{KEY_SEPARATOR}{rev}")
}

/// Glob pattern matching every key of a type, in both families.
pub fn type_pattern(doc_type: &str) -> String {
    format!("{doc_type}{KEY_SEPARATOR}*")
}

/// Glob pattern matching every revision key of one document.
pub fn revisions_pattern(doc_type: &str, id: &str) -> String {
    format!("{doc_type}{KEY_SEPARATOR}{id}{KEY_SEPARATOR}*")
}

/// A raw substrate key classified by shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParsedKey<'a> {
    /// Two segments: a pointer key or an unversioned entry.
    Pointer { doc_type: &'a str, id: &'a str },
    /// Three segments with a decimal revision.
    Revision {
        doc_type: &'a str,
        id: &'a str,
        rev: u64,
    },
}

impl<'a> ParsedKey<'a> {
    /// Classify `key`. Returns `None` for any other shape (empty segments,
    /// more than three segments, or a non-decimal revision).
    pub fn parse(key: &'a str) -> Option<Self> {
        let mut parts = key.split(KEY_SEPARATOR);
        let doc_type = parts.next().filter(|s| !s.is_empty())?;
        let id = parts.next().filter(|s| !s.is_empty())?;
        let Some(rev) = parts.next() else {
            return Some(Self::Pointer { doc_type, id });
        };
        if parts.next().is_some() || rev.is_empty() || !rev.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let rev = rev.parse().ok()?;
        Some(Self::Revision { doc_type, id, rev })
    }

    pub fn doc_type(&self) -> &'a str {
        match self {
            Self::Pointer { doc_type, .. } | Self::Revision { doc_type, .. } => doc_type,
        }
    }

    pub fn id(&self) -> &'a str {
        match self {
            Self::Pointer { id, .. } | Self::Revision { id, .. } => id,
        }
    }

    /// The revision, for revision keys.
    pub fn rev(&self) -> Option<u64> {
        match self {
            Self::Pointer { .. } => None,
            Self::Revision { rev, .. } => Some(*rev),
        }
    }
}
