use revdoc_kv::KvError;
use revdoc_types::TypeError;
use thiserror::Error;

/// Errors from document store operations.
///
/// Revision conflicts are not errors: they are reported through
/// [`crate::PutOutcome`] and [`crate::DeleteOutcome`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The caller passed something the store cannot act on.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The substrate failed; propagated unchanged.
    #[error("substrate error: {0}")]
    Substrate(#[from] KvError),

    /// A document or pointer could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// The store configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

impl From<TypeError> for StoreError {
    fn from(e: TypeError) -> Self {
        if e.is_invalid_argument() {
            Self::InvalidArgument(e.to_string())
        } else {
            Self::Codec(e.to_string())
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
