use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid {kind} {name:?}: {reason}")]
    InvalidName {
        kind: &'static str,
        name: String,
        reason: String,
    },

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("invalid schedule {spec:?}: {reason}")]
    InvalidSchedule { spec: String, reason: String },

    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TypeError {
    /// Returns `true` if this error describes bad caller input rather than
    /// a malformed stored payload.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidName { .. } | Self::InvalidSchedule { .. }
        )
    }
}
