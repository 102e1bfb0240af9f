//! Foundation types for revdoc.
//!
//! revdoc persists versioned JSON documents on top of a flat key-value
//! substrate. This crate holds everything that is pure data: the document
//! model, the key scheme that addresses documents in the substrate, name
//! validation, and the schedule specs used by timer entries. Every other
//! revdoc crate depends on `revdoc-types`.
//!
//! # Key Types
//!
//! - [`Document`]: common header (`type`, `_id`, `_rev`, `put_at`) plus a typed [`DocBody`]
//! - [`DocType`]: logical collection name; decides revisioned vs unversioned storage
//! - [`ParsedKey`]: classification of a raw substrate key (pointer or revision)
//! - [`ScheduleSpec`]: when a schedule entry fires
//!
//! # Key Scheme
//!
//! | Family | Key | Value |
//! |---|---|---|
//! | pointer | `type/id` | current revision number |
//! | revision | `type/id/rev` | serialized document at `rev` |
//! | unversioned | `type/id` | serialized document |

pub mod document;
pub mod error;
pub mod keys;
pub mod names;
pub mod schedule;
pub mod timestamp;

pub use document::{
    Configuration, DocBody, DocType, Document, Fields, Message, Schedule, ENGINE_CONFIGURATION_ID,
};
pub use error::TypeError;
pub use keys::{
    pointer_key, revision_key, revisions_pattern, type_pattern, ParsedKey, KEY_SEPARATOR,
};
pub use names::{validate_doc_id, validate_type_name};
pub use schedule::{parse_duration, ScheduleFlavour, ScheduleSpec};
pub use timestamp::{format_utc, now_utc_string, parse_utc};
