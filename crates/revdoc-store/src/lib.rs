//! Versioned document storage with optimistic concurrency.
//!
//! A [`DocumentStore`] keeps JSON documents, grouped by type, on any
//! [`revdoc_kv::KvSubstrate`]. Every write to a revisioned document names
//! the revision it was based on; if another writer got there first the
//! write is refused and the caller re-reads. Many processes can share one
//! substrate with no locking beyond the substrate's create-if-absent.
//!
//! # Storage Model
//!
//! - revisioned types: pointer `type/id` holds the current revision `r`,
//!   revision entry `type/id/r` holds the document
//! - `msgs` and `schedules`: the document sits directly at `type/id`, last
//!   write wins
//!
//! # Design Rules
//!
//! 1. A revision entry is created once and never overwritten.
//! 2. Create, then point, then clean up. A reader following the pointer
//!    never sees a partial write.
//! 3. Conflicts are outcomes, not errors. Substrate failures are errors.
//! 4. The store never retries; callers decide.
//! 5. Cleanup failures leave litter that readers skip, and are only logged.

pub mod admin;
pub mod codec;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod outcome;
pub mod revisioned;
pub mod store;
pub mod unversioned;

#[cfg(test)]
mod testing;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use outcome::{ConflictReason, DeleteOutcome, GetManyOptions, PutOptions, PutOutcome};
pub use store::DocumentStore;
