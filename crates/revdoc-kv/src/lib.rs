//! Key-value substrate for revdoc.
//!
//! The document store never talks to a backend directly. It drives five
//! primitives, collected in the [`KvSubstrate`] trait: get, set, delete,
//! create-if-absent, and glob key scan. Create-if-absent is the only atomic
//! primitive the store relies on; everything else may be independently
//! interleaved across clients.
//!
//! # Modules
//!
//! - [`error`]: Error types for substrate operations
//! - [`traits`]: The [`KvSubstrate`] trait
//! - [`pattern`]: Redis-style glob matching for key scans
//! - [`memory`]: In-memory [`InMemoryKv`] for tests and embedding
//! - [`file`]: [`FileKv`], a single-file JSON backend for local use

pub mod error;
pub mod file;
pub mod memory;
pub mod pattern;
pub mod traits;

pub use error::{KvError, KvResult};
pub use file::FileKv;
pub use memory::InMemoryKv;
pub use pattern::glob_match;
pub use traits::KvSubstrate;
