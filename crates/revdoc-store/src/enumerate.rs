//! Listing documents by type.
//!
//! Listings are rebuilt from a key scan. For revisioned types the scan sees
//! revision entries directly and keeps the highest revision per id, which
//! is the current one: a revision entry only exists above the pointer while
//! a put is between its create and its pointer update, and lower ones are
//! litter from a cleanup delete that failed. This avoids a second round of
//! pointer reads.

use std::collections::HashMap;

use regex::Regex;
use revdoc_kv::KvSubstrate;
use revdoc_types::{type_pattern, DocType, Document, ParsedKey};
use tracing::warn;

use crate::codec;
use crate::error::StoreResult;
use crate::outcome::GetManyOptions;
use crate::store::{readable, DocumentStore};

/// One document selected by a scan: its id and the key holding it.
struct Selected {
    id: String,
    rev: u64,
    key: String,
}

impl<S: KvSubstrate> DocumentStore<S> {
    /// Ids of every document of `doc_type`, in scan order.
    pub fn ids(&self, doc_type: &str) -> StoreResult<Vec<String>> {
        if !readable(doc_type, None) {
            return Ok(Vec::new());
        }
        Ok(self
            .kv
            .scan_keys(&type_pattern(doc_type))?
            .iter()
            .filter_map(|key| match ParsedKey::parse(key)? {
                ParsedKey::Pointer { id, .. } => Some(id.to_string()),
                ParsedKey::Revision { .. } => None,
            })
            .collect())
    }

    /// Every current document of `doc_type`.
    ///
    /// For revisioned types, `id_filter` keeps only ids it matches
    /// (unanchored). Unversioned types ignore it. `options.limit` is applied
    /// to the selected keys before any value is fetched. Entries that vanish
    /// or fail to decode between the scan and the fetch are skipped.
    ///
    /// Order is scan order unless `options.sorted` or the store's
    /// `sorted_listings` is set, in which case it is by id.
    pub fn get_many(
        &self,
        doc_type: &str,
        id_filter: Option<&Regex>,
        options: GetManyOptions,
    ) -> StoreResult<Vec<Document>> {
        let mut selected = self.select(doc_type, id_filter)?;

        if options.sorted || self.config.sorted_listings {
            selected.sort_by(|a, b| a.id.cmp(&b.id));
        }
        if options.descending {
            selected.reverse();
        }
        let limit = options.limit.unwrap_or(usize::MAX);

        let mut docs = Vec::new();
        for entry in selected.into_iter().skip(options.skip).take(limit) {
            let Some(bytes) = self.kv.get(&entry.key)? else {
                continue;
            };
            match codec::decode(&bytes) {
                Ok(doc) => docs.push(doc),
                Err(e) => {
                    warn!(
                        key = %entry.key,
                        rev = entry.rev,
                        error = %e,
                        "skipping undecodable entry in listing"
                    );
                }
            }
        }
        Ok(docs)
    }

    /// Number of documents [`get_many`](Self::get_many) would list for
    /// `doc_type` without a filter or limit.
    pub fn count(&self, doc_type: &str) -> StoreResult<usize> {
        Ok(self.select(doc_type, None)?.len())
    }

    fn select(&self, doc_type: &str, id_filter: Option<&Regex>) -> StoreResult<Vec<Selected>> {
        if !readable(doc_type, None) {
            return Ok(Vec::new());
        }
        let keys = self.kv.scan_keys(&type_pattern(doc_type))?;
        if DocType::is_unversioned_name(doc_type) {
            Ok(direct_entries(keys))
        } else {
            Ok(latest_revisions(keys, id_filter))
        }
    }
}

fn direct_entries(keys: Vec<String>) -> Vec<Selected> {
    keys.into_iter()
        .filter_map(|key| {
            let id = match ParsedKey::parse(&key)? {
                ParsedKey::Pointer { id, .. } => id.to_string(),
                ParsedKey::Revision { .. } => return None,
            };
            Some(Selected { id, rev: 0, key })
        })
        .collect()
}

/// Reduce revision keys to the highest revision per id, keeping the order
/// in which ids were first seen.
fn latest_revisions(keys: Vec<String>, id_filter: Option<&Regex>) -> Vec<Selected> {
    let mut selected: Vec<Selected> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for key in keys {
        let (id, rev) = match ParsedKey::parse(&key) {
            Some(ParsedKey::Revision { id, rev, .. }) => (id.to_string(), rev),
            _ => continue,
        };
        if id_filter.is_some_and(|re| !re.is_match(&id)) {
            continue;
        }
        match by_id.get(&id) {
            Some(&i) => {
                if selected[i].rev < rev {
                    selected[i].rev = rev;
                    selected[i].key = key;
                }
            }
            None => {
                by_id.insert(id.clone(), selected.len());
                selected.push(Selected { id, rev, key });
            }
        }
    }
    selected
}
