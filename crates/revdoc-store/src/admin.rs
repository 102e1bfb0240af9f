use revdoc_kv::KvSubstrate;
use revdoc_types::{
    type_pattern, validate_type_name, Configuration, DocBody, DocType, Document,
    ENGINE_CONFIGURATION_ID,
};
use tracing::{debug, info};

use crate::error::StoreResult;
use crate::outcome::{PutOptions, PutOutcome};
use crate::store::DocumentStore;

impl<S: KvSubstrate> DocumentStore<S> {
    /// Write the engine configuration document from the store's `engine`
    /// settings unless one already exists. Losing a race to another store
    /// bootstrapping the same substrate is fine: either copy will do.
    pub(crate) fn put_configuration(&self) -> StoreResult<()> {
        if self
            .get(DocType::CONFIGURATIONS, ENGINE_CONFIGURATION_ID)?
            .is_some()
        {
            debug!("engine configuration already present");
            return Ok(());
        }

        let mut doc = Document::new(
            DocType::configurations(),
            ENGINE_CONFIGURATION_ID,
            DocBody::Configuration(Configuration {
                settings: self.config.engine.clone(),
            }),
        );
        match self.put(&mut doc, PutOptions::default())? {
            PutOutcome::Stored { rev } => {
                info!(rev, settings = self.config.engine.len(), "bootstrapped engine configuration")
            }
            _ => debug!("engine configuration written concurrently"),
        }
        Ok(())
    }

    /// The engine configuration document, if present.
    pub fn configuration(&self) -> StoreResult<Option<Document>> {
        self.get(DocType::CONFIGURATIONS, ENGINE_CONFIGURATION_ID)
    }

    /// Delete every entry of `doc_type`: pointers, revisions and unversioned
    /// entries alike. Returns the number of keys removed.
    ///
    /// Not safe against concurrent writers; intended for tests and resets.
    pub fn purge_type(&self, doc_type: &str) -> StoreResult<usize> {
        validate_type_name(doc_type)?;
        let removed = self.remove_all(&type_pattern(doc_type))?;
        info!(doc_type, removed, "purged type");
        Ok(removed)
    }

    /// Delete every entry in the substrate, configuration included.
    pub fn purge(&self) -> StoreResult<usize> {
        let removed = self.remove_all("*")?;
        info!(removed, "purged store");
        Ok(removed)
    }

    fn remove_all(&self, pattern: &str) -> StoreResult<usize> {
        let mut removed = 0;
        for key in self.kv.scan_keys(pattern)? {
            removed += self.kv.delete(&key)? as usize;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use revdoc_kv::InMemoryKv;
    use revdoc_types::Fields;
    use serde_json::json;

    use super::*;
    use crate::config::StoreConfig;
    use crate::error::StoreError;

    fn engine_settings() -> Fields {
        let mut engine = Fields::new();
        engine.insert("restless_worker".into(), json!(true));
        engine
    }

    #[test]
    fn open_bootstraps_configuration() {
        let config = StoreConfig {
            engine: engine_settings(),
            ..StoreConfig::default()
        };
        let store = DocumentStore::open(InMemoryKv::new(), config).unwrap();

        let doc = store.configuration().unwrap().unwrap();
        assert_eq!(doc.rev, Some(1));
        assert_eq!(doc.field("restless_worker"), Some(json!(true)));
    }

    #[test]
    fn bootstrap_does_not_clobber_existing_configuration() {
        let kv = Arc::new(InMemoryKv::new());
        let first = DocumentStore::open(
            Arc::clone(&kv),
            StoreConfig {
                engine: engine_settings(),
                ..StoreConfig::default()
            },
        )
        .unwrap();

        let second = DocumentStore::new(Arc::clone(&kv)).unwrap();
        let doc = second.configuration().unwrap().unwrap();
        assert_eq!(doc.rev, Some(1));
        assert_eq!(doc.field("restless_worker"), Some(json!(true)));
        assert_eq!(first.configuration().unwrap(), Some(doc));
    }

    #[test]
    fn bootstrap_can_be_disabled() {
        let store = DocumentStore::open(
            InMemoryKv::new(),
            StoreConfig {
                bootstrap_configuration: false,
                ..StoreConfig::default()
            },
        )
        .unwrap();
        assert!(store.configuration().unwrap().is_none());
        assert!(store.substrate().is_empty());
    }

    #[test]
    fn purge_type_leaves_other_types() {
        let store = DocumentStore::new(InMemoryKv::new()).unwrap();
        store.put_msg("launch", Fields::new()).unwrap();
        store.put_msg("reply", Fields::new()).unwrap();
        let mut wi = Document::state("wi", "a", Fields::new());
        store.put(&mut wi, PutOptions::default()).unwrap();

        assert_eq!(store.purge_type("msgs").unwrap(), 2);
        assert!(store.get_msgs().unwrap().is_empty());
        assert!(store.get("wi", "a").unwrap().is_some());
        assert!(store.configuration().unwrap().is_some());
    }

    #[test]
    fn purge_type_counts_pointer_and_revision_entries() {
        let store = DocumentStore::new(InMemoryKv::new()).unwrap();
        let mut wi = Document::state("wi", "a", Fields::new());
        store.put(&mut wi, PutOptions::default()).unwrap();
        assert_eq!(store.purge_type("wi").unwrap(), 2);
        assert!(store.get("wi", "a").unwrap().is_none());
    }

    #[test]
    fn purge_type_rejects_patterns() {
        let store = DocumentStore::new(InMemoryKv::new()).unwrap();
        assert!(matches!(
            store.purge_type("*"),
            Err(StoreError::InvalidArgument(_))
        ));
        assert!(store.configuration().unwrap().is_some());
    }

    #[test]
    fn purge_removes_everything() {
        let store = DocumentStore::new(InMemoryKv::new()).unwrap();
        store.put_msg("launch", Fields::new()).unwrap();
        let mut wi = Document::state("wi", "a", Fields::new());
        store.put(&mut wi, PutOptions::default()).unwrap();

        assert_eq!(store.purge().unwrap(), 5);
        assert!(store.substrate().is_empty());
        assert_eq!(store.purge().unwrap(), 0);
    }
}
