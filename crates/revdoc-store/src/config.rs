use std::path::Path;

use revdoc_types::Fields;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Configuration for a [`crate::DocumentStore`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Engine options, written into the `configurations/engine` document
    /// when the store bootstraps it.
    pub engine: Fields,
    /// Create the engine configuration document on open if it is absent.
    pub bootstrap_configuration: bool,
    /// Sort listings by id instead of returning them in substrate scan
    /// order.
    pub sorted_listings: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            engine: Fields::new(),
            bootstrap_configuration: true,
            sorted_listings: false,
        }
    }
}

impl StoreConfig {
    /// Parse a TOML document.
    ///
    /// ```
    /// use revdoc_store::StoreConfig;
    ///
    /// let config = StoreConfig::from_toml_str("sorted_listings = true").unwrap();
    /// assert!(config.sorted_listings);
    /// assert!(config.bootstrap_configuration);
    /// ```
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Load a TOML file.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
