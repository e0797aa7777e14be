//! Persistence for filesift definitions.
//!
//! Two named collections of [`FilesSet`]s are kept on disk: interesting items
//! and custom ingest filters. [`FilesSetsManager`] is the single owner of both;
//! it loads them lazily, migrates the legacy XML document on first read, and
//! tells subscribers when a collection has been replaced.

mod config;
mod error;
mod legacy;
mod manager;
mod notify;
mod settings;

use std::fmt;

use filesift_core::FilesSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use config::{
    FILE_INGEST_FILTER_DEFS_NAME, INTERESTING_FILES_SET_DEFS_NAME,
    LEGACY_FILES_SET_DEFS_FILE_NAME, StoreConfig, StoreConfigBuilder,
};
pub use error::{DefinitionsError, DefinitionsResult};
pub use legacy::LegacyXmlFile;
pub use manager::FilesSetsManager;
pub use notify::{DefinitionsChanged, SubscriptionId};
pub use settings::{DefinitionsSource, SettingsFile};

/// A collection of filter sets keyed by set name, in stored order.
pub type Definitions = IndexMap<String, FilesSet>;

/// The two collections owned by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionsKind {
    /// Sets that flag entries of interest during analysis.
    InterestingItems,
    /// User-defined filters that restrict which entries are ingested.
    IngestFilters,
}

impl fmt::Display for DefinitionsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InterestingItems => write!(f, "interesting items"),
            Self::IngestFilters => write!(f, "ingest filters"),
        }
    }
}

/// Build a collection keyed by each set's name.
///
/// A later set replaces an earlier one with the same name.
pub fn definitions_from(sets: impl IntoIterator<Item = FilesSet>) -> Definitions {
    sets.into_iter()
        .map(|set| (set.name().to_string(), set))
        .collect()
}
