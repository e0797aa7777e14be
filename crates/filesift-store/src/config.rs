//! Store configuration: where definitions live on disk.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::DefinitionsKind;

/// File holding the interesting items collection.
pub const INTERESTING_FILES_SET_DEFS_NAME: &str = "InterestingFileSets.settings";

/// File holding the custom ingest filter collection.
pub const FILE_INGEST_FILTER_DEFS_NAME: &str = "FileIngestFilterDefs.settings";

/// Legacy XML document read once for migration.
pub const LEGACY_FILES_SET_DEFS_FILE_NAME: &str = "InterestingFilesSetDefs.xml";

/// Configuration for the definitions store.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct StoreConfig {
    /// Per-user configuration directory.
    #[builder(default = "default_config_dir()")]
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// File name of the interesting items collection.
    #[builder(default = "INTERESTING_FILES_SET_DEFS_NAME.to_string()")]
    #[serde(default = "default_interesting_name")]
    pub interesting_sets_file: String,

    /// File name of the custom ingest filter collection.
    #[builder(default = "FILE_INGEST_FILTER_DEFS_NAME.to_string()")]
    #[serde(default = "default_ingest_name")]
    pub ingest_filters_file: String,

    /// File name of the legacy XML document.
    #[builder(default = "LEGACY_FILES_SET_DEFS_FILE_NAME.to_string()")]
    #[serde(default = "default_legacy_name")]
    pub legacy_file: String,
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("filesift")
}

fn default_interesting_name() -> String {
    INTERESTING_FILES_SET_DEFS_NAME.to_string()
}

fn default_ingest_name() -> String {
    FILE_INGEST_FILTER_DEFS_NAME.to_string()
}

fn default_legacy_name() -> String {
    LEGACY_FILES_SET_DEFS_FILE_NAME.to_string()
}

impl StoreConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref dir) = self.config_dir {
            if dir.as_os_str().is_empty() {
                return Err("Configuration directory cannot be empty".to_string());
            }
        }

        let names = [
            &self.interesting_sets_file,
            &self.ingest_filters_file,
            &self.legacy_file,
        ];
        for name in names.into_iter().flatten() {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(format!("Invalid definitions file name: {name:?}"));
            }
        }

        if self.interesting_sets_file.is_some()
            && self.interesting_sets_file == self.ingest_filters_file
        {
            return Err("Both collections cannot share one file".to_string());
        }
        Ok(())
    }
}

impl StoreConfig {
    /// Create a new store config builder.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Default file names inside the given directory.
    pub fn in_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            interesting_sets_file: default_interesting_name(),
            ingest_filters_file: default_ingest_name(),
            legacy_file: default_legacy_name(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Current-format file for a collection.
    pub fn settings_path(&self, kind: DefinitionsKind) -> PathBuf {
        let name = match kind {
            DefinitionsKind::InterestingItems => &self.interesting_sets_file,
            DefinitionsKind::IngestFilters => &self.ingest_filters_file,
        };
        self.config_dir.join(name)
    }

    /// Legacy XML document path.
    pub fn legacy_path(&self) -> PathBuf {
        self.config_dir.join(&self.legacy_file)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_dir(default_config_dir())
    }
}
