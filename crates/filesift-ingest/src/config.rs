//! Classification run configuration.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for a directory classification run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ClassifyConfig {
    /// Root directory to walk. The root itself is not classified.
    pub root: PathBuf,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Maximum depth below the root (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Number of walker threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Report progress after this many entries have been classified.
    #[builder(default = "DEFAULT_PROGRESS_INTERVAL")]
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

const DEFAULT_PROGRESS_INTERVAL: usize = 1000;

fn default_true() -> bool {
    true
}

fn default_progress_interval() -> usize {
    DEFAULT_PROGRESS_INTERVAL
}

impl ClassifyConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match &self.root {
            Some(root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            Some(_) => {}
        }
        if self.progress_interval == Some(0) {
            return Err("Progress interval must be at least 1".to_string());
        }
        Ok(())
    }
}

impl ClassifyConfig {
    /// Create a new config builder.
    pub fn builder() -> ClassifyConfigBuilder {
        ClassifyConfigBuilder::default()
    }

    /// Create a config with defaults for `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_hidden: true,
            max_depth: None,
            threads: 0,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ClassifyConfig::builder().root("/tmp").build().unwrap();
        assert!(config.include_hidden);
        assert_eq!(config.max_depth, None);
        assert_eq!(config.progress_interval, DEFAULT_PROGRESS_INTERVAL);
    }

    #[test]
    fn test_builder_rejects_bad_values() {
        assert!(ClassifyConfig::builder().build().is_err());
        assert!(ClassifyConfig::builder().root("").build().is_err());
        assert!(
            ClassifyConfig::builder()
                .root("/tmp")
                .progress_interval(0usize)
                .build()
                .is_err()
        );
    }
}
