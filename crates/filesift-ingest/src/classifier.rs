//! Walks a directory tree and classifies every entry against a filter set.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, UNIX_EPOCH};

use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use filesift_core::{EntryKind, FileEntry, FilesSet};

use crate::config::ClassifyConfig;
use crate::error::{IngestError, IngestResult, IngestWarning, WarningKind};
use crate::progress::IngestProgress;

/// One entry matched by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub path: PathBuf,
    /// Name of the filter set.
    pub set: String,
    /// Name of the first rule that matched.
    pub rule: String,
    /// Size in bytes, for regular files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Outcome of a classification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Canonical root that was walked.
    pub root: PathBuf,
    /// Name of the filter set applied.
    pub set: String,
    /// Entries handed to the filter set, not counting the root.
    pub entries_examined: u64,
    /// Matches in walk order.
    pub matches: Vec<Classification>,
    pub warnings: Vec<IngestWarning>,
    pub duration: Duration,
}

impl ClassificationReport {
    /// Matches attributed to `rule`.
    pub fn matches_for_rule<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a Classification> {
        self.matches.iter().filter(move |m| m.rule == rule)
    }
}

/// Build a [`FileEntry`] from filesystem metadata.
///
/// The metadata should describe the entry itself, not a symlink target;
/// symlinks and other special files become [`EntryKind::Other`]. Sizes are
/// only recorded for regular files.
pub fn entry_from_metadata(path: &Path, metadata: &Metadata) -> FileEntry {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let parent = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_type = metadata.file_type();
    let kind = if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    };

    let mut entry = FileEntry::new(name, &parent, kind);
    if kind.is_file() {
        entry = entry.with_size(metadata.len());
    }
    if let Some(modified) = modified_epoch_seconds(metadata) {
        entry = entry.with_modified(modified);
    }
    entry
}

fn modified_epoch_seconds(metadata: &Metadata) -> Option<i64> {
    let modified = metadata.modified().ok()?;
    match modified.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).ok(),
        Err(before) => i64::try_from(before.duration().as_secs()).ok().map(|s| -s),
    }
}

/// Classifies the contents of a directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryClassifier {
    config: ClassifyConfig,
}

impl DirectoryClassifier {
    /// Create a new classifier.
    pub fn new(config: ClassifyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifyConfig {
        &self.config
    }

    /// Walk the configured root and classify every entry below it.
    ///
    /// Entries that cannot be read are recorded as warnings and skipped.
    pub fn classify(
        &self,
        set: &FilesSet,
        progress: &dyn IngestProgress,
    ) -> IngestResult<ClassificationReport> {
        let start = Instant::now();
        let root = self
            .config
            .root
            .canonicalize()
            .map_err(|e| IngestError::io(&self.config.root, e))?;
        if !root.is_dir() {
            return Err(IngestError::NotADirectory { path: root });
        }

        progress.switch_to_indeterminate();
        progress.progress_message(&format!("Walking {}", root.display()));

        let mut warnings = Vec::new();
        let entries = self.collect_entries(&root, &mut warnings);

        let total = entries.len() as u64;
        progress.switch_to_determinate(total);
        tracing::debug!(root = %root.display(), entries = total, set = set.name(), "classifying");

        let mut matches = Vec::new();
        let mut done = 0u64;
        for chunk in entries.chunks(self.config.progress_interval.max(1)) {
            let found: Vec<Classification> = chunk
                .par_iter()
                .filter_map(|(path, entry)| {
                    set.classify(entry).map(|rule| Classification {
                        path: path.clone(),
                        set: set.name().to_string(),
                        rule: rule.to_string(),
                        size: entry.size,
                    })
                })
                .collect();
            matches.extend(found);

            done += chunk.len() as u64;
            progress.progress(done);
        }

        tracing::info!(
            root = %root.display(),
            examined = total,
            matched = matches.len(),
            warnings = warnings.len(),
            "classification finished"
        );

        Ok(ClassificationReport {
            root,
            set: set.name().to_string(),
            entries_examined: total,
            matches,
            warnings,
            duration: start.elapsed(),
        })
    }

    fn collect_entries(
        &self,
        root: &Path,
        warnings: &mut Vec<IngestWarning>,
    ) -> Vec<(PathBuf, FileEntry)> {
        let parallelism = match self.config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(root)
            .parallelism(parallelism)
            .skip_hidden(!self.config.include_hidden)
            .follow_links(false)
            .sort(true)
            .min_depth(1)
            .max_depth(
                self.config
                    .max_depth
                    .map(|d| d as usize)
                    .unwrap_or(usize::MAX),
            );

        let mut entries = Vec::new();
        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    tracing::warn!(path = %path.display(), error = %err, "unreadable entry");
                    warnings.push(IngestWarning::new(path, err.to_string(), WarningKind::ReadError));
                    continue;
                }
            };

            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "unreadable metadata");
                    warnings.push(IngestWarning::new(
                        &path,
                        err.to_string(),
                        WarningKind::MetadataError,
                    ));
                    continue;
                }
            };

            let file_entry = entry_from_metadata(&path, &metadata);
            entries.push((path, file_entry));
        }
        entries
    }
}
