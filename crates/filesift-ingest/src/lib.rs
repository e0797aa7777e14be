//! Ingest-side classification for filesift.
//!
//! This crate applies a [`FilesSet`] to real filesystem entries. It provides
//! the progress reporting contract an ingest job talks to, and a
//! [`DirectoryClassifier`] that walks a tree with jwalk and classifies every
//! entry in parallel.
//!
//! # Example
//!
//! ```rust,no_run
//! use filesift_core::default_filter;
//! use filesift_ingest::{BroadcastProgress, ClassifyConfig, DirectoryClassifier};
//!
//! let progress = BroadcastProgress::default();
//! let mut progress_rx = progress.subscribe();
//!
//! let classifier = DirectoryClassifier::new(ClassifyConfig::new("/path/to/scan"));
//! let report = classifier.classify(&default_filter(), &progress).unwrap();
//!
//! println!("{} of {} entries matched", report.matches.len(), report.entries_examined);
//! while let Ok(event) = progress_rx.try_recv() {
//!     println!("{event:?}");
//! }
//! ```

mod classifier;
mod config;
mod error;
mod progress;

pub use classifier::{Classification, ClassificationReport, DirectoryClassifier, entry_from_metadata};
pub use config::{ClassifyConfig, ClassifyConfigBuilder};
pub use error::{IngestError, IngestResult, IngestWarning, WarningKind};
pub use progress::{BroadcastProgress, IngestProgress, NoProgress, ProgressEvent};

// Re-export core types for convenience
pub use filesift_core::{FileEntry, FilesSet};
