//! File entry types evaluated by conditions.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Type of file system entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Other entry types (symlinks, sockets, devices, etc.).
    Other,
}

impl EntryKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, EntryKind::File)
    }
}

/// Metadata for a single entry being classified.
///
/// Only what the conditions look at is carried. Attributes that could not be
/// read are `None` and never satisfy a size or date condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Base name (not full path).
    pub name: CompactString,

    /// Path of the containing directory, `/` separated.
    pub parent_path: String,

    /// Entry type.
    pub kind: EntryKind,

    /// Size in bytes.
    pub size: Option<u64>,

    /// Last modification time in seconds since the Unix epoch.
    pub modified: Option<i64>,

    /// Whether the entry was recognised as a known/standard item.
    pub known: bool,

    /// Whether the entry represents unallocated space.
    pub unallocated: bool,
}

impl FileEntry {
    /// Create an entry of the given kind.
    pub fn new(name: impl Into<CompactString>, parent_path: &str, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            parent_path: normalize_path(parent_path),
            kind,
            size: None,
            modified: None,
            known: false,
            unallocated: false,
        }
    }

    /// Create a regular file entry.
    pub fn file(name: impl Into<CompactString>, parent_path: &str) -> Self {
        Self::new(name, parent_path, EntryKind::File)
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<CompactString>, parent_path: &str) -> Self {
        Self::new(name, parent_path, EntryKind::Directory)
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_modified(mut self, epoch_seconds: i64) -> Self {
        self.modified = Some(epoch_seconds);
        self
    }

    pub fn with_known(mut self, known: bool) -> Self {
        self.known = known;
        self
    }

    pub fn with_unallocated(mut self, unallocated: bool) -> Self {
        self.unallocated = unallocated;
        self
    }

    /// Full path of the entry, `/` separated.
    pub fn path(&self) -> String {
        if self.parent_path.is_empty() {
            self.name.to_string()
        } else if self.parent_path.ends_with('/') {
            format!("{}{}", self.parent_path, self.name)
        } else {
            format!("{}/{}", self.parent_path, self.name)
        }
    }

    /// Check if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }
}

/// Convert platform separators to `/`.
fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}
