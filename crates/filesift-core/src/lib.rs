//! Core types for filesift.
//!
//! This crate holds the classification engine: [`Condition`]s test one
//! attribute of a [`FileEntry`], a [`Rule`] is a named conjunction of
//! conditions, and a [`FilesSet`] is an ordered collection of rules where the
//! first matching rule wins.
//!
//! ```rust
//! use filesift_core::{FileEntry, FilesSet, MetaType, NameCondition, Rule};
//!
//! let rule = Rule::new("executables", MetaType::Files)
//!     .with_name(NameCondition::extension("exe").unwrap());
//! let set = FilesSet::new("Suspicious", "", false, true, [rule]).unwrap();
//!
//! let entry = FileEntry::file("setup.exe", "/Users/alice/Downloads");
//! assert_eq!(set.matches(&entry), Some("executables"));
//! ```

mod condition;
pub mod defaults;
mod entry;
mod error;
mod files_set;
mod rule;

pub use condition::{
    Comparator, Condition, DateCondition, MatchMode, MetaType, MetaTypeCondition, NameCondition,
    PathCondition, SizeCondition, SizeUnit, TextMatcher,
};
pub use defaults::{
    ILLEGAL_FILE_NAME_CHARS, ILLEGAL_FILE_PATH_CHARS, default_filter, standard_ingest_filters,
};
pub use entry::{EntryKind, FileEntry};
pub use error::{FilterError, FilterResult};
pub use files_set::FilesSet;
pub use rule::Rule;
