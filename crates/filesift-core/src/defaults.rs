//! Built-in ingest filters and editor validation lists.

use crate::condition::MetaType;
use crate::files_set::FilesSet;
use crate::rule::Rule;

/// Name of the filter covering every file and directory.
pub const ALL_FILES_AND_DIRECTORIES: &str = "All Files and Directories";

/// Name of the filter covering every file, directory and unallocated space.
pub const ALL_FILES_DIRECTORIES_AND_UNALLOCATED: &str =
    "All Files, Directories, and Unallocated Space";

/// Characters not allowed in a filter set name.
pub const ILLEGAL_FILE_NAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>'];

/// Characters not allowed in a path segment of a path condition.
pub const ILLEGAL_FILE_PATH_CHARS: &[char] = &['\\', ':', '*', '?', '"', '<', '>'];

fn match_everything(name: &str, includes_unallocated_space: bool) -> FilesSet {
    FilesSet::with_single_rule(
        name,
        name,
        false,
        includes_unallocated_space,
        Rule::new(name, MetaType::All),
    )
}

/// Every file and directory, excluding unallocated space.
pub fn all_files_and_directories() -> FilesSet {
    match_everything(ALL_FILES_AND_DIRECTORIES, false)
}

/// Every file and directory plus unallocated space.
pub fn all_files_directories_and_unallocated() -> FilesSet {
    match_everything(ALL_FILES_DIRECTORIES_AND_UNALLOCATED, true)
}

/// The two built-in ingest filters, default first.
pub fn standard_ingest_filters() -> Vec<FilesSet> {
    vec![
        all_files_directories_and_unallocated(),
        all_files_and_directories(),
    ]
}

/// Filter used when no ingest filter was chosen.
pub fn default_filter() -> FilesSet {
    all_files_directories_and_unallocated()
}

/// Check a proposed set name against [`ILLEGAL_FILE_NAME_CHARS`].
pub fn is_valid_set_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains(ILLEGAL_FILE_NAME_CHARS)
}

/// Check a path fragment against [`ILLEGAL_FILE_PATH_CHARS`].
pub fn is_valid_path_segment(segment: &str) -> bool {
    !segment.contains(ILLEGAL_FILE_PATH_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::FileEntry;

    #[test]
    fn test_default_is_unallocated_inclusive() {
        let filter = default_filter();
        assert_eq!(filter.name(), ALL_FILES_DIRECTORIES_AND_UNALLOCATED);
        assert!(filter.includes_unallocated_space());
        assert!(!filter.ignores_known_files());
    }

    #[test]
    fn test_standard_filters_match_everything_allowed() {
        let unalloc = FileEntry::file("$Unalloc_1", "/").with_unallocated(true);
        let dir = FileEntry::directory("Windows", "/");

        let [with_unalloc, without]: [FilesSet; 2] = standard_ingest_filters().try_into().unwrap();
        assert_eq!(with_unalloc.matches(&unalloc), Some(ALL_FILES_DIRECTORIES_AND_UNALLOCATED));
        assert_eq!(without.matches(&unalloc), None);
        assert_eq!(without.matches(&dir), Some(ALL_FILES_AND_DIRECTORIES));
    }

    #[test]
    fn test_name_validation() {
        assert!(is_valid_set_name("Executables"));
        assert!(!is_valid_set_name("a/b"));
        assert!(!is_valid_set_name("   "));
        assert!(is_valid_path_segment("/Windows/System32/"));
        assert!(!is_valid_path_segment("C:"));
    }
}
