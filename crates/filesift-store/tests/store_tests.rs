//! Integration tests for filesift-store.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use filesift_core::defaults::{ALL_FILES_AND_DIRECTORIES, ALL_FILES_DIRECTORIES_AND_UNALLOCATED};
use filesift_core::{Comparator, FileEntry, FilesSet, MetaType, NameCondition, Rule, SizeCondition};
use filesift_store::{
    DefinitionsChanged, DefinitionsKind, FilesSetsManager, LEGACY_FILES_SET_DEFS_FILE_NAME,
    StoreConfig, definitions_from,
};
use tempfile::TempDir;

fn exe_set(name: &str) -> FilesSet {
    let rule = Rule::new("exe", MetaType::Files).with_name(NameCondition::extension("exe").unwrap());
    FilesSet::new(name, "executables", true, false, [rule]).unwrap()
}

fn big_files_set(name: &str) -> FilesSet {
    let rule = Rule::new("big", MetaType::Files)
        .with_size(SizeCondition::new(Comparator::Greater, 1_000_000));
    FilesSet::new(name, "", false, true, [rule]).unwrap()
}

fn manager_in(temp: &TempDir) -> FilesSetsManager {
    FilesSetsManager::new(StoreConfig::in_dir(temp.path()))
}

const LEGACY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<INTERESTING_FILE_SETS>
  <INTERESTING_FILE_SET name="Executables" description="Binaries" ignoreKnown="false">
    <EXTENSION name="exe" typeFilter="file">exe</EXTENSION>
  </INTERESTING_FILE_SET>
</INTERESTING_FILE_SETS>
"#;

#[test]
fn test_round_trip_both_collections_independently() {
    let temp = TempDir::new().unwrap();
    let manager = manager_in(&temp);

    let interesting = definitions_from([exe_set("Exes")]);
    let filters = definitions_from([big_files_set("Big")]);

    manager.set_interesting_files_sets(interesting.clone()).unwrap();
    assert_eq!(manager.interesting_files_sets().unwrap(), interesting);
    assert!(manager.custom_ingest_filters().unwrap().is_empty());

    manager.set_custom_ingest_filters(filters.clone()).unwrap();
    assert_eq!(manager.custom_ingest_filters().unwrap(), filters);
    assert_eq!(manager.interesting_files_sets().unwrap(), interesting);

    // A fresh manager reads the same content from disk.
    let reopened = manager_in(&temp);
    assert_eq!(reopened.interesting_files_sets().unwrap(), interesting);
    assert_eq!(reopened.custom_ingest_filters().unwrap(), filters);
}

#[test]
fn test_reads_return_independent_copies() {
    let temp = TempDir::new().unwrap();
    let manager = manager_in(&temp);
    manager
        .set_interesting_files_sets(definitions_from([exe_set("Exes")]))
        .unwrap();

    let first = manager.interesting_files_sets().unwrap();
    let mut second = manager.interesting_files_sets().unwrap();
    assert_eq!(first, second);

    second.shift_remove("Exes");
    second.insert("Other".to_string(), big_files_set("Other"));
    assert_eq!(manager.interesting_files_sets().unwrap(), first);
}

#[test]
fn test_set_replaces_whole_collection() {
    let temp = TempDir::new().unwrap();
    let manager = manager_in(&temp);

    manager
        .set_custom_ingest_filters(definitions_from([exe_set("A")]))
        .unwrap();
    manager
        .set_custom_ingest_filters(definitions_from([big_files_set("B")]))
        .unwrap();

    let stored = manager_in(&temp).custom_ingest_filters().unwrap();
    assert!(!stored.contains_key("A"));
    assert!(stored.contains_key("B"));
}

#[test]
fn test_legacy_file_is_migrated() {
    let temp = TempDir::new().unwrap();
    let legacy_path = temp.path().join(LEGACY_FILES_SET_DEFS_FILE_NAME);
    fs::write(&legacy_path, LEGACY_XML).unwrap();

    let config = StoreConfig::in_dir(temp.path());
    let current_path = config.settings_path(DefinitionsKind::InterestingItems);
    let manager = FilesSetsManager::new(config.clone());

    let migrated = manager.interesting_files_sets().unwrap();
    assert_eq!(migrated.len(), 1);
    let exes = &migrated["Executables"];
    assert_eq!(exes.matches(&FileEntry::file("setup.exe", "/tmp")), Some("exe"));

    assert!(current_path.exists());
    assert_eq!(fs::read_to_string(&legacy_path).unwrap(), LEGACY_XML);

    // The legacy fallback only applies to interesting items.
    assert!(manager.custom_ingest_filters().unwrap().is_empty());

    fs::remove_file(&legacy_path).unwrap();
    let later = FilesSetsManager::new(config);
    assert_eq!(later.interesting_files_sets().unwrap(), migrated);
}

#[test]
fn test_current_file_wins_over_legacy() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(LEGACY_FILES_SET_DEFS_FILE_NAME), LEGACY_XML).unwrap();

    let manager = manager_in(&temp);
    let current = definitions_from([big_files_set("Big")]);
    manager.set_interesting_files_sets(current.clone()).unwrap();

    assert_eq!(manager_in(&temp).interesting_files_sets().unwrap(), current);
}

#[test]
fn test_malformed_legacy_is_an_error() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(LEGACY_FILES_SET_DEFS_FILE_NAME),
        "<SOMETHING_ELSE/>",
    )
    .unwrap();

    let manager = manager_in(&temp);
    assert!(manager.interesting_files_sets().is_err());
    assert!(
        !StoreConfig::in_dir(temp.path())
            .settings_path(DefinitionsKind::InterestingItems)
            .exists()
    );
}

#[test]
fn test_standard_filters_ignore_stored_content() {
    let temp = TempDir::new().unwrap();
    let manager = manager_in(&temp);
    manager
        .set_custom_ingest_filters(definitions_from([exe_set(ALL_FILES_AND_DIRECTORIES)]))
        .unwrap();

    let standard = FilesSetsManager::standard_ingest_filters();
    let names: Vec<&str> = standard.iter().map(FilesSet::name).collect();
    assert_eq!(
        names,
        [ALL_FILES_DIRECTORIES_AND_UNALLOCATED, ALL_FILES_AND_DIRECTORIES]
    );

    let default = FilesSetsManager::default_filter();
    assert_eq!(default.name(), ALL_FILES_DIRECTORIES_AND_UNALLOCATED);
    assert!(default.includes_unallocated_space());
    assert_eq!(default, standard[0]);
}

#[test]
fn test_illegal_characters() {
    assert!(FilesSetsManager::illegal_file_name_chars().contains(&'/'));
    assert!(!FilesSetsManager::illegal_file_path_chars().contains(&'/'));
    assert!(FilesSetsManager::illegal_file_path_chars().contains(&':'));
}

#[test]
fn test_observers_fire_after_successful_writes() {
    let temp = TempDir::new().unwrap();
    let manager = manager_in(&temp);

    let seen: Arc<Mutex<Vec<DefinitionsKind>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let id = manager.subscribe(move |event: &DefinitionsChanged| {
        sink.lock().unwrap().push(event.kind);
    });

    manager
        .set_interesting_files_sets(definitions_from([exe_set("A")]))
        .unwrap();
    manager
        .set_custom_ingest_filters(definitions_from([exe_set("B")]))
        .unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        [DefinitionsKind::InterestingItems, DefinitionsKind::IngestFilters]
    );

    assert!(manager.unsubscribe(id));
    manager
        .set_custom_ingest_filters(definitions_from([exe_set("C")]))
        .unwrap();
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn test_failed_write_keeps_previous_contents() {
    let temp = TempDir::new().unwrap();
    let config = StoreConfig::in_dir(temp.path());
    let manager = FilesSetsManager::new(config.clone());

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    manager.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let original = definitions_from([exe_set("A")]);
    manager.set_custom_ingest_filters(original.clone()).unwrap();

    // A directory in place of the settings file makes the final rename fail.
    let path = config.settings_path(DefinitionsKind::IngestFilters);
    fs::remove_file(&path).unwrap();
    fs::create_dir(&path).unwrap();
    fs::write(path.join("occupied"), b"x").unwrap();

    let result = manager.set_custom_ingest_filters(definitions_from([exe_set("B")]));
    assert!(result.is_err());
    assert_eq!(manager.custom_ingest_filters().unwrap(), original);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_listener_may_read_back_from_manager() {
    let temp = TempDir::new().unwrap();
    let manager = Arc::new(manager_in(&temp));

    let observed = Arc::new(AtomicUsize::new(0));
    let weak = Arc::downgrade(&manager);
    let sink = Arc::clone(&observed);
    manager.subscribe(move |event| {
        if let Some(manager) = weak.upgrade() {
            let defs = manager.definitions(event.kind).unwrap();
            sink.store(defs.len(), Ordering::SeqCst);
        }
    });

    manager
        .set_interesting_files_sets(definitions_from([exe_set("A"), big_files_set("B")]))
        .unwrap();
    assert_eq!(observed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_concurrent_readers_see_whole_collections() {
    let temp = TempDir::new().unwrap();
    let manager = Arc::new(manager_in(&temp));

    let small = definitions_from([exe_set("A")]);
    let large = definitions_from([exe_set("A"), big_files_set("B"), exe_set("C")]);
    manager.set_interesting_files_sets(small.clone()).unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let (small, large) = (small.clone(), large.clone());
            thread::spawn(move || {
                for _ in 0..50 {
                    let seen = manager.interesting_files_sets().unwrap();
                    assert!(seen == small || seen == large);
                    let filters = manager.custom_ingest_filters().unwrap();
                    assert!(filters.is_empty() || filters.len() == 1);
                }
            })
        })
        .collect();

    let writer = {
        let manager = Arc::clone(&manager);
        let (small, large) = (small.clone(), large.clone());
        thread::spawn(move || {
            for i in 0..20 {
                let next = if i % 2 == 0 { large.clone() } else { small.clone() };
                manager.set_interesting_files_sets(next).unwrap();
                manager
                    .set_custom_ingest_filters(definitions_from([big_files_set("F")]))
                    .unwrap();
            }
        })
    };

    for reader in readers {
        reader.join().unwrap();
    }
    writer.join().unwrap();
}
