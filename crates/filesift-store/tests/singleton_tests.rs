//! The process-wide shared manager.
//!
//! Kept in its own test binary: the shared instance can only be installed once
//! per process.

use std::thread;

use filesift_core::{FilesSet, MetaType, Rule};
use filesift_store::{FilesSetsManager, StoreConfig, definitions_from};
use tempfile::TempDir;

#[test]
fn test_shared_manager_is_installed_once() {
    let temp = TempDir::new().unwrap();
    assert!(FilesSetsManager::init_instance(StoreConfig::in_dir(temp.path())));

    let first = FilesSetsManager::instance();
    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(|| FilesSetsManager::instance() as *const FilesSetsManager as usize))
        .collect();
    for handle in handles {
        let addr = handle.join().unwrap();
        assert!(std::ptr::eq(addr as *const FilesSetsManager, first));
    }

    let other = TempDir::new().unwrap();
    assert!(!FilesSetsManager::init_instance(StoreConfig::in_dir(other.path())));
    assert_eq!(FilesSetsManager::instance().config().config_dir(), temp.path());

    let set = FilesSet::new("Shared", "", false, true, [Rule::new("all", MetaType::All)]).unwrap();
    FilesSetsManager::instance()
        .set_interesting_files_sets(definitions_from([set.clone()]))
        .unwrap();
    let seen = thread::spawn(|| FilesSetsManager::instance().interesting_files_sets().unwrap())
        .join()
        .unwrap();
    assert_eq!(seen.get("Shared"), Some(&set));
}
