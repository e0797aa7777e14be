//! The process-wide owner of the persisted filter set collections.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use filesift_core::{FilesSet, defaults};

use crate::config::StoreConfig;
use crate::error::DefinitionsResult;
use crate::legacy::LegacyXmlFile;
use crate::notify::{DefinitionsChanged, Listeners, SubscriptionId};
use crate::settings::{DefinitionsSource, SettingsFile};
use crate::{Definitions, DefinitionsKind};

static INSTANCE: OnceLock<FilesSetsManager> = OnceLock::new();

/// One persisted collection plus its in-memory copy.
///
/// The mutex guards both the cache and the file, so concurrent readers and
/// writers of the same collection are serialized while the other collection
/// stays available.
#[derive(Debug)]
struct Collection {
    kind: DefinitionsKind,
    settings: SettingsFile,
    fallback: Option<LegacyXmlFile>,
    cache: Mutex<Option<Definitions>>,
}

impl Collection {
    fn new(kind: DefinitionsKind, settings: SettingsFile, fallback: Option<LegacyXmlFile>) -> Self {
        Self {
            kind,
            settings,
            fallback,
            cache: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Definitions>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self) -> DefinitionsResult<Definitions> {
        let mut cache = self.lock();
        if let Some(definitions) = cache.as_ref() {
            return Ok(definitions.clone());
        }

        let loaded = self.load()?;
        *cache = Some(loaded.clone());
        Ok(loaded)
    }

    /// Read the current file, falling back to the legacy document.
    ///
    /// Legacy definitions are written out in the current format right away;
    /// the legacy file itself is left in place.
    fn load(&self) -> DefinitionsResult<Definitions> {
        if let Some(definitions) = self.settings.read()? {
            return Ok(definitions);
        }

        if let Some(legacy) = &self.fallback {
            if let Some(definitions) = legacy.read()? {
                tracing::info!(
                    kind = %self.kind,
                    from = %legacy.describe(),
                    to = %self.settings.describe(),
                    sets = definitions.len(),
                    "migrating legacy definitions"
                );
                self.settings.write(&definitions)?;
                return Ok(definitions);
            }
        }

        tracing::debug!(kind = %self.kind, "no stored definitions, starting empty");
        Ok(Definitions::new())
    }

    fn set(&self, definitions: Definitions) -> DefinitionsResult<()> {
        let mut cache = self.lock();
        self.settings.write(&definitions)?;
        *cache = Some(definitions);
        Ok(())
    }

    fn invalidate(&self) {
        *self.lock() = None;
    }
}

/// Owns the interesting items and custom ingest filter collections.
///
/// Every read returns an independent copy; callers may edit it freely and hand
/// it back through the matching `set_*` call, which replaces the whole
/// collection. Successful writes are announced to subscribers after the
/// collection lock has been released.
#[derive(Debug)]
pub struct FilesSetsManager {
    config: StoreConfig,
    interesting: Collection,
    ingest_filters: Collection,
    listeners: Listeners,
}

impl FilesSetsManager {
    /// Create a manager over the files named by `config`.
    pub fn new(config: StoreConfig) -> Self {
        let interesting = Collection::new(
            DefinitionsKind::InterestingItems,
            SettingsFile::new(config.settings_path(DefinitionsKind::InterestingItems)),
            Some(LegacyXmlFile::new(config.legacy_path())),
        );
        let ingest_filters = Collection::new(
            DefinitionsKind::IngestFilters,
            SettingsFile::new(config.settings_path(DefinitionsKind::IngestFilters)),
            None,
        );

        Self {
            config,
            interesting,
            ingest_filters,
            listeners: Listeners::default(),
        }
    }

    /// The shared manager, created on first use with the default configuration.
    pub fn instance() -> &'static FilesSetsManager {
        INSTANCE.get_or_init(|| Self::new(StoreConfig::default()))
    }

    /// Install `config` for the shared manager.
    ///
    /// Returns `false` if the shared manager already exists, in which case the
    /// existing one is kept.
    pub fn init_instance(config: StoreConfig) -> bool {
        INSTANCE.set(Self::new(config)).is_ok()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn collection(&self, kind: DefinitionsKind) -> &Collection {
        match kind {
            DefinitionsKind::InterestingItems => &self.interesting,
            DefinitionsKind::IngestFilters => &self.ingest_filters,
        }
    }

    /// Get a copy of one collection, loading it on first use.
    pub fn definitions(&self, kind: DefinitionsKind) -> DefinitionsResult<Definitions> {
        self.collection(kind).get()
    }

    /// Replace and save one collection.
    ///
    /// On failure the previous contents stay in effect and nobody is notified.
    pub fn set_definitions(
        &self,
        kind: DefinitionsKind,
        definitions: Definitions,
    ) -> DefinitionsResult<()> {
        self.collection(kind).set(definitions)?;
        tracing::info!(%kind, "definitions saved");
        self.listeners.publish(DefinitionsChanged { kind });
        Ok(())
    }

    /// Drop the in-memory copy so the next read goes back to disk.
    pub fn reload(&self, kind: DefinitionsKind) {
        self.collection(kind).invalidate();
    }

    pub fn interesting_files_sets(&self) -> DefinitionsResult<Definitions> {
        self.definitions(DefinitionsKind::InterestingItems)
    }

    pub fn set_interesting_files_sets(&self, definitions: Definitions) -> DefinitionsResult<()> {
        self.set_definitions(DefinitionsKind::InterestingItems, definitions)
    }

    pub fn custom_ingest_filters(&self) -> DefinitionsResult<Definitions> {
        self.definitions(DefinitionsKind::IngestFilters)
    }

    pub fn set_custom_ingest_filters(&self, definitions: Definitions) -> DefinitionsResult<()> {
        self.set_definitions(DefinitionsKind::IngestFilters, definitions)
    }

    /// Built-in ingest filters, default first. Never persisted.
    pub fn standard_ingest_filters() -> Vec<FilesSet> {
        defaults::standard_ingest_filters()
    }

    pub fn default_filter() -> FilesSet {
        defaults::default_filter()
    }

    /// Every filter a user may pick for ingest: custom filters in stored
    /// order, then the built-in ones.
    pub fn ingest_filter_choices(&self) -> DefinitionsResult<Vec<FilesSet>> {
        let mut choices: Vec<FilesSet> = self.custom_ingest_filters()?.into_values().collect();
        choices.extend(Self::standard_ingest_filters());
        Ok(choices)
    }

    /// Look up a filter by name among the custom and built-in filters.
    ///
    /// Custom filters shadow built-in ones of the same name.
    pub fn ingest_filter(&self, name: &str) -> DefinitionsResult<Option<FilesSet>> {
        Ok(self
            .ingest_filter_choices()?
            .into_iter()
            .find(|set| set.name() == name))
    }

    pub fn illegal_file_name_chars() -> &'static [char] {
        defaults::ILLEGAL_FILE_NAME_CHARS
    }

    pub fn illegal_file_path_chars() -> &'static [char] {
        defaults::ILLEGAL_FILE_PATH_CHARS
    }

    /// Register a listener for successful collection changes.
    ///
    /// Listeners run on the writing thread, after the write has completed.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&DefinitionsChanged) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Returns `true` if the listener was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions_from;
    use filesift_core::{MetaType, NameCondition, Rule};
    use tempfile::TempDir;

    fn set(name: &str) -> FilesSet {
        let rule = Rule::new("exe", MetaType::Files)
            .with_name(NameCondition::extension("exe").unwrap());
        FilesSet::new(name, "", false, true, [rule]).unwrap()
    }

    #[test]
    fn test_empty_when_nothing_stored() {
        let temp = TempDir::new().unwrap();
        let manager = FilesSetsManager::new(StoreConfig::in_dir(temp.path()));

        assert!(manager.interesting_files_sets().unwrap().is_empty());
        assert!(manager.custom_ingest_filters().unwrap().is_empty());
        assert!(!temp.path().join(crate::INTERESTING_FILES_SET_DEFS_NAME).exists());
    }

    #[test]
    fn test_custom_filters_come_first() {
        let temp = TempDir::new().unwrap();
        let manager = FilesSetsManager::new(StoreConfig::in_dir(temp.path()));
        manager
            .set_custom_ingest_filters(definitions_from([set("Mine")]))
            .unwrap();

        let names: Vec<String> = manager
            .ingest_filter_choices()
            .unwrap()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(
            names,
            [
                "Mine",
                defaults::ALL_FILES_DIRECTORIES_AND_UNALLOCATED,
                defaults::ALL_FILES_AND_DIRECTORIES
            ]
        );
        assert!(manager.ingest_filter("Mine").unwrap().is_some());
        assert!(manager.ingest_filter("Nope").unwrap().is_none());
    }

    #[test]
    fn test_reload_picks_up_external_edits() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig::in_dir(temp.path());
        let first = FilesSetsManager::new(config.clone());
        let second = FilesSetsManager::new(config);

        assert!(second.interesting_files_sets().unwrap().is_empty());
        first
            .set_interesting_files_sets(definitions_from([set("A")]))
            .unwrap();
        assert!(second.interesting_files_sets().unwrap().is_empty());

        second.reload(DefinitionsKind::InterestingItems);
        assert_eq!(second.interesting_files_sets().unwrap().len(), 1);
    }
}
