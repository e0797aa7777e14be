//! Definition sources and the current settings file format.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::Definitions;
use crate::error::{DefinitionsError, DefinitionsResult};

/// Anything that can produce a named collection of filter sets.
pub trait DefinitionsSource: Send + Sync {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    /// Read the collection. `Ok(None)` means the source does not exist.
    fn read(&self) -> DefinitionsResult<Option<Definitions>>;
}

/// The current format: the whole collection serialized as one JSON object.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file contents with `definitions`.
    ///
    /// The data is written to a uniquely named temporary file in the same
    /// directory and renamed into place, so a reader never sees a half-written
    /// file and concurrent writers never share a scratch file.
    pub fn write(&self, definitions: &Definitions) -> DefinitionsResult<()> {
        check_keys(&self.path, definitions)?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| DefinitionsError::io(parent, e))?;

        let content = serde_json::to_vec_pretty(definitions)
            .map_err(|e| DefinitionsError::serialization(&self.path, e))?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| DefinitionsError::io(parent, e))?;
        if let Err(e) = tmp.write_all(&content).and_then(|()| tmp.flush()) {
            return Err(DefinitionsError::io(tmp.path(), e));
        }
        tmp.persist(&self.path)
            .map_err(|e| DefinitionsError::io(&self.path, e.error))?;

        tracing::debug!(path = %self.path.display(), sets = definitions.len(), "wrote definitions");
        Ok(())
    }
}

/// Every set must be stored under its own name.
fn check_keys(path: &Path, definitions: &Definitions) -> DefinitionsResult<()> {
    match definitions.iter().find(|(key, set)| *key != set.name()) {
        Some((key, set)) => Err(DefinitionsError::KeyMismatch {
            path: path.to_path_buf(),
            key: key.clone(),
            name: set.name().to_string(),
        }),
        None => Ok(()),
    }
}

impl DefinitionsSource for SettingsFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> DefinitionsResult<Option<Definitions>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DefinitionsError::io(&self.path, e)),
        };

        let definitions: Definitions = serde_json::from_slice(&bytes)
            .map_err(|e| DefinitionsError::serialization(&self.path, e))?;
        check_keys(&self.path, &definitions)?;

        tracing::debug!(path = %self.path.display(), sets = definitions.len(), "read definitions");
        Ok(Some(definitions))
    }
}
