//! Shared registry files.
//!
//! Three hand-maintained files list every generated collection: the root
//! extension list, the schema export index and the UI registry. Each is
//! parsed with tree-sitter and edited next to its parsed entries, so
//! unrelated content is never rewritten and repeated runs are no-ops.

mod extension_list;
mod schema_index;
mod syntax;
mod ui_registry;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::RegistryPaths;
use crate::diagnostic::GeneratorError;
use crate::layout::{RegistryEntry, RegistryKind};

pub use extension_list::ExtensionList;
pub use schema_index::SchemaIndex;
pub use ui_registry::UiRegistry;

/// A registry file held in memory for the duration of a run.
#[derive(Debug, Clone)]
pub struct RegistryFile {
    /// Path relative to the project root, used in diagnostics.
    pub path: PathBuf,
    /// Current content; `None` while the file does not exist.
    pub source: Option<String>,
    /// Content on disk when loaded or last flushed.
    on_disk: Option<String>,
}

impl RegistryFile {
    pub fn new(path: impl Into<PathBuf>, source: Option<String>) -> Self {
        Self {
            path: path.into(),
            on_disk: source.clone(),
            source,
        }
    }

    fn load(root: &Path, path: &Path) -> Result<Self, GeneratorError> {
        let full = root.join(path);
        let source = if full.exists() {
            Some(
                std::fs::read_to_string(&full)
                    .map_err(|e| GeneratorError::io(&full, e.to_string()))?,
            )
        } else {
            None
        };
        Ok(Self::new(path, source))
    }

    pub fn is_dirty(&self) -> bool {
        self.source != self.on_disk
    }

    /// Source to edit, created from `bootstrap` when the file is missing.
    fn source_or(&mut self, bootstrap: &str) -> &str {
        self.source.get_or_insert_with(|| bootstrap.to_string())
    }
}

/// Structural access to one registry file.
pub trait Registry {
    fn kind(&self) -> RegistryKind;

    fn file(&self) -> &RegistryFile;

    fn file_mut(&mut self) -> &mut RegistryFile;

    /// Content of a freshly created file.
    fn bootstrap(&self) -> String;

    /// Insertion keys currently present.
    fn list(&self) -> Result<Vec<String>, GeneratorError>;

    /// Adds `entry` unless its key is present. Returns whether the file changed.
    fn upsert(&mut self, entry: &RegistryEntry) -> Result<bool, GeneratorError>;

    /// Removes the entry with `key`. Absent keys are a no-op.
    fn remove(&mut self, key: &str) -> Result<bool, GeneratorError>;
}

/// Whether a registry changed because of an upsert or a removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Added,
    Removed,
}

/// One effective registry edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryChange {
    pub kind: RegistryKind,
    pub path: PathBuf,
    pub key: String,
    pub action: ChangeAction,
}

/// The three registries of a project, loaded once per run.
pub struct RegistrySet {
    root: PathBuf,
    registries: Vec<Box<dyn Registry>>,
}

impl RegistrySet {
    /// Reads the registry files. Parsing waits until the first edit so a
    /// broken file only fails the registry stage.
    pub fn load(root: &Path, paths: &RegistryPaths) -> Result<Self, GeneratorError> {
        let registries: Vec<Box<dyn Registry>> = vec![
            Box::new(ExtensionList::new(RegistryFile::load(root, &paths.extension_list)?)),
            Box::new(SchemaIndex::new(RegistryFile::load(root, &paths.schema_index)?)),
            Box::new(UiRegistry::new(
                RegistryFile::load(root, &paths.ui_registry)?,
                &paths.ui_registry_property,
            )),
        ];
        Ok(Self {
            root: root.to_path_buf(),
            registries,
        })
    }

    pub fn get(&self, kind: RegistryKind) -> Option<&dyn Registry> {
        self.registries
            .iter()
            .find(|r| r.kind() == kind)
            .map(|r| r.as_ref())
    }

    fn get_mut(&mut self, kind: RegistryKind) -> Option<&mut Box<dyn Registry>> {
        self.registries.iter_mut().find(|r| r.kind() == kind)
    }

    /// Upserts every entry. On error no registry of the set is modified.
    pub fn apply(&mut self, entries: &[RegistryEntry]) -> Result<Vec<RegistryChange>, GeneratorError> {
        self.transaction(|set| {
            let mut changes = Vec::new();
            for entry in entries {
                let Some(registry) = set.get_mut(entry.kind) else {
                    continue;
                };
                if registry.upsert(entry)? {
                    debug!(registry = entry.kind.as_str(), key = %entry.key, "registry entry added");
                    changes.push(RegistryChange {
                        kind: entry.kind,
                        path: registry.file().path.clone(),
                        key: entry.key.clone(),
                        action: ChangeAction::Added,
                    });
                }
            }
            Ok(changes)
        })
    }

    /// Removes every entry's key. On error no registry of the set is modified.
    pub fn retract(&mut self, entries: &[RegistryEntry]) -> Result<Vec<RegistryChange>, GeneratorError> {
        self.transaction(|set| {
            let mut changes = Vec::new();
            for entry in entries {
                let Some(registry) = set.get_mut(entry.kind) else {
                    continue;
                };
                if registry.remove(&entry.key)? {
                    debug!(registry = entry.kind.as_str(), key = %entry.key, "registry entry removed");
                    changes.push(RegistryChange {
                        kind: entry.kind,
                        path: registry.file().path.clone(),
                        key: entry.key.clone(),
                        action: ChangeAction::Removed,
                    });
                }
            }
            Ok(changes)
        })
    }

    fn transaction<T>(
        &mut self,
        edit: impl FnOnce(&mut Self) -> Result<T, GeneratorError>,
    ) -> Result<T, GeneratorError> {
        let snapshot: Vec<Option<String>> = self
            .registries
            .iter()
            .map(|r| r.file().source.clone())
            .collect();

        let result = edit(self);
        if result.is_err() {
            for (registry, source) in self.registries.iter_mut().zip(snapshot) {
                registry.file_mut().source = source;
            }
        }
        result
    }

    /// Writes changed files.
    ///
    /// With `prune_bootstrap`, a file whose content is back to its bootstrap
    /// template is deleted instead of written.
    pub fn flush(&mut self, prune_bootstrap: bool) -> Result<Vec<PathBuf>, GeneratorError> {
        let mut touched = Vec::new();

        for registry in &mut self.registries {
            let bootstrap = registry.bootstrap();
            let file = registry.file_mut();
            if !file.is_dirty() {
                continue;
            }
            let full = self.root.join(&file.path);

            let back_to_bootstrap = file.source.as_deref() == Some(bootstrap.as_str());
            if prune_bootstrap && back_to_bootstrap {
                if full.exists() {
                    std::fs::remove_file(&full).map_err(|e| GeneratorError::io(&full, e.to_string()))?;
                }
                file.source = None;
                info!(path = %file.path.display(), "removed registry file");
            } else if let Some(source) = &file.source {
                if let Some(parent) = full.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| GeneratorError::io(parent, e.to_string()))?;
                }
                std::fs::write(&full, source).map_err(|e| GeneratorError::io(&full, e.to_string()))?;
                info!(path = %file.path.display(), "updated registry file");
            } else {
                continue;
            }

            file.on_disk = file.source.clone();
            touched.push(file.path.clone());
        }

        Ok(touched)
    }

    /// Discards unflushed edits.
    pub fn reset(&mut self) {
        for registry in &mut self.registries {
            let file = registry.file_mut();
            file.source = file.on_disk.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use crate::naming::derive;
    use std::fs;
    use tempfile::TempDir;

    fn entries(layer: &str, collection: &str) -> Vec<RegistryEntry> {
        let naming = derive(layer, collection).unwrap();
        Layout::new(&naming).registry_entries(&naming, &RegistryPaths::default())
    }

    #[test]
    fn test_missing_files_are_bootstrapped_and_pruned() {
        let temp = TempDir::new().unwrap();
        let paths = RegistryPaths::default();

        let mut set = RegistrySet::load(temp.path(), &paths).unwrap();
        let changes = set.apply(&entries("blog", "posts")).unwrap();
        assert_eq!(changes.len(), 3);
        set.flush(false).unwrap();
        assert!(temp.path().join("nuxt.config.ts").exists());
        assert!(temp.path().join("app/app.config.ts").exists());

        let mut set = RegistrySet::load(temp.path(), &paths).unwrap();
        assert_eq!(set.retract(&entries("blog", "posts")).unwrap().len(), 3);
        set.flush(true).unwrap();
        assert!(!temp.path().join("nuxt.config.ts").exists());
        assert!(!temp.path().join("server/database/schema/index.ts").exists());
        assert!(!temp.path().join("app/app.config.ts").exists());
    }

    #[test]
    fn test_failed_apply_leaves_every_registry_untouched() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("app")).unwrap();
        fs::write(temp.path().join("app/app.config.ts"), "export default defineAppConfig({\n").unwrap();

        let mut set = RegistrySet::load(temp.path(), &RegistryPaths::default()).unwrap();
        let err = set.apply(&entries("blog", "posts")).unwrap_err();
        assert!(matches!(err, GeneratorError::RegistryParse { .. }));
        assert!(set.flush(false).unwrap().is_empty());
        assert!(!temp.path().join("nuxt.config.ts").exists());
    }

    #[test]
    fn test_apply_twice_is_a_no_op() {
        let temp = TempDir::new().unwrap();
        let mut set = RegistrySet::load(temp.path(), &RegistryPaths::default()).unwrap();
        set.apply(&entries("blog", "posts")).unwrap();
        assert!(set.apply(&entries("blog", "posts")).unwrap().is_empty());
    }
}
