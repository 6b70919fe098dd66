//! Rollback of a generated target.
//!
//! Rollback needs no fields file: the naming set and layout give every path a
//! generation could have produced, and dependent components are found on
//! disk by their marker line. Missing files are expected after a partial
//! generation.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::codegen::DEPENDENT_MARKER;
use crate::config::GeneratorConfig;
use crate::diagnostic::GeneratorError;
use crate::layout::Layout;
use crate::naming;
use crate::registry::{RegistryChange, RegistrySet};

/// Suffix of generated dependent-field components.
const DEPENDENT_SUFFIX: &str = "Select.vue";

/// What a rollback removed, or would remove in a dry run.
#[derive(Debug, Default)]
pub struct RollbackReport {
    pub removed: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
    /// Directories left empty by the removal.
    pub pruned: Vec<PathBuf>,
    pub registry_changes: Vec<RegistryChange>,
}

/// Removes the artifacts and registry entries of `layer`/`collection`.
pub fn rollback(
    layer: &str,
    collection: &str,
    config: &GeneratorConfig,
    dry_run: bool,
) -> Result<RollbackReport, GeneratorError> {
    let naming = naming::derive(layer, collection)?;
    let layout = Layout::new(&naming);
    let root = config.root.as_path();
    let mut report = RollbackReport::default();

    let mut paths = layout.all_paths();
    paths.extend(dependent_components(root, &layout.components_dir()));

    for path in paths {
        let full = root.join(&path);
        if !full.is_file() {
            report.missing.push(path);
            continue;
        }
        if !dry_run {
            std::fs::remove_file(&full).map_err(|e| GeneratorError::io(&full, e.to_string()))?;
            debug!(path = %path.display(), "removed artifact");
        }
        report.removed.push(path);
    }

    let mut registries = RegistrySet::load(root, &config.registries)?;
    report.registry_changes = registries.retract(&layout.registry_entries(&naming, &config.registries))?;

    if dry_run {
        return Ok(report);
    }

    for path in registries.flush(true)? {
        if !root.join(&path).exists() {
            report.removed.push(path);
        }
    }

    let emptied: Vec<PathBuf> = report
        .removed
        .iter()
        .filter_map(|p| p.parent().map(Path::to_path_buf))
        .collect();
    for dir in emptied {
        report.pruned.extend(prune_empty(root, &dir)?);
    }

    info!(
        layer = %layer,
        collection = %collection,
        removed = report.removed.len(),
        missing = report.missing.len(),
        registry_changes = report.registry_changes.len(),
        "rollback done"
    );
    Ok(report)
}

/// Generated `*Select.vue` files directly under the collection's components
/// directory. Hand-written components without the marker line are kept.
fn dependent_components(root: &Path, components_dir: &Path) -> Vec<PathBuf> {
    let dir = root.join(components_dir);
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut found: Vec<PathBuf> = WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(DEPENDENT_SUFFIX))
        .filter(|e| is_generated_dependent(e.path()))
        .map(|e| components_dir.join(e.file_name()))
        .collect();
    found.sort();
    found
}

fn is_generated_dependent(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .map(|content| content.lines().next().map(str::trim) == Some(DEPENDENT_MARKER))
        .unwrap_or(false)
}

/// Removes `dir` and its ancestors while they are empty, stopping at `root`.
fn prune_empty(root: &Path, dir: &Path) -> Result<Vec<PathBuf>, GeneratorError> {
    let mut pruned = Vec::new();
    let mut current = Some(dir);

    while let Some(relative) = current {
        if relative.as_os_str().is_empty() {
            break;
        }
        let full = root.join(relative);
        let is_empty = match std::fs::read_dir(&full) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => break,
        };
        if !is_empty {
            break;
        }
        std::fs::remove_dir(&full).map_err(|e| GeneratorError::io(&full, e.to_string()))?;
        pruned.push(relative.to_path_buf());
        current = relative.parent();
    }

    Ok(pruned)
}
