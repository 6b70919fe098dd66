//! File output for the Writing stage.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::codegen::GeneratedArtifact;
use crate::diagnostic::GeneratorError;

/// Writes artifacts under the project root.
///
/// Only constructed for real runs; a dry run never reaches the Writing stage.
pub struct Writer {
    root: PathBuf,
    force: bool,
}

impl Writer {
    pub fn new(root: &Path, force: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            force,
        }
    }

    /// Writes one artifact.
    ///
    /// Returns [`GeneratorError::FileExists`] for an existing file when
    /// `force` is off; the caller turns it into a skip.
    pub fn write(&self, artifact: &GeneratedArtifact) -> Result<(), GeneratorError> {
        let path = self.root.join(&artifact.relative_path);

        if path.exists() && !self.force {
            return Err(GeneratorError::FileExists {
                path: artifact.relative_path.clone(),
            });
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GeneratorError::io(parent, e.to_string()))?;
        }
        std::fs::write(&path, &artifact.content).map_err(|e| GeneratorError::io(&path, e.to_string()))?;

        debug!(path = %artifact.relative_path.display(), kind = %artifact.kind, "wrote artifact");
        Ok(())
    }
}
