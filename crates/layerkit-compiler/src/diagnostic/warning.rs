//! Non-fatal diagnostics collected during a run.

use std::path::PathBuf;

use thiserror::Error;

/// A warning that does not stop the target.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A translatable field was also marked required at the top level.
    #[error("field '{field}' is translatable and required; the value lives in translations, so 'required' is only enforced per language")]
    TranslatableRequired { field: String },

    /// An existing file was left untouched because `force` was off.
    #[error("skipped existing file {} (use --force to overwrite)", path.display())]
    FileSkipped { path: PathBuf },

    /// A package listed in the configuration is not in the catalog.
    #[error("unknown package '{id}' ignored")]
    UnknownPackage { id: String },

    /// A dependent field points at a collection that is not part of this run.
    #[error("field '{field}' depends on collection '{collection}', which is not generated in this run")]
    UnresolvedDependency { field: String, collection: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_subject() {
        let skipped = Warning::FileSkipped { path: PathBuf::from("layers/blog/types.ts") };
        assert_eq!(
            skipped.to_string(),
            "skipped existing file layers/blog/types.ts (use --force to overwrite)"
        );
        let dependency = Warning::UnresolvedDependency {
            field: "slot".into(),
            collection: "locations".into(),
        };
        assert!(dependency.to_string().contains("'locations'"));
    }
}
