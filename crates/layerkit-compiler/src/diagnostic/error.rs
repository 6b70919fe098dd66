//! Generator error types.
#![allow(unused_assignments)]

use std::path::PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while planning, writing, or rolling back a target.
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug)]
pub enum GeneratorError {
    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("Failed to access '{}': {message}", path.display())]
    #[diagnostic(code(layerkit::io::access_failed))]
    IoError {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration in '{}': {message}", path.display())]
    #[diagnostic(
        code(layerkit::config::invalid),
        help("See `layerkit init-config` for a complete example configuration")
    )]
    ConfigError {
        path: PathBuf,
        message: String,
    },

    #[error("Collection '{collection}' is listed in a target but not declared in `collections`")]
    #[diagnostic(code(layerkit::config::undeclared_collection))]
    UndeclaredCollection {
        collection: String,
    },

    #[error("Unsupported dialect: {dialect}")]
    #[diagnostic(
        code(layerkit::config::unsupported_dialect),
        help("Supported dialects are 'sqlite' and 'pg'")
    )]
    UnsupportedDialect {
        dialect: String,
    },

    // =========================================================================
    // Naming Errors
    // =========================================================================
    #[error("Cannot derive names from {role} '{value}'")]
    #[diagnostic(
        code(layerkit::naming::invalid_name),
        help("Layer and collection names need at least one letter, e.g. 'blog' or 'blog-posts'")
    )]
    InvalidName {
        role: &'static str,
        value: String,
    },

    // =========================================================================
    // Schema Errors
    // =========================================================================
    #[error("Schema for '{collection}' declares no fields")]
    #[diagnostic(
        code(layerkit::schema::empty),
        help("A fields file maps field names to {{ \"type\": ..., \"meta\": {{ ... }} }}")
    )]
    EmptySchema {
        collection: String,
    },

    #[error("Invalid schema for field '{field}': {message}")]
    #[diagnostic(code(layerkit::schema::invalid))]
    InvalidSchema {
        field: String,
        message: String,
    },

    #[error("Field '{field}' has unknown type '{type_name}'")]
    #[diagnostic(
        code(layerkit::schema::unknown_field_type),
        help("Known types: string, text, number, decimal, boolean, date, json, repeater, array, reference, uuid, image, select")
    )]
    UnknownFieldType {
        field: String,
        type_name: String,
    },

    #[error("Repeater '{field}' declares property '{property}' with unknown type '{type_name}'")]
    #[diagnostic(code(layerkit::schema::invalid_repeater_property))]
    InvalidRepeaterProperty {
        field: String,
        property: String,
        type_name: String,
    },

    #[error("Field '{field}' collides with the generated '{field}' field")]
    #[diagnostic(
        code(layerkit::schema::naming_collision),
        help("Rename the field, or list it under `allowOverrides` if replacing the generated field is intended")
    )]
    NamingCollision {
        field: String,
    },

    // =========================================================================
    // Writing Errors
    // =========================================================================
    #[error("File already exists: {}", path.display())]
    #[diagnostic(
        code(layerkit::write::file_exists),
        help("Re-run with --force to overwrite generated files")
    )]
    FileExists {
        path: PathBuf,
    },

    #[error("Artifact '{}' was planned twice for {target}", path.display())]
    #[diagnostic(code(layerkit::plan::duplicate_artifact))]
    DuplicateArtifact {
        target: String,
        path: PathBuf,
    },

    // =========================================================================
    // Registry Errors
    // =========================================================================
    #[error("Failed to initialize parser")]
    #[diagnostic(code(layerkit::registry::init_failed))]
    ParserInitFailed,

    #[error("Cannot understand registry file '{}': {message}", path.display())]
    #[diagnostic(
        code(layerkit::registry::parse_failed),
        help("Generated files were kept. Fix the registry file by hand and re-run; existing files are skipped.")
    )]
    RegistryParse {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Run Errors
    // =========================================================================
    #[error("{} of {total} target(s) failed: {}", failed.len(), failed.join(", "))]
    #[diagnostic(
        code(layerkit::run::partial),
        help("Use `layerkit rollback <layer> <collection>` for a clean slate")
    )]
    PartialRun {
        total: usize,
        failed: Vec<String>,
    },
}

impl GeneratorError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IoError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a registry parse error.
    pub fn registry(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::RegistryParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error belongs to the schema family (fatal before Writing).
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::EmptySchema { .. }
                | Self::InvalidSchema { .. }
                | Self::UnknownFieldType { .. }
                | Self::InvalidRepeaterProperty { .. }
                | Self::NamingCollision { .. }
        )
    }
}
