//! Generator configuration.
//!
//! [`GeneratorConfig`] is what a run needs beyond the targets themselves:
//! the project root, registry locations and the ownership resolver inserted
//! into handlers. [`ProjectConfig`] is the multi-collection configuration
//! file (`layerkit.config.json`).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::diagnostic::GeneratorError;
use crate::schema::SchemaOptions;

/// Default configuration file name, looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "layerkit.config.json";

/// Rows generated by a seed module when the count is not given.
pub const DEFAULT_SEED_COUNT: usize = 25;

/// Persistence dialect of the generated schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Dialect {
    #[default]
    #[serde(rename = "sqlite")]
    Sqlite,
    #[serde(rename = "pg", alias = "postgres", alias = "postgresql")]
    Postgres,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "pg",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Dialect::Sqlite),
            "pg" | "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(GeneratorError::UnsupportedDialect {
                dialect: other.to_string(),
            }),
        }
    }
}

/// Run-wide switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationFlags {
    /// Overwrite existing files instead of skipping them.
    pub force: bool,
    /// Plan only. Nothing is written and no registry is touched.
    pub dry_run: bool,
    /// Treat translatable fields as plain columns.
    pub no_translations: bool,
}

/// The externally supplied capability every request handler calls.
///
/// The generator only emits `import { <function> } from '<module>'` and a
/// call site; access rules live in the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipResolver {
    pub module: String,
    pub function: String,
}

impl Default for OwnershipResolver {
    fn default() -> Self {
        Self {
            module: "@layerkit/core/server".to_string(),
            function: "resolveTeamAndCheckMembership".to_string(),
        }
    }
}

/// Locations of the shared registry files, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistryPaths {
    /// Root `nuxt.config.ts` holding the `extends` list.
    pub extension_list: PathBuf,
    /// Export index aggregating every collection's persistence schema.
    pub schema_index: PathBuf,
    /// `app.config.ts` mapping collection names to their config objects.
    pub ui_registry: PathBuf,
    /// Property of the app config object that holds the collections.
    pub ui_registry_property: String,
}

impl Default for RegistryPaths {
    fn default() -> Self {
        Self {
            extension_list: PathBuf::from("nuxt.config.ts"),
            schema_index: PathBuf::from("server/database/schema/index.ts"),
            ui_registry: PathBuf::from("app/app.config.ts"),
            ui_registry_property: "layerkitCollections".to_string(),
        }
    }
}

/// Configuration shared by every target of a run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Project root. Every generated and registry path is relative to it.
    pub root: PathBuf,
    pub ownership: OwnershipResolver,
    pub registries: RegistryPaths,
    /// Package ids whose layers are added to the extension list.
    pub packages: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            ownership: OwnershipResolver::default(),
            registries: RegistryPaths::default(),
            packages: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

/// Per-collection options, shared by the configuration file and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionOptions {
    pub hierarchy: bool,
    pub sortable: bool,
    /// Number of seed rows; `None` disables the seed module.
    #[serde(deserialize_with = "seed_count")]
    pub seed: Option<usize>,
    /// Field names made translatable in addition to their own `meta`.
    pub translatable: Vec<String>,
    /// Custom input component; the generated form is not emitted.
    pub form_component: Option<String>,
    /// Show created/updated columns in the listing surface.
    pub audit_columns: bool,
    /// Generated field names a user field may replace.
    pub allow_overrides: Vec<String>,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            hierarchy: false,
            sortable: false,
            seed: None,
            translatable: Vec::new(),
            form_component: None,
            audit_columns: true,
            allow_overrides: Vec::new(),
        }
    }
}

impl CollectionOptions {
    pub fn schema_options(&self, flags: &GenerationFlags) -> SchemaOptions {
        SchemaOptions {
            hierarchy: self.hierarchy,
            sortable: self.sortable,
            translatable: self.translatable.clone(),
            no_translations: flags.no_translations,
            allow_overrides: self.allow_overrides.clone(),
        }
    }
}

/// `seed` may be written as `true`/`false` or as a row count.
fn seed_count<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seed {
        Flag(bool),
        Count(usize),
    }

    Ok(match Option::<Seed>::deserialize(deserializer)? {
        Some(Seed::Flag(true)) => Some(DEFAULT_SEED_COUNT),
        Some(Seed::Count(0)) | Some(Seed::Flag(false)) | None => None,
        Some(Seed::Count(n)) => Some(n),
    })
}

/// One collection declared in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    pub name: String,
    /// Fields file, relative to the configuration file.
    pub fields_file: PathBuf,
    #[serde(flatten)]
    pub options: CollectionOptions,
}

/// A layer and the declared collections generated into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetEntry {
    pub layer: String,
    pub collections: Vec<String>,
}

/// Run-wide switches as written in the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectFlags {
    pub no_translations: bool,
    pub force: bool,
    pub dry_run: bool,
}

impl From<&ProjectFlags> for GenerationFlags {
    fn from(flags: &ProjectFlags) -> Self {
        Self {
            force: flags.force,
            dry_run: flags.dry_run,
            no_translations: flags.no_translations,
        }
    }
}

/// The multi-collection configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub dialect: Dialect,
    pub collections: Vec<CollectionEntry>,
    pub targets: Vec<TargetEntry>,
    #[serde(default)]
    pub flags: ProjectFlags,
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub ownership: Option<OwnershipResolver>,
    #[serde(default)]
    pub registries: Option<RegistryPaths>,
}

impl ProjectConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, GeneratorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GeneratorError::io(path, e.to_string()))?;
        let config: ProjectConfig =
            serde_json::from_str(&content).map_err(|e| GeneratorError::ConfigError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), GeneratorError> {
        if self.targets.is_empty() {
            return Err(GeneratorError::ConfigError {
                path: path.to_path_buf(),
                message: "no targets declared".to_string(),
            });
        }
        for (i, entry) in self.collections.iter().enumerate() {
            if self.collections[..i].iter().any(|c| c.name == entry.name) {
                return Err(GeneratorError::ConfigError {
                    path: path.to_path_buf(),
                    message: format!("collection '{}' is declared twice", entry.name),
                });
            }
        }
        for target in &self.targets {
            for name in &target.collections {
                if self.collection(name).is_none() {
                    return Err(GeneratorError::UndeclaredCollection {
                        collection: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionEntry> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Applies the file's ownership, registries and packages to `config`.
    pub fn apply_to(&self, config: &mut GeneratorConfig) {
        if let Some(ownership) = &self.ownership {
            config.ownership = ownership.clone();
        }
        if let Some(registries) = &self.registries {
            config.registries = registries.clone();
        }
        config.packages = self.packages.clone();
    }

    /// A complete example written by `layerkit init-config`.
    pub fn example() -> Self {
        ProjectConfig {
            dialect: Dialect::Sqlite,
            collections: vec![
                CollectionEntry {
                    name: "posts".to_string(),
                    fields_file: PathBuf::from("schemas/posts.json"),
                    options: CollectionOptions {
                        seed: Some(DEFAULT_SEED_COUNT),
                        ..Default::default()
                    },
                },
                CollectionEntry {
                    name: "categories".to_string(),
                    fields_file: PathBuf::from("schemas/categories.json"),
                    options: CollectionOptions {
                        hierarchy: true,
                        ..Default::default()
                    },
                },
            ],
            targets: vec![TargetEntry {
                layer: "blog".to_string(),
                collections: vec!["posts".to_string(), "categories".to_string()],
            }],
            flags: ProjectFlags::default(),
            packages: Vec::new(),
            ownership: Some(OwnershipResolver::default()),
            registries: None,
        }
    }
}
