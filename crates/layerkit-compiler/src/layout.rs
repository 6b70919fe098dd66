//! Artifact paths and registry entries of a target.
//!
//! Generators and rollback both go through [`Layout`], so rollback removes
//! exactly the paths generation can produce without reading the schema.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::RegistryPaths;
use crate::naming::NamingSet;

/// Request handlers emitted for a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerVerb {
    List,
    Create,
    Update,
    Delete,
    Reorder,
    Move,
}

impl HandlerVerb {
    pub const ALL: [HandlerVerb; 6] = [
        HandlerVerb::List,
        HandlerVerb::Create,
        HandlerVerb::Update,
        HandlerVerb::Delete,
        HandlerVerb::Reorder,
        HandlerVerb::Move,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerVerb::List => "list",
            HandlerVerb::Create => "create",
            HandlerVerb::Update => "update",
            HandlerVerb::Delete => "delete",
            HandlerVerb::Reorder => "reorder",
            HandlerVerb::Move => "move",
        }
    }

    /// HTTP method in lowercase, as used in the route file suffix.
    pub fn method(&self) -> &'static str {
        match self {
            HandlerVerb::List => "get",
            HandlerVerb::Create => "post",
            HandlerVerb::Update | HandlerVerb::Reorder | HandlerVerb::Move => "patch",
            HandlerVerb::Delete => "delete",
        }
    }

    /// Whether the handler addresses a single item through the route param.
    pub fn has_item_param(&self) -> bool {
        matches!(self, HandlerVerb::Update | HandlerVerb::Delete | HandlerVerb::Move)
    }

    /// Route file path below the collection's API directory.
    fn file_name(&self, item_param: &str) -> String {
        match self {
            HandlerVerb::List | HandlerVerb::Create => format!("index.{}.ts", self.method()),
            HandlerVerb::Update | HandlerVerb::Delete => format!("[{}].{}.ts", item_param, self.method()),
            HandlerVerb::Reorder => "reorder.patch.ts".to_string(),
            HandlerVerb::Move => format!("[{}]/move.patch.ts", item_param),
        }
    }
}

/// What an artifact is, for duplicate detection and reporting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Form,
    List,
    Composable,
    Handler(HandlerVerb),
    Database,
    Queries,
    Types,
    Seed,
    Dependent(String),
    Manifest,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Form => f.write_str("form"),
            ArtifactKind::List => f.write_str("list"),
            ArtifactKind::Composable => f.write_str("composable"),
            ArtifactKind::Handler(verb) => write!(f, "handler:{}", verb.as_str()),
            ArtifactKind::Database => f.write_str("database"),
            ArtifactKind::Queries => f.write_str("queries"),
            ArtifactKind::Types => f.write_str("types"),
            ArtifactKind::Seed => f.write_str("seed"),
            ArtifactKind::Dependent(name) => write!(f, "dependent:{}", name),
            ArtifactKind::Manifest => f.write_str("manifest"),
        }
    }
}

/// The shared registry a [`RegistryEntry`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKind {
    ExtensionList,
    SchemaIndex,
    UiRegistry,
}

impl RegistryKind {
    pub const ALL: [RegistryKind; 3] = [
        RegistryKind::ExtensionList,
        RegistryKind::SchemaIndex,
        RegistryKind::UiRegistry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryKind::ExtensionList => "extension list",
            RegistryKind::SchemaIndex => "schema index",
            RegistryKind::UiRegistry => "ui registry",
        }
    }

    pub fn path<'a>(&self, paths: &'a RegistryPaths) -> &'a Path {
        match self {
            RegistryKind::ExtensionList => &paths.extension_list,
            RegistryKind::SchemaIndex => &paths.schema_index,
            RegistryKind::UiRegistry => &paths.ui_registry,
        }
    }
}

/// One entry a target adds to a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub kind: RegistryKind,
    /// Insertion key: the list value, the module path, or the property name.
    pub key: String,
    /// Rendered value. Equal to `key` except in the UI registry.
    pub value: String,
    /// Module the value is imported from (UI registry only).
    pub import: Option<String>,
}

/// Paths of one target, relative to the project root.
#[derive(Debug, Clone)]
pub struct Layout {
    layer_dir: PathBuf,
    collection_dir: PathBuf,
    api_dir: PathBuf,
    composable_file: String,
    item_param: String,
}

impl Layout {
    pub fn new(naming: &NamingSet) -> Self {
        let collection_dir = PathBuf::from(&naming.collection_dir);
        let api_dir = collection_dir
            .join("server/api/teams/[id]")
            .join(&naming.api_path_segment);

        Self {
            layer_dir: PathBuf::from(&naming.layer_dir),
            collection_dir,
            api_dir,
            composable_file: format!("{}.ts", naming.composable_name),
            item_param: naming.item_param.clone(),
        }
    }

    pub fn layer_dir(&self) -> &Path {
        &self.layer_dir
    }

    pub fn collection_dir(&self) -> &Path {
        &self.collection_dir
    }

    pub fn components_dir(&self) -> PathBuf {
        self.collection_dir.join("app/components")
    }

    pub fn form(&self) -> PathBuf {
        self.components_dir().join("Form.vue")
    }

    pub fn list(&self) -> PathBuf {
        self.components_dir().join("List.vue")
    }

    pub fn dependent_component(&self, component: &str) -> PathBuf {
        self.components_dir().join(format!("{}Select.vue", component))
    }

    pub fn composable(&self) -> PathBuf {
        self.collection_dir.join("app/composables").join(&self.composable_file)
    }

    pub fn api_dir(&self) -> &Path {
        &self.api_dir
    }

    pub fn handler(&self, verb: HandlerVerb) -> PathBuf {
        self.api_dir.join(verb.file_name(&self.item_param))
    }

    pub fn database_schema(&self) -> PathBuf {
        self.collection_dir.join("server/database/schema.ts")
    }

    pub fn queries(&self) -> PathBuf {
        self.collection_dir.join("server/database/queries.ts")
    }

    pub fn seed(&self) -> PathBuf {
        self.collection_dir.join("server/database/seed.ts")
    }

    pub fn types(&self) -> PathBuf {
        self.collection_dir.join("types.ts")
    }

    pub fn manifest(&self) -> PathBuf {
        self.collection_dir.join("nuxt.config.ts")
    }

    /// Every fixed path generation can produce, optional artifacts included.
    ///
    /// Dependent sub-components are named after schema fields and are found
    /// on disk by rollback instead.
    pub fn all_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![
            self.manifest(),
            self.form(),
            self.list(),
            self.composable(),
        ];
        paths.extend(HandlerVerb::ALL.iter().map(|v| self.handler(*v)));
        paths.push(self.database_schema());
        paths.push(self.queries());
        paths.push(self.seed());
        paths.push(self.types());
        paths
    }

    /// Entries the target adds to the three shared registries.
    pub fn registry_entries(&self, naming: &NamingSet, registries: &RegistryPaths) -> Vec<RegistryEntry> {
        let extension = format!("./{}", naming.collection_dir);

        let schema_module = relative_module(
            &registries.schema_index,
            &self.collection_dir.join("server/database/schema"),
        );

        let composable = self.composable().with_extension("");
        let config_module = relative_module(&registries.ui_registry, &composable);

        vec![
            RegistryEntry {
                kind: RegistryKind::ExtensionList,
                key: extension.clone(),
                value: extension,
                import: None,
            },
            RegistryEntry {
                kind: RegistryKind::SchemaIndex,
                key: schema_module.clone(),
                value: schema_module,
                import: None,
            },
            RegistryEntry {
                kind: RegistryKind::UiRegistry,
                key: naming.prefixed_plural_camel.clone(),
                value: naming.config_ident.clone(),
                import: Some(config_module),
            },
        ]
    }
}

/// Import specifier of `target` from the directory holding `from_file`.
///
/// Both paths are relative to the project root.
pub fn relative_module(from_file: &Path, target: &Path) -> String {
    let base = from_file.parent().unwrap_or_else(|| Path::new(""));
    let relative = pathdiff::diff_paths(target, base).unwrap_or_else(|| target.to_path_buf());
    let text = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    if text.starts_with("../") {
        text
    } else {
        format!("./{}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::derive;

    #[test]
    fn test_handler_paths() {
        let naming = derive("blog", "posts").unwrap();
        let layout = Layout::new(&naming);
        let base = "layers/blog/collections/posts/server/api/teams/[id]/blog-posts";
        assert_eq!(layout.handler(HandlerVerb::List), PathBuf::from(format!("{base}/index.get.ts")));
        assert_eq!(layout.handler(HandlerVerb::Update), PathBuf::from(format!("{base}/[postId].patch.ts")));
        assert_eq!(layout.handler(HandlerVerb::Move), PathBuf::from(format!("{base}/[postId]/move.patch.ts")));
    }

    #[test]
    fn test_all_paths_are_unique() {
        let layout = Layout::new(&derive("my-shop", "order_items").unwrap());
        let paths = layout.all_paths();
        let mut deduped = paths.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(paths.len(), deduped.len());
        assert!(paths.iter().all(|p| p.starts_with("layers/my-shop/collections/order-items")));
    }

    #[test]
    fn test_registry_entries() {
        let naming = derive("blog", "posts").unwrap();
        let entries = Layout::new(&naming).registry_entries(&naming, &RegistryPaths::default());

        assert_eq!(entries[0].key, "./layers/blog/collections/posts");
        assert_eq!(
            entries[1].key,
            "../../../layers/blog/collections/posts/server/database/schema"
        );
        assert_eq!(entries[2].key, "blogPosts");
        assert_eq!(entries[2].value, "blogPostsConfig");
        assert_eq!(
            entries[2].import.as_deref(),
            Some("../layers/blog/collections/posts/app/composables/useBlogPosts")
        );
    }

    #[test]
    fn test_relative_module_same_dir() {
        assert_eq!(relative_module(Path::new("index.ts"), Path::new("schema")), "./schema");
    }
}
