use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use walkdir::WalkDir;

use layerkit_compiler::config::RegistryPaths;
use layerkit_compiler::layout::RegistryKind;
use layerkit_compiler::registry::{Registry, RegistrySet};
use layerkit_compiler::{
    CollectionOptions, Dialect, FieldsSource, Generator, GeneratorConfig, GeneratorError, State,
    Target, Warning,
};

/// Every file and directory under `root` with file contents.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| {
            let relative = e.path().strip_prefix(root).unwrap().to_path_buf();
            let content = e.file_type().is_file().then(|| fs::read(e.path()).unwrap());
            (relative, content)
        })
        .collect()
}

fn blog_posts() -> Target {
    Target::new(
        "blog",
        "posts",
        FieldsSource::Inline(json!({
            "id": { "type": "uuid", "meta": { "primaryKey": true } },
            "title": { "type": "string", "meta": { "required": true, "maxLength": 200 } }
        })),
    )
}

fn rich_target(dialect: Dialect) -> Target {
    let mut target = Target::new(
        "my-shop",
        "order-items",
        FieldsSource::Inline(json!({
            "name": { "type": "string", "meta": { "required": true, "maxLength": 120, "translatable": true } },
            "notes": { "type": "text" },
            "quantity": { "type": "number", "meta": { "default": 1 } },
            "price": { "type": "decimal", "meta": { "precision": 10, "scale": 2 } },
            "active": { "type": "boolean" },
            "deliveredAt": { "type": "date" },
            "extra": { "type": "json" },
            "tags": { "type": "array" },
            "lines": { "type": "repeater", "meta": { "properties": {
                "label": { "type": "string" },
                "amount": { "type": "number" }
            } } },
            "product": { "type": "reference", "meta": { "refTarget": "products" } },
            "variant": { "type": "string", "meta": { "dependsOn": "product", "dependsOnCollection": "products", "dependsOnField": "variants" } }
        })),
    );
    target.dialect = dialect;
    target.options = CollectionOptions {
        hierarchy: true,
        seed: Some(5),
        ..Default::default()
    };
    target
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

fn registry_keys(root: &Path, kind: RegistryKind) -> Vec<String> {
    let set = RegistrySet::load(root, &RegistryPaths::default()).unwrap();
    set.get(kind).unwrap().list().unwrap()
}

#[test]
fn blog_posts_scenario() {
    let temp = tempfile::TempDir::new().unwrap();
    let root = temp.path();
    let mut generator = Generator::new(GeneratorConfig::with_root(root));

    let report = generator.generate(&[blog_posts()]).into_result().unwrap();
    let target = &report.targets[0];
    assert_eq!(target.state, State::Done);
    assert!(target.skipped.is_empty());
    assert_eq!(target.registry_changes.len(), 3);

    let form = read(root, "layers/blog/collections/posts/app/components/Form.vue");
    assert_eq!(form.matches("<UFormField").count(), 1);
    assert!(form.contains("name=\"title\""));
    assert!(!form.contains("name=\"id\""));

    let list = read(root, "layers/blog/collections/posts/app/components/List.vue");
    for column in ["createdAt", "updatedAt"] {
        assert!(list.contains(&format!("accessorKey: '{}'", column)));
    }

    assert_eq!(
        registry_keys(root, RegistryKind::ExtensionList),
        vec!["./layers/blog/collections/posts"]
    );
    assert_eq!(
        registry_keys(root, RegistryKind::SchemaIndex),
        vec!["../../../layers/blog/collections/posts/server/database/schema"]
    );
    assert_eq!(registry_keys(root, RegistryKind::UiRegistry), vec!["blogPosts"]);

    // Same command again, without force.
    let before = snapshot(root);
    let report = generator.generate(&[blog_posts()]).into_result().unwrap();
    let rerun = &report.targets[0];
    assert!(rerun.written.is_empty());
    assert_eq!(rerun.skipped.len(), target.written.len());
    assert!(rerun.registry_changes.is_empty());
    assert!(rerun.warnings.iter().all(|w| matches!(w, Warning::FileSkipped { .. })));
    assert_eq!(snapshot(root), before);
}

#[test]
fn generate_then_rollback_restores_existing_project() {
    let temp = tempfile::TempDir::new().unwrap();
    let root = temp.path();

    fs::write(
        root.join("nuxt.config.ts"),
        "// https://nuxt.com/docs/api/configuration/nuxt-config\nexport default defineNuxtConfig({\n  extends: [\n    '@layerkit/core',\n  ],\n  modules: ['@nuxt/ui'],\n  devtools: { enabled: true },\n})\n",
    )
    .unwrap();
    fs::create_dir_all(root.join("server/database/schema")).unwrap();
    fs::write(
        root.join("server/database/schema/index.ts"),
        "export * from './auth'\nexport * from './teams'\n",
    )
    .unwrap();
    fs::create_dir_all(root.join("app")).unwrap();
    fs::write(
        root.join("app/app.config.ts"),
        "import { pagesConfig } from '../layers/site/collections/pages/app/composables/useSitePages'\n\nexport default defineAppConfig({\n  ui: { colors: { primary: 'emerald' } },\n  layerkitCollections: {\n    sitePages: pagesConfig,\n  },\n})\n",
    )
    .unwrap();
    fs::create_dir_all(root.join("layers/blog")).unwrap();
    fs::write(root.join("layers/blog/nuxt.config.ts"), "export default defineNuxtConfig({})\n").unwrap();

    let before = snapshot(root);

    let mut generator = Generator::new(GeneratorConfig::with_root(root));
    generator.generate(&[blog_posts()]).into_result().unwrap();
    assert_ne!(snapshot(root), before);
    assert!(read(root, "nuxt.config.ts").contains("    '@layerkit/core',\n    './layers/blog/collections/posts',\n"));

    let report = generator.rollback("blog", "posts", false).unwrap();
    assert_eq!(report.registry_changes.len(), 3);
    assert_eq!(snapshot(root), before);
}

#[test]
fn generate_then_rollback_leaves_empty_project_empty() {
    let temp = tempfile::TempDir::new().unwrap();
    let root = temp.path();
    let mut generator = Generator::new(GeneratorConfig::with_root(root));

    generator.generate(&[rich_target(Dialect::Sqlite)]).into_result().unwrap();
    assert!(root.join("layers/my-shop/collections/order-items/app/components/VariantSelect.vue").exists());

    generator.rollback("my-shop", "order-items", false).unwrap();
    assert!(snapshot(root).is_empty());
}

#[test]
fn dry_run_is_pure() {
    let temp = tempfile::TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("nuxt.config.ts"), "export default defineNuxtConfig({ extends: [] })\n").unwrap();
    let before = snapshot(root);

    let mut generator = Generator::new(GeneratorConfig::with_root(root));

    let mut valid = rich_target(Dialect::Postgres);
    valid.flags.dry_run = true;
    let report = generator.generate(&[valid]).into_result().unwrap();
    assert!(report.targets[0].planned.len() > 10);
    assert_eq!(report.targets[0].planned_entries.len(), 3);

    let mut invalid = Target::new("blog", "posts", FieldsSource::Inline(json!({ "title": { "type": "money" } })));
    invalid.flags.dry_run = true;
    let err = generator.generate(&[invalid]).into_result().unwrap_err();
    assert!(matches!(err, GeneratorError::UnknownFieldType { .. }));

    let rollback = generator.rollback("blog", "posts", true).unwrap();
    assert!(rollback.removed.is_empty());

    assert_eq!(snapshot(root), before);
}

#[test]
fn upsert_is_idempotent_across_runs() {
    let temp = tempfile::TempDir::new().unwrap();
    let root = temp.path();
    let mut generator = Generator::new(GeneratorConfig::with_root(root));

    generator.generate(&[blog_posts()]).into_result().unwrap();
    let once = snapshot(root);

    let mut forced = blog_posts();
    forced.flags.force = true;
    let report = generator.generate(&[forced]).into_result().unwrap();
    assert!(report.targets[0].registry_changes.is_empty());
    assert_eq!(snapshot(root), once);
}

/// `name: builder(` lines of the table definition.
fn table_builders(schema: &str) -> BTreeMap<String, String> {
    schema
        .lines()
        .filter_map(|line| {
            let (name, rest) = line.strip_prefix("  ")?.split_once(": ")?;
            let builder = rest.split_once('(')?.0;
            builder
                .chars()
                .all(|c| c.is_ascii_alphabetic())
                .then(|| (name.to_string(), builder.to_string()))
        })
        .collect()
}

/// `name: 'builder',` lines of the column type record.
fn assumed_builders(queries: &str) -> BTreeMap<String, String> {
    queries
        .lines()
        .skip_while(|line| !line.contains("ColumnTypes = {"))
        .skip(1)
        .take_while(|line| !line.starts_with('}'))
        .filter_map(|line| {
            let (name, rest) = line.trim().split_once(": ")?;
            Some((name.to_string(), rest.trim_end_matches(',').trim_matches('\'').to_string()))
        })
        .collect()
}

#[test]
fn storage_types_agree_between_schema_and_queries() {
    for dialect in [Dialect::Sqlite, Dialect::Postgres] {
        let generator = Generator::new(GeneratorConfig::default());
        let plan = generator.plan(&rich_target(dialect)).unwrap();
        let content = |suffix: &str| {
            plan.artifacts
                .iter()
                .find(|a| a.relative_path.ends_with(suffix))
                .unwrap()
                .content
                .clone()
        };

        let table = table_builders(&content("server/database/schema.ts"));
        let assumed = assumed_builders(&content("server/database/queries.ts"));

        assert_eq!(table.len(), plan.schema.fields.len(), "{dialect}");
        assert_eq!(table, assumed, "{dialect}");
    }
}

#[test]
fn planning_is_deterministic() {
    let generator = Generator::new(GeneratorConfig::default());
    let first = generator.plan(&rich_target(Dialect::Postgres)).unwrap();
    let second = generator.plan(&rich_target(Dialect::Postgres)).unwrap();
    assert_eq!(first.artifacts, second.artifacts);
    assert_eq!(first.naming, second.naming);
}

#[test]
fn config_run_generates_targets_in_order() {
    let temp = tempfile::TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("schemas")).unwrap();
    fs::write(root.join("schemas/posts.json"), r#"{ "title": { "type": "string", "meta": { "required": true } } }"#).unwrap();
    fs::write(root.join("schemas/tags.json"), r#"{ "name": { "type": "string" } }"#).unwrap();
    fs::write(
        root.join("layerkit.config.json"),
        r#"{
            "dialect": "pg",
            "collections": [
                { "name": "posts", "fieldsFile": "schemas/posts.json", "sortable": true },
                { "name": "tags", "fieldsFile": "schemas/tags.json", "seed": true }
            ],
            "targets": [ { "layer": "blog", "collections": ["posts", "tags"] } ],
            "packages": ["pages"]
        }"#,
    )
    .unwrap();

    let mut generator = Generator::new(GeneratorConfig::with_root(root));
    let report = generator
        .generate_config(&root.join("layerkit.config.json"), Default::default(), None)
        .unwrap()
        .into_result()
        .unwrap();

    let names: Vec<&str> = report.targets.iter().map(|t| t.target.as_str()).collect();
    assert_eq!(names, vec!["blog/posts", "blog/tags"]);
    assert_eq!(report.packages.len(), 1);
    assert!(root.join("layers/blog/collections/posts/server/api/teams/[id]/blog-posts/reorder.patch.ts").exists());
    assert!(root.join("layers/blog/collections/tags/server/database/seed.ts").exists());
    assert_eq!(
        registry_keys(root, RegistryKind::ExtensionList),
        vec![
            "./layers/blog/collections/posts",
            "./layers/blog/collections/tags",
            "@layerkit/pages",
        ]
    );
}
