//! Artifact generation for one collection.
//!
//! Every generator is a pure function of a [`GenContext`]: it reads names from
//! the [`NamingSet`], paths from the [`Layout`] and representations from the
//! [`TypeMapping`] of each field, and returns complete file contents. Nothing
//! here touches the filesystem.

mod composable;
mod database;
mod dependent;
mod form;
mod handlers;
mod list;
mod manifest;
mod queries;
mod seed;
mod ts_types;

pub(crate) use dependent::DEPENDENT_MARKER;

use std::path::PathBuf;

use crate::config::{CollectionOptions, Dialect, OwnershipResolver};
use crate::diagnostic::GeneratorError;
use crate::layout::{ArtifactKind, Layout};
use crate::naming::NamingSet;
use crate::schema::{CollectionSchema, FieldDescriptor, FieldOrigin};
use crate::types::{TypeMapper, TypeMapping};

/// Runtime package the generated code imports shared pieces from.
pub const RUNTIME_PACKAGE: &str = "@layerkit/core";

/// A generated file, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub relative_path: PathBuf,
    pub content: String,
    pub kind: ArtifactKind,
}

impl GeneratedArtifact {
    pub(crate) fn new(kind: ArtifactKind, relative_path: PathBuf, content: String) -> Self {
        Self {
            relative_path,
            content,
            kind,
        }
    }
}

/// A field together with its mapped representations.
#[derive(Debug, Clone)]
pub struct MappedField<'a> {
    pub field: &'a FieldDescriptor,
    pub mapping: TypeMapping,
    /// Column name in the persistence schema.
    pub column: String,
}

/// Everything a generator reads.
pub struct GenContext<'a> {
    pub naming: &'a NamingSet,
    pub schema: &'a CollectionSchema,
    pub options: &'a CollectionOptions,
    pub ownership: &'a OwnershipResolver,
    pub layout: Layout,
    pub dialect: Dialect,
    pub fields: Vec<MappedField<'a>>,
}

impl<'a> GenContext<'a> {
    pub fn new(
        naming: &'a NamingSet,
        schema: &'a CollectionSchema,
        options: &'a CollectionOptions,
        ownership: &'a OwnershipResolver,
        dialect: Dialect,
    ) -> Self {
        let mapper = TypeMapper::new(dialect);
        let fields = schema
            .fields
            .iter()
            .map(|field| MappedField {
                field,
                mapping: mapper.map(field),
                column: crate::naming::snake(&field.name),
            })
            .collect();

        Self {
            naming,
            schema,
            options,
            ownership,
            layout: Layout::new(naming),
            dialect,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&MappedField<'a>> {
        self.fields.iter().find(|f| f.field.name == name)
    }

    /// User fields edited through the input surface, in schema order.
    pub fn editable(&self) -> impl Iterator<Item = &MappedField<'a>> {
        self.fields.iter().filter(|f| f.field.is_editable())
    }

    /// Fields the client sends on create and update.
    pub fn writable(&self) -> impl Iterator<Item = &MappedField<'a>> {
        self.fields
            .iter()
            .filter(|f| f.field.is_editable() || f.field.origin == FieldOrigin::Translations)
    }
}

/// Runs every generator in a fixed order.
pub fn generate(ctx: &GenContext) -> Result<Vec<GeneratedArtifact>, GeneratorError> {
    let mut artifacts = Vec::new();

    artifacts.push(manifest::generate(ctx));
    if ctx.options.form_component.is_none() {
        artifacts.push(form::generate(ctx)?);
    }
    artifacts.push(list::generate(ctx));
    artifacts.extend(dependent::generate(ctx)?);
    artifacts.push(composable::generate(ctx));
    artifacts.extend(handlers::generate(ctx));
    artifacts.push(database::generate(ctx));
    artifacts.push(queries::generate(ctx));
    if let Some(count) = ctx.options.seed {
        artifacts.push(seed::generate(ctx, count));
    }
    artifacts.push(ts_types::generate(ctx));

    Ok(artifacts)
}

/// Banner placed at the top of generated TypeScript files.
pub(crate) fn banner(ctx: &GenContext) -> String {
    format!(
        "// Generated by layerkit for {} / {}. Edits are kept: re-runs skip existing files.\n",
        ctx.naming.layer_kebab, ctx.naming.plural_kebab
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::schema::{parse_schema, SchemaOptions};

    pub struct Fixture {
        pub naming: NamingSet,
        pub schema: CollectionSchema,
        pub options: CollectionOptions,
        pub ownership: OwnershipResolver,
    }

    impl Fixture {
        pub fn new(layer: &str, collection: &str, raw: serde_json::Value, options: CollectionOptions) -> Self {
            let schema_options = SchemaOptions {
                hierarchy: options.hierarchy,
                sortable: options.sortable,
                translatable: options.translatable.clone(),
                no_translations: false,
                allow_overrides: options.allow_overrides.clone(),
            };
            let schema = parse_schema(&raw, collection, &schema_options).unwrap().schema;
            Self {
                naming: crate::naming::derive(layer, collection).unwrap(),
                schema,
                options,
                ownership: OwnershipResolver::default(),
            }
        }

        pub fn blog_posts() -> Self {
            Self::new(
                "blog",
                "posts",
                serde_json::json!({
                    "id": { "type": "uuid", "meta": { "primaryKey": true } },
                    "title": { "type": "string", "meta": { "required": true, "maxLength": 200 } }
                }),
                CollectionOptions::default(),
            )
        }

        pub fn ctx(&self, dialect: Dialect) -> GenContext<'_> {
            GenContext::new(&self.naming, &self.schema, &self.options, &self.ownership, dialect)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::Fixture;
    use super::*;

    #[test]
    fn test_generator_order_is_fixed() {
        let fixture = Fixture::blog_posts();
        let ctx = fixture.ctx(Dialect::Sqlite);
        let kinds: Vec<String> = generate(&ctx).unwrap().iter().map(|a| a.kind.to_string()).collect();
        assert_eq!(
            kinds,
            vec![
                "manifest",
                "form",
                "list",
                "composable",
                "handler:list",
                "handler:create",
                "handler:update",
                "handler:delete",
                "database",
                "queries",
                "types",
            ]
        );
    }

    #[test]
    fn test_generation_is_deterministic() {
        let fixture = Fixture::blog_posts();
        let first = generate(&fixture.ctx(Dialect::Postgres)).unwrap();
        let second = generate(&fixture.ctx(Dialect::Postgres)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_form_component_skips_form() {
        let mut fixture = Fixture::blog_posts();
        fixture.options.form_component = Some("CustomPostForm".to_string());
        let ctx = fixture.ctx(Dialect::Sqlite);
        let artifacts = generate(&ctx).unwrap();
        assert!(artifacts.iter().all(|a| a.kind != ArtifactKind::Form));
    }
}
