//! Persistence schema: `server/database/schema.ts` (Drizzle).
//!
//! Column builders come straight from [`StorageType`](crate::types::StorageType);
//! the query module records the same builders.

use serde_json::Value;

use crate::config::Dialect;
use crate::layout::ArtifactKind;
use crate::schema::{CanonicalType, FieldOrigin};
use crate::types::quote;

use super::{banner, GenContext, GeneratedArtifact, MappedField};

pub fn generate(ctx: &GenContext) -> GeneratedArtifact {
    let n = ctx.naming;
    let (table_fn, core) = match ctx.dialect {
        Dialect::Sqlite => ("sqliteTable", "drizzle-orm/sqlite-core"),
        Dialect::Postgres => ("pgTable", "drizzle-orm/pg-core"),
    };

    let mut imports: Vec<&str> = vec![table_fn, "index"];
    for f in &ctx.fields {
        if !imports.contains(&f.mapping.storage.builder) {
            imports.push(f.mapping.storage.builder);
        }
    }
    imports[2..].sort_unstable();

    let mut code = banner(ctx);
    code.push_str(&format!("import {{ {} }} from '{}'\n\n", imports.join(", "), core));

    code.push_str(&format!(
        "export const {} = {}('{}', {{\n",
        n.prefixed_plural_camel, table_fn, n.table_name
    ));
    for f in &ctx.fields {
        code.push_str(&format!("  {}: {},\n", f.field.name, column(f)));
    }
    code.push_str(&format!(
        "}}, (table) => [\n  index('{}_team_idx').on(table.teamId),\n",
        n.table_name
    ));
    if ctx.schema.is_hierarchical() {
        code.push_str(&format!("  index('{}_parent_idx').on(table.parentId),\n", n.table_name));
    }
    code.push_str("])\n");

    GeneratedArtifact::new(ArtifactKind::Database, ctx.layout.database_schema(), code)
}

fn column(f: &MappedField) -> String {
    let field = f.field;
    let mut col = f.mapping.storage.render(&f.column);

    if matches!(
        field.canonical_type,
        CanonicalType::Json | CanonicalType::Repeater | CanonicalType::Array
    ) {
        let ty = if field.origin == FieldOrigin::Translations {
            "Record<string, Record<string, unknown>>"
        } else {
            f.mapping.ts_type.as_str()
        };
        col.push_str(&format!(".$type<{}>()", ty));
    }

    if field.origin == FieldOrigin::Identifier {
        col.push_str(".primaryKey()");
        if matches!(field.canonical_type, CanonicalType::Uuid | CanonicalType::String) {
            col.push_str(".$default(() => crypto.randomUUID())");
        }
        return col;
    }

    if field.required && !field.is_translatable {
        col.push_str(".notNull()");
    }
    if field.unique {
        col.push_str(".unique()");
    }

    match field.name.as_str() {
        "createdAt" if field.origin == FieldOrigin::Audit => {
            col.push_str(".$default(() => new Date())");
        }
        "updatedAt" if field.origin == FieldOrigin::Audit => {
            col.push_str(".$default(() => new Date()).$onUpdate(() => new Date())");
        }
        _ => {
            if let Some(default) = &field.default_value {
                col.push_str(&default_modifier(field.canonical_type, default));
            }
        }
    }
    col
}

fn default_modifier(ty: CanonicalType, value: &Value) -> String {
    match (ty, value) {
        (CanonicalType::Date, Value::String(s)) if s == "now" => ".$default(() => new Date())".to_string(),
        (CanonicalType::Date, _) => String::new(),
        (CanonicalType::Json | CanonicalType::Repeater | CanonicalType::Array, v) => {
            format!(".$default(() => ({}))", v)
        }
        (_, Value::String(s)) => format!(".default({})", quote(s)),
        (_, v) => format!(".default({})", v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::test_support::Fixture;
    use crate::config::CollectionOptions;
    use serde_json::json;

    #[test]
    fn test_blog_posts_sqlite() {
        let fixture = Fixture::blog_posts();
        let code = generate(&fixture.ctx(Dialect::Sqlite)).content;
        assert!(code.contains("import { sqliteTable, index, integer, text } from 'drizzle-orm/sqlite-core'"));
        assert!(code.contains("export const blogPosts = sqliteTable('blog_posts', {"));
        assert!(code.contains("  id: text('id').primaryKey().$default(() => crypto.randomUUID()),"));
        assert!(code.contains("  teamId: text('team_id').notNull(),"));
        assert!(code.contains("  title: text('title').notNull(),"));
        assert!(code.contains("  createdAt: integer('created_at', { mode: 'timestamp' }).notNull().$default(() => new Date()),"));
    }

    #[test]
    fn test_postgres_hierarchy() {
        let fixture = Fixture::new(
            "docs",
            "pages",
            json!({
                "title": { "type": "string", "meta": { "required": true, "maxLength": 120, "translatable": true } },
                "price": { "type": "decimal", "meta": { "precision": 10, "scale": 2, "default": 0 } }
            }),
            CollectionOptions { hierarchy: true, ..Default::default() },
        );
        let code = generate(&fixture.ctx(Dialect::Postgres)).content;
        assert!(code.contains("pgTable('docs_pages'"));
        assert!(code.contains("  title: varchar('title', { length: 120 }),"));
        assert!(code.contains("  price: numeric('price', { precision: 10, scale: 2, mode: 'number' }).default(0),"));
        assert!(code.contains("  path: text('path').notNull().default('/'),"));
        assert!(code.contains("  order: integer('order').notNull().default(0),"));
        assert!(code.contains("  translations: jsonb('translations').$type<Record<string, Record<string, unknown>>>(),"));
        assert!(code.contains("index('docs_pages_parent_idx')"));
    }
}
