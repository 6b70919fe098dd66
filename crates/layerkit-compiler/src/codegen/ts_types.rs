//! Type declarations: `types.ts`.

use crate::layout::ArtifactKind;
use crate::schema::FieldOrigin;
use crate::types::quote;

use super::{banner, GenContext, GeneratedArtifact};

/// Fields the database fills in on insert.
const SERVER_FILLED: &[&str] = &["createdAt", "updatedAt", "path", "depth"];

pub fn generate(ctx: &GenContext) -> GeneratedArtifact {
    let item = &ctx.naming.prefixed_singular_pascal;
    let mut code = banner(ctx);

    code.push_str(&format!("export interface {} {{\n", item));
    for f in &ctx.fields {
        let field = f.field;
        let ty = match field.origin {
            FieldOrigin::Translations => translations_type(ctx),
            _ => f.mapping.ts_type.clone(),
        };
        if field.required || field.origin == FieldOrigin::Identifier {
            code.push_str(&format!("  {}: {}\n", field.name, ty));
        } else {
            code.push_str(&format!("  {}?: {} | null\n", field.name, ty));
        }
    }
    code.push_str("}\n\n");

    let mut omitted = vec![];
    if let Some(id) = ctx.schema.identifier() {
        omitted.push(quote(&id.name));
    }
    for name in SERVER_FILLED {
        if ctx.schema.field(name).is_some_and(|f| f.origin != FieldOrigin::User) {
            omitted.push(quote(name));
        }
    }
    code.push_str(&format!(
        "export type New{} = Omit<{}, {}>\n\n",
        item,
        item,
        omitted.join(" | ")
    ));

    let scoped: Vec<String> = ctx
        .fields
        .iter()
        .filter(|f| matches!(f.field.origin, FieldOrigin::Scope | FieldOrigin::Audit))
        .filter(|f| !SERVER_FILLED.contains(&f.field.name.as_str()))
        .map(|f| quote(&f.field.name))
        .collect();
    code.push_str(&format!(
        "export type {}FormData = Omit<New{}, {}>\n\n",
        item,
        item,
        scoped.join(" | ")
    ));

    code.push_str(&format!(
        r#"export interface {item}FormProps {{
  items: string[]
  action: 'create' | 'update' | 'delete'
  activeItem?: {item}
  loading?: string
}}
"#
    ));

    GeneratedArtifact::new(ArtifactKind::Types, ctx.layout.types(), code)
}

/// Per-language values of the translatable fields, keyed by locale.
fn translations_type(ctx: &GenContext) -> String {
    let fields: Vec<String> = ctx
        .editable()
        .filter(|f| f.field.is_translatable)
        .map(|f| format!("{}?: {}", f.field.name, f.mapping.ts_type))
        .collect();
    if fields.is_empty() {
        // Only repeater items carry translations.
        return "Record<string, Record<string, unknown>>".to_string();
    }
    format!("Record<string, {{ {} }}>", fields.join("; "))
}
