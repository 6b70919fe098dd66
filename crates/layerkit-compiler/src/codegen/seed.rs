//! Seed module: `server/database/seed.ts`.

use crate::layout::ArtifactKind;
use crate::schema::{CanonicalType, FieldOrigin};
use crate::types::quote;

use super::{banner, GenContext, GeneratedArtifact, MappedField, RUNTIME_PACKAGE};

pub fn generate(ctx: &GenContext, count: usize) -> GeneratedArtifact {
    let n = ctx.naming;
    let table = &n.prefixed_plural_camel;

    let mut code = banner(ctx);
    code.push_str(&format!("import {{ useDB }} from '{}/server'\n", RUNTIME_PACKAGE));
    code.push_str(&format!("import {{ {} }} from './schema'\n\n", table));

    code.push_str(&format!(
        "export async function seed{}(teamId: string, userId: string, count = {}) {{\n",
        n.prefixed_plural_pascal, count
    ));
    code.push_str("  const db = useDB()\n");
    code.push_str("  const rows = Array.from({ length: count }, (_, i) => ({\n");
    for f in &ctx.fields {
        if let Some(value) = value(f) {
            code.push_str(&format!("    {}: {},\n", f.field.name, value));
        }
    }
    code.push_str("  }))\n");
    code.push_str(&format!("  return await db.insert({}).values(rows).returning()\n", table));
    code.push_str("}\n");

    GeneratedArtifact::new(ArtifactKind::Seed, ctx.layout.seed(), code)
}

/// Deterministic value expression for row `i`, or `None` to leave it out.
fn value(f: &MappedField) -> Option<String> {
    let field = f.field;
    match field.origin {
        FieldOrigin::Identifier => return None,
        FieldOrigin::Scope => {
            let source = if field.name == "teamId" { "teamId" } else { "userId" };
            return Some(source.to_string());
        }
        FieldOrigin::Audit => {
            return field.name.ends_with("By").then(|| "userId".to_string());
        }
        FieldOrigin::Hierarchy => {
            return match field.name.as_str() {
                "order" => Some("i".to_string()),
                "path" => Some("'/'".to_string()),
                "depth" => Some("0".to_string()),
                _ => None,
            };
        }
        FieldOrigin::Translations => return Some("{}".to_string()),
        FieldOrigin::User => {}
    }

    let label = &field.label;
    let expr = match field.canonical_type {
        CanonicalType::String => match field.max_length {
            Some(max) => format!("`{} ${{i + 1}}`.slice(0, {})", label, max),
            None => format!("`{} ${{i + 1}}`", label),
        },
        CanonicalType::Text => format!("`Sample {} ${{i + 1}}`", label.to_lowercase()),
        CanonicalType::Number => "i + 1".to_string(),
        CanonicalType::Decimal => "(i + 1) * 1.5".to_string(),
        CanonicalType::Boolean => "i % 2 === 0".to_string(),
        CanonicalType::Date => "new Date(Date.UTC(2024, 0, 1 + i))".to_string(),
        CanonicalType::Json => "{}".to_string(),
        CanonicalType::Repeater | CanonicalType::Array => "[]".to_string(),
        CanonicalType::Uuid => "crypto.randomUUID()".to_string(),
        CanonicalType::Select if !field.options.is_empty() => {
            let options: Vec<String> = field.options.iter().map(|o| quote(o)).collect();
            format!("[{}][i % {}]", options.join(", "), options.len())
        }
        CanonicalType::Reference | CanonicalType::Image | CanonicalType::Select => {
            if !field.required {
                return None;
            }
            "''".to_string()
        }
    };
    Some(expr)
}
