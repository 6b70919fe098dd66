//! Collection composable: zod schema, defaults and the registry config object.

use crate::layout::ArtifactKind;
use crate::types::quote;

use super::{banner, GenContext, GeneratedArtifact};

pub fn generate(ctx: &GenContext) -> GeneratedArtifact {
    let n = ctx.naming;
    let schema_ident = format!("{}Schema", n.prefixed_plural_camel);
    let defaults_ident = format!("{}Defaults", n.prefixed_plural_camel);

    let mut code = banner(ctx);
    code.push_str("import { z } from 'zod'\n\n");

    code.push_str(&format!("export const {} = z.object({{\n", schema_ident));
    for f in ctx.writable() {
        code.push_str(&format!("  {}: {},\n", f.field.name, f.mapping.validation_expr));
    }
    code.push_str("})\n\n");

    code.push_str(&format!("export const {} = {{\n", defaults_ident));
    for f in ctx.editable() {
        code.push_str(&format!("  {}: {},\n", f.field.name, f.mapping.default_literal));
    }
    if ctx.schema.has_translations() {
        code.push_str("  translations: {},\n");
    }
    code.push_str("}\n\n");

    let form_component = ctx
        .options
        .form_component
        .clone()
        .unwrap_or_else(|| format!("{}Form", n.component_prefix));
    let translatable: Vec<String> = ctx.schema.translatable_fields().map(|f| quote(&f.name)).collect();

    code.push_str(&format!("export const {} = {{\n", n.config_ident));
    code.push_str(&format!("  name: {},\n", quote(&n.prefixed_plural_camel)));
    code.push_str(&format!("  layer: {},\n", quote(&n.layer_kebab)));
    code.push_str(&format!("  label: {},\n", quote(&n.plural_label)));
    code.push_str(&format!("  singularLabel: {},\n", quote(&n.singular_label)));
    code.push_str(&format!("  apiPath: {},\n", quote(&n.api_path_segment)));
    code.push_str(&format!("  componentName: {},\n", quote(&form_component)));
    code.push_str(&format!("  listComponentName: {},\n", quote(&format!("{}List", n.component_prefix))));
    code.push_str(&format!("  schema: {},\n", schema_ident));
    code.push_str(&format!("  defaultValues: {},\n", defaults_ident));
    code.push_str(&format!("  sortable: {},\n", ctx.schema.is_sortable()));
    code.push_str(&format!("  hierarchical: {},\n", ctx.schema.is_hierarchical()));
    code.push_str(&format!("  translatable: [{}],\n", translatable.join(", ")));
    code.push_str("}\n\n");

    code.push_str(&format!(
        r#"export function {composable}() {{
  return {{
    collection: {collection} as const,
    schema: {schema_ident},
    defaultValue: {defaults_ident},
    config: {config},
  }}
}}
"#,
        composable = n.composable_name,
        collection = quote(&n.prefixed_plural_camel),
        config = n.config_ident,
    ));

    GeneratedArtifact::new(ArtifactKind::Composable, ctx.layout.composable(), code)
}
