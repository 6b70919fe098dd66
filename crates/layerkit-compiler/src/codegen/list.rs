//! Listing surface: `app/components/List.vue`.

use crate::layout::ArtifactKind;
use crate::schema::{CanonicalType, FieldOrigin};
use crate::types::quote;

use super::{GenContext, GeneratedArtifact, MappedField};

/// Columns shown in the listing, in schema order.
///
/// User fields except structured ones, then the audit columns unless the
/// collection turns them off.
pub fn columns<'c, 'a>(ctx: &'c GenContext<'a>) -> Vec<&'c MappedField<'a>> {
    ctx.fields
        .iter()
        .filter(|f| match f.field.origin {
            FieldOrigin::User => {
                !f.field.is_primary_key
                    && !matches!(f.field.canonical_type, CanonicalType::Json | CanonicalType::Repeater)
            }
            FieldOrigin::Audit => ctx.options.audit_columns,
            _ => false,
        })
        .collect()
}

pub fn generate(ctx: &GenContext) -> GeneratedArtifact {
    let n = ctx.naming;
    let mut code = String::new();

    code.push_str("<script setup lang=\"ts\">\n");
    code.push_str("const props = withDefaults(defineProps<{ layout?: 'table' | 'grid' | 'cards' }>(), {\n  layout: 'table',\n})\n\n");
    code.push_str(&format!("const {{ collection }} = {}()\n", n.composable_name));
    code.push_str(&format!(
        "const {{ items, pending, refresh }} = await useLayerkitCollectionQuery<{}>(collection)\n\n",
        n.prefixed_singular_pascal
    ));

    code.push_str("const columns = [\n");
    for column in columns(ctx) {
        let f = column.field;
        let mut entry = format!(
            "  {{ accessorKey: {}, header: {}, display: {}",
            quote(&f.name),
            quote(&f.label),
            quote(column.mapping.display_hint.as_str())
        );
        if let Some(display_as) = &f.display_as {
            entry.push_str(&format!(", displayAs: {}", quote(display_as)));
        }
        if let Some(target) = &f.reference_target {
            entry.push_str(&format!(", collection: {}", quote(target)));
        }
        entry.push_str(" },\n");
        code.push_str(&entry);
    }
    code.push_str("]\n");
    code.push_str("</script>\n\n");

    code.push_str("<template>\n");
    code.push_str("  <LayerkitCollection\n");
    code.push_str("    :layout=\"props.layout\"\n");
    code.push_str("    :collection=\"collection\"\n");
    code.push_str("    :columns=\"columns\"\n");
    code.push_str("    :rows=\"items\"\n");
    code.push_str("    :loading=\"pending\"\n");
    if ctx.schema.is_hierarchical() {
        code.push_str("    hierarchical\n");
    }
    if ctx.schema.is_sortable() {
        code.push_str("    sortable\n");
    }
    code.push_str("    @refresh=\"refresh\"\n");
    code.push_str("  />\n");
    code.push_str("</template>\n");

    GeneratedArtifact::new(ArtifactKind::List, ctx.layout.list(), code)
}
