//! Input surface: `app/components/Form.vue`.

use crate::diagnostic::GeneratorError;
use crate::layout::ArtifactKind;
use crate::naming::dependent_component_name;
use crate::schema::{CanonicalType, ItemProperty};
use crate::types::{quote, translatable_item_properties, ControlKind};

use super::{GenContext, GeneratedArtifact, MappedField};

pub fn generate(ctx: &GenContext) -> Result<GeneratedArtifact, GeneratorError> {
    let primary: Vec<&MappedField> = ctx.editable().filter(|f| !f.field.is_translatable).collect();
    let translatable: Vec<&MappedField> = ctx.editable().filter(|f| f.field.is_translatable).collect();
    let dates: Vec<&MappedField> = primary
        .iter()
        .copied()
        .filter(|f| f.field.canonical_type == CanonicalType::Date)
        .collect();

    let mut code = String::new();
    code.push_str("<template>\n");
    code.push_str("  <LayerkitConfirmDelete v-if=\"action === 'delete'\" :items=\"items\" :loading=\"loading\" @confirm=\"handleSubmit\" />\n");
    code.push_str("  <UForm v-else :schema=\"schema\" :state=\"state\" class=\"flex flex-col gap-4\" @submit=\"handleSubmit\">\n");

    for (area, fields) in by_area(&primary) {
        let indent = match &area {
            Some(name) => {
                code.push_str(&format!("    <div data-area=\"{}\" class=\"flex flex-col gap-4\">\n", name));
                "      "
            }
            None => "    ",
        };
        for field in fields {
            code.push_str(&form_field(ctx, field, indent)?);
        }
        if area.is_some() {
            code.push_str("    </div>\n");
        }
    }

    if !translatable.is_empty() {
        code.push_str("    <LayerkitTranslationsInput\n");
        code.push_str("      v-model=\"state.translations\"\n");
        code.push_str("      v-model:base=\"state\"\n");
        code.push_str(&format!(
            "      :fields=\"[{}]\"\n",
            translatable
                .iter()
                .map(|f| translation_field(&f.field.name, &f.field.label, f.mapping.control_kind, f.field.required))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        code.push_str("    />\n");
    }

    code.push_str("    <LayerkitFormActions :action=\"action\" :loading=\"loading\" />\n");
    code.push_str("  </UForm>\n");
    code.push_str("</template>\n\n");

    code.push_str(&script(ctx, &dates));

    Ok(GeneratedArtifact::new(ArtifactKind::Form, ctx.layout.form(), code))
}

/// Groups fields by `meta.area`, keeping first-appearance order.
fn by_area<'f, 'a>(fields: &[&'f MappedField<'a>]) -> Vec<(Option<String>, Vec<&'f MappedField<'a>>)> {
    let mut groups: Vec<(Option<String>, Vec<&'f MappedField<'a>>)> = Vec::new();
    for &field in fields {
        let area = field.field.area.clone();
        match groups.iter_mut().find(|(a, _)| *a == area) {
            Some((_, members)) => members.push(field),
            None => groups.push((area, vec![field])),
        }
    }
    groups
}

fn form_field(ctx: &GenContext, f: &MappedField, indent: &str) -> Result<String, GeneratorError> {
    let field = f.field;
    let required = if field.required { " required" } else { "" };
    let mut out = format!(
        "{indent}<UFormField label={} name=\"{}\"{}>\n",
        attr(&field.label),
        field.name,
        required
    );
    let inner = format!("{indent}  ");
    out.push_str(&control(ctx, f, &inner)?);
    out.push_str(&format!("{indent}</UFormField>\n"));
    Ok(out)
}

fn control(ctx: &GenContext, f: &MappedField, indent: &str) -> Result<String, GeneratorError> {
    let field = f.field;
    let name = &field.name;

    if let Some(dep) = &field.dependent_on {
        let component = format!("{}{}Select", ctx.naming.component_prefix, dependent_component_name(&dep.field)?);
        return Ok(format!(
            "{indent}<{component} v-model=\"state.{name}\" :parent-id=\"state.{}\" collection=\"{}\" field=\"{}\" />\n",
            dep.via, dep.collection, dep.field
        ));
    }

    let tag = f.mapping.control_kind.component();
    let line = match f.mapping.control_kind {
        ControlKind::TextInput | ControlKind::Hidden => {
            format!("<{tag} v-model=\"state.{name}\" class=\"w-full\" />")
        }
        ControlKind::Textarea => format!("<{tag} v-model=\"state.{name}\" class=\"w-full\" :rows=\"4\" />"),
        ControlKind::NumberInput => match field.scale {
            Some(scale) if field.canonical_type == CanonicalType::Decimal => format!(
                "<{tag} v-model=\"state.{name}\" class=\"w-full\" :step=\"{}\" />",
                step(scale)
            ),
            _ => format!("<{tag} v-model=\"state.{name}\" class=\"w-full\" />"),
        },
        ControlKind::Toggle => format!("<{tag} v-model=\"state.{name}\" />"),
        ControlKind::DatePicker => format!("<{tag} v-model=\"{}Value\" />", crate::naming::camel(name)),
        ControlKind::JsonEditor | ControlKind::ImageUpload | ControlKind::TagInput => {
            format!("<{tag} v-model=\"state.{name}\" class=\"w-full\" />")
        }
        ControlKind::ReferenceSelect => format!(
            "<{tag} v-model=\"state.{name}\" collection=\"{}\" />",
            field.reference_target.as_deref().unwrap_or_default()
        ),
        ControlKind::Select => format!(
            "<{tag} v-model=\"state.{name}\" :items=\"[{}]\" class=\"w-full\" />",
            field.options.iter().map(|o| quote(o)).collect::<Vec<_>>().join(", ")
        ),
        ControlKind::Repeater => return Ok(repeater(f, indent)),
    };
    Ok(format!("{indent}{line}\n"))
}

fn repeater(f: &MappedField, indent: &str) -> String {
    let field = f.field;
    let fields = field
        .repeater_item_schema
        .as_ref()
        .map(|item| item_fields(&item.properties))
        .unwrap_or_else(|| "[]".to_string());

    let translatable = translatable_item_properties(field);
    if translatable.is_empty() {
        return format!(
            "{indent}<LayerkitRepeater v-model=\"state.{}\" :fields=\"{}\" />\n",
            field.name, fields
        );
    }

    let mut out = format!(
        "{indent}<LayerkitRepeater v-model=\"state.{}\" :fields=\"{}\">\n",
        field.name, fields
    );
    out.push_str(&format!("{indent}  <template #item-translations=\"{{ item }}\">\n"));
    out.push_str(&format!(
        "{indent}    <LayerkitTranslationsInput v-model=\"item.translations\" v-model:base=\"item\" :fields=\"[{}]\" />\n",
        translatable
            .iter()
            .map(|p| translation_field(&p.name, &p.label, item_control(p), p.required))
            .collect::<Vec<_>>()
            .join(", ")
    ));
    out.push_str(&format!("{indent}  </template>\n"));
    out.push_str(&format!("{indent}</LayerkitRepeater>\n"));
    out
}

fn item_fields(properties: &[ItemProperty]) -> String {
    let entries: Vec<String> = properties
        .iter()
        .map(|p| {
            format!(
                "{{ name: {}, label: {}, type: {}, required: {} }}",
                quote(&p.name),
                quote(&p.label),
                quote(p.canonical_type.as_str()),
                p.required
            )
        })
        .collect();
    format!("[{}]", entries.join(", "))
}

fn item_control(prop: &ItemProperty) -> ControlKind {
    match prop.canonical_type {
        CanonicalType::Text => ControlKind::Textarea,
        _ => ControlKind::TextInput,
    }
}

fn translation_field(name: &str, label: &str, control: ControlKind, required: bool) -> String {
    format!(
        "{{ name: {}, label: {}, component: {}, required: {} }}",
        quote(name),
        quote(label),
        quote(control.component()),
        required
    )
}

fn script(ctx: &GenContext, dates: &[&MappedField]) -> String {
    let n = ctx.naming;
    let id = ctx.schema.identifier().map(|f| f.name.as_str()).unwrap_or("id");

    let mut code = String::new();
    code.push_str("<script setup lang=\"ts\">\n");
    code.push_str(&format!(
        "import type {{ {}FormProps }} from '../../types'\n\n",
        n.prefixed_singular_pascal
    ));
    code.push_str(&format!(
        "const props = defineProps<{}FormProps>()\n",
        n.prefixed_singular_pascal
    ));
    code.push_str(&format!(
        "const {{ defaultValue, schema, collection }} = {}()\n",
        n.composable_name
    ));
    code.push_str("const { create, update, deleteItems } = useLayerkitMutation()\n");
    code.push_str("const loading = ref(false)\n\n");

    code.push_str(&format!(
        "const initialValues = props.action === 'update' && props.activeItem?.{id}\n  ? {{ ...defaultValue, ...props.activeItem }}\n  : {{ ...defaultValue }}\n\n"
    ));
    code.push_str("const state = ref({ ...initialValues })\n");

    if !dates.is_empty() {
        code.push_str(
            r#"
const toDateValue = (value: string | Date | null | undefined): Date | undefined => {
  if (!value) return undefined
  const date = value instanceof Date ? value : new Date(value)
  return Number.isNaN(date.getTime()) ? undefined : date
}

const fromDateValue = (value: Date | undefined): string | null =>
  value ? value.toISOString() : null
"#,
        );
        for date in dates {
            let name = &date.field.name;
            code.push_str(&format!(
                "\nconst {}Value = computed({{\n  get: () => toDateValue(state.value.{name}),\n  set: (value: Date | undefined) => {{ state.value.{name} = fromDateValue(value) }},\n}})\n",
                crate::naming::camel(name)
            ));
        }
    }

    code.push_str(&format!(
        r#"
const handleSubmit = async () => {{
  loading.value = true
  try {{
    if (props.action === 'create') {{
      await create(collection, state.value)
    }} else if (props.action === 'update' && props.activeItem?.{id}) {{
      await update(collection, props.activeItem.{id}, state.value)
    }} else if (props.action === 'delete') {{
      await deleteItems(collection, props.items)
    }}
  }} finally {{
    loading.value = false
  }}
}}
</script>
"#
    ));
    code
}

fn step(scale: u32) -> String {
    if scale == 0 {
        "1".to_string()
    } else {
        format!("0.{}1", "0".repeat(scale as usize - 1))
    }
}

/// A static attribute with its value escaped for the template.
fn attr(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "&quot;"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::test_support::Fixture;
    use crate::config::{CollectionOptions, Dialect};
    use serde_json::json;

    #[test]
    fn test_blog_posts_has_one_control() {
        let fixture = Fixture::blog_posts();
        let form = generate(&fixture.ctx(Dialect::Sqlite)).unwrap();
        assert_eq!(form.content.matches("<UFormField").count(), 1);
        assert!(form.content.contains("name=\"title\" required"));
        assert!(!form.content.contains("state.id\""));
        assert!(form.content.contains("useBlogPosts()"));
        assert!(form.content.contains("BlogPostFormProps"));
    }

    #[test]
    fn test_translatable_fields_go_to_one_block() {
        let fixture = Fixture::new(
            "site",
            "pages",
            json!({
                "title": { "type": "string", "meta": { "translatable": true } },
                "body": { "type": "text", "meta": { "translatable": true } },
                "slug": { "type": "string", "meta": { "required": true } }
            }),
            CollectionOptions::default(),
        );
        let form = generate(&fixture.ctx(Dialect::Sqlite)).unwrap().content;
        assert_eq!(form.matches("<UFormField").count(), 1);
        assert_eq!(form.matches("<LayerkitTranslationsInput").count(), 1);
        assert!(form.contains("name: 'title'"));
        assert!(form.contains("name: 'body', label: 'Body', component: 'UTextarea'"));
    }

    #[test]
    fn test_date_helpers() {
        let fixture = Fixture::new(
            "blog",
            "posts",
            json!({ "publishedAt": { "type": "date" } }),
            CollectionOptions::default(),
        );
        let form = generate(&fixture.ctx(Dialect::Sqlite)).unwrap().content;
        assert!(form.contains("const toDateValue"));
        assert!(form.contains("const fromDateValue"));
        assert!(form.contains("v-model=\"publishedAtValue\""));
    }

    #[test]
    fn test_dependent_field_uses_singular_component() {
        let fixture = Fixture::new(
            "bookings",
            "reservations",
            json!({
                "location": { "type": "reference", "meta": { "refTarget": "locations" } },
                "slot": { "type": "string", "meta": { "dependsOn": "location", "dependsOnCollection": "locations", "dependsOnField": "slots" } }
            }),
            CollectionOptions::default(),
        );
        let form = generate(&fixture.ctx(Dialect::Sqlite)).unwrap().content;
        assert!(form.contains("<BookingsReservationsSlotSelect v-model=\"state.slot\" :parent-id=\"state.location\""));
        assert!(form.contains("<LayerkitReferenceSelect v-model=\"state.location\" collection=\"locations\" />"));
    }

    #[test]
    fn test_repeater_translation_sub_surface() {
        let fixture = Fixture::new(
            "bookings",
            "locations",
            json!({
                "slots": {
                    "type": "repeater",
                    "meta": { "properties": { "label": { "type": "string", "translatable": true }, "capacity": { "type": "number" } } }
                }
            }),
            CollectionOptions::default(),
        );
        let form = generate(&fixture.ctx(Dialect::Sqlite)).unwrap().content;
        assert!(form.contains("#item-translations"));
        assert!(form.contains("v-model=\"item.translations\""));
    }

    #[test]
    fn test_decimal_step() {
        assert_eq!(step(2), "0.01");
        assert_eq!(step(0), "1");
    }
}
