//! Dependent-field sub-components: `app/components/<Singular>Select.vue`.
//!
//! A dependent field selects one entry of an array field held by an item of
//! another collection. The component name is the singular of that array
//! field, derived by [`dependent_component_name`].

use crate::diagnostic::GeneratorError;
use crate::layout::ArtifactKind;
use crate::naming::{dependent_component_name, label};

use super::{GenContext, GeneratedArtifact};

/// First line of every generated dependent component. Rollback only removes
/// `*Select.vue` files that start with it.
pub const DEPENDENT_MARKER: &str = "<!-- layerkit:dependent -->";

pub fn generate(ctx: &GenContext) -> Result<Vec<GeneratedArtifact>, GeneratorError> {
    let mut artifacts: Vec<GeneratedArtifact> = Vec::new();
    let mut seen: Vec<(String, String, String)> = Vec::new();

    for field in ctx.schema.dependent_fields() {
        let Some(dep) = &field.dependent_on else {
            continue;
        };
        let component = dependent_component_name(&dep.field)?;
        let key = (component.clone(), dep.collection.clone(), dep.field.clone());
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);

        let item_label = label(&component);
        let content = format!(
            r#"{DEPENDENT_MARKER}
<script setup lang="ts">
const props = defineProps<{{
  parentId?: string | null
  collection: string
  field: string
}}>()

const model = defineModel<string | null>()

const {{ items }} = await useLayerkitCollectionQuery<Record<string, unknown>>(props.collection)

const options = computed(() => {{
  const parent = items.value?.find((item) => item.id === props.parentId)
  const entries = (parent?.[props.field] ?? []) as Array<Record<string, unknown>>
  return entries.map((entry, index) => ({{
    label: String(entry.label ?? entry.name ?? `{item_label} ${{index + 1}}`),
    value: String(entry.id ?? index),
  }}))
}})

watch(() => props.parentId, (next, previous) => {{
  if (previous !== undefined && next !== previous) model.value = null
}})
</script>

<template>
  <USelect
    v-model="model"
    :items="options"
    :disabled="!parentId"
    placeholder="Select {placeholder}"
    class="w-full"
  />
</template>
"#,
            placeholder = item_label.to_lowercase(),
        );

        artifacts.push(GeneratedArtifact::new(
            ArtifactKind::Dependent(component.clone()),
            ctx.layout.dependent_component(&component),
            content,
        ));
    }

    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::test_support::Fixture;
    use crate::config::{CollectionOptions, Dialect};
    use serde_json::json;

    fn fixture(field: &str) -> Fixture {
        Fixture::new(
            "bookings",
            "reservations",
            json!({
                "location": { "type": "reference", "meta": { "refTarget": "locations" } },
                "choice": { "type": "string", "meta": { "dependsOn": "location", "dependsOnCollection": "locations", "dependsOnField": field } }
            }),
            CollectionOptions::default(),
        )
    }

    #[test]
    fn test_slots_becomes_slot_select() {
        let fixture = fixture("slots");
        let artifacts = generate(&fixture.ctx(Dialect::Sqlite)).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert!(artifacts[0]
            .relative_path
            .ends_with("layers/bookings/collections/reservations/app/components/SlotSelect.vue"));
        assert_eq!(artifacts[0].kind, ArtifactKind::Dependent("Slot".to_string()));
        assert!(artifacts[0].content.contains("placeholder=\"Select slot\""));
        assert!(artifacts[0].content.starts_with(DEPENDENT_MARKER));
    }

    #[test]
    fn test_categories_becomes_category_select() {
        let fixture = fixture("categories");
        let artifacts = generate(&fixture.ctx(Dialect::Sqlite)).unwrap();
        assert!(artifacts[0].relative_path.ends_with("CategorySelect.vue"));
    }

    #[test]
    fn test_no_dependent_fields() {
        let fixture = Fixture::blog_posts();
        assert!(generate(&fixture.ctx(Dialect::Sqlite)).unwrap().is_empty());
    }
}
