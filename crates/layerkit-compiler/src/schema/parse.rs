//! Fields file parsing and implicit field injection.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::diagnostic::{GeneratorError, Warning};
use super::{
    CanonicalType, CollectionSchema, DependentOn, FieldDescriptor, FieldOrigin, ItemProperty,
    ParsedSchema, RepeaterItem, SchemaOptions, AUDIT_FIELDS, HIERARCHY_FIELDS, ID_FIELD,
    ORDER_FIELD, SCOPE_FIELDS, TRANSLATIONS_FIELD,
};

/// Field metadata as written in the fields file. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawMeta {
    required: bool,
    max_length: Option<u32>,
    label: Option<String>,
    translatable: bool,
    default: Option<Value>,
    primary_key: bool,
    precision: Option<u32>,
    scale: Option<u32>,
    area: Option<String>,
    group: Option<String>,
    display_as: Option<String>,
    depends_on: Option<String>,
    depends_on_collection: Option<String>,
    depends_on_field: Option<String>,
    properties: Option<Map<String, Value>>,
    translatable_properties: Vec<String>,
    options: Vec<String>,
    ref_target: Option<String>,
    unique: bool,
}

/// Reads and parses a JSON fields file.
pub fn parse_schema_file(
    path: &Path,
    collection: &str,
    options: &SchemaOptions,
) -> Result<ParsedSchema, GeneratorError> {
    let content = std::fs::read_to_string(path).map_err(|e| GeneratorError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let raw: Value = serde_json::from_str(&content).map_err(|e| GeneratorError::ConfigError {
        path: path.to_path_buf(),
        message: format!("Failed to parse fields file: {}", e),
    })?;

    parse_schema(&raw, collection, options)
}

/// Parses a field map into a collection schema.
///
/// Injection order: identifier, scope, user fields, audit, hierarchy (or
/// `order` for sortable collections), translations.
pub fn parse_schema(
    raw: &Value,
    collection: &str,
    options: &SchemaOptions,
) -> Result<ParsedSchema, GeneratorError> {
    let map = raw.as_object().ok_or_else(|| GeneratorError::InvalidSchema {
        field: "<root>".to_string(),
        message: "expected an object mapping field names to definitions".to_string(),
    })?;

    if map.is_empty() {
        return Err(GeneratorError::EmptySchema {
            collection: collection.to_string(),
        });
    }

    let mut warnings = Vec::new();
    let mut user_fields = Vec::with_capacity(map.len());
    for (name, definition) in map {
        user_fields.push(parse_field(name, definition)?);
    }

    apply_translation_options(&mut user_fields, options)?;

    for field in &user_fields {
        if field.is_translatable && field.required {
            warnings.push(Warning::TranslatableRequired {
                field: field.name.clone(),
            });
        }
    }

    let fields = assemble(collection, user_fields, options)?;
    debug!(collection, fields = fields.len(), "parsed collection schema");

    Ok(ParsedSchema {
        schema: CollectionSchema {
            collection: collection.to_string(),
            fields,
            options: options.clone(),
        },
        warnings,
    })
}

/// Field and property names become TS properties and Vue bindings verbatim.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn check_identifier(field: &str, name: &str) -> Result<(), GeneratorError> {
    if is_identifier(name) {
        return Ok(());
    }
    Err(GeneratorError::InvalidSchema {
        field: field.to_string(),
        message: format!("'{}' is not a valid identifier (letters, digits, '_' or '$', not starting with a digit)", name),
    })
}

fn parse_field(name: &str, definition: &Value) -> Result<FieldDescriptor, GeneratorError> {
    check_identifier(name, name)?;

    let obj = definition.as_object().ok_or_else(|| GeneratorError::InvalidSchema {
        field: name.to_string(),
        message: "expected an object with a 'type'".to_string(),
    })?;

    let type_name = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| GeneratorError::InvalidSchema {
            field: name.to_string(),
            message: "missing 'type'".to_string(),
        })?;

    let meta: RawMeta = match obj.get("meta") {
        Some(meta) => serde_json::from_value(meta.clone()).map_err(|e| GeneratorError::InvalidSchema {
            field: name.to_string(),
            message: format!("invalid meta: {}", e),
        })?,
        None => RawMeta::default(),
    };

    let mut canonical_type = CanonicalType::parse(type_name).ok_or_else(|| GeneratorError::UnknownFieldType {
        field: name.to_string(),
        type_name: type_name.to_string(),
    })?;

    let reference_target = meta
        .ref_target
        .clone()
        .or_else(|| obj.get("refTarget").and_then(Value::as_str).map(str::to_string));

    if reference_target.is_some() && matches!(canonical_type, CanonicalType::String | CanonicalType::Uuid) {
        canonical_type = CanonicalType::Reference;
    }
    if canonical_type == CanonicalType::Reference && reference_target.is_none() {
        return Err(GeneratorError::InvalidSchema {
            field: name.to_string(),
            message: "reference fields need 'refTarget'".to_string(),
        });
    }

    let repeater_item_schema = match (&meta.properties, canonical_type) {
        (Some(properties), CanonicalType::Repeater) => {
            Some(parse_item(name, properties, &meta.translatable_properties)?)
        }
        (Some(_), _) => {
            return Err(GeneratorError::InvalidSchema {
                field: name.to_string(),
                message: "'properties' is only supported on repeater fields".to_string(),
            })
        }
        (None, _) => None,
    };

    let dependent_on = parse_dependency(name, &meta)?;

    Ok(FieldDescriptor {
        name: name.to_string(),
        canonical_type,
        required: meta.required,
        max_length: meta.max_length,
        default_value: meta.default,
        is_translatable: meta.translatable,
        is_primary_key: meta.primary_key,
        reference_target,
        dependent_on,
        repeater_item_schema,
        label: meta.label.unwrap_or_else(|| crate::naming::label(name)),
        area: meta.area,
        group: meta.group,
        display_as: meta.display_as,
        precision: meta.precision,
        scale: meta.scale,
        options: meta.options,
        unique: meta.unique,
        origin: FieldOrigin::User,
    })
}

fn parse_dependency(name: &str, meta: &RawMeta) -> Result<Option<DependentOn>, GeneratorError> {
    let Some(via) = &meta.depends_on else {
        return Ok(None);
    };

    let collection = meta
        .depends_on_collection
        .clone()
        .ok_or_else(|| GeneratorError::InvalidSchema {
            field: name.to_string(),
            message: "'dependsOn' needs 'dependsOnCollection'".to_string(),
        })?;

    Ok(Some(DependentOn {
        via: via.clone(),
        collection,
        field: meta.depends_on_field.clone().unwrap_or_else(|| name.to_string()),
    }))
}

/// Parses repeater item properties, recursing into nested repeaters.
///
/// Each property is either `{ "type": ..., "meta": { ... } }` or the flat
/// form `{ "type": ..., "required": true, ... }`.
fn parse_item(
    field: &str,
    properties: &Map<String, Value>,
    translatable_properties: &[String],
) -> Result<RepeaterItem, GeneratorError> {
    let mut parsed = Vec::with_capacity(properties.len());

    for (prop_name, definition) in properties {
        check_identifier(&format!("{}.{}", field, prop_name), prop_name)?;

        let obj = definition.as_object().ok_or_else(|| GeneratorError::InvalidSchema {
            field: format!("{}.{}", field, prop_name),
            message: "expected an object with a 'type'".to_string(),
        })?;

        let type_name = obj.get("type").and_then(Value::as_str).unwrap_or("string");
        let canonical_type =
            CanonicalType::parse(type_name).ok_or_else(|| GeneratorError::InvalidRepeaterProperty {
                field: field.to_string(),
                property: prop_name.to_string(),
                type_name: type_name.to_string(),
            })?;

        let meta = obj.get("meta").and_then(Value::as_object).unwrap_or(obj);
        let flag = |key: &str| meta.get(key).and_then(Value::as_bool).unwrap_or(false);

        let item = match (canonical_type, meta.get("properties").and_then(Value::as_object)) {
            (CanonicalType::Repeater, Some(nested)) => {
                Some(parse_item(&format!("{}.{}", field, prop_name), nested, &[])?)
            }
            _ => None,
        };

        parsed.push(ItemProperty {
            name: prop_name.to_string(),
            canonical_type,
            required: flag("required"),
            translatable: flag("translatable") || translatable_properties.iter().any(|p| p == prop_name),
            label: meta
                .get("label")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| crate::naming::label(prop_name)),
            item,
        });
    }

    Ok(RepeaterItem { properties: parsed })
}

fn apply_translation_options(
    fields: &mut [FieldDescriptor],
    options: &SchemaOptions,
) -> Result<(), GeneratorError> {
    for name in &options.translatable {
        let field = fields.iter_mut().find(|f| &f.name == name).ok_or_else(|| {
            GeneratorError::InvalidSchema {
                field: name.clone(),
                message: "listed as translatable but not declared in the fields file".to_string(),
            }
        })?;
        field.is_translatable = true;
    }

    if options.no_translations {
        for field in fields.iter_mut() {
            field.is_translatable = false;
            if let Some(item) = &mut field.repeater_item_schema {
                clear_item_translations(item);
            }
        }
    }
    Ok(())
}

fn clear_item_translations(item: &mut RepeaterItem) {
    for prop in &mut item.properties {
        prop.translatable = false;
        if let Some(nested) = &mut prop.item {
            clear_item_translations(nested);
        }
    }
}

/// Places user fields between the generated ones and rejects collisions.
fn assemble(
    collection: &str,
    mut user_fields: Vec<FieldDescriptor>,
    options: &SchemaOptions,
) -> Result<Vec<FieldDescriptor>, GeneratorError> {
    let primary_keys: Vec<&str> = user_fields
        .iter()
        .filter(|f| f.is_primary_key)
        .map(|f| f.name.as_str())
        .collect();
    if primary_keys.len() > 1 {
        return Err(GeneratorError::InvalidSchema {
            field: primary_keys.join(", "),
            message: "only one field can be the primary key".to_string(),
        });
    }

    let mut fields = Vec::with_capacity(user_fields.len() + 12);

    // Identifier: a user primary key takes the slot, otherwise a uuid `id`.
    let declared_key = user_fields.iter().position(|f| f.is_primary_key);
    let mut identifier = match declared_key {
        Some(index) => {
            let mut field = user_fields.remove(index);
            field.origin = FieldOrigin::Identifier;
            field.required = true;
            field
        }
        None => {
            let mut field = FieldDescriptor::implicit(ID_FIELD, CanonicalType::Uuid, true, FieldOrigin::Identifier);
            field.is_primary_key = true;
            field
        }
    };

    let mut injected: Vec<FieldDescriptor> = Vec::new();
    for name in SCOPE_FIELDS {
        injected.push(FieldDescriptor::implicit(name, CanonicalType::String, true, FieldOrigin::Scope));
    }
    let scope_count = injected.len();

    let mut trailing: Vec<FieldDescriptor> = Vec::new();
    for name in AUDIT_FIELDS {
        let ty = if name.ends_with("At") { CanonicalType::Date } else { CanonicalType::String };
        trailing.push(FieldDescriptor::implicit(name, ty, true, FieldOrigin::Audit));
    }
    if options.hierarchy {
        for name in HIERARCHY_FIELDS {
            trailing.push(hierarchy_field(collection, name));
        }
    } else if options.sortable {
        trailing.push(hierarchy_field(collection, ORDER_FIELD));
    }

    // `id` stays reserved even when a declared primary key took the slot.
    let mut reserved: Vec<&str> = vec![ID_FIELD, TRANSLATIONS_FIELD];
    reserved.extend(injected.iter().map(|f| f.name.as_str()));
    reserved.extend(trailing.iter().map(|f| f.name.as_str()));

    let mut overrides: Vec<FieldDescriptor> = Vec::new();
    let mut remaining = Vec::with_capacity(user_fields.len());
    for field in user_fields {
        if reserved.contains(&field.name.as_str()) {
            if options.allow_overrides.iter().any(|n| n == &field.name) {
                overrides.push(field);
                continue;
            }
            return Err(GeneratorError::NamingCollision { field: field.name });
        }
        remaining.push(field);
    }

    // An overriding `id` only replaces the injected identifier.
    if declared_key.is_none() {
        if let Some(pos) = overrides.iter().position(|f| f.name == ID_FIELD) {
            let mut replacement = overrides.remove(pos);
            replacement.origin = FieldOrigin::Identifier;
            replacement.is_primary_key = true;
            replacement.required = true;
            identifier = replacement;
        }
    }
    fields.push(identifier);

    for slot in injected.iter_mut().chain(trailing.iter_mut()) {
        if let Some(pos) = overrides.iter().position(|f| f.name == slot.name) {
            let mut replacement = overrides.remove(pos);
            replacement.origin = slot.origin;
            *slot = replacement;
        }
    }
    if let Some(unplaced) = overrides.into_iter().next() {
        return Err(GeneratorError::NamingCollision { field: unplaced.name });
    }

    let has_translations = !options.no_translations
        && remaining.iter().any(|f| {
            f.is_translatable
                || f.repeater_item_schema
                    .as_ref()
                    .is_some_and(|item| !item.translatable_properties().is_empty())
        });

    fields.extend(injected.into_iter().take(scope_count));
    fields.extend(remaining);
    fields.extend(trailing);

    if has_translations {
        fields.push(FieldDescriptor::implicit(
            TRANSLATIONS_FIELD,
            CanonicalType::Json,
            false,
            FieldOrigin::Translations,
        ));
    }

    Ok(fields)
}

fn hierarchy_field(collection: &str, name: &str) -> FieldDescriptor {
    match name {
        "parentId" => {
            let mut field = FieldDescriptor::implicit(name, CanonicalType::Reference, false, FieldOrigin::Hierarchy);
            field.reference_target = Some(collection.to_string());
            field
        }
        "path" => {
            let mut field = FieldDescriptor::implicit(name, CanonicalType::String, true, FieldOrigin::Hierarchy);
            field.default_value = Some(Value::String("/".to_string()));
            field
        }
        _ => {
            let mut field = FieldDescriptor::implicit(name, CanonicalType::Number, true, FieldOrigin::Hierarchy);
            field.default_value = Some(Value::from(0));
            field
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(parsed: &ParsedSchema) -> Vec<&str> {
        parsed.schema.fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_injection_order() {
        let raw = json!({
            "title": { "type": "string", "meta": { "required": true } },
            "body": { "type": "text" }
        });
        let parsed = parse_schema(&raw, "posts", &SchemaOptions::default()).unwrap();
        assert_eq!(
            names(&parsed),
            vec!["id", "teamId", "owner", "title", "body", "createdAt", "updatedAt", "createdBy", "updatedBy"]
        );
    }

    #[test]
    fn test_hierarchy_and_translations() {
        let raw = json!({
            "title": { "type": "string", "meta": { "translatable": true } }
        });
        let options = SchemaOptions { hierarchy: true, ..Default::default() };
        let parsed = parse_schema(&raw, "pages", &options).unwrap();
        let fields = names(&parsed);
        assert_eq!(
            &fields[fields.len() - 5..],
            &["parentId", "path", "depth", "order", "translations"]
        );
        assert_eq!(
            parsed.schema.field("parentId").unwrap().reference_target.as_deref(),
            Some("pages")
        );
    }

    #[test]
    fn test_sortable_adds_order_only() {
        let raw = json!({ "name": { "type": "string" } });
        let options = SchemaOptions { sortable: true, ..Default::default() };
        let parsed = parse_schema(&raw, "tags", &options).unwrap();
        assert_eq!(names(&parsed).last(), Some(&"order"));
        assert!(parsed.schema.field("path").is_none());
    }

    #[test]
    fn test_user_primary_key_replaces_identifier() {
        let raw = json!({
            "id": { "type": "uuid", "meta": { "primaryKey": true } },
            "title": { "type": "string" }
        });
        let parsed = parse_schema(&raw, "posts", &SchemaOptions::default()).unwrap();
        let ids: Vec<_> = parsed.schema.fields.iter().filter(|f| f.name == "id").collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].origin, FieldOrigin::Identifier);
        assert_eq!(parsed.schema.editable_fields().count(), 1);
    }

    #[test]
    fn test_plain_id_field_collides_with_identifier() {
        let raw = json!({
            "id": { "type": "string" },
            "title": { "type": "string" }
        });
        let err = parse_schema(&raw, "posts", &SchemaOptions::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::NamingCollision { field } if field == "id"));
    }

    #[test]
    fn test_id_override_replaces_identifier() {
        let raw = json!({
            "id": { "type": "string", "meta": { "maxLength": 24 } },
            "title": { "type": "string" }
        });
        let options = SchemaOptions { allow_overrides: vec!["id".into()], ..Default::default() };
        let parsed = parse_schema(&raw, "posts", &options).unwrap();
        let ids: Vec<_> = parsed.schema.fields.iter().filter(|f| f.name == "id").collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].canonical_type, CanonicalType::String);
        assert_eq!(ids[0].origin, FieldOrigin::Identifier);
        assert!(ids[0].is_primary_key);
        assert_eq!(names(&parsed)[0], "id");
    }

    #[test]
    fn test_id_next_to_declared_key_collides() {
        let raw = json!({
            "slug": { "type": "string", "meta": { "primaryKey": true } },
            "id": { "type": "string" }
        });
        let err = parse_schema(&raw, "posts", &SchemaOptions::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::NamingCollision { field } if field == "id"));
    }

    #[test]
    fn test_field_names_must_be_identifiers() {
        let raw = json!({ "first-name": { "type": "string" } });
        let err = parse_schema(&raw, "people", &SchemaOptions::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidSchema { field, .. } if field == "first-name"));

        for name in ["2fa", "with space", ""] {
            let raw = json!({ name: { "type": "string" } });
            assert!(parse_schema(&raw, "people", &SchemaOptions::default()).is_err(), "{name}");
        }
        let raw = json!({ "_internal": { "type": "string" }, "$price2": { "type": "number" } });
        assert!(parse_schema(&raw, "people", &SchemaOptions::default()).is_ok());
    }

    #[test]
    fn test_repeater_property_names_must_be_identifiers() {
        let raw = json!({
            "slots": { "type": "repeater", "meta": { "properties": { "start-time": { "type": "string" } } } }
        });
        let err = parse_schema(&raw, "locations", &SchemaOptions::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidSchema { field, .. } if field == "slots.start-time"));
    }

    #[test]
    fn test_empty_schema() {
        let err = parse_schema(&json!({}), "posts", &SchemaOptions::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::EmptySchema { .. }));
    }

    #[test]
    fn test_unknown_type_names_field() {
        let raw = json!({ "title": { "type": "strnig" } });
        let err = parse_schema(&raw, "posts", &SchemaOptions::default()).unwrap_err();
        match err {
            GeneratorError::UnknownFieldType { field, type_name } => {
                assert_eq!(field, "title");
                assert_eq!(type_name, "strnig");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_collision_with_audit_field() {
        let raw = json!({ "createdAt": { "type": "date" } });
        let err = parse_schema(&raw, "posts", &SchemaOptions::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::NamingCollision { field } if field == "createdAt"));
    }

    #[test]
    fn test_collision_allowed_override() {
        let raw = json!({ "owner": { "type": "reference", "meta": { "refTarget": "members" } } });
        let options = SchemaOptions { allow_overrides: vec!["owner".into()], ..Default::default() };
        let parsed = parse_schema(&raw, "posts", &options).unwrap();
        let owner = parsed.schema.field("owner").unwrap();
        assert_eq!(owner.canonical_type, CanonicalType::Reference);
        assert_eq!(owner.origin, FieldOrigin::Scope);
        assert_eq!(names(&parsed)[2], "owner");
    }

    #[test]
    fn test_order_only_collides_when_injected() {
        let raw = json!({ "order": { "type": "number" } });
        assert!(parse_schema(&raw, "posts", &SchemaOptions::default()).is_ok());
        let sortable = SchemaOptions { sortable: true, ..Default::default() };
        assert!(parse_schema(&raw, "posts", &sortable).is_err());
    }

    #[test]
    fn test_translatable_required_is_warning() {
        let raw = json!({
            "title": { "type": "string", "meta": { "required": true, "translatable": true } }
        });
        let parsed = parse_schema(&raw, "posts", &SchemaOptions::default()).unwrap();
        assert_eq!(
            parsed.warnings,
            vec![Warning::TranslatableRequired { field: "title".into() }]
        );
    }

    #[test]
    fn test_no_translations_clears_flags() {
        let raw = json!({
            "title": { "type": "string", "meta": { "translatable": true } }
        });
        let options = SchemaOptions { no_translations: true, ..Default::default() };
        let parsed = parse_schema(&raw, "posts", &options).unwrap();
        assert!(!parsed.schema.has_translations());
        assert_eq!(parsed.schema.translatable_fields().count(), 0);
    }

    #[test]
    fn test_repeater_properties() {
        let raw = json!({
            "slots": {
                "type": "repeater",
                "meta": {
                    "properties": {
                        "label": { "type": "string", "required": true, "translatable": true },
                        "capacity": { "type": "number" }
                    }
                }
            }
        });
        let parsed = parse_schema(&raw, "locations", &SchemaOptions::default()).unwrap();
        let item = parsed.schema.field("slots").unwrap().repeater_item_schema.clone().unwrap();
        assert_eq!(item.properties.len(), 2);
        assert_eq!(item.translatable_properties().len(), 1);
        assert!(parsed.schema.has_translations());
    }

    #[test]
    fn test_repeater_unknown_property_type() {
        let raw = json!({
            "slots": { "type": "repeater", "meta": { "properties": { "when": { "type": "moment" } } } }
        });
        let err = parse_schema(&raw, "locations", &SchemaOptions::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidRepeaterProperty { property, .. } if property == "when"));
    }

    #[test]
    fn test_unknown_meta_keys_ignored() {
        let raw = json!({ "title": { "type": "string", "meta": { "futureFlag": 3 } } });
        assert!(parse_schema(&raw, "posts", &SchemaOptions::default()).is_ok());
    }

    #[test]
    fn test_dependent_field() {
        let raw = json!({
            "location": { "type": "string", "meta": { "refTarget": "locations" } },
            "slot": {
                "type": "string",
                "meta": { "dependsOn": "location", "dependsOnCollection": "locations", "dependsOnField": "slots" }
            }
        });
        let parsed = parse_schema(&raw, "bookings", &SchemaOptions::default()).unwrap();
        let dep = parsed.schema.field("slot").unwrap().dependent_on.clone().unwrap();
        assert_eq!(dep.field, "slots");
        assert_eq!(dep.via, "location");
        assert_eq!(parsed.schema.field("location").unwrap().canonical_type, CanonicalType::Reference);
    }
}
