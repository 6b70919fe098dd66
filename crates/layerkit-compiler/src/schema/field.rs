//! Canonical field descriptors.

use serde::Serialize;
use serde_json::Value;

/// The generator's representation-independent field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalType {
    String,
    Text,
    Number,
    Decimal,
    Boolean,
    Date,
    Json,
    Repeater,
    Array,
    Reference,
    Uuid,
    Image,
    Select,
}

impl CanonicalType {
    /// Parses a type tag from a schema file, accepting common aliases.
    pub fn parse(name: &str) -> Option<Self> {
        let ty = match name.trim().to_ascii_lowercase().as_str() {
            "string" => CanonicalType::String,
            "text" | "textarea" => CanonicalType::Text,
            "number" | "integer" | "int" => CanonicalType::Number,
            "decimal" | "float" => CanonicalType::Decimal,
            "boolean" | "bool" => CanonicalType::Boolean,
            "date" | "datetime" | "timestamp" => CanonicalType::Date,
            "json" | "object" => CanonicalType::Json,
            "repeater" => CanonicalType::Repeater,
            "array" => CanonicalType::Array,
            "reference" | "ref" => CanonicalType::Reference,
            "uuid" => CanonicalType::Uuid,
            "image" => CanonicalType::Image,
            "select" | "enum" => CanonicalType::Select,
            _ => return None,
        };
        Some(ty)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalType::String => "string",
            CanonicalType::Text => "text",
            CanonicalType::Number => "number",
            CanonicalType::Decimal => "decimal",
            CanonicalType::Boolean => "boolean",
            CanonicalType::Date => "date",
            CanonicalType::Json => "json",
            CanonicalType::Repeater => "repeater",
            CanonicalType::Array => "array",
            CanonicalType::Reference => "reference",
            CanonicalType::Uuid => "uuid",
            CanonicalType::Image => "image",
            CanonicalType::Select => "select",
        }
    }

    /// Whether values of this type are plain strings on the wire.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            CanonicalType::String
                | CanonicalType::Text
                | CanonicalType::Uuid
                | CanonicalType::Image
                | CanonicalType::Select
                | CanonicalType::Reference
        )
    }
}

/// Where a field in the collection schema came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldOrigin {
    /// Primary key, injected or declared by the user as `id`.
    Identifier,
    /// Team scope and ownership columns.
    Scope,
    /// Declared in the fields file.
    User,
    /// Created/updated timestamps and authors.
    Audit,
    /// Tree columns of hierarchical or sortable collections.
    Hierarchy,
    /// Per-language shadow column.
    Translations,
}

/// A field whose selectable values come from an array field of another collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependentOn {
    /// Local field holding the selected item of the other collection.
    pub via: String,
    /// Collection that owns the array field.
    pub collection: String,
    /// Array-valued field of that collection (plural, e.g. `slots`).
    pub field: String,
}

/// Item shape of a repeater field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeaterItem {
    pub properties: Vec<ItemProperty>,
}

impl RepeaterItem {
    /// Item properties that need a per-language editing surface.
    pub fn translatable_properties(&self) -> Vec<&ItemProperty> {
        self.properties.iter().filter(|p| p.translatable).collect()
    }
}

/// One property of a repeater item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemProperty {
    pub name: String,
    pub canonical_type: CanonicalType,
    pub required: bool,
    pub translatable: bool,
    pub label: String,
    /// Nested item shape when the property is itself a repeater.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<RepeaterItem>,
}

/// A canonical, immutable field of a collection schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    pub canonical_type: CanonicalType,
    pub required: bool,
    pub max_length: Option<u32>,
    pub default_value: Option<Value>,
    pub is_translatable: bool,
    pub is_primary_key: bool,
    pub reference_target: Option<String>,
    pub dependent_on: Option<DependentOn>,
    pub repeater_item_schema: Option<RepeaterItem>,
    pub label: String,
    pub area: Option<String>,
    pub group: Option<String>,
    pub display_as: Option<String>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub options: Vec<String>,
    pub unique: bool,
    pub origin: FieldOrigin,
}

impl FieldDescriptor {
    /// A generated field with no metadata beyond its type.
    pub(crate) fn implicit(name: &str, canonical_type: CanonicalType, required: bool, origin: FieldOrigin) -> Self {
        Self {
            name: name.to_string(),
            canonical_type,
            required,
            max_length: None,
            default_value: None,
            is_translatable: false,
            is_primary_key: false,
            reference_target: None,
            dependent_on: None,
            repeater_item_schema: None,
            label: crate::naming::label(name),
            area: None,
            group: None,
            display_as: None,
            precision: None,
            scale: None,
            options: Vec::new(),
            unique: false,
            origin,
        }
    }

    /// Whether the field was declared in the fields file.
    pub fn is_user(&self) -> bool {
        self.origin == FieldOrigin::User
    }

    /// Whether users can edit the value in the input surface.
    pub fn is_editable(&self) -> bool {
        self.is_user() && !self.is_primary_key
    }
}
