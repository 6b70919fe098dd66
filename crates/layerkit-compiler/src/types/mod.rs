//! Field type mapping.
//!
//! One table row per canonical type decides every representation a field
//! has in the generated code: the zod expression, the Drizzle column, the
//! input control, the default literal, the TypeScript type and the listing
//! display hint. Generators never branch on [`CanonicalType`] for these; they
//! read the [`TypeMapping`].

mod repeater;

use serde_json::Value;

use crate::config::Dialect;
use crate::schema::{CanonicalType, FieldDescriptor, ItemProperty};

pub use repeater::{item_ts_type, item_validation_expr};

/// Input control rendered for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    TextInput,
    Textarea,
    NumberInput,
    Toggle,
    DatePicker,
    JsonEditor,
    Repeater,
    TagInput,
    ReferenceSelect,
    ImageUpload,
    Select,
    Hidden,
}

impl ControlKind {
    /// Component tag used in the input surface.
    pub fn component(&self) -> &'static str {
        match self {
            ControlKind::TextInput | ControlKind::Hidden => "UInput",
            ControlKind::Textarea => "UTextarea",
            ControlKind::NumberInput => "UInputNumber",
            ControlKind::Toggle => "USwitch",
            ControlKind::DatePicker => "LayerkitDatePicker",
            ControlKind::JsonEditor => "LayerkitJsonEditor",
            ControlKind::Repeater => "LayerkitRepeater",
            ControlKind::TagInput => "UInputTags",
            ControlKind::ReferenceSelect => "LayerkitReferenceSelect",
            ControlKind::ImageUpload => "LayerkitImageUpload",
            ControlKind::Select => "USelect",
        }
    }
}

/// How the listing surface formats a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayHint {
    Text,
    Truncate,
    Number,
    Boolean,
    Date,
    Json,
    Count,
    Reference,
    Image,
    Badge,
}

impl DisplayHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayHint::Text => "text",
            DisplayHint::Truncate => "truncate",
            DisplayHint::Number => "number",
            DisplayHint::Boolean => "boolean",
            DisplayHint::Date => "date",
            DisplayHint::Json => "json",
            DisplayHint::Count => "count",
            DisplayHint::Reference => "reference",
            DisplayHint::Image => "image",
            DisplayHint::Badge => "badge",
        }
    }
}

/// A Drizzle column builder and its options object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageType {
    /// Builder function, e.g. `text`, `integer`, `jsonb`.
    pub builder: &'static str,
    /// Options object literal passed after the column name.
    pub options: Option<String>,
}

impl StorageType {
    fn plain(builder: &'static str) -> Self {
        Self { builder, options: None }
    }

    fn with(builder: &'static str, options: impl Into<String>) -> Self {
        Self {
            builder,
            options: Some(options.into()),
        }
    }

    /// Column constructor call, e.g. `text('title', { length: 200 })`.
    pub fn render(&self, column: &str) -> String {
        match &self.options {
            Some(options) => format!("{}('{}', {})", self.builder, column, options),
            None => format!("{}('{}')", self.builder, column),
        }
    }
}

/// Every representation of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMapping {
    pub validation_expr: String,
    pub storage: StorageType,
    pub control_kind: ControlKind,
    pub default_literal: String,
    pub ts_type: String,
    pub display_hint: DisplayHint,
}

/// Table-driven mapper for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapper {
    dialect: Dialect,
}

impl TypeMapper {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Maps a parsed field.
    pub fn map(&self, field: &FieldDescriptor) -> TypeMapping {
        TypeMapping {
            validation_expr: self.validation_expr(field),
            storage: self.storage(field),
            control_kind: control_kind(field),
            default_literal: default_literal(field),
            ts_type: ts_type(field),
            display_hint: display_hint(field),
        }
    }

    /// The Drizzle column for a field in this dialect.
    pub fn storage(&self, field: &FieldDescriptor) -> StorageType {
        use CanonicalType as T;

        match (self.dialect, field.canonical_type) {
            (Dialect::Sqlite, T::Number) => StorageType::plain("integer"),
            (Dialect::Sqlite, T::Decimal) => StorageType::plain("real"),
            (Dialect::Sqlite, T::Boolean) => StorageType::with("integer", "{ mode: 'boolean' }"),
            (Dialect::Sqlite, T::Date) => StorageType::with("integer", "{ mode: 'timestamp' }"),
            (Dialect::Sqlite, T::Json | T::Repeater | T::Array) => {
                StorageType::with("text", "{ mode: 'json' }")
            }
            (Dialect::Sqlite, _) => StorageType::plain("text"),

            (Dialect::Postgres, T::String) => match field.max_length {
                Some(n) => StorageType::with("varchar", format!("{{ length: {} }}", n)),
                None => StorageType::plain("text"),
            },
            (Dialect::Postgres, T::Number) => StorageType::plain("integer"),
            (Dialect::Postgres, T::Decimal) => match (field.precision, field.scale) {
                (Some(p), Some(s)) => StorageType::with(
                    "numeric",
                    format!("{{ precision: {}, scale: {}, mode: 'number' }}", p, s),
                ),
                (Some(p), None) => {
                    StorageType::with("numeric", format!("{{ precision: {}, mode: 'number' }}", p))
                }
                _ => StorageType::plain("doublePrecision"),
            },
            (Dialect::Postgres, T::Boolean) => StorageType::plain("boolean"),
            (Dialect::Postgres, T::Date) => StorageType::with("timestamp", "{ withTimezone: true }"),
            (Dialect::Postgres, T::Json | T::Repeater | T::Array) => StorageType::plain("jsonb"),
            (Dialect::Postgres, T::Uuid) => StorageType::plain("uuid"),
            (Dialect::Postgres, _) => StorageType::plain("text"),
        }
    }

    fn validation_expr(&self, field: &FieldDescriptor) -> String {
        use CanonicalType as T;

        // Translated values are validated per language, not at the top level.
        let required = field.required && !field.is_translatable;

        let mut expr = match field.canonical_type {
            T::String | T::Text | T::Reference | T::Image => {
                let mut s = "z.string()".to_string();
                if required {
                    s.push_str(".min(1)");
                }
                if let Some(n) = field.max_length {
                    s.push_str(&format!(".max({})", n));
                }
                s
            }
            T::Uuid => "z.string().uuid()".to_string(),
            T::Select if !field.options.is_empty() => {
                let values: Vec<String> = field.options.iter().map(|o| quote(o)).collect();
                format!("z.enum([{}])", values.join(", "))
            }
            T::Select => "z.string()".to_string(),
            T::Number => "z.number().int()".to_string(),
            T::Decimal => "z.number()".to_string(),
            T::Boolean => "z.boolean()".to_string(),
            T::Date => "z.coerce.date()".to_string(),
            T::Json => "z.record(z.string(), z.unknown())".to_string(),
            T::Repeater => match &field.repeater_item_schema {
                Some(item) => format!("z.array({})", item_validation_expr(item)),
                None => "z.array(z.record(z.string(), z.unknown()))".to_string(),
            },
            T::Array => "z.array(z.string())".to_string(),
        };

        if !required {
            expr.push_str(".optional()");
        }
        expr
    }
}

fn control_kind(field: &FieldDescriptor) -> ControlKind {
    use CanonicalType as T;

    match field.canonical_type {
        T::String => ControlKind::TextInput,
        T::Text => ControlKind::Textarea,
        T::Number | T::Decimal => ControlKind::NumberInput,
        T::Boolean => ControlKind::Toggle,
        T::Date => ControlKind::DatePicker,
        T::Json => ControlKind::JsonEditor,
        T::Repeater => ControlKind::Repeater,
        T::Array => ControlKind::TagInput,
        T::Reference => ControlKind::ReferenceSelect,
        T::Uuid => ControlKind::Hidden,
        T::Image => ControlKind::ImageUpload,
        T::Select => ControlKind::Select,
    }
}

fn display_hint(field: &FieldDescriptor) -> DisplayHint {
    use CanonicalType as T;

    match field.canonical_type {
        T::String | T::Uuid => DisplayHint::Text,
        T::Text => DisplayHint::Truncate,
        T::Number | T::Decimal => DisplayHint::Number,
        T::Boolean => DisplayHint::Boolean,
        T::Date => DisplayHint::Date,
        T::Json => DisplayHint::Json,
        T::Repeater | T::Array => DisplayHint::Count,
        T::Reference => DisplayHint::Reference,
        T::Image => DisplayHint::Image,
        T::Select => DisplayHint::Badge,
    }
}

/// TypeScript literal of a field's initial form value.
fn default_literal(field: &FieldDescriptor) -> String {
    use CanonicalType as T;

    if let Some(value) = &field.default_value {
        return match (field.canonical_type, value) {
            (T::Date, Value::String(s)) if s == "now" => "new Date()".to_string(),
            (T::Date, Value::String(s)) => format!("new Date({})", quote(s)),
            (_, Value::String(s)) => quote(s),
            (_, other) => other.to_string(),
        };
    }

    match field.canonical_type {
        T::String | T::Text | T::Reference | T::Uuid | T::Image | T::Select => "''".to_string(),
        T::Number | T::Decimal => "0".to_string(),
        T::Boolean => "false".to_string(),
        T::Date => "null".to_string(),
        T::Json => "{}".to_string(),
        T::Repeater | T::Array => "[]".to_string(),
    }
}

fn ts_type(field: &FieldDescriptor) -> String {
    use CanonicalType as T;

    match field.canonical_type {
        T::Select if !field.options.is_empty() => {
            let values: Vec<String> = field.options.iter().map(|o| quote(o)).collect();
            values.join(" | ")
        }
        T::Repeater => match &field.repeater_item_schema {
            Some(item) => format!("Array<{}>", item_ts_type(item)),
            None => "Array<Record<string, unknown>>".to_string(),
        },
        other => scalar_ts_type(other).to_string(),
    }
}

/// TypeScript type of a non-structured canonical type.
pub(crate) fn scalar_ts_type(ty: CanonicalType) -> &'static str {
    use CanonicalType as T;

    match ty {
        T::Number | T::Decimal => "number",
        T::Boolean => "boolean",
        T::Date => "Date",
        T::Json => "Record<string, unknown>",
        T::Repeater => "Array<Record<string, unknown>>",
        T::Array => "string[]",
        T::String | T::Text | T::Reference | T::Uuid | T::Image | T::Select => "string",
    }
}

/// Item properties of a repeater that need a per-language editing surface.
pub fn translatable_item_properties(field: &FieldDescriptor) -> Vec<&ItemProperty> {
    field
        .repeater_item_schema
        .as_ref()
        .map(|item| item.translatable_properties())
        .unwrap_or_default()
}

/// Single-quoted TypeScript string literal.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}
