//! Collection schema model.
//!
//! A fields file is parsed once per target into a [`CollectionSchema`]: the
//! user's fields in declaration order, surrounded by the generated identifier,
//! scope, audit, hierarchy and translation fields. Generators render fields
//! in this order.

mod field;
mod parse;

pub use field::{
    CanonicalType, DependentOn, FieldDescriptor, FieldOrigin, ItemProperty, RepeaterItem,
};
pub use parse::{parse_schema, parse_schema_file};

use serde::Serialize;

use crate::diagnostic::Warning;

/// Name of the generated primary key.
pub const ID_FIELD: &str = "id";
/// Name of the per-language shadow column.
pub const TRANSLATIONS_FIELD: &str = "translations";
/// Team scope and ownership columns, in injection order.
pub const SCOPE_FIELDS: &[&str] = &["teamId", "owner"];
/// Audit columns, in injection order.
pub const AUDIT_FIELDS: &[&str] = &["createdAt", "updatedAt", "createdBy", "updatedBy"];
/// Tree columns of hierarchical collections, in injection order.
pub const HIERARCHY_FIELDS: &[&str] = &["parentId", "path", "depth", "order"];
/// Column of sortable collections.
pub const ORDER_FIELD: &str = "order";

/// Collection-level options that shape the schema.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaOptions {
    /// Adds `parentId`, `path`, `depth` and `order`.
    pub hierarchy: bool,
    /// Adds `order`.
    pub sortable: bool,
    /// Field names made translatable from the configuration file.
    pub translatable: Vec<String>,
    /// Drops every translatable flag; fields become plain columns.
    pub no_translations: bool,
    /// User fields allowed to replace a generated field of the same name.
    pub allow_overrides: Vec<String>,
}

/// Ordered fields of one collection plus the options that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSchema {
    pub collection: String,
    pub fields: Vec<FieldDescriptor>,
    pub options: SchemaOptions,
}

impl CollectionSchema {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The primary key field.
    pub fn identifier(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.origin == FieldOrigin::Identifier)
    }

    /// Fields declared in the fields file, in declaration order.
    pub fn user_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_user())
    }

    /// User fields rendered as controls of the input surface.
    pub fn editable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_editable())
    }

    /// User fields whose value lives in the translations block.
    pub fn translatable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_editable() && f.is_translatable)
    }

    /// Fields whose options come from another collection's array field.
    pub fn dependent_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.dependent_on.is_some())
    }

    pub fn has_translations(&self) -> bool {
        self.fields.iter().any(|f| f.origin == FieldOrigin::Translations)
    }

    pub fn is_hierarchical(&self) -> bool {
        self.options.hierarchy
    }

    pub fn is_sortable(&self) -> bool {
        self.options.hierarchy || self.options.sortable
    }
}

/// Result of parsing a fields file.
#[derive(Debug, Clone)]
pub struct ParsedSchema {
    pub schema: CollectionSchema,
    pub warnings: Vec<Warning>,
}
