//! Structured shapes of repeater items.

use crate::schema::{CanonicalType, ItemProperty, RepeaterItem};

use super::scalar_ts_type;

/// `z.object({ ... })` for one item, recursing into nested repeaters.
pub fn item_validation_expr(item: &RepeaterItem) -> String {
    let props: Vec<String> = item
        .properties
        .iter()
        .map(|p| format!("{}: {}", p.name, property_validation_expr(p)))
        .collect();
    format!("z.object({{ {} }})", props.join(", "))
}

fn property_validation_expr(prop: &ItemProperty) -> String {
    use CanonicalType as T;

    let mut expr = match (prop.canonical_type, &prop.item) {
        (T::Repeater, Some(nested)) => format!("z.array({})", item_validation_expr(nested)),
        (T::Repeater, None) => "z.array(z.record(z.string(), z.unknown()))".to_string(),
        (T::String | T::Text | T::Reference | T::Image | T::Select, _) if prop.required => {
            "z.string().min(1)".to_string()
        }
        (T::String | T::Text | T::Reference | T::Image | T::Select, _) => "z.string()".to_string(),
        (T::Uuid, _) => "z.string().uuid()".to_string(),
        (T::Number, _) => "z.number().int()".to_string(),
        (T::Decimal, _) => "z.number()".to_string(),
        (T::Boolean, _) => "z.boolean()".to_string(),
        (T::Date, _) => "z.coerce.date()".to_string(),
        (T::Json, _) => "z.record(z.string(), z.unknown())".to_string(),
        (T::Array, _) => "z.array(z.string())".to_string(),
    };
    if !prop.required {
        expr.push_str(".optional()");
    }
    expr
}

/// `{ a: string; b?: number }` for one item.
pub fn item_ts_type(item: &RepeaterItem) -> String {
    if item.properties.is_empty() {
        return "Record<string, never>".to_string();
    }

    let props: Vec<String> = item
        .properties
        .iter()
        .map(|p| {
            let optional = if p.required { "" } else { "?" };
            let ty = match &p.item {
                Some(nested) => format!("Array<{}>", item_ts_type(nested)),
                None => scalar_ts_type(p.canonical_type).to_string(),
            };
            format!("{}{}: {}", p.name, optional, ty)
        })
        .collect();
    format!("{{ {} }}", props.join("; "))
}
