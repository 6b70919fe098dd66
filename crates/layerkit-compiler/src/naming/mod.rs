//! Name derivation for a (layer, collection) pair.
//!
//! [`derive`] is the only place where case and number variants are produced.
//! Generators, the layout, the registry entries and rollback all read fields
//! of the resulting [`NamingSet`]; none of them re-case strings themselves.

pub mod inflect;
mod words;

use serde::Serialize;

use crate::diagnostic::GeneratorError;
pub use words::WordList;

/// Every name variant used by the artifacts of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamingSet {
    /// `myShop`
    pub layer_camel: String,
    /// `MyShop`
    pub layer_pascal: String,
    /// `my-shop`
    pub layer_kebab: String,

    /// `orderItem`
    pub singular_camel: String,
    /// `OrderItem`
    pub singular_pascal: String,
    /// `order-item`
    pub singular_kebab: String,
    /// `orderItems`
    pub plural_camel: String,
    /// `OrderItems`
    pub plural_pascal: String,
    /// `order-items`
    pub plural_kebab: String,
    /// `Order items`
    pub plural_label: String,
    /// `Order item`
    pub singular_label: String,

    /// `myShopOrderItem`
    pub prefixed_singular_camel: String,
    /// `MyShopOrderItem`
    pub prefixed_singular_pascal: String,
    /// `myShopOrderItems`
    pub prefixed_plural_camel: String,
    /// `MyShopOrderItems`
    pub prefixed_plural_pascal: String,
    /// `my-shop-order-items`
    pub prefixed_plural_kebab: String,

    /// `my_shop_order_items`
    pub table_name: String,
    /// `my-shop-order-items`
    pub api_path_segment: String,
    /// `MyShopOrderItems`, the auto-import prefix of the collection's components.
    pub component_prefix: String,
    /// `useMyShopOrderItems`
    pub composable_name: String,
    /// `myShopOrderItemsConfig`
    pub config_ident: String,
    /// `orderItemId`, the route parameter of item handlers.
    pub item_param: String,
    /// `layers/my-shop`
    pub layer_dir: String,
    /// `layers/my-shop/collections/order-items`
    pub collection_dir: String,
}

/// Derives the naming set for a target.
///
/// Both inputs are split into word lists once; every variant below is a
/// recombination of `layer`, `singular`, `plural` or their concatenation.
pub fn derive(layer: &str, collection: &str) -> Result<NamingSet, GeneratorError> {
    let layer_words = parse_name("layer", layer)?;
    let collection_words = parse_name("collection", collection)?;

    let singular = collection_words.singular();
    let plural = collection_words.plural();
    let prefixed_singular = layer_words.join(&singular);
    let prefixed_plural = layer_words.join(&plural);

    let layer_dir = format!("layers/{}", layer_words.kebab());
    let collection_dir = format!("{}/collections/{}", layer_dir, plural.kebab());

    Ok(NamingSet {
        layer_camel: layer_words.camel(),
        layer_pascal: layer_words.pascal(),
        layer_kebab: layer_words.kebab(),

        singular_camel: singular.camel(),
        singular_pascal: singular.pascal(),
        singular_kebab: singular.kebab(),
        plural_camel: plural.camel(),
        plural_pascal: plural.pascal(),
        plural_kebab: plural.kebab(),
        plural_label: plural.sentence(),
        singular_label: singular.sentence(),

        prefixed_singular_camel: prefixed_singular.camel(),
        prefixed_singular_pascal: prefixed_singular.pascal(),
        prefixed_plural_camel: prefixed_plural.camel(),
        prefixed_plural_pascal: prefixed_plural.pascal(),
        prefixed_plural_kebab: prefixed_plural.kebab(),

        table_name: prefixed_plural.snake(),
        api_path_segment: prefixed_plural.kebab(),
        component_prefix: prefixed_plural.pascal(),
        composable_name: format!("use{}", prefixed_plural.pascal()),
        config_ident: format!("{}Config", prefixed_plural.camel()),
        item_param: format!("{}Id", singular.camel()),
        layer_dir,
        collection_dir,
    })
}

/// Name of the sub-component that selects one item of a dependent field.
///
/// `slots` → `Slot`, `categories` → `Category`, `opening_hours` → `OpeningHour`.
/// Uses the same word list and inflection as [`derive`].
pub fn dependent_component_name(field_name: &str) -> Result<String, GeneratorError> {
    Ok(parse_name("dependent field", field_name)?.singular().pascal())
}

/// camelCase form of an arbitrary identifier, e.g. a field name.
pub fn camel(name: &str) -> String {
    WordList::parse(name).camel()
}

/// snake_case form of an arbitrary identifier, e.g. a column name.
pub fn snake(name: &str) -> String {
    WordList::parse(name).snake()
}

/// Human label for a field name (`publishedAt` → `Published at`).
pub fn label(name: &str) -> String {
    WordList::parse(name).sentence()
}

fn parse_name(role: &'static str, value: &str) -> Result<WordList, GeneratorError> {
    let words = WordList::parse(value);
    let has_letter = words
        .words()
        .iter()
        .any(|w| w.chars().any(|c| c.is_alphabetic()));
    if words.is_empty() || !has_letter {
        return Err(GeneratorError::InvalidName {
            role,
            value: value.to_string(),
        });
    }
    Ok(words)
}
