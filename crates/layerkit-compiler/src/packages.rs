//! Catalog of feature packages a project can extend.
//!
//! A package ships as a prebuilt layer. Listing its id under `packages` in
//! the configuration file adds the layer to the root extension list.

use serde::Serialize;

use crate::layout::{RegistryEntry, RegistryKind};

/// What a package contributes to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub id: &'static str,
    /// Entry added to the extension list.
    pub extends: &'static str,
    pub description: &'static str,
    /// Collections the package layer provides.
    pub collections: &'static [&'static str],
}

impl PackageManifest {
    pub fn registry_entry(&self) -> RegistryEntry {
        RegistryEntry {
            kind: RegistryKind::ExtensionList,
            key: self.extends.to_string(),
            value: self.extends.to_string(),
            import: None,
        }
    }
}

/// A package id and the function producing its manifest.
#[derive(Clone, Copy)]
pub struct PackageSource {
    pub id: &'static str,
    pub loader: fn() -> Option<PackageManifest>,
}

pub struct PackageCatalog {
    sources: Vec<PackageSource>,
}

impl Default for PackageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PackageCatalog {
    pub fn new(sources: Vec<PackageSource>) -> Self {
        Self { sources }
    }

    /// The packages published alongside the runtime.
    pub fn builtin() -> Self {
        Self::new(vec![
            PackageSource { id: "bookings", loader: bookings },
            PackageSource { id: "pages", loader: pages },
            PackageSource { id: "sales", loader: sales },
            PackageSource { id: "editor", loader: editor },
            PackageSource { id: "i18n", loader: i18n },
        ])
    }

    pub fn resolve(&self, id: &str) -> Option<PackageManifest> {
        self.sources
            .iter()
            .find(|source| source.id == id)
            .and_then(|source| (source.loader)())
    }

    /// Every manifest that loads, in catalog order.
    pub fn manifests(&self) -> Vec<PackageManifest> {
        self.sources.iter().filter_map(|source| (source.loader)()).collect()
    }
}

fn bookings() -> Option<PackageManifest> {
    Some(PackageManifest {
        id: "bookings",
        extends: "@layerkit/bookings",
        description: "Locations, time slots and reservations",
        collections: &["locations", "bookings", "blocked-dates"],
    })
}

fn pages() -> Option<PackageManifest> {
    Some(PackageManifest {
        id: "pages",
        extends: "@layerkit/pages",
        description: "Hierarchical content pages with a block editor",
        collections: &["pages"],
    })
}

fn sales() -> Option<PackageManifest> {
    Some(PackageManifest {
        id: "sales",
        extends: "@layerkit/sales",
        description: "Products, orders and point-of-sale events",
        collections: &["products", "categories", "orders", "events"],
    })
}

fn editor() -> Option<PackageManifest> {
    Some(PackageManifest {
        id: "editor",
        extends: "@layerkit/editor",
        description: "Rich text editing components",
        collections: &[],
    })
}

fn i18n() -> Option<PackageManifest> {
    Some(PackageManifest {
        id: "i18n",
        extends: "@layerkit/i18n",
        description: "Locale switching and translation inputs",
        collections: &["translations"],
    })
}
