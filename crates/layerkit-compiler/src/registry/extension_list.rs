//! Root extension list: the `extends` array of the project `nuxt.config.ts`.

use tree_sitter::Node;

use crate::diagnostic::GeneratorError;
use crate::layout::{RegistryEntry, RegistryKind};

use super::syntax::{
    default_export_object, find_pair, insert_entry, parse, quote_style, quoted, remove_entry,
    string_value, ListSpan,
};
use super::{Registry, RegistryFile};

const PROPERTY: &str = "extends";

pub struct ExtensionList {
    file: RegistryFile,
}

impl ExtensionList {
    pub fn new(file: RegistryFile) -> Self {
        Self { file }
    }

    /// The `extends` array, `None` when the config has no such key yet.
    fn extends_array<'t>(&self, object: Node<'t>, source: &str) -> Result<Option<Node<'t>>, GeneratorError> {
        let Some(pair) = find_pair(object, PROPERTY, source) else {
            return Ok(None);
        };
        match pair.child_by_field_name("value") {
            Some(value) if value.kind() == "array" => Ok(Some(value)),
            _ => Err(GeneratorError::registry(
                &self.file.path,
                "`extends` is not an array literal",
            )),
        }
    }

    fn no_object(&self) -> GeneratorError {
        GeneratorError::registry(&self.file.path, "no default export object")
    }
}

/// `./layers/a/` and `layers/a` name the same layer.
fn normalize(path: &str) -> &str {
    let path = path.strip_prefix("./").unwrap_or(path);
    path.strip_suffix('/').unwrap_or(path)
}

fn position(array: Node, source: &str, key: &str) -> Option<usize> {
    let mut cursor = array.walk();
    let entries: Vec<Node> = array
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    entries
        .into_iter()
        .position(|entry| string_value(entry, source).is_some_and(|v| normalize(&v) == normalize(key)))
}

impl Registry for ExtensionList {
    fn kind(&self) -> RegistryKind {
        RegistryKind::ExtensionList
    }

    fn file(&self) -> &RegistryFile {
        &self.file
    }

    fn file_mut(&mut self) -> &mut RegistryFile {
        &mut self.file
    }

    fn bootstrap(&self) -> String {
        "export default defineNuxtConfig({\n  extends: [],\n})\n".to_string()
    }

    fn list(&self) -> Result<Vec<String>, GeneratorError> {
        let Some(source) = &self.file.source else {
            return Ok(vec![]);
        };
        let tree = parse(&self.file.path, source)?;
        let object = default_export_object(tree.root_node()).ok_or_else(|| self.no_object())?;
        let Some(array) = self.extends_array(object, source)? else {
            return Ok(vec![]);
        };
        let mut cursor = array.walk();
        let values = array
            .named_children(&mut cursor)
            .filter_map(|entry| string_value(entry, source))
            .collect();
        Ok(values)
    }

    fn upsert(&mut self, entry: &RegistryEntry) -> Result<bool, GeneratorError> {
        let bootstrap = self.bootstrap();
        let source = self.file.source_or(&bootstrap).to_string();
        let tree = parse(&self.file.path, &source)?;
        let object = default_export_object(tree.root_node()).ok_or_else(|| self.no_object())?;
        let quote = quote_style(object, &source);
        let value = quoted(&entry.value, quote);

        let updated = match self.extends_array(object, &source)? {
            Some(array) => {
                if position(array, &source, &entry.key).is_some() {
                    return Ok(false);
                }
                insert_entry(&source, &ListSpan::of(array), &value)
            }
            None => insert_entry(&source, &ListSpan::of(object), &format!("{PROPERTY}: [{value}]")),
        };

        self.file.source = Some(updated);
        Ok(true)
    }

    fn remove(&mut self, key: &str) -> Result<bool, GeneratorError> {
        let Some(source) = self.file.source.clone() else {
            return Ok(false);
        };
        let tree = parse(&self.file.path, &source)?;
        let object = default_export_object(tree.root_node()).ok_or_else(|| self.no_object())?;
        let Some(array) = self.extends_array(object, &source)? else {
            return Ok(false);
        };
        let Some(index) = position(array, &source, key) else {
            return Ok(false);
        };

        self.file.source = Some(remove_entry(&source, &ListSpan::of(array), index));
        Ok(true)
    }
}
