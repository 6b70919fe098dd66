//! UI registry: the collection configs listed under one property of
//! `app.config.ts`, each with the import it needs.
//!
//! ```ts
//! import { blogPostsConfig } from '../layers/blog/collections/posts/app/composables/useBlogPosts'
//!
//! export default defineAppConfig({
//!   layerkitCollections: {
//!     blogPosts: blogPostsConfig,
//!   },
//! })
//! ```

use std::ops::Range;

use tree_sitter::{Node, Tree};

use crate::diagnostic::GeneratorError;
use crate::layout::{RegistryEntry, RegistryKind};

use super::syntax::{
    default_export_object, find_pair, insert_entry, insert_statement, node_text, pair_key, parse,
    quote_style, quoted, remove_entry, remove_statement, ListSpan,
};
use super::{Registry, RegistryFile};

pub struct UiRegistry {
    file: RegistryFile,
    property: String,
}

impl UiRegistry {
    pub fn new(file: RegistryFile, property: &str) -> Self {
        Self {
            file,
            property: property.to_string(),
        }
    }

    fn parse(&self, source: &str) -> Result<Tree, GeneratorError> {
        parse(&self.file.path, source)
    }

    fn export_object<'t>(&self, tree: &'t Tree) -> Result<Node<'t>, GeneratorError> {
        default_export_object(tree.root_node())
            .ok_or_else(|| GeneratorError::registry(&self.file.path, "no default export object"))
    }

    /// The registry object literal, `None` when the property is missing.
    fn registry_object<'t>(&self, tree: &'t Tree, source: &str) -> Result<Option<Node<'t>>, GeneratorError> {
        let object = self.export_object(tree)?;
        let Some(pair) = find_pair(object, &self.property, source) else {
            return Ok(None);
        };
        match pair.child_by_field_name("value") {
            Some(value) if value.kind() == "object" => Ok(Some(value)),
            _ => Err(GeneratorError::registry(
                &self.file.path,
                format!("`{}` is not an object literal", self.property),
            )),
        }
    }

    /// Adds `<property>: {}` to the exported object, spread over two lines
    /// when the object's entries are one per line.
    fn add_property(&self, source: &str) -> Result<String, GeneratorError> {
        let tree = self.parse(source)?;
        let object = self.export_object(&tree)?;
        let list = ListSpan::of(object);
        let rendered = match list.entries.last().and_then(|last| entry_indent(source, last.start)) {
            Some(indent) => format!("{}: {{\n{}}}", self.property, indent),
            None => format!("{}: {{}}", self.property),
        };
        Ok(insert_entry(source, &list, &rendered))
    }

    fn add_import(&self, source: &str, binding: &str, module: &str) -> Result<String, GeneratorError> {
        let tree = self.parse(source)?;
        let root = tree.root_node();
        let imports = imports(root);

        if imports.iter().any(|stmt| imported_binding(*stmt, source).as_deref() == Some(binding)) {
            return Ok(source.to_string());
        }

        let last = imports.last().copied();
        let semicolon = match last {
            Some(stmt) if node_text(stmt, source).ends_with(';') => ";",
            _ => "",
        };
        let statement = format!(
            "import {{ {} }} from {}{}",
            binding,
            quoted(module, quote_style(root, source)),
            semicolon
        );
        Ok(insert_statement(source, last.map(|n| n.byte_range()), &statement, true))
    }

    /// Drops the import of `binding` once nothing else in the file uses it.
    fn drop_import(&self, source: &str, binding: &str) -> Result<String, GeneratorError> {
        let tree = self.parse(source)?;
        if references(tree.root_node(), source, binding) > 0 {
            return Ok(source.to_string());
        }
        let Some(stmt) = imports(tree.root_node())
            .into_iter()
            .find(|stmt| imported_binding(*stmt, source).as_deref() == Some(binding))
        else {
            return Ok(source.to_string());
        };
        Ok(remove_statement(
            source,
            stmt.byte_range(),
            range(stmt.prev_named_sibling()),
            range(stmt.next_named_sibling()),
        ))
    }
}

/// Whitespace before `pos` when it starts its line.
fn entry_indent(source: &str, pos: usize) -> Option<&str> {
    let line_start = source[..pos].rfind('\n')? + 1;
    let prefix = &source[line_start..pos];
    prefix.chars().all(|c| c == ' ' || c == '\t').then_some(prefix)
}

/// Uses of `binding` outside import statements.
fn references(node: Node, source: &str, binding: &str) -> usize {
    match node.kind() {
        "import_statement" => 0,
        "identifier" | "shorthand_property_identifier" => usize::from(node_text(node, source) == binding),
        _ => {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            children
                .into_iter()
                .map(|child| references(child, source, binding))
                .sum()
        }
    }
}

fn range(node: Option<Node>) -> Option<Range<usize>> {
    node.map(|n| n.byte_range())
}

fn imports(root: Node) -> Vec<Node> {
    let mut cursor = root.walk();
    let statements: Vec<Node> = root.named_children(&mut cursor).collect();
    statements
        .into_iter()
        .filter(|stmt| stmt.kind() == "import_statement")
        .collect()
}

/// The binding of a single-specifier `import { x } from '...'`.
fn imported_binding(stmt: Node, source: &str) -> Option<String> {
    let mut cursor = stmt.walk();
    let clause = stmt
        .named_children(&mut cursor)
        .find(|child| child.kind() == "import_clause")?;
    let inner = node_text(clause, source)
        .trim()
        .strip_prefix('{')?
        .strip_suffix('}')?
        .trim();
    (!inner.is_empty() && !inner.contains(',') && !inner.contains(' ')).then(|| inner.to_string())
}

fn entries(object: Node) -> Vec<Node> {
    let mut cursor = object.walk();
    let children: Vec<Node> = object
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    children
}

impl Registry for UiRegistry {
    fn kind(&self) -> RegistryKind {
        RegistryKind::UiRegistry
    }

    fn file(&self) -> &RegistryFile {
        &self.file
    }

    fn file_mut(&mut self) -> &mut RegistryFile {
        &mut self.file
    }

    fn bootstrap(&self) -> String {
        format!("export default defineAppConfig({{\n  {}: {{\n  }},\n}})\n", self.property)
    }

    fn list(&self) -> Result<Vec<String>, GeneratorError> {
        let Some(source) = &self.file.source else {
            return Ok(vec![]);
        };
        let tree = self.parse(source)?;
        let Some(object) = self.registry_object(&tree, source)? else {
            return Ok(vec![]);
        };
        Ok(entries(object)
            .into_iter()
            .filter_map(|pair| pair_key(pair, source))
            .collect())
    }

    fn upsert(&mut self, entry: &RegistryEntry) -> Result<bool, GeneratorError> {
        let bootstrap = self.bootstrap();
        let mut source = self.file.source_or(&bootstrap).to_string();

        let tree = self.parse(&source)?;
        if self.registry_object(&tree, &source)?.is_none() {
            source = self.add_property(&source)?;
        }

        let tree = self.parse(&source)?;
        let object = self
            .registry_object(&tree, &source)?
            .ok_or_else(|| GeneratorError::registry(&self.file.path, "registry property missing"))?;
        let present = entries(object)
            .into_iter()
            .any(|pair| pair_key(pair, &source).as_deref() == Some(entry.key.as_str()));
        if present {
            return Ok(false);
        }

        let mut updated = insert_entry(
            &source,
            &ListSpan::of(object),
            &format!("{}: {}", entry.key, entry.value),
        );
        if let Some(module) = &entry.import {
            updated = self.add_import(&updated, &entry.value, module)?;
        }

        self.file.source = Some(updated);
        Ok(true)
    }

    fn remove(&mut self, key: &str) -> Result<bool, GeneratorError> {
        let Some(source) = self.file.source.clone() else {
            return Ok(false);
        };
        let tree = self.parse(&source)?;
        let Some(object) = self.registry_object(&tree, &source)? else {
            return Ok(false);
        };
        let pairs = entries(object);
        let Some(index) = pairs
            .iter()
            .position(|pair| pair_key(*pair, &source).as_deref() == Some(key))
        else {
            return Ok(false);
        };
        let binding = pairs[index]
            .child_by_field_name("value")
            .filter(|value| value.kind() == "identifier")
            .map(|value| node_text(value, &source).to_string());

        let mut updated = remove_entry(&source, &ListSpan::of(object), index);
        if let Some(binding) = binding {
            updated = self.drop_import(&updated, &binding)?;
        }

        self.file.source = Some(updated);
        Ok(true)
    }
}
