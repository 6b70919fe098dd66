//! Schema export index: one `export * from '...'` per collection.

use std::ops::Range;

use tree_sitter::Node;

use crate::diagnostic::GeneratorError;
use crate::layout::{RegistryEntry, RegistryKind};

use super::syntax::{
    insert_statement, node_text, parse, quote_style, quoted, remove_statement, string_value,
};
use super::{Registry, RegistryFile};

pub struct SchemaIndex {
    file: RegistryFile,
}

impl SchemaIndex {
    pub fn new(file: RegistryFile) -> Self {
        Self { file }
    }
}

/// Top-level re-exports with their module specifier.
fn reexports<'t>(root: Node<'t>, source: &str) -> Vec<(Node<'t>, String)> {
    let mut cursor = root.walk();
    let statements: Vec<Node> = root.named_children(&mut cursor).collect();
    statements
        .into_iter()
        .filter(|stmt| stmt.kind() == "export_statement")
        .filter_map(|stmt| {
            let module = stmt
                .child_by_field_name("source")
                .and_then(|s| string_value(s, source))?;
            Some((stmt, module))
        })
        .collect()
}

fn range(node: Option<Node>) -> Option<Range<usize>> {
    node.map(|n| n.byte_range())
}

impl Registry for SchemaIndex {
    fn kind(&self) -> RegistryKind {
        RegistryKind::SchemaIndex
    }

    fn file(&self) -> &RegistryFile {
        &self.file
    }

    fn file_mut(&mut self) -> &mut RegistryFile {
        &mut self.file
    }

    fn bootstrap(&self) -> String {
        "// Collection schemas, maintained by layerkit.\n".to_string()
    }

    fn list(&self) -> Result<Vec<String>, GeneratorError> {
        let Some(source) = &self.file.source else {
            return Ok(vec![]);
        };
        let tree = parse(&self.file.path, source)?;
        Ok(reexports(tree.root_node(), source)
            .into_iter()
            .map(|(_, module)| module)
            .collect())
    }

    fn upsert(&mut self, entry: &RegistryEntry) -> Result<bool, GeneratorError> {
        let bootstrap = self.bootstrap();
        let source = self.file.source_or(&bootstrap).to_string();
        let tree = parse(&self.file.path, &source)?;
        let root = tree.root_node();
        let exports = reexports(root, &source);

        if exports.iter().any(|(_, module)| module == &entry.key) {
            return Ok(false);
        }

        let last = exports.last().map(|(stmt, _)| *stmt);
        let semicolon = match last {
            Some(stmt) if node_text(stmt, &source).ends_with(';') => ";",
            _ => "",
        };
        let statement = format!(
            "export * from {}{}",
            quoted(&entry.value, quote_style(root, &source)),
            semicolon
        );

        self.file.source = Some(insert_statement(&source, range(last), &statement, false));
        Ok(true)
    }

    fn remove(&mut self, key: &str) -> Result<bool, GeneratorError> {
        let Some(source) = self.file.source.clone() else {
            return Ok(false);
        };
        let tree = parse(&self.file.path, &source)?;
        let Some((stmt, _)) = reexports(tree.root_node(), &source)
            .into_iter()
            .find(|(_, module)| module == key)
        else {
            return Ok(false);
        };

        self.file.source = Some(remove_statement(
            &source,
            stmt.byte_range(),
            range(stmt.prev_named_sibling()),
            range(stmt.next_named_sibling()),
        ));
        Ok(true)
    }
}
