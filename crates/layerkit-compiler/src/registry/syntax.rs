//! Tree-sitter helpers and span edits shared by the registry files.
//!
//! Edits only ever insert or delete bytes next to the parsed entries. An
//! insertion followed by the removal of the same entry gives back the
//! original source, including the whitespace of an empty container and a
//! missing final newline.

use std::ops::Range;
use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use crate::diagnostic::GeneratorError;

/// Parses TypeScript source, rejecting files with syntax errors.
pub fn parse(path: &Path, source: &str) -> Result<Tree, GeneratorError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
        .map_err(|_| GeneratorError::ParserInitFailed)?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| GeneratorError::registry(path, "parser returned no tree"))?;

    if let Some(error) = first_error(tree.root_node()) {
        let position = error.start_position();
        return Err(GeneratorError::registry(
            path,
            format!(
                "syntax error at line {}, column {}",
                position.row + 1,
                position.column + 1
            ),
        ));
    }
    Ok(tree)
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

pub fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Unquoted value of a `string` node.
pub fn string_value(node: Node, source: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let text = node_text(node, source);
    if text.len() < 2 {
        return None;
    }
    Some(text[1..text.len() - 1].to_string())
}

/// Quote character used by the first string literal under `node`.
pub fn quote_style(node: Node, source: &str) -> char {
    first_quote(node, source).unwrap_or('\'')
}

fn first_quote(node: Node, source: &str) -> Option<char> {
    if node.kind() == "string" {
        return node_text(node, source).chars().next();
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    children.into_iter().find_map(|child| first_quote(child, source))
}

pub fn quoted(value: &str, quote: char) -> String {
    format!("{quote}{value}{quote}")
}

/// Key of a `pair`, with quotes stripped from string keys.
pub fn pair_key(pair: Node, source: &str) -> Option<String> {
    let key = pair.child_by_field_name("key")?;
    match key.kind() {
        "string" => string_value(key, source),
        _ => Some(node_text(key, source).to_string()),
    }
}

/// Finds `key: value` in an object literal.
pub fn find_pair<'t>(object: Node<'t>, key: &str, source: &str) -> Option<Node<'t>> {
    let mut cursor = object.walk();
    let pairs: Vec<Node> = object
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "pair")
        .collect();
    pairs
        .into_iter()
        .find(|pair| pair_key(*pair, source).as_deref() == Some(key))
}

/// The object literal of `export default`, unwrapping `defineX({ ... })`,
/// `satisfies`, `as` and parentheses.
pub fn default_export_object(root: Node) -> Option<Node> {
    let mut cursor = root.walk();
    let statements: Vec<Node> = root.named_children(&mut cursor).collect();
    statements
        .into_iter()
        .filter(|stmt| stmt.kind() == "export_statement")
        .find_map(|stmt| stmt.child_by_field_name("value"))
        .and_then(unwrap_object)
}

fn unwrap_object(node: Node) -> Option<Node> {
    match node.kind() {
        "object" => Some(node),
        "call_expression" => {
            let args = node.child_by_field_name("arguments")?;
            let mut cursor = args.walk();
            let first = args.named_children(&mut cursor).next();
            first.and_then(unwrap_object)
        }
        "satisfies_expression" | "as_expression" | "parenthesized_expression" => {
            let mut cursor = node.walk();
            let first = node.named_children(&mut cursor).next();
            first.and_then(unwrap_object)
        }
        _ => None,
    }
}

/// Byte layout of an array or object literal and its entries.
#[derive(Debug, Clone)]
pub struct ListSpan {
    /// Byte right after the opening bracket.
    pub inner_start: usize,
    /// Byte of the closing bracket.
    pub inner_end: usize,
    /// Entry ranges, comments excluded.
    pub entries: Vec<Range<usize>>,
}

impl ListSpan {
    pub fn of(container: Node) -> Self {
        let mut cursor = container.walk();
        let entries = container
            .named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .map(|child| child.byte_range())
            .collect();
        Self {
            inner_start: container.start_byte() + 1,
            inner_end: container.end_byte().saturating_sub(1),
            entries,
        }
    }
}

/// Inserts `rendered` as the last entry of `list`.
///
/// An empty container spanning several lines gets the entry on its own line
/// right after the opening bracket; a single-line one gets it inline.
pub fn insert_entry(source: &str, list: &ListSpan, rendered: &str) -> String {
    let (at, text) = match list.entries.last() {
        Some(last) => {
            let separator = match line_indent(source, last.start) {
                Some(indent) => format!(",\n{}", indent),
                None => ", ".to_string(),
            };
            (last.end, format!("{separator}{rendered}"))
        }
        None if source[list.inner_start..list.inner_end].contains('\n') => {
            let indent = enclosing_indent(source, list.inner_start);
            (list.inner_start, format!("\n{indent}  {rendered},"))
        }
        None => (list.inner_start, rendered.to_string()),
    };
    format!("{}{}{}", &source[..at], text, &source[at..])
}

/// Removes entry `index` of `list` together with one separator.
pub fn remove_entry(source: &str, list: &ListSpan, index: usize) -> String {
    let entry = &list.entries[index];

    let range = if index > 0 {
        list.entries[index - 1].end..entry.end
    } else if let Some(next) = list.entries.get(1) {
        entry.start..next.start
    } else {
        // Sole entry: its trailing comma goes too, and its line when it has one.
        let end = if source[entry.end..].starts_with(',') {
            entry.end + 1
        } else {
            entry.end
        };
        let start = match line_indent(source, entry.start) {
            Some(indent) => entry.start - indent.len() - 1,
            None => entry.start,
        };
        start..end
    };

    format!("{}{}", &source[..range.start], &source[range.end..])
}

/// Whitespace before `pos` when `pos` is the first token on its line.
fn line_indent(source: &str, pos: usize) -> Option<&str> {
    let line_start = source[..pos].rfind('\n')? + 1;
    let prefix = &source[line_start..pos];
    prefix.chars().all(|c| c == ' ' || c == '\t').then_some(prefix)
}

/// Leading whitespace of the line containing `pos`.
fn enclosing_indent(source: &str, pos: usize) -> &str {
    let line_start = source[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = &source[line_start..pos];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// Inserts a top-level statement after `after`, or at the given fallback.
pub fn insert_statement(source: &str, after: Option<Range<usize>>, statement: &str, at_start: bool) -> String {
    match after {
        Some(prev) => format!("{}\n{}{}", &source[..prev.end], statement, &source[prev.end..]),
        None if at_start => format!("{}\n{}", statement, source),
        None if source.is_empty() || source.ends_with('\n') => format!("{}{}\n", source, statement),
        None => format!("{}\n{}", source, statement),
    }
}

/// Removes a top-level statement; `prev` is the preceding statement of the
/// same group, `next` the following one.
pub fn remove_statement(
    source: &str,
    target: Range<usize>,
    prev: Option<Range<usize>>,
    next: Option<Range<usize>>,
) -> String {
    let range = match (prev, next) {
        (Some(prev), _) => prev.end..target.end,
        (None, Some(next)) => target.start..next.start,
        (None, None) => {
            let end = if source[target.end..].starts_with('\n') {
                target.end + 1
            } else {
                target.end
            };
            target.start..end
        }
    };
    format!("{}{}", &source[..range.start], &source[range.end..])
}
