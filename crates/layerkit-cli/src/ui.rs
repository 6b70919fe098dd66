//! Terminal output primitives for the layerkit CLI.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Color palette
pub mod colors {
    use console::Color;

    pub const CYAN: Color = Color::Color256(51);
    pub const MAGENTA: Color = Color::Color256(201);
    pub const AMBER: Color = Color::Color256(214);
    pub const GREEN: Color = Color::Color256(82);
    pub const DIM: Color = Color::Color256(240);
}

pub mod symbols {
    pub const DIAMOND: &str = "\u{25C6}"; // ◆
    pub const DIAMOND_OUTLINE: &str = "\u{25C7}"; // ◇
    pub const TARGET_FILLED: &str = "\u{25C9}"; // ◉
    pub const TRIANGLE: &str = "\u{25B8}"; // ▸
    pub const PLUS: &str = "+";
    pub const MINUS: &str = "-";
    pub const DOT: &str = "\u{00B7}"; // ·
}

/// How an artifact fared in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Planned,
    Written,
    Skipped,
    Removed,
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Planned => "plan",
            FileStatus::Written => "write",
            FileStatus::Skipped => "skip",
            FileStatus::Removed => "remove",
        }
    }
}

pub fn success(msg: &str) {
    println!("  {} {}", style(symbols::TARGET_FILLED).fg(colors::GREEN), msg);
}

pub fn error(msg: &str) {
    println!(
        "  {} {}",
        style(symbols::DIAMOND).fg(colors::MAGENTA),
        style(msg).fg(colors::MAGENTA)
    );
}

pub fn warning(msg: &str) {
    println!("  {} {}", style(symbols::DIAMOND).fg(colors::AMBER), msg);
}

pub fn info(msg: &str) {
    println!("  {} {}", style(symbols::DIAMOND_OUTLINE).fg(colors::CYAN), msg);
}

pub fn dim(msg: &str) {
    println!("  {}", style(msg).fg(colors::DIM));
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_chars("\u{25CE}\u{25C9}\u{25CE}\u{25C9}") // ◎◉◎◉
        .template("  {spinner:.cyan} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Section header for one target.
pub fn target_header(name: &str, detail: &str) {
    println!(
        "  {} {} {}",
        style(symbols::TRIANGLE).fg(colors::CYAN),
        style(name).fg(colors::CYAN).bold(),
        style(detail).dim()
    );
}

/// One artifact line: status, path and an optional note.
pub fn file_line(status: FileStatus, path: &Path, note: Option<&str>) {
    let label = format!("{:>6}", status.label());
    let label = match status {
        FileStatus::Written | FileStatus::Removed => style(label).fg(colors::GREEN),
        FileStatus::Skipped => style(label).fg(colors::AMBER),
        FileStatus::Planned => style(label).fg(colors::CYAN),
    };
    match note {
        Some(note) => println!("    {} {}  {}", label, path.display(), style(note).dim()),
        None => println!("    {} {}", label, path.display()),
    }
}

/// A registry edit: `+ key` or `- key` with the registry name.
pub fn registry_line(added: bool, registry: &str, key: &str) {
    let sign = if added {
        style(symbols::PLUS).fg(colors::GREEN)
    } else {
        style(symbols::MINUS).fg(colors::MAGENTA)
    };
    println!("    {} {} {} {}", sign, style(registry).dim(), symbols::DOT, key);
}

pub fn timing(label: &str, duration_ms: u128) {
    println!(
        "  {} {} in {}ms",
        style(symbols::DIAMOND_OUTLINE).fg(colors::CYAN),
        label,
        duration_ms
    );
}

pub fn error_header() {
    println!();
    println!(
        "  {} {}",
        style(symbols::DIAMOND).fg(colors::MAGENTA).bold(),
        style("Generation failed.").fg(colors::MAGENTA).bold()
    );
    println!();
}

/// `3 files` / `1 file`.
pub fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count() {
        assert_eq!(count(1, "file"), "1 file");
        assert_eq!(count(0, "file"), "0 files");
        assert_eq!(count(3, "warning"), "3 warnings");
    }

    #[test]
    fn test_status_labels_fit_column() {
        for status in [
            FileStatus::Planned,
            FileStatus::Written,
            FileStatus::Skipped,
            FileStatus::Removed,
        ] {
            assert!(status.label().len() <= 6);
        }
    }
}
