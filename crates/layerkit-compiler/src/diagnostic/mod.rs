//! Diagnostic types for error reporting.

mod error;
mod warning;

pub use error::GeneratorError;
pub use warning::Warning;
