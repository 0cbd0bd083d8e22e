//! Semantic analysis
//!
//! Scope-aware checking of a parsed [`Program`](crate::parser::ast::Program):
//! - [`symbols`]: symbols and the scope stack
//! - [`types`]: promotion, implicit-cast and operator typing rules
//! - [`analyzer`]: declarations, statements and the [`Analysis`] result
//! - [`expressions`]: bottom-up type inference
//! - [`errors`]: diagnostics

pub mod analyzer;
pub mod errors;
pub mod expressions;
pub mod symbols;
pub mod types;

pub use analyzer::{analyze_with, Analysis, Analyzer, AnalyzerOptions};
pub use errors::{SemanticError, SemanticWarning};
