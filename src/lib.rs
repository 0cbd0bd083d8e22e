//! # Introduction
//!
//! minic is the front end of a compiler for a small C-like teaching
//! language. It turns source text into a checked syntax tree and lowers
//! that tree into three-address code.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Semantic Analyzer → IR Generator → IrProgram
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds an AST, recovering from
//!    syntax errors so that one run reports as many as possible.
//! 2. [`semantic`]: resolves names through a scope stack, infers expression
//!    types and checks declarations, calls and returns.
//! 3. [`ir`]: emits three-address instructions with fresh temporaries and
//!    labels.
//! 4. [`compiler`]: chains the stages and stops at the first failing one.
//!
//! ## Language
//!
//! Types: `int`, `float`/`double`, `char`, `bool`, `string`, `void`.
//! Declarations: globals, function prototypes and definitions.
//! Control flow: `if/else`, `while`, `for`, `break`, `continue`, `return`.
//!
//! ## Example
//!
//! ```
//! let outcome = minic::parse("int main() { int x = 1 + 2 * 3; return x; }");
//! assert!(!outcome.had_error());
//!
//! let analysis = minic::analyze(&outcome.program);
//! assert!(analysis.is_ok());
//!
//! let ir = minic::generate_ir(&outcome.program);
//! assert!(ir.to_string().contains("t1 = 1 ADD t0"));
//! ```

pub mod compiler;
pub mod ir;
pub mod parser;
pub mod semantic;

use ir::IrProgram;
use parser::ast::Program;
use parser::lexer::{LexError, Token};
use parser::parse::ParseOutcome;
use semantic::{Analysis, AnalyzerOptions};

/// Scan `source` into tokens, ending with a single end-of-file token.
/// Lexical diagnostics are dropped; see [`tokenize_with_diagnostics`].
pub fn tokenize(source: &str) -> Vec<Token> {
    parser::lexer::tokenize(source)
}

/// Scan `source` and keep the lexical diagnostics, ready for
/// [`Parser::from_tokens`](parser::parse::Parser::from_tokens)
pub fn tokenize_with_diagnostics(source: &str) -> (Vec<Token>, Vec<LexError>) {
    parser::lexer::tokenize_with_diagnostics(source)
}

/// Parse `source`; the tree is only meaningful when no errors were reported
pub fn parse(source: &str) -> ParseOutcome {
    parser::parse::parse(source)
}

/// Check a parsed program with the default options
pub fn analyze(program: &Program) -> Analysis {
    semantic::analyze_with(program, AnalyzerOptions::default())
}

/// Lower a checked program to three-address code
pub fn generate_ir(program: &Program) -> IrProgram {
    ir::generate(program)
}
