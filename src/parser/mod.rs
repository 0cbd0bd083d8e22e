//! minic source code parser
//!
//! This module transforms minic source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parser struct, recovery and helpers (tokens → AST)
//! - [`declarations`], [`statements`], [`expressions`]: grammar rules
//! - [`ast`]: AST node definitions
//!
//! # Supported language
//!
//! - Types: `int`, `float` (alias `double`), `char`, `bool`, `string`, `void`
//! - Declarations: globals, function prototypes and definitions
//! - Statements: declarations, `if`/`else`, `while`, `for`, `break`,
//!   `continue`, `return`, blocks, expression statements
//! - Expressions: arithmetic, comparison, logical, unary `-`/`!`,
//!   assignment, function calls
//! - No preprocessor, pointers, arrays, or user-defined types
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser, one method per precedence level.
//! No external parser generator dependencies.

pub mod ast;
pub mod declarations;
pub mod expressions;
pub mod lexer;
pub mod parse;
pub mod statements;
