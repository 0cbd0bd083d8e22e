// Semantic diagnostics

use crate::parser::ast::{BaseType, BinOp, SourceLocation, UnOp};
use thiserror::Error;

/// A semantic error. Analysis keeps going after each one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("Semantic error at line {}, column {}: undeclared variable '{name}'", .location.line, .location.column)]
    UndeclaredVariable {
        name: String,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: undeclared function '{name}'", .location.line, .location.column)]
    UndeclaredFunction {
        name: String,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: function '{name}' used as a value", .location.line, .location.column)]
    NotAValue {
        name: String,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: '{name}' is not a function", .location.line, .location.column)]
    NotAFunction {
        name: String,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: '{name}' is already declared in this scope", .location.line, .location.column)]
    Redeclaration {
        name: String,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: type mismatch: expected {expected}, found {found}", .location.line, .location.column)]
    TypeMismatch {
        expected: BaseType,
        found: BaseType,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: invalid operands to '{op}': {left} and {right}", .location.line, .location.column)]
    InvalidOperands {
        op: BinOp,
        left: BaseType,
        right: BaseType,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: invalid operand to unary '{op}': {operand}", .location.line, .location.column)]
    InvalidUnaryOperand {
        op: UnOp,
        operand: BaseType,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: condition must be bool or numeric, found {found}", .location.line, .location.column)]
    InvalidCondition {
        found: BaseType,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: function '{name}' expects {expected} arguments, got {found}", .location.line, .location.column)]
    ArgumentCountMismatch {
        name: String,
        expected: usize,
        found: usize,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: argument {position} of '{name}': expected {expected}, found {found}", .location.line, .location.column)]
    ArgumentTypeMismatch {
        name: String,
        position: usize,
        expected: BaseType,
        found: BaseType,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: void function '{function}' cannot return a value", .location.line, .location.column)]
    ReturnValueInVoid {
        function: String,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: function '{function}' must return a value of type {expected}", .location.line, .location.column)]
    MissingReturnValue {
        function: String,
        expected: BaseType,
        location: SourceLocation,
    },

    #[error("Semantic error: no 'main' function defined")]
    MissingMain,

    #[error("Semantic error at line {}, column {}: 'main' must return int or void, found {found}", .location.line, .location.column)]
    InvalidMainSignature {
        found: BaseType,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: conflicting declaration of function '{name}'", .location.line, .location.column)]
    ConflictingDeclaration {
        name: String,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: function '{name}' is already defined", .location.line, .location.column)]
    FunctionRedefinition {
        name: String,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: '{name}' declared with type void", .location.line, .location.column)]
    VoidVariable {
        name: String,
        location: SourceLocation,
    },

    #[error("Semantic error at line {}, column {}: 'break' outside of a loop", .location.line, .location.column)]
    BreakOutsideLoop { location: SourceLocation },

    #[error("Semantic error at line {}, column {}: 'continue' outside of a loop", .location.line, .location.column)]
    ContinueOutsideLoop { location: SourceLocation },
}

impl SemanticError {
    /// Position of the offending construct; whole-program errors have none
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            SemanticError::MissingMain => None,
            SemanticError::UndeclaredVariable { location, .. }
            | SemanticError::UndeclaredFunction { location, .. }
            | SemanticError::NotAValue { location, .. }
            | SemanticError::NotAFunction { location, .. }
            | SemanticError::Redeclaration { location, .. }
            | SemanticError::TypeMismatch { location, .. }
            | SemanticError::InvalidOperands { location, .. }
            | SemanticError::InvalidUnaryOperand { location, .. }
            | SemanticError::InvalidCondition { location, .. }
            | SemanticError::ArgumentCountMismatch { location, .. }
            | SemanticError::ArgumentTypeMismatch { location, .. }
            | SemanticError::ReturnValueInVoid { location, .. }
            | SemanticError::MissingReturnValue { location, .. }
            | SemanticError::InvalidMainSignature { location, .. }
            | SemanticError::ConflictingDeclaration { location, .. }
            | SemanticError::FunctionRedefinition { location, .. }
            | SemanticError::VoidVariable { location, .. }
            | SemanticError::BreakOutsideLoop { location }
            | SemanticError::ContinueOutsideLoop { location } => Some(*location),
        }
    }
}

/// Non-fatal findings
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticWarning {
    #[error("Warning at line {}, column {}: variable '{name}' declared but never used", .location.line, .location.column)]
    UnusedVariable {
        name: String,
        location: SourceLocation,
    },
}

impl SemanticWarning {
    pub fn location(&self) -> SourceLocation {
        match self {
            SemanticWarning::UnusedVariable { location, .. } => *location,
        }
    }
}
