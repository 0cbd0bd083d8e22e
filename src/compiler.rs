//! The front-end pipeline
//!
//! [`compile`] runs lexer and parser, semantic analysis and IR generation in
//! order and stops at the first stage that reports errors. Each stage's
//! diagnostics travel inside [`CompileError`] unchanged.

use crate::ir::{self, IrProgram};
use crate::parser::ast::Program;
use crate::parser::parse::{self, ParseError};
use crate::semantic::{analyze_with, Analysis, AnalyzerOptions, SemanticError, SemanticWarning};
use thiserror::Error;

/// Pipeline settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub analyzer: AnalyzerOptions,
    /// Go straight from parsing to IR generation
    pub skip_semantic: bool,
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("parsing failed with {} error(s)", .0.len())]
    Syntax(Vec<ParseError>),

    #[error("semantic analysis failed with {} error(s)", .errors.len())]
    Semantic {
        errors: Vec<SemanticError>,
        warnings: Vec<SemanticWarning>,
    },
}

impl CompileError {
    /// Rendered diagnostics, in the order they were reported
    pub fn messages(&self) -> Vec<String> {
        match self {
            CompileError::Syntax(errors) => errors.iter().map(ToString::to_string).collect(),
            CompileError::Semantic { errors, .. } => {
                errors.iter().map(ToString::to_string).collect()
            }
        }
    }
}

/// Output of a successful run
#[derive(Debug, Clone)]
pub struct Compilation {
    pub program: Program,
    /// `None` when analysis was skipped
    pub analysis: Option<Analysis>,
    pub ir: IrProgram,
}

impl Compilation {
    pub fn warnings(&self) -> &[SemanticWarning] {
        self.analysis
            .as_ref()
            .map(|analysis| analysis.warnings.as_slice())
            .unwrap_or_default()
    }
}

pub fn compile(source: &str, options: &CompileOptions) -> Result<Compilation, CompileError> {
    log::debug!("compiling {} bytes of source", source.len());

    let program = parse::parse(source)
        .into_result()
        .map_err(CompileError::Syntax)?;

    let analysis = if options.skip_semantic {
        log::debug!("semantic analysis skipped");
        None
    } else {
        let analysis = analyze_with(&program, options.analyzer);
        if !analysis.is_ok() {
            return Err(CompileError::Semantic {
                errors: analysis.errors,
                warnings: analysis.warnings,
            });
        }
        Some(analysis)
    };

    let ir = ir::generate(&program);
    Ok(Compilation {
        program,
        analysis,
        ir,
    })
}
