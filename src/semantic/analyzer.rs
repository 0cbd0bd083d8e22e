//! Declaration and statement checking
//!
//! The [`Analyzer`] walks the program once, in source order. Declarations
//! go into the scope stack as they are met, so a function can only be
//! called after its definition or a prototype. Expression typing lives in
//! [`super::expressions`].
//!
//! Every check records a diagnostic and keeps going; an [`Analysis`] with
//! no errors is the only thing the IR generator should be handed.

use crate::parser::ast::*;
use crate::semantic::errors::{SemanticError, SemanticWarning};
use crate::semantic::symbols::{Symbol, SymbolKind, SymbolTable};
use crate::semantic::types::{can_implicitly_cast, is_condition};

/// Analyzer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Report variables that are declared but never read
    pub warn_unused: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self { warn_unused: true }
    }
}

/// Everything one analysis run found
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub errors: Vec<SemanticError>,
    pub warnings: Vec<SemanticWarning>,
    /// Global scope as it stood at the end of the run
    pub globals: Vec<Symbol>,
}

impl Analysis {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The function whose body is being checked
#[derive(Debug, Clone)]
pub(crate) struct FunctionContext {
    pub(crate) name: String,
    pub(crate) return_type: BaseType,
}

pub struct Analyzer {
    pub(crate) options: AnalyzerOptions,
    pub(crate) symbols: SymbolTable,
    pub(crate) errors: Vec<SemanticError>,
    pub(crate) warnings: Vec<SemanticWarning>,
    pub(crate) function: Option<FunctionContext>,
    pub(crate) loop_depth: usize,
    pub(crate) saw_main: bool,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerOptions::default())
    }
}

impl Analyzer {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self {
            options,
            symbols: SymbolTable::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            function: None,
            loop_depth: 0,
            saw_main: false,
        }
    }

    /// Check a whole program
    pub fn analyze(mut self, program: &Program) -> Analysis {
        for node in &program.nodes {
            match node {
                AstNode::FunctionDecl {
                    name,
                    params,
                    return_type,
                    body,
                    location,
                } => self.check_function(name, params, *return_type, body.as_deref(), *location),
                AstNode::VarDecl {
                    name,
                    var_type,
                    init,
                    location,
                } => self.check_var_decl(name, *var_type, init.as_deref(), *location),
                other => log::trace!("ignoring top-level node at {}", other.location()),
            }
        }

        if !self.saw_main {
            self.error(SemanticError::MissingMain);
        }

        let globals = self.symbols.globals();
        self.report_unused(&globals);

        log::debug!(
            "semantic analysis finished: {} errors, {} warnings, {} globals",
            self.errors.len(),
            self.warnings.len(),
            globals.len()
        );

        Analysis {
            errors: self.errors,
            warnings: self.warnings,
            globals,
        }
    }

    // ===== Declarations =====

    fn check_function(
        &mut self,
        name: &str,
        params: &[Param],
        return_type: BaseType,
        body: Option<&[AstNode]>,
        location: SourceLocation,
    ) {
        if name == "main" {
            if !matches!(return_type, BaseType::Int | BaseType::Void) {
                self.error(SemanticError::InvalidMainSignature {
                    found: return_type,
                    location,
                });
            }
            if body.is_some() {
                self.saw_main = true;
            }
        }

        let param_types: Vec<BaseType> = params.iter().map(|p| p.param_type).collect();
        self.register_function(name, return_type, param_types, body.is_some(), location);

        let Some(body) = body else {
            return;
        };

        // Parameters and the outermost block share one scope
        self.function = Some(FunctionContext {
            name: name.to_string(),
            return_type,
        });
        self.symbols.enter_scope();

        for param in params {
            if param.param_type == BaseType::Void {
                self.error(SemanticError::VoidVariable {
                    name: param.name.clone(),
                    location: param.location,
                });
                continue;
            }
            let symbol = Symbol::parameter(&param.name, param.param_type, param.location);
            if let Err(rejected) = self.symbols.declare(symbol) {
                self.error(SemanticError::Redeclaration {
                    name: rejected.name,
                    location: rejected.location,
                });
            }
        }

        for statement in body {
            self.check_statement(statement);
        }

        self.exit_scope();
        self.function = None;
    }

    /// Enter a function into the global scope, reconciling it with any
    /// earlier prototype of the same name.
    fn register_function(
        &mut self,
        name: &str,
        return_type: BaseType,
        params: Vec<BaseType>,
        is_definition: bool,
        location: SourceLocation,
    ) {
        let conflict = match self.symbols.lookup_current_mut(name) {
            None => None,
            Some(existing) => match &mut existing.kind {
                SymbolKind::Function {
                    params: known,
                    defined,
                } => {
                    if existing.data_type != return_type || *known != params {
                        Some(SemanticError::ConflictingDeclaration {
                            name: name.to_string(),
                            location,
                        })
                    } else if is_definition && *defined {
                        Some(SemanticError::FunctionRedefinition {
                            name: name.to_string(),
                            location,
                        })
                    } else {
                        *defined |= is_definition;
                        None
                    }
                }
                _ => Some(SemanticError::Redeclaration {
                    name: name.to_string(),
                    location,
                }),
            },
        };

        match conflict {
            Some(err) => self.error(err),
            None => {
                if self.symbols.lookup_current(name).is_none() {
                    let symbol =
                        Symbol::function(name, return_type, params, is_definition, location);
                    // Cannot clash: the name was just checked
                    let _ = self.symbols.declare(symbol);
                }
            }
        }
    }

    pub(crate) fn check_var_decl(
        &mut self,
        name: &str,
        var_type: BaseType,
        init: Option<&AstNode>,
        location: SourceLocation,
    ) {
        // The initializer is checked before the name comes into scope
        if let Some(init) = init {
            if let Some(found) = self.infer(init) {
                if var_type != BaseType::Void && !can_implicitly_cast(found, var_type) {
                    self.error(SemanticError::TypeMismatch {
                        expected: var_type,
                        found,
                        location: *init.location(),
                    });
                }
            }
        }

        if var_type == BaseType::Void {
            self.error(SemanticError::VoidVariable {
                name: name.to_string(),
                location,
            });
            return;
        }

        if let Err(rejected) = self
            .symbols
            .declare(Symbol::variable(name, var_type, location))
        {
            self.error(SemanticError::Redeclaration {
                name: rejected.name,
                location: rejected.location,
            });
        }
    }

    // ===== Statements =====

    pub(crate) fn check_statement(&mut self, node: &AstNode) {
        match node {
            AstNode::VarDecl {
                name,
                var_type,
                init,
                location,
            } => self.check_var_decl(name, *var_type, init.as_deref(), *location),

            AstNode::Block { statements, .. } => {
                self.symbols.enter_scope();
                for statement in statements {
                    self.check_statement(statement);
                }
                self.exit_scope();
            }

            AstNode::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.check_condition(condition);
                self.check_statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_statement(else_branch);
                }
            }

            AstNode::While {
                condition, body, ..
            } => {
                self.check_condition(condition);
                self.check_loop_body(body);
            }

            AstNode::For {
                init,
                condition,
                increment,
                body,
                ..
            } => {
                self.symbols.enter_scope();
                if let Some(init) = init {
                    self.check_statement(init);
                }
                if let Some(condition) = condition {
                    self.check_condition(condition);
                }
                if let Some(increment) = increment {
                    self.infer(increment);
                }
                self.check_loop_body(body);
                self.exit_scope();
            }

            AstNode::Return { expr, location } => self.check_return(expr.as_deref(), *location),

            AstNode::Break { location } => {
                if self.loop_depth == 0 {
                    self.error(SemanticError::BreakOutsideLoop {
                        location: *location,
                    });
                }
            }

            AstNode::Continue { location } => {
                if self.loop_depth == 0 {
                    self.error(SemanticError::ContinueOutsideLoop {
                        location: *location,
                    });
                }
            }

            AstNode::ExpressionStatement { expr, .. } => {
                self.infer(expr);
            }

            AstNode::FunctionDecl { location, .. } => {
                log::trace!("nested function declaration at {} ignored", location);
            }

            expr => {
                self.infer(expr);
            }
        }
    }

    fn check_loop_body(&mut self, body: &AstNode) {
        self.loop_depth += 1;
        self.check_statement(body);
        self.loop_depth -= 1;
    }

    fn check_condition(&mut self, condition: &AstNode) {
        if let Some(found) = self.infer(condition) {
            if !is_condition(found) {
                self.error(SemanticError::InvalidCondition {
                    found,
                    location: *condition.location(),
                });
            }
        }
    }

    fn check_return(&mut self, expr: Option<&AstNode>, location: SourceLocation) {
        let found = expr.and_then(|expr| self.infer(expr));
        let Some(function) = self.function.clone() else {
            return;
        };

        match (function.return_type, expr) {
            (BaseType::Void, Some(_)) => self.error(SemanticError::ReturnValueInVoid {
                function: function.name,
                location,
            }),
            (BaseType::Void, None) => {}
            (expected, None) => self.error(SemanticError::MissingReturnValue {
                function: function.name,
                expected,
                location,
            }),
            (expected, Some(expr)) => {
                if let Some(found) = found {
                    if !can_implicitly_cast(found, expected) {
                        self.error(SemanticError::TypeMismatch {
                            expected,
                            found,
                            location: *expr.location(),
                        });
                    }
                }
            }
        }
    }

    // ===== Scopes and diagnostics =====

    fn exit_scope(&mut self) {
        let symbols = self.symbols.leave_scope();
        self.report_unused(&symbols);
    }

    fn report_unused(&mut self, symbols: &[Symbol]) {
        if !self.options.warn_unused {
            return;
        }
        for symbol in symbols {
            if symbol.kind == SymbolKind::Variable && !symbol.used {
                self.warnings.push(SemanticWarning::UnusedVariable {
                    name: symbol.name.clone(),
                    location: symbol.location,
                });
            }
        }
    }

    pub(crate) fn error(&mut self, err: SemanticError) {
        log::trace!("{}", err);
        self.errors.push(err);
    }
}

/// Check `program` with the given options
pub fn analyze_with(program: &Program, options: AnalyzerOptions) -> Analysis {
    Analyzer::new(options).analyze(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::parse;

    fn analyze_source(source: &str) -> Analysis {
        let outcome = parse(source);
        assert!(!outcome.had_error(), "{:?}", outcome.errors);
        Analyzer::default().analyze(&outcome.program)
    }

    fn only_error(source: &str) -> SemanticError {
        let analysis = analyze_source(source);
        assert_eq!(analysis.errors.len(), 1, "{:?}", analysis.errors);
        analysis.errors.into_iter().next().unwrap()
    }

    #[test]
    fn test_valid_program() {
        let analysis = analyze_source(
            r#"
            int add(int a, int b) { return a + b; }
            int main() {
                int total = add(1, 2);
                return total;
            }
            "#,
        );
        assert!(analysis.is_ok(), "{:?}", analysis.errors);
        assert!(analysis.warnings.is_empty());
    }

    #[test]
    fn test_missing_main_reported_once() {
        let analysis = analyze_source("int f() { return 1; } int g() { return 2; }");
        assert_eq!(analysis.errors, vec![SemanticError::MissingMain]);
    }

    #[test]
    fn test_prototype_only_main_is_missing() {
        let analysis = analyze_source("int main();");
        assert_eq!(analysis.errors, vec![SemanticError::MissingMain]);
    }

    #[test]
    fn test_main_return_type() {
        let err = only_error("float main() { return 1.0; }");
        assert!(matches!(
            err,
            SemanticError::InvalidMainSignature {
                found: BaseType::Float,
                ..
            }
        ));
    }

    #[test]
    fn test_same_scope_redeclaration() {
        let err = only_error("int main() { int a = 1; int a = 2; return a; }");
        assert!(matches!(err, SemanticError::Redeclaration { ref name, .. } if name == "a"));
    }

    #[test]
    fn test_parameter_and_body_share_scope() {
        let err = only_error("int f(int a) { int a = 0; return a; } int main() { return f(1); }");
        assert!(matches!(err, SemanticError::Redeclaration { .. }));
    }

    #[test]
    fn test_shadowing_in_inner_block() {
        let analysis = analyze_source(
            "int main() { int x = 1; { float x = 2.0; x = x + 1.5; } return x; }",
        );
        assert!(analysis.is_ok(), "{:?}", analysis.errors);
    }

    #[test]
    fn test_prototype_then_definition() {
        let analysis = analyze_source(
            r#"
            int twice(int n);
            int twice(int n);
            int main() { return twice(4); }
            int twice(int n) { return n * 2; }
            "#,
        );
        assert!(analysis.is_ok(), "{:?}", analysis.errors);
        let twice = analysis.globals.iter().find(|s| s.name == "twice").unwrap();
        assert!(matches!(twice.kind, SymbolKind::Function { defined: true, .. }));
    }

    #[test]
    fn test_conflicting_prototype() {
        let err = only_error("int f(int a); int f(float a) { return 0; } int main() { return 0; }");
        assert!(matches!(err, SemanticError::ConflictingDeclaration { .. }));
    }

    #[test]
    fn test_function_redefinition() {
        let err = only_error("void f() { } void f() { } int main() { return 0; }");
        assert!(matches!(err, SemanticError::FunctionRedefinition { .. }));
    }

    #[test]
    fn test_global_variable_clashes_with_function() {
        let analysis = analyze_source("int f; int f() { return 0; } int main() { return f(); }");
        // the call still resolves to the variable
        assert_eq!(analysis.errors.len(), 2, "{:?}", analysis.errors);
        assert!(matches!(analysis.errors[0], SemanticError::Redeclaration { .. }));
        assert!(matches!(analysis.errors[1], SemanticError::NotAFunction { .. }));
    }

    #[test]
    fn test_return_checks() {
        let err = only_error("void f() { return 1; } int main() { return 0; }");
        assert!(matches!(err, SemanticError::ReturnValueInVoid { .. }));

        let err = only_error("int main() { return; }");
        assert!(matches!(
            err,
            SemanticError::MissingReturnValue {
                expected: BaseType::Int,
                ..
            }
        ));

        let err = only_error("int main() { return 1.5; }");
        assert!(matches!(
            err,
            SemanticError::TypeMismatch {
                expected: BaseType::Int,
                found: BaseType::Float,
                ..
            }
        ));
    }

    #[test]
    fn test_break_and_continue_need_a_loop() {
        let analysis = analyze_source("int main() { break; continue; return 0; }");
        assert_eq!(analysis.errors.len(), 2);
        assert!(matches!(analysis.errors[0], SemanticError::BreakOutsideLoop { .. }));
        assert!(matches!(analysis.errors[1], SemanticError::ContinueOutsideLoop { .. }));

        let analysis =
            analyze_source("int main() { for (int i = 0; i < 3; i = i + 1) { if (i == 1) continue; break; } return 0; }");
        assert!(analysis.is_ok(), "{:?}", analysis.errors);
    }

    #[test]
    fn test_for_scope_ends_with_loop() {
        let err = only_error("int main() { for (int i = 0; i < 3; i = i + 1) { } return i; }");
        assert!(matches!(err, SemanticError::UndeclaredVariable { ref name, .. } if name == "i"));
    }

    #[test]
    fn test_void_variables_rejected() {
        let analysis = analyze_source("void f(void x) { } int main() { void y; return 0; }");
        assert_eq!(analysis.errors.len(), 2);
        assert!(analysis
            .errors
            .iter()
            .all(|e| matches!(e, SemanticError::VoidVariable { .. })));
    }

    #[test]
    fn test_condition_must_be_truthy() {
        let err = only_error("int main() { string s = \"a\"; while (s) { } return 0; }");
        assert!(matches!(
            err,
            SemanticError::InvalidCondition {
                found: BaseType::String,
                ..
            }
        ));
    }

    #[test]
    fn test_unused_variable_warnings() {
        let analysis = analyze_source(
            "int g; int h = 1; int main(int argc) { int unused = 0; int used = h; return used; }",
        );
        assert!(analysis.is_ok());
        let names: Vec<String> = analysis
            .warnings
            .iter()
            .map(|w| match w {
                SemanticWarning::UnusedVariable { name, .. } => name.clone(),
            })
            .collect();
        assert_eq!(names, vec!["unused", "g"]);
    }

    #[test]
    fn test_unused_warnings_can_be_disabled() {
        let program = parse("int main() { int x = 0; return 0; }").program;
        let analysis = analyze_with(
            &program,
            AnalyzerOptions { warn_unused: false },
        );
        assert!(analysis.is_ok());
        assert!(analysis.warnings.is_empty());
    }

    #[test]
    fn test_errors_accumulate() {
        let analysis = analyze_source(
            "int main() { a = 1; int b = \"s\"; c(); return 0; }",
        );
        assert_eq!(analysis.errors.len(), 3, "{:?}", analysis.errors);
    }
}
