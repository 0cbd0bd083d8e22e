//! Expression type inference
//!
//! `infer` returns the type of an expression bottom-up. `None` means the
//! expression is already known to be broken and a diagnostic has been
//! recorded; callers skip their own checks on `None` so that one mistake
//! produces one error.

use crate::parser::ast::*;
use crate::semantic::analyzer::Analyzer;
use crate::semantic::errors::SemanticError;
use crate::semantic::symbols::SymbolKind;
use crate::semantic::types::{binary_result, can_implicitly_cast, unary_result};

impl Analyzer {
    pub(crate) fn infer(&mut self, expr: &AstNode) -> Option<BaseType> {
        match expr {
            AstNode::IntLiteral(..) => Some(BaseType::Int),
            AstNode::FloatLiteral(..) => Some(BaseType::Float),
            AstNode::CharLiteral(..) => Some(BaseType::Char),
            AstNode::StringLiteral(..) => Some(BaseType::String),
            AstNode::BoolLiteral(..) => Some(BaseType::Bool),

            AstNode::Identifier(name, location) => self.infer_identifier(name, *location),

            AstNode::Assignment {
                target,
                value,
                location,
            } => self.infer_assignment(target, value, *location),

            AstNode::BinaryOp {
                op,
                left,
                right,
                location,
            } => {
                let left = self.infer(left);
                let right = self.infer(right);
                let (left, right) = (left?, right?);
                let result = binary_result(*op, left, right);
                if result.is_none() {
                    self.error(SemanticError::InvalidOperands {
                        op: *op,
                        left,
                        right,
                        location: *location,
                    });
                }
                result
            }

            AstNode::UnaryOp {
                op,
                operand,
                location,
            } => {
                let operand = self.infer(operand)?;
                let result = unary_result(*op, operand);
                if result.is_none() {
                    self.error(SemanticError::InvalidUnaryOperand {
                        op: *op,
                        operand,
                        location: *location,
                    });
                }
                result
            }

            AstNode::FunctionCall {
                name,
                args,
                location,
            } => self.infer_call(name, args, *location),

            other => {
                log::trace!("statement node at {} has no type", other.location());
                None
            }
        }
    }

    fn infer_identifier(&mut self, name: &str, location: SourceLocation) -> Option<BaseType> {
        let symbol = match self.symbols.lookup(name) {
            Some(symbol) => symbol,
            None => {
                self.error(SemanticError::UndeclaredVariable {
                    name: name.to_string(),
                    location,
                });
                return None;
            }
        };

        if !symbol.is_value() {
            self.error(SemanticError::NotAValue {
                name: name.to_string(),
                location,
            });
            return None;
        }

        let ty = symbol.data_type;
        self.symbols.mark_used(name);
        Some(ty)
    }

    /// Assignment has the target's type; it writes but does not read the target
    fn infer_assignment(
        &mut self,
        target: &str,
        value: &AstNode,
        location: SourceLocation,
    ) -> Option<BaseType> {
        let target_type = match self.symbols.lookup(target) {
            None => {
                self.error(SemanticError::UndeclaredVariable {
                    name: target.to_string(),
                    location,
                });
                None
            }
            Some(symbol) if !symbol.is_value() => {
                self.error(SemanticError::NotAValue {
                    name: target.to_string(),
                    location,
                });
                None
            }
            Some(symbol) => Some(symbol.data_type),
        };

        let value_type = self.infer(value);
        let (expected, found) = (target_type?, value_type?);
        if !can_implicitly_cast(found, expected) {
            self.error(SemanticError::TypeMismatch {
                expected,
                found,
                location: *value.location(),
            });
        }
        Some(expected)
    }

    /// Arity and argument types are checked independently; a call whose
    /// target resolves still has its declared return type.
    fn infer_call(
        &mut self,
        name: &str,
        args: &[AstNode],
        location: SourceLocation,
    ) -> Option<BaseType> {
        let signature = match self.symbols.lookup(name) {
            None => {
                self.error(SemanticError::UndeclaredFunction {
                    name: name.to_string(),
                    location,
                });
                None
            }
            Some(symbol) => match &symbol.kind {
                SymbolKind::Function { params, .. } => Some((params.clone(), symbol.data_type)),
                _ => {
                    self.error(SemanticError::NotAFunction {
                        name: name.to_string(),
                        location,
                    });
                    None
                }
            },
        };

        let Some((params, return_type)) = signature else {
            for arg in args {
                self.infer(arg);
            }
            return None;
        };

        if args.len() != params.len() {
            self.error(SemanticError::ArgumentCountMismatch {
                name: name.to_string(),
                expected: params.len(),
                found: args.len(),
                location,
            });
        }

        for (index, arg) in args.iter().enumerate() {
            let Some(found) = self.infer(arg) else {
                continue;
            };
            if let Some(&expected) = params.get(index) {
                if !can_implicitly_cast(found, expected) {
                    self.error(SemanticError::ArgumentTypeMismatch {
                        name: name.to_string(),
                        position: index + 1,
                        expected,
                        found,
                        location: *arg.location(),
                    });
                }
            }
        }

        Some(return_type)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::BaseType;
    use crate::parser::parse::parse;
    use crate::semantic::analyzer::{Analysis, Analyzer};
    use crate::semantic::errors::SemanticError;

    fn analyze_main(body: &str) -> Analysis {
        let source = format!(
            "int add(int a, int b) {{ return a + b; }} void log_it(string s) {{ }} int main() {{ {} return 0; }}",
            body
        );
        let outcome = parse(&source);
        assert!(!outcome.had_error(), "{:?}", outcome.errors);
        Analyzer::default().analyze(&outcome.program)
    }

    #[test]
    fn test_promotions_in_initializers() {
        let analysis = analyze_main(
            "float f = 1 + 2.5; int i = 'a' + 1; string s = \"a\" + \"b\"; bool b = 1 < 2.0;",
        );
        assert!(analysis.is_ok(), "{:?}", analysis.errors);
    }

    #[test]
    fn test_int_plus_string_is_invalid() {
        let analysis = analyze_main("int x = 1 + \"s\";");
        assert_eq!(analysis.errors.len(), 1, "{:?}", analysis.errors);
        assert!(matches!(
            analysis.errors[0],
            SemanticError::InvalidOperands {
                left: BaseType::Int,
                right: BaseType::String,
                ..
            }
        ));
    }

    #[test]
    fn test_void_results_cannot_be_compared() {
        let analysis = analyze_main(
            "bool b = log_it(\"a\") == log_it(\"b\"); if (log_it(\"c\") != log_it(\"d\")) { } if (b) { }",
        );
        assert_eq!(analysis.errors.len(), 2, "{:?}", analysis.errors);
        for err in &analysis.errors {
            assert!(matches!(
                err,
                SemanticError::InvalidOperands {
                    left: BaseType::Void,
                    right: BaseType::Void,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_narrowing_assignment_rejected() {
        let analysis = analyze_main("int x = 0; x = 2.5;");
        assert_eq!(analysis.errors.len(), 1);
        assert!(matches!(
            analysis.errors[0],
            SemanticError::TypeMismatch {
                expected: BaseType::Int,
                found: BaseType::Float,
                ..
            }
        ));
    }

    #[test]
    fn test_undeclared_variable_reported_once() {
        let analysis = analyze_main("int x = y * 2 + 1;");
        assert_eq!(analysis.errors.len(), 1);
        assert!(matches!(
            analysis.errors[0],
            SemanticError::UndeclaredVariable { ref name, .. } if name == "y"
        ));
    }

    #[test]
    fn test_arity_and_argument_types_both_reported() {
        let analysis = analyze_main("add(1.5);");
        assert_eq!(analysis.errors.len(), 2, "{:?}", analysis.errors);
        assert!(matches!(
            analysis.errors[0],
            SemanticError::ArgumentCountMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
        assert!(matches!(
            analysis.errors[1],
            SemanticError::ArgumentTypeMismatch { position: 1, .. }
        ));
    }

    #[test]
    fn test_void_call_used_as_value() {
        let analysis = analyze_main("log_it(\"hi\"); int x = log_it(\"hi\");");
        assert_eq!(analysis.errors.len(), 1);
        assert!(matches!(
            analysis.errors[0],
            SemanticError::TypeMismatch {
                found: BaseType::Void,
                ..
            }
        ));
    }

    #[test]
    fn test_function_name_is_not_a_value() {
        let analysis = analyze_main("int x = add;");
        assert!(matches!(
            analysis.errors.as_slice(),
            [SemanticError::NotAValue { name, .. }] if name == "add"
        ));
    }

    #[test]
    fn test_calling_a_variable() {
        let analysis = analyze_main("int v = 1; v(2);");
        assert!(matches!(
            analysis.errors.as_slice(),
            [SemanticError::NotAFunction { .. }]
        ));
    }

    #[test]
    fn test_unary_operators() {
        let analysis = analyze_main("int n = -3; bool b = !n; bool c = !true;");
        assert!(analysis.is_ok(), "{:?}", analysis.errors);

        let analysis = analyze_main("string s = -\"x\";");
        assert!(matches!(
            analysis.errors.as_slice(),
            [SemanticError::InvalidUnaryOperand { .. }]
        ));
    }

    #[test]
    fn test_modulo_needs_integral_operands() {
        let analysis = analyze_main("int r = 7 % 2; float f = 7.0 % 2;");
        assert_eq!(analysis.errors.len(), 1);
    }
}
