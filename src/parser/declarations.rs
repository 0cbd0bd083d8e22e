//! Declaration parsing implementation
//!
//! This module handles parsing of top-level declarations:
//!
//! - Global variables: `int counter = 0;`
//! - Function prototypes: `int add(int a, int b);`
//! - Function definitions: `int add(int a, int b) { ... }`
//!
//! # Grammar
//!
//! ```text
//! declaration  ::= type identifier ( var_rest | func_rest )
//! var_rest     ::= ( "=" expression )? ";"
//! func_rest    ::= "(" params ")" ( ";" | "{" statements "}" )
//! params       ::= ε | "void" | type identifier ( "," type identifier )*
//! type         ::= "int" | "float" | "double" | "char" | "void" | "string" | "bool"
//! ```
//!
//! Variables and functions share their first two tokens, so the parser looks
//! two tokens past the type keyword before committing to either form.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, Operator, TokenKind};
use crate::parser::parse::{ParseError, Parser, TokenSource};

impl<S: TokenSource> Parser<S> {
    /// Parse a top-level declaration (global variable or function)
    pub(crate) fn parse_top_level_declaration(&mut self) -> Result<AstNode, ParseError> {
        if !self.is_type_keyword() {
            return Err(self.unexpected("type specifier"));
        }

        // type identifier '(' ...  => function
        let is_function =
            self.peek_ahead(1).is(TokenKind::Ident) && self.peek_ahead(2).is(TokenKind::LParen);

        if is_function {
            self.parse_function_declaration()
        } else {
            self.parse_variable_declaration()
        }
    }

    /// Parse function prototype or definition: type name(params) ( ; | { body } )
    pub(crate) fn parse_function_declaration(&mut self) -> Result<AstNode, ParseError> {
        let return_type = self.parse_type()?;
        let loc = self.current_location();
        let name = self.expect_identifier()?;

        self.expect_lparen("after function name")?;
        let params = self.parse_parameter_list()?;
        self.expect_rparen("after parameters")?;

        if self.match_token(TokenKind::Semicolon) {
            return Ok(AstNode::FunctionDecl {
                name,
                params,
                return_type,
                body: None,
                location: loc,
            });
        }

        self.expect_lbrace("or ';' after function signature")?;
        let body = self.parse_block_statements();
        self.expect_rbrace("after function body")?;

        Ok(AstNode::FunctionDecl {
            name,
            params,
            return_type,
            body: Some(body),
            location: loc,
        })
    }

    /// Parse parameter list: (type name, type name, ...)
    pub(crate) fn parse_parameter_list(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();

        if self.check(TokenKind::RParen) {
            return Ok(params);
        }

        // (void) means no parameters
        if self.check_keyword(Keyword::Void) && self.peek_ahead(1).is(TokenKind::RParen) {
            self.advance();
            return Ok(params);
        }

        loop {
            let param_type = self.parse_type()?;
            let location = self.current_location();
            let name = self.expect_identifier()?;
            params.push(Param {
                name,
                param_type,
                location,
            });

            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    /// Parse variable declaration: type name [= expr];
    pub(crate) fn parse_variable_declaration(&mut self) -> Result<AstNode, ParseError> {
        let var_type = self.parse_type()?;
        let loc = self.current_location();
        let name = self.expect_identifier()?;

        let init = if self.check_operator(Operator::Assign) {
            self.advance();
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        self.expect_semicolon("after variable declaration")?;

        Ok(AstNode::VarDecl {
            name,
            var_type,
            init,
            location: loc,
        })
    }

    /// Parse a type keyword
    pub(crate) fn parse_type(&mut self) -> Result<BaseType, ParseError> {
        let base = match self.peek().kind {
            TokenKind::Keyword(Keyword::Int) => BaseType::Int,
            TokenKind::Keyword(Keyword::Float) | TokenKind::Keyword(Keyword::Double) => {
                BaseType::Float
            }
            TokenKind::Keyword(Keyword::Char) => BaseType::Char,
            TokenKind::Keyword(Keyword::Void) => BaseType::Void,
            TokenKind::Keyword(Keyword::String) => BaseType::String,
            TokenKind::Keyword(Keyword::Bool) => BaseType::Bool,
            _ => return Err(self.unexpected("type")),
        };
        self.advance();
        Ok(base)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::parse;

    #[test]
    fn test_global_variable_and_function() {
        let outcome = parse("int g = 1; float h; int main() { return g; }");
        assert!(!outcome.had_error(), "{:?}", outcome.errors);

        let nodes = &outcome.program.nodes;
        assert_eq!(nodes.len(), 3);
        assert!(matches!(
            &nodes[0],
            AstNode::VarDecl { name, var_type: BaseType::Int, init: Some(_), .. } if name == "g"
        ));
        assert!(matches!(
            &nodes[1],
            AstNode::VarDecl { var_type: BaseType::Float, init: None, .. }
        ));
        assert!(matches!(&nodes[2], AstNode::FunctionDecl { body: Some(_), .. }));
    }

    #[test]
    fn test_prototype_and_parameters() {
        let outcome = parse("int add(int a, float b); void tick(void) { }");
        assert!(!outcome.had_error(), "{:?}", outcome.errors);

        match &outcome.program.nodes[0] {
            AstNode::FunctionDecl { name, params, body, .. } => {
                assert_eq!(name, "add");
                assert!(body.is_none());
                assert_eq!(params.len(), 2);
                assert_eq!(params[0].name, "a");
                assert_eq!(params[1].param_type, BaseType::Float);
            }
            other => panic!("Expected prototype, got {:?}", other),
        }

        match &outcome.program.nodes[1] {
            AstNode::FunctionDecl { params, return_type, body, .. } => {
                assert!(params.is_empty());
                assert_eq!(*return_type, BaseType::Void);
                assert_eq!(body.as_ref().map(Vec::len), Some(0));
            }
            other => panic!("Expected definition, got {:?}", other),
        }
    }

    #[test]
    fn test_double_is_float() {
        let outcome = parse("double d = 1.5;");
        assert!(matches!(
            &outcome.program.nodes[0],
            AstNode::VarDecl { var_type: BaseType::Float, .. }
        ));
    }

    #[test]
    fn test_missing_type_is_error() {
        let outcome = parse("main() { return 0; }");
        assert!(outcome.had_error());
        assert!(outcome.errors[0].to_string().contains("expected type specifier"));
    }
}
