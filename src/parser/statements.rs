//! Statement parsing implementation
//!
//! This module handles parsing of all statement types:
//!
//! - Variable declarations: `int x = 42;`
//! - Control flow: `if`/`else`, `while`, `for`
//! - Jump statements: `return`, `break`, `continue`
//! - Compound statements: `{ ... }`
//! - Expression statements: function calls, assignments
//!
//! # Grammar
//!
//! ```text
//! statement ::= var_decl | if_stmt | while_stmt | for_stmt | return_stmt
//!             | break_stmt | continue_stmt | block | expr_stmt
//! if_stmt   ::= "if" "(" expression ")" statement ( "else" statement )?
//! for_stmt  ::= "for" "(" ( var_decl | expression? ";" ) expression? ";" expression? ")" statement
//! ```
//!
//! An `else` always binds to the nearest `if` that has none.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, TokenKind};
use crate::parser::parse::{ParseError, Parser, TokenSource};

impl<S: TokenSource> Parser<S> {
    /// Parse block statements (inside braces, excluding the braces themselves).
    ///
    /// A statement that fails to parse is recorded and skipped; the block
    /// keeps whatever statements parsed cleanly.
    pub(crate) fn parse_block_statements(&mut self) -> Vec<AstNode> {
        let mut statements = Vec::new();

        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let start = self.position;
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.record(err);
                    self.synchronize();
                    if self.position == start {
                        self.advance();
                    }
                }
            }
        }

        statements
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        if self.match_keyword(Keyword::Return) {
            return self.parse_return_statement(loc);
        }

        if self.match_keyword(Keyword::If) {
            return self.parse_if_statement(loc);
        }

        if self.match_keyword(Keyword::While) {
            return self.parse_while_statement(loc);
        }

        if self.match_keyword(Keyword::For) {
            return self.parse_for_statement(loc);
        }

        if self.match_keyword(Keyword::Break) {
            self.expect_semicolon("after 'break'")?;
            return Ok(AstNode::Break { location: loc });
        }

        if self.match_keyword(Keyword::Continue) {
            self.expect_semicolon("after 'continue'")?;
            return Ok(AstNode::Continue { location: loc });
        }

        if self.match_token(TokenKind::LBrace) {
            let statements = self.parse_block_statements();
            self.expect_rbrace("after block")?;
            return Ok(AstNode::Block {
                statements,
                location: loc,
            });
        }

        if self.is_type_keyword() {
            return self.parse_variable_declaration();
        }

        // Otherwise, it's an expression statement
        let expr = self.parse_expression()?;
        self.expect_semicolon("after expression")?;
        Ok(AstNode::ExpressionStatement {
            expr: Box::new(expr),
            location: loc,
        })
    }

    /// Parse return statement: return [expr];
    fn parse_return_statement(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        let expr = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };

        self.expect_semicolon("after return statement")?;
        Ok(AstNode::Return {
            expr,
            location: loc,
        })
    }

    /// Parse if statement: if (cond) stmt [else stmt]
    fn parse_if_statement(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        self.expect_lparen("after 'if'")?;
        let condition = Box::new(self.parse_expression()?);
        self.expect_rparen("after if condition")?;

        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_keyword(Keyword::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(AstNode::If {
            condition,
            then_branch,
            else_branch,
            location: loc,
        })
    }

    /// Parse while statement: while (cond) stmt
    fn parse_while_statement(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        self.expect_lparen("after 'while'")?;
        let condition = Box::new(self.parse_expression()?);
        self.expect_rparen("after while condition")?;

        let body = Box::new(self.parse_statement()?);

        Ok(AstNode::While {
            condition,
            body,
            location: loc,
        })
    }

    /// Parse for statement: for (init; cond; step) stmt
    fn parse_for_statement(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        self.expect_lparen("after 'for'")?;

        // The declaration form consumes its own ';'
        let init = if self.match_token(TokenKind::Semicolon) {
            None
        } else if self.is_type_keyword() {
            Some(Box::new(self.parse_variable_declaration()?))
        } else {
            let expr_loc = self.current_location();
            let expr = self.parse_expression()?;
            self.expect_semicolon("after for initializer")?;
            Some(Box::new(AstNode::ExpressionStatement {
                expr: Box::new(expr),
                location: expr_loc,
            }))
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_semicolon("after for condition")?;

        let increment = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_rparen("after for clauses")?;

        let body = Box::new(self.parse_statement()?);

        Ok(AstNode::For {
            init,
            condition,
            increment,
            body,
            location: loc,
        })
    }
}
