//! Expression parsing implementation
//!
//! One method per precedence level, lowest first. Every binary level is
//! left-associative; assignment is the only right-associative form.
//!
//! # Grammar
//!
//! ```text
//! expression     ::= assignment
//! assignment     ::= identifier "=" assignment | logical_or
//! logical_or     ::= logical_and ( "||" logical_and )*
//! logical_and    ::= equality ( "&&" equality )*
//! equality       ::= relational ( ( "==" | "!=" ) relational )*
//! relational     ::= additive ( ( "<" | ">" | "<=" | ">=" ) additive )*
//! additive       ::= multiplicative ( ( "+" | "-" ) multiplicative )*
//! multiplicative ::= unary ( ( "*" | "/" | "%" ) unary )*
//! unary          ::= ( "-" | "!" ) unary | call
//! call           ::= identifier "(" ( expression ( "," expression )* )? ")" | primary
//! primary        ::= literal | identifier | "(" expression ")"
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{unescape_literal, Operator, TokenKind};
use crate::parser::parse::{ParseError, Parser, TokenSource};

impl<S: TokenSource> Parser<S> {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<AstNode, ParseError> {
        self.parse_assignment()
    }

    /// Parse assignment (right-associative)
    fn parse_assignment(&mut self) -> Result<AstNode, ParseError> {
        let expr = self.parse_logical_or()?;

        if !self.check_operator(Operator::Assign) {
            return Ok(expr);
        }

        let loc = self.current_location();
        self.advance();
        let value = Box::new(self.parse_assignment()?);

        match expr {
            AstNode::Identifier(target, _) => Ok(AstNode::Assignment {
                target,
                value,
                location: loc,
            }),
            _ => Err(ParseError::InvalidAssignmentTarget { location: loc }),
        }
    }

    /// Parse logical OR (||)
    fn parse_logical_or(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_logical_and()?;

        while self.check_operator(Operator::OrOr) {
            left = self.finish_binary(left, BinOp::Or, Self::parse_logical_and)?;
        }

        Ok(left)
    }

    /// Parse logical AND (&&)
    fn parse_logical_and(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_equality()?;

        while self.check_operator(Operator::AndAnd) {
            left = self.finish_binary(left, BinOp::And, Self::parse_equality)?;
        }

        Ok(left)
    }

    /// Parse equality (==, !=)
    fn parse_equality(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Operator(Operator::EqEq) => BinOp::Eq,
                TokenKind::Operator(Operator::NotEq) => BinOp::Ne,
                _ => break,
            };
            left = self.finish_binary(left, op, Self::parse_relational)?;
        }

        Ok(left)
    }

    /// Parse relational (<, >, <=, >=)
    fn parse_relational(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Operator(Operator::Lt) => BinOp::Lt,
                TokenKind::Operator(Operator::Gt) => BinOp::Gt,
                TokenKind::Operator(Operator::Le) => BinOp::Le,
                TokenKind::Operator(Operator::Ge) => BinOp::Ge,
                _ => break,
            };
            left = self.finish_binary(left, op, Self::parse_additive)?;
        }

        Ok(left)
    }

    /// Parse additive (+, -)
    fn parse_additive(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Operator(Operator::Plus) => BinOp::Add,
                TokenKind::Operator(Operator::Minus) => BinOp::Sub,
                _ => break,
            };
            left = self.finish_binary(left, op, Self::parse_multiplicative)?;
        }

        Ok(left)
    }

    /// Parse multiplicative (*, /, %)
    fn parse_multiplicative(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Operator(Operator::Star) => BinOp::Mul,
                TokenKind::Operator(Operator::Slash) => BinOp::Div,
                TokenKind::Operator(Operator::Percent) => BinOp::Mod,
                _ => break,
            };
            left = self.finish_binary(left, op, Self::parse_unary)?;
        }

        Ok(left)
    }

    /// Consume the operator token, parse the right operand with `next`,
    /// and combine. The node is located at the operator.
    fn finish_binary(
        &mut self,
        left: AstNode,
        op: BinOp,
        next: fn(&mut Self) -> Result<AstNode, ParseError>,
    ) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.advance();
        let right = next(self)?;
        Ok(AstNode::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
            location: loc,
        })
    }

    /// Parse unary operators (-, !)
    fn parse_unary(&mut self) -> Result<AstNode, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Operator(Operator::Minus) => UnOp::Neg,
            TokenKind::Operator(Operator::Bang) => UnOp::Not,
            _ => return self.parse_call(),
        };

        let loc = self.current_location();
        self.advance();
        let operand = Box::new(self.parse_unary()?);
        Ok(AstNode::UnaryOp {
            op,
            operand,
            location: loc,
        })
    }

    /// Parse a function call, or fall through to a primary expression
    fn parse_call(&mut self) -> Result<AstNode, ParseError> {
        if !(self.check(TokenKind::Ident) && self.peek_ahead(1).is(TokenKind::LParen)) {
            return self.parse_primary();
        }

        let loc = self.current_location();
        let name = self.advance().text;
        self.advance(); // '('

        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect_rparen("after arguments")?;

        Ok(AstNode::FunctionCall {
            name,
            args,
            location: loc,
        })
    }

    /// Parse primary expressions (literals, identifiers, parenthesized)
    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        match self.peek().kind {
            TokenKind::IntLiteral => {
                let text = self.advance().text;
                text.parse::<i64>()
                    .map(|value| AstNode::IntLiteral(value, loc))
                    .map_err(|_| ParseError::InvalidLiteral {
                        text,
                        location: loc,
                    })
            }
            TokenKind::FloatLiteral => {
                let text = self.advance().text;
                text.parse::<f64>()
                    .map(|value| AstNode::FloatLiteral(value, loc))
                    .map_err(|_| ParseError::InvalidLiteral {
                        text,
                        location: loc,
                    })
            }
            TokenKind::CharLiteral => {
                let text = self.advance().text;
                let value = unescape_literal(&text).chars().next().unwrap_or('\0');
                Ok(AstNode::CharLiteral(value, loc))
            }
            TokenKind::StringLiteral => {
                let text = self.advance().text;
                Ok(AstNode::StringLiteral(unescape_literal(&text), loc))
            }
            TokenKind::BoolLiteral => {
                let text = self.advance().text;
                Ok(AstNode::BoolLiteral(text == "true", loc))
            }
            TokenKind::Ident => {
                let name = self.advance().text;
                Ok(AstNode::Identifier(name, loc))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_rparen("after expression")?;
                Ok(expr)
            }
            _ => Err(self.unexpected("expression")),
        }
    }
}
