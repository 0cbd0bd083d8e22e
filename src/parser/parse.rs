//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, token-buffer helpers, panic-mode recovery and the
//! main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: global variables, function prototypes and definitions
//! - `statements`: blocks, `if`, `while`, `for`, `return`, expression statements
//! - `expressions`: one method per precedence level
//!
//! # Token supply
//!
//! The parser pulls tokens one at a time from a [`TokenSource`] (normally the
//! [`Lexer`] itself) and keeps only the current token and a
//! small lookahead queue. Looking ahead fills the queue and never consumes.
//!
//! # Error recovery
//!
//! Errors are recorded and the parser resynchronizes instead of stopping:
//! inside a block it discards tokens up to the next `;` or statement keyword,
//! at top level it skips to the end of the broken declaration. The resulting
//! [`Program`] is only meaningful when no errors were recorded.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, LexError, Lexer, Operator, Token, TokenKind};
use std::collections::VecDeque;
use thiserror::Error;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Parse error at line {}, column {}: expected {expected}, found {found}", .location.line, .location.column)]
    Unexpected {
        expected: String,
        found: String,
        location: SourceLocation,
    },

    #[error("Parse error at line {}, column {}: left-hand side of '=' must be a variable name", .location.line, .location.column)]
    InvalidAssignmentTarget { location: SourceLocation },

    #[error("Parse error at line {}, column {}: invalid literal {text}", .location.line, .location.column)]
    InvalidLiteral {
        text: String,
        location: SourceLocation,
    },

    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParseError {
    pub fn location(&self) -> SourceLocation {
        match self {
            ParseError::Unexpected { location, .. }
            | ParseError::InvalidAssignmentTarget { location }
            | ParseError::InvalidLiteral { location, .. } => *location,
            ParseError::Lex(err) => err.location(),
        }
    }
}

/// Anything the parser can pull tokens from
pub trait TokenSource {
    /// Next token; must keep returning `Eof` once the input is exhausted
    fn next_token(&mut self) -> Token;

    /// Lexical diagnostics gathered while producing tokens
    fn take_diagnostics(&mut self) -> Vec<LexError> {
        Vec::new()
    }
}

impl TokenSource for Lexer {
    fn next_token(&mut self) -> Token {
        Lexer::next_token(self)
    }

    fn take_diagnostics(&mut self) -> Vec<LexError> {
        Lexer::take_diagnostics(self)
    }
}

/// Already-scanned tokens together with the lexer's diagnostics, e.g. the
/// output of [`crate::tokenize_with_diagnostics`]
pub struct TokenStream {
    tokens: std::vec::IntoIter<Token>,
    diagnostics: Vec<LexError>,
    end: SourceLocation,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>, diagnostics: Vec<LexError>) -> Self {
        let end = tokens
            .last()
            .map(|t| t.location)
            .unwrap_or_else(|| SourceLocation::new(1, 1));
        Self {
            tokens: tokens.into_iter(),
            diagnostics,
            end,
        }
    }
}

impl TokenSource for TokenStream {
    fn next_token(&mut self) -> Token {
        match self.tokens.next() {
            Some(token) => {
                self.end = token.location;
                token
            }
            None => Token::new(TokenKind::Eof, "", self.end),
        }
    }

    fn take_diagnostics(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.diagnostics)
    }
}

/// Result of parsing a whole program
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

impl ParseOutcome {
    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<Program, Vec<ParseError>> {
        if self.errors.is_empty() {
            Ok(self.program)
        } else {
            Err(self.errors)
        }
    }
}

/// Recursive descent parser for minic
pub struct Parser<S = Lexer> {
    pub(crate) source: S,
    pub(crate) current: Token,
    pub(crate) lookahead: VecDeque<Token>,
    pub(crate) position: usize, // tokens consumed so far
    pub(crate) errors: Vec<ParseError>,
}

impl Parser<Lexer> {
    pub fn new(source: &str) -> Self {
        Parser::with_source(Lexer::new(source))
    }
}

impl Parser<TokenStream> {
    pub fn from_tokens(tokens: Vec<Token>, diagnostics: Vec<LexError>) -> Self {
        Parser::with_source(TokenStream::new(tokens, diagnostics))
    }
}

impl<S: TokenSource> Parser<S> {
    pub fn with_source(mut source: S) -> Self {
        let current = source.next_token();
        Self {
            source,
            current,
            lookahead: VecDeque::new(),
            position: 0,
            errors: Vec::new(),
        }
    }

    /// Parse everything and hand back the tree together with every diagnostic
    pub fn parse(mut self) -> ParseOutcome {
        let program = self.parse_program();
        let mut errors: Vec<ParseError> = self
            .source
            .take_diagnostics()
            .into_iter()
            .map(ParseError::from)
            .collect();
        errors.append(&mut self.errors);
        errors.sort_by_key(|err| {
            let loc = err.location();
            (loc.line, loc.column)
        });

        log::debug!(
            "parsed {} top-level declarations with {} errors",
            program.nodes.len(),
            errors.len()
        );
        ParseOutcome { program, errors }
    }

    /// Parse the entire program (top-level declarations)
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::new();

        while !self.is_at_end() {
            let start = self.position;
            match self.parse_top_level_declaration() {
                Ok(decl) => program.nodes.push(decl),
                Err(err) => {
                    self.record(err);
                    self.synchronize_declaration();
                    if self.position == start {
                        self.advance();
                    }
                }
            }
        }

        program
    }

    /// Syntax errors recorded so far
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    // ===== Recovery =====

    pub(crate) fn record(&mut self, err: ParseError) {
        log::trace!("recovering from: {}", err);
        self.errors.push(err);
    }

    /// Discard tokens up to a statement boundary: a consumed `;`, or a `}`
    /// or statement-starting keyword left in place.
    pub(crate) fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.check(TokenKind::Semicolon) {
                self.advance();
                return;
            }
            if self.check(TokenKind::RBrace) || self.at_statement_start() {
                return;
            }
            self.advance();
        }
    }

    /// Discard the rest of a broken top-level declaration, skipping a
    /// brace-balanced body if one follows.
    pub(crate) fn synchronize_declaration(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.current.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::Keyword(k) if depth == 0 && k.is_type() => return,
                _ => {}
            }
            self.advance();
        }
    }

    pub(crate) fn at_statement_start(&self) -> bool {
        match self.current.kind {
            TokenKind::Keyword(k) => {
                k.is_type()
                    || matches!(
                        k,
                        Keyword::If
                            | Keyword::While
                            | Keyword::For
                            | Keyword::Return
                            | Keyword::Break
                            | Keyword::Continue
                    )
            }
            TokenKind::LBrace => true,
            _ => false,
        }
    }

    // ===== Helper methods =====

    pub(crate) fn is_type_keyword(&self) -> bool {
        self.current.is_type_keyword()
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current.is(kind)
    }

    pub(crate) fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current.is_keyword(keyword)
    }

    pub(crate) fn check_operator(&self, op: Operator) -> bool {
        self.current.is_operator(op)
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn match_keyword(&mut self, keyword: Keyword) -> bool {
        self.match_token(TokenKind::Keyword(keyword))
    }

    /// Consume the current token and return it
    pub(crate) fn advance(&mut self) -> Token {
        if self.is_at_end() {
            return self.current.clone();
        }
        let next = match self.lookahead.pop_front() {
            Some(token) => token,
            None => self.source.next_token(),
        };
        self.position += 1;
        std::mem::replace(&mut self.current, next)
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.current
    }

    /// Token `n` positions after the current one, without consuming anything
    pub(crate) fn peek_ahead(&mut self, n: usize) -> &Token {
        if n == 0 {
            return &self.current;
        }
        while self.lookahead.len() < n {
            let token = match self.lookahead.back() {
                Some(last) if last.is(TokenKind::Eof) => last.clone(),
                _ if self.current.is(TokenKind::Eof) => self.current.clone(),
                _ => self.source.next_token(),
            };
            self.lookahead.push_back(token);
        }
        &self.lookahead[n - 1]
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.current.location
    }

    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::Unexpected {
            expected: expected.to_string(),
            found: self.peek().to_string(),
            location: self.current_location(),
        }
    }

    pub(crate) fn expect_token(
        &mut self,
        kind: TokenKind,
        expected: &str,
    ) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    pub(crate) fn expect_lparen(&mut self, ctx: &str) -> Result<Token, ParseError> {
        self.expect_token(TokenKind::LParen, &format!("'(' {ctx}"))
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<Token, ParseError> {
        self.expect_token(TokenKind::RParen, &format!("')' {ctx}"))
    }

    pub(crate) fn expect_lbrace(&mut self, ctx: &str) -> Result<Token, ParseError> {
        self.expect_token(TokenKind::LBrace, &format!("'{{' {ctx}"))
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> Result<Token, ParseError> {
        self.expect_token(TokenKind::RBrace, &format!("'}}' {ctx}"))
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<Token, ParseError> {
        self.expect_token(TokenKind::Semicolon, &format!("';' {ctx}"))
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if self.check(TokenKind::Ident) {
            Ok(self.advance().text)
        } else {
            Err(self.unexpected("identifier"))
        }
    }
}

/// Parse a whole source string
pub fn parse(source: &str) -> ParseOutcome {
    Parser::new(source).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize_with_diagnostics;

    #[test]
    fn test_parse_simple_function() {
        let outcome = parse("int main() { return 0; }");
        assert!(!outcome.had_error());

        let program = outcome.program;
        assert_eq!(program.nodes.len(), 1);
        match &program.nodes[0] {
            AstNode::FunctionDecl {
                name,
                params,
                return_type,
                body,
                ..
            } => {
                assert_eq!(name, "main");
                assert_eq!(params.len(), 0);
                assert_eq!(*return_type, BaseType::Int);
                assert_eq!(body.as_ref().map(|b| b.len()), Some(1));
            }
            _ => panic!("Expected function definition"),
        }
    }

    #[test]
    fn test_parse_from_tokens_matches_source() {
        let source = "int g = 3; int main() { while (g > 0) { g = g - 1; } return g; }";
        let from_source = parse(source);
        let (tokens, diagnostics) = tokenize_with_diagnostics(source);
        let from_tokens = Parser::from_tokens(tokens, diagnostics).parse();

        assert!(!from_source.had_error());
        assert_eq!(from_source.program, from_tokens.program);
    }

    #[test]
    fn test_token_input_keeps_lexer_errors() {
        for source in [
            "int main() { char c = 'ab'; return c; }",
            "int main() { return 0; } /* never closed",
        ] {
            let from_source = parse(source);
            let (tokens, diagnostics) = tokenize_with_diagnostics(source);
            let from_tokens = Parser::from_tokens(tokens, diagnostics).parse();

            assert!(from_source.had_error(), "{}", source);
            assert_eq!(from_source.errors, from_tokens.errors);
        }
    }

    #[test]
    fn test_peek_ahead_does_not_consume() {
        let mut parser = Parser::new("int x = 1;");
        assert!(parser.peek_ahead(1).is(TokenKind::Ident));
        assert!(parser.peek_ahead(2).is_operator(Operator::Assign));
        assert!(parser.peek_ahead(10).is(TokenKind::Eof));
        assert!(parser.check_keyword(Keyword::Int));
        parser.advance();
        assert_eq!(parser.peek().text, "x");
        parser.advance();
        assert!(parser.check_operator(Operator::Assign));
    }

    #[test]
    fn test_lexer_errors_are_reported() {
        let outcome = parse("int main() { string s = \"abc; }");
        assert!(outcome.had_error());
        assert!(outcome
            .errors
            .iter()
            .any(|e| matches!(e, ParseError::Lex(LexError::UnterminatedString { .. }))));
    }

    #[test]
    fn test_recovers_and_reports_multiple_errors() {
        let source = r#"
            int main() {
                int x = ;
                x = 1 +;
                return x;
            }
        "#;
        let outcome = parse(source);
        assert_eq!(outcome.errors.len(), 2);
        assert_eq!(outcome.errors[0].location().line, 3);
        assert_eq!(outcome.errors[1].location().line, 4);

        // the function itself survives with its valid return statement
        match &outcome.program.nodes[0] {
            AstNode::FunctionDecl { body: Some(body), .. } => {
                assert!(matches!(body.last(), Some(AstNode::Return { .. })));
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_recovers_at_top_level() {
        let source = "int 5; int main() { return 0; }";
        let outcome = parse(source);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.program.nodes.len(), 1);
    }

    #[test]
    fn test_broken_function_header_skips_body() {
        let source = "int f(int a,) { return a; } int main() { return 0; }";
        let outcome = parse(source);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.program.nodes.len(), 1);
    }

    #[test]
    fn test_invalid_character_is_a_syntax_error() {
        let outcome = parse("int main() { int x = 1 @ 2; return 0; }");
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].to_string().contains("invalid character '@'"));
    }
}
