//! Lexer (tokenizer) for minic source code
//!
//! Converts raw source text into [`Token`]s on demand. The parser pulls one
//! token at a time with [`Lexer::next_token`]; [`Lexer::peek_token`] scans the
//! next token and then restores the cursor, so nothing is retained between
//! calls apart from the cursor itself.
//!
//! Malformed input never stops the scan. Unknown characters come back as
//! [`TokenKind::Invalid`] tokens, and unterminated literals or comments are
//! truncated at end of input with a [`LexError`] recorded on the side.

use super::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// Reserved words of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Int,
    Float,
    Char,
    Double,
    Void,
    If,
    Else,
    While,
    For,
    Return,
    Break,
    Continue,
    Switch,
    Case,
    Default,
    String,
    Bool,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Keyword> {
        let keyword = match word {
            "int" => Keyword::Int,
            "float" => Keyword::Float,
            "char" => Keyword::Char,
            "double" => Keyword::Double,
            "void" => Keyword::Void,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "for" => Keyword::For,
            "return" => Keyword::Return,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "switch" => Keyword::Switch,
            "case" => Keyword::Case,
            "default" => Keyword::Default,
            "string" => Keyword::String,
            "bool" => Keyword::Bool,
            _ => return None,
        };
        Some(keyword)
    }

    /// True for keywords that name a type
    pub fn is_type(self) -> bool {
        matches!(
            self,
            Keyword::Int
                | Keyword::Float
                | Keyword::Char
                | Keyword::Double
                | Keyword::Void
                | Keyword::String
                | Keyword::Bool
        )
    }
}

/// Operator tokens, two-character forms included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %
    Assign,  // =
    Lt,      // <
    Gt,      // >
    Bang,    // !
    Amp,     // &
    EqEq,    // ==
    NotEq,   // !=
    Le,      // <=
    Ge,      // >=
    AndAnd,  // &&
    OrOr,    // ||
}

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Ident,

    // Literals
    IntLiteral,
    FloatLiteral,
    CharLiteral,
    StringLiteral,
    BoolLiteral,

    Operator(Operator),

    // Punctuation
    LParen,   // (
    RParen,   // )
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    Semicolon,
    Comma,

    Eof,
    Invalid,
}

/// A single lexeme with its classification and position.
///
/// `text` is the exact source spelling, quotes and escapes included for
/// string and char literals.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            text: text.into(),
            location,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    pub fn is_operator(&self, op: Operator) -> bool {
        self.kind == TokenKind::Operator(op)
    }

    pub fn is_type_keyword(&self) -> bool {
        matches!(self.kind, TokenKind::Keyword(k) if k.is_type())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Keyword(_) => write!(f, "'{}'", self.text),
            TokenKind::Ident => write!(f, "identifier '{}'", self.text),
            TokenKind::IntLiteral => write!(f, "int literal {}", self.text),
            TokenKind::FloatLiteral => write!(f, "float literal {}", self.text),
            TokenKind::CharLiteral => write!(f, "char literal {}", self.text),
            TokenKind::StringLiteral => write!(f, "string literal {}", self.text),
            TokenKind::BoolLiteral => write!(f, "bool literal {}", self.text),
            TokenKind::Operator(_)
            | TokenKind::LParen
            | TokenKind::RParen
            | TokenKind::LBrace
            | TokenKind::RBrace
            | TokenKind::LBracket
            | TokenKind::RBracket
            | TokenKind::Semicolon
            | TokenKind::Comma => write!(f, "'{}'", self.text),
            TokenKind::Eof => write!(f, "end of file"),
            TokenKind::Invalid => write!(f, "invalid character '{}'", self.text),
        }
    }
}

/// Lexical diagnostics. None of them stop the scan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("Lexer error at line {}, column {}: unterminated string literal", .location.line, .location.column)]
    UnterminatedString { location: SourceLocation },

    #[error("Lexer error at line {}, column {}: unterminated character literal", .location.line, .location.column)]
    UnterminatedChar { location: SourceLocation },

    #[error("Lexer error at line {}, column {}: character literal {text} must hold exactly one character", .location.line, .location.column)]
    InvalidCharLiteral { text: String, location: SourceLocation },

    #[error("Lexer error at line {}, column {}: unterminated block comment", .location.line, .location.column)]
    UnterminatedComment { location: SourceLocation },

    #[error("Lexer error at line {}, column {}: unknown escape sequence '\\{escape}'", .location.line, .location.column)]
    UnknownEscape { escape: char, location: SourceLocation },
}

impl LexError {
    pub fn location(&self) -> SourceLocation {
        match self {
            LexError::UnterminatedString { location }
            | LexError::UnterminatedChar { location }
            | LexError::InvalidCharLiteral { location, .. }
            | LexError::UnterminatedComment { location }
            | LexError::UnknownEscape { location, .. } => *location,
        }
    }
}

/// Scan position. Offset, line and column are saved and restored together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    position: usize,
    line: usize,
    column: usize,
}

impl Cursor {
    fn start() -> Self {
        Self {
            position: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

/// Lexer for minic source code
pub struct Lexer {
    input: Vec<char>,
    cursor: Cursor,
    diagnostics: Vec<LexError>,
    finished: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            cursor: Cursor::start(),
            diagnostics: Vec::new(),
            finished: false,
        }
    }

    /// Tokenize the entire remaining input, end-of-file token included
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let at_end = token.is(TokenKind::Eof);
            tokens.push(token);
            if at_end {
                break;
            }
        }
        log::debug!("lexer produced {} tokens", tokens.len());
        tokens
    }

    /// Scan and consume the next token. Returns `Eof` forever once the
    /// input is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let loc = self.cursor.location();
        let ch = match self.advance() {
            Some(ch) => ch,
            None => return Token::new(TokenKind::Eof, "", loc),
        };

        match ch {
            'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(ch, loc),
            '0'..='9' => self.number_literal(ch, loc),
            '"' => self.string_literal(loc),
            '\'' => self.char_literal(loc),

            // Two-character operators are matched before their one-character prefixes
            '=' => self.one_or_two(loc, '=', Operator::EqEq, Operator::Assign),
            '!' => self.one_or_two(loc, '=', Operator::NotEq, Operator::Bang),
            '<' => self.one_or_two(loc, '=', Operator::Le, Operator::Lt),
            '>' => self.one_or_two(loc, '=', Operator::Ge, Operator::Gt),
            '&' => self.one_or_two(loc, '&', Operator::AndAnd, Operator::Amp),
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    Token::new(TokenKind::Operator(Operator::OrOr), "||", loc)
                } else {
                    Token::new(TokenKind::Invalid, "|", loc)
                }
            }
            '+' => Token::new(TokenKind::Operator(Operator::Plus), "+", loc),
            '-' => Token::new(TokenKind::Operator(Operator::Minus), "-", loc),
            '*' => Token::new(TokenKind::Operator(Operator::Star), "*", loc),
            '/' => Token::new(TokenKind::Operator(Operator::Slash), "/", loc),
            '%' => Token::new(TokenKind::Operator(Operator::Percent), "%", loc),

            '(' => Token::new(TokenKind::LParen, "(", loc),
            ')' => Token::new(TokenKind::RParen, ")", loc),
            '{' => Token::new(TokenKind::LBrace, "{", loc),
            '}' => Token::new(TokenKind::RBrace, "}", loc),
            '[' => Token::new(TokenKind::LBracket, "[", loc),
            ']' => Token::new(TokenKind::RBracket, "]", loc),
            ';' => Token::new(TokenKind::Semicolon, ";", loc),
            ',' => Token::new(TokenKind::Comma, ",", loc),

            other => Token::new(TokenKind::Invalid, other.to_string(), loc),
        }
    }

    /// Scan the next token without consuming it
    pub fn peek_token(&mut self) -> Token {
        let saved = self.cursor;
        let reported = self.diagnostics.len();
        let token = self.next_token();
        self.cursor = saved;
        self.diagnostics.truncate(reported);
        token
    }

    /// Current scan position, for a later [`Lexer::restore`]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Rewind to a position previously returned by [`Lexer::cursor`]
    pub fn restore(&mut self, cursor: Cursor) {
        self.cursor = cursor;
        self.finished = false;
    }

    /// Diagnostics recorded so far
    pub fn diagnostics(&self) -> &[LexError] {
        &self.diagnostics
    }

    /// Drain the recorded diagnostics
    pub fn take_diagnostics(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.diagnostics)
    }

    fn one_or_two(
        &mut self,
        loc: SourceLocation,
        second: char,
        double: Operator,
        single: Operator,
    ) -> Token {
        let first = self.input[self.cursor.position - 1];
        if self.peek() == Some(second) {
            self.advance();
            Token::new(
                TokenKind::Operator(double),
                format!("{}{}", first, second),
                loc,
            )
        } else {
            Token::new(TokenKind::Operator(single), first.to_string(), loc)
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first_char: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = if ident == "true" || ident == "false" {
            TokenKind::BoolLiteral
        } else if let Some(keyword) = Keyword::from_word(&ident) {
            TokenKind::Keyword(keyword)
        } else {
            TokenKind::Ident
        };

        Token::new(kind, ident, loc)
    }

    /// Parse numeric literal: digits, optionally `.` digits
    fn number_literal(&mut self, first_digit: char, loc: SourceLocation) -> Token {
        let mut text = String::new();
        text.push(first_digit);
        self.take_digits(&mut text);

        let is_float = self.peek() == Some('.')
            && self.peek_ahead(1).is_some_and(|ch| ch.is_ascii_digit());
        if is_float {
            text.push('.');
            self.advance();
            self.take_digits(&mut text);
            Token::new(TokenKind::FloatLiteral, text, loc)
        } else {
            Token::new(TokenKind::IntLiteral, text, loc)
        }
    }

    fn take_digits(&mut self, text: &mut String) {
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            text.push(ch);
            self.advance();
        }
    }

    /// Parse string literal. Stops at the closing quote or end of input.
    fn string_literal(&mut self, loc: SourceLocation) -> Token {
        let mut text = String::from('"');

        loop {
            match self.peek() {
                None => {
                    self.diagnostics
                        .push(LexError::UnterminatedString { location: loc });
                    break;
                }
                Some('"') => {
                    self.advance();
                    text.push('"');
                    break;
                }
                Some('\\') => self.escape_sequence(&mut text, '"'),
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }

        Token::new(TokenKind::StringLiteral, text, loc)
    }

    /// Parse character literal: exactly one logical character between quotes
    fn char_literal(&mut self, loc: SourceLocation) -> Token {
        let mut text = String::from('\'');
        let mut length = 0;
        let mut terminated = false;

        while let Some(ch) = self.peek() {
            match ch {
                '\'' => {
                    self.advance();
                    text.push('\'');
                    terminated = true;
                    break;
                }
                '\n' => break,
                '\\' => {
                    self.escape_sequence(&mut text, '\'');
                    length += 1;
                }
                _ => {
                    text.push(ch);
                    self.advance();
                    length += 1;
                }
            }
        }

        if !terminated {
            self.diagnostics
                .push(LexError::UnterminatedChar { location: loc });
        } else if length != 1 {
            self.diagnostics.push(LexError::InvalidCharLiteral {
                text: text.clone(),
                location: loc,
            });
        }

        Token::new(TokenKind::CharLiteral, text, loc)
    }

    /// Copy a backslash escape into `text` verbatim, validating it
    fn escape_sequence(&mut self, text: &mut String, quote: char) {
        let loc = self.cursor.location();
        self.advance(); // consume '\'
        text.push('\\');

        // at end of input the caller reports the unterminated literal
        if let Some(escaped) = self.advance() {
            if escape_value(escaped, quote).is_none() {
                self.diagnostics.push(LexError::UnknownEscape {
                    escape: escaped,
                    location: loc,
                });
            }
            text.push(escaped);
        }
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment();
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    /// Skip single-line comment (// ...)
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) {
        let start_loc = self.cursor.location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance(); // skip '*'
                self.advance(); // skip '/'
                return;
            }
            self.advance();
        }

        self.diagnostics.push(LexError::UnterminatedComment {
            location: start_loc,
        });
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.cursor.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.cursor.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.cursor.position += 1;

        if ch == '\n' {
            self.cursor.line += 1;
            self.cursor.column = 1;
        } else {
            self.cursor.column += 1;
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.cursor.position >= self.input.len()
    }
}

impl Iterator for Lexer {
    type Item = Token;

    /// Yields every token up to and including the first `Eof`
    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.is(TokenKind::Eof) {
            self.finished = true;
        }
        Some(token)
    }
}

/// Value of the escape `\<escaped>` inside a literal delimited by `quote`
fn escape_value(escaped: char, quote: char) -> Option<char> {
    match escaped {
        'n' => Some('\n'),
        't' => Some('\t'),
        '\\' => Some('\\'),
        '0' => Some('\0'),
        c if c == quote => Some(c),
        _ => None,
    }
}

/// Strip the quotes from a string or char literal's source text and
/// resolve its escapes. Unknown escapes keep the escaped character.
pub fn unescape_literal(text: &str) -> String {
    let mut chars = text.chars();
    let quote = match chars.next() {
        Some(q @ ('"' | '\'')) => q,
        _ => return text.to_string(),
    };

    let body: Vec<char> = chars.collect();
    let end = if body.last() == Some(&quote) && !ends_with_escaped_quote(&body) {
        body.len() - 1
    } else {
        body.len()
    };

    let mut value = String::new();
    let mut iter = body[..end].iter().copied();
    while let Some(ch) = iter.next() {
        if ch == '\\' {
            if let Some(escaped) = iter.next() {
                value.push(escape_value(escaped, quote).unwrap_or(escaped));
            }
        } else {
            value.push(ch);
        }
    }
    value
}

/// True when the final quote of `body` is itself escaped (`"abc\"`),
/// which happens for literals truncated at end of input.
fn ends_with_escaped_quote(body: &[char]) -> bool {
    let backslashes = body[..body.len() - 1]
        .iter()
        .rev()
        .take_while(|&&ch| ch == '\\')
        .count();
    backslashes % 2 == 1
}

/// Tokenize a whole source string, discarding lexical diagnostics
pub fn tokenize(source: &str) -> Vec<Token> {
    tokenize_with_diagnostics(source).0
}

/// Tokenize a whole source string and keep what went wrong along the way
pub fn tokenize_with_diagnostics(source: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize();
    (tokens, lexer.take_diagnostics())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = tokenize("int main() { return 0; }");

        assert!(tokens[0].is_keyword(Keyword::Int));
        assert!(tokens[1].is(TokenKind::Ident) && tokens[1].text == "main");
        assert!(tokens[2].is(TokenKind::LParen));
        assert!(tokens[3].is(TokenKind::RParen));
        assert!(tokens[4].is(TokenKind::LBrace));
        assert!(tokens[5].is_keyword(Keyword::Return));
        assert!(tokens[6].is(TokenKind::IntLiteral) && tokens[6].text == "0");
        assert!(tokens[7].is(TokenKind::Semicolon));
        assert!(tokens[8].is(TokenKind::RBrace));
        assert!(tokens[9].is(TokenKind::Eof));
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            kinds("== != <= >= && || = < > ! &"),
            vec![
                TokenKind::Operator(Operator::EqEq),
                TokenKind::Operator(Operator::NotEq),
                TokenKind::Operator(Operator::Le),
                TokenKind::Operator(Operator::Ge),
                TokenKind::Operator(Operator::AndAnd),
                TokenKind::Operator(Operator::OrOr),
                TokenKind::Operator(Operator::Assign),
                TokenKind::Operator(Operator::Lt),
                TokenKind::Operator(Operator::Gt),
                TokenKind::Operator(Operator::Bang),
                TokenKind::Operator(Operator::Amp),
                TokenKind::Eof,
            ]
        );
        // no whitespace: still one '==' then '='
        assert_eq!(
            kinds("a===b"),
            vec![
                TokenKind::Ident,
                TokenKind::Operator(Operator::EqEq),
                TokenKind::Operator(Operator::Assign),
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("42 3.14 7. 8");
        assert!(tokens[0].is(TokenKind::IntLiteral) && tokens[0].text == "42");
        assert!(tokens[1].is(TokenKind::FloatLiteral) && tokens[1].text == "3.14");
        // '.' not followed by a digit ends the number
        assert!(tokens[2].is(TokenKind::IntLiteral) && tokens[2].text == "7");
        assert!(tokens[3].is(TokenKind::Invalid) && tokens[3].text == ".");
        assert!(tokens[4].is(TokenKind::IntLiteral) && tokens[4].text == "8");
    }

    #[test]
    fn test_keywords_and_bools() {
        let tokens = tokenize("double string bool true false truth");
        assert!(tokens[0].is_keyword(Keyword::Double));
        assert!(tokens[1].is_keyword(Keyword::String));
        assert!(tokens[2].is_keyword(Keyword::Bool));
        assert!(tokens[3].is(TokenKind::BoolLiteral));
        assert!(tokens[4].is(TokenKind::BoolLiteral));
        assert!(tokens[5].is(TokenKind::Ident));
    }

    #[test]
    fn test_comments() {
        let tokens = tokenize("int x; // comment\nint y; /* block\ncomment */ int z;");

        assert!(tokens[0].is_keyword(Keyword::Int));
        assert_eq!(tokens[1].text, "x");
        assert!(tokens[2].is(TokenKind::Semicolon));
        assert!(tokens[3].is_keyword(Keyword::Int));
        assert_eq!(tokens[4].text, "y");
        assert!(tokens[5].is(TokenKind::Semicolon));
        assert!(tokens[6].is_keyword(Keyword::Int));
        assert_eq!(tokens[7].text, "z");
        assert_eq!(tokens[7].location, SourceLocation::new(3, 16));
    }

    #[test]
    fn test_string_literal() {
        let tokens = tokenize(r#""hello\nworld" "say \"hi\"""#);

        assert!(tokens[0].is(TokenKind::StringLiteral));
        assert_eq!(tokens[0].text, r#""hello\nworld""#);
        assert_eq!(unescape_literal(&tokens[0].text), "hello\nworld");
        assert_eq!(unescape_literal(&tokens[1].text), "say \"hi\"");
    }

    #[test]
    fn test_char_literal() {
        let mut lexer = Lexer::new(r"'a' '\n' '\''");
        let tokens = lexer.tokenize();

        assert_eq!(unescape_literal(&tokens[0].text), "a");
        assert_eq!(unescape_literal(&tokens[1].text), "\n");
        assert_eq!(unescape_literal(&tokens[2].text), "'");
        assert!(lexer.diagnostics().is_empty());
    }

    #[test]
    fn test_bad_char_literals_reported() {
        let mut lexer = Lexer::new("'ab' ''");
        let tokens = lexer.tokenize();

        assert!(tokens[0].is(TokenKind::CharLiteral));
        assert!(tokens[1].is(TokenKind::CharLiteral));
        assert_eq!(lexer.diagnostics().len(), 2);
        assert!(matches!(
            lexer.diagnostics()[0],
            LexError::InvalidCharLiteral { .. }
        ));
    }

    #[test]
    fn test_unterminated_string_is_truncated_and_reported() {
        let mut lexer = Lexer::new("\"abc");
        let tokens = lexer.tokenize();

        assert!(tokens[0].is(TokenKind::StringLiteral));
        assert_eq!(tokens[0].text, "\"abc");
        assert!(tokens[1].is(TokenKind::Eof));
        assert_eq!(
            lexer.diagnostics(),
            &[LexError::UnterminatedString {
                location: SourceLocation::new(1, 1)
            }]
        );
    }

    #[test]
    fn test_unterminated_block_comment_reported() {
        let mut lexer = Lexer::new("int /* never closed");
        let tokens = lexer.tokenize();

        assert_eq!(tokens.len(), 2);
        assert!(matches!(
            lexer.diagnostics()[0],
            LexError::UnterminatedComment { .. }
        ));
    }

    #[test]
    fn test_invalid_character_continues() {
        let tokens = tokenize("a @ b | c");
        assert!(tokens[1].is(TokenKind::Invalid) && tokens[1].text == "@");
        assert!(tokens[2].is(TokenKind::Ident) && tokens[2].text == "b");
        assert!(tokens[3].is(TokenKind::Invalid) && tokens[3].text == "|");
        assert!(tokens[4].is(TokenKind::Ident));
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut lexer = Lexer::new("x = 1;");
        let peeked = lexer.peek_token();
        let next = lexer.next_token();
        assert_eq!(peeked, next);
        assert!(lexer.next_token().is_operator(Operator::Assign));
    }

    #[test]
    fn test_peek_does_not_duplicate_diagnostics() {
        let mut lexer = Lexer::new("\"open");
        lexer.peek_token();
        lexer.peek_token();
        lexer.next_token();
        assert_eq!(lexer.diagnostics().len(), 1);
    }

    #[test]
    fn test_cursor_restore() {
        let mut lexer = Lexer::new("a\nb c");
        lexer.next_token();
        let saved = lexer.cursor();
        let b = lexer.next_token();
        lexer.next_token();
        lexer.restore(saved);
        let again = lexer.next_token();
        assert_eq!(b, again);
        assert_eq!(again.location, SourceLocation::new(2, 1));
    }

    #[test]
    fn test_iterator_stops_after_eof() {
        let tokens: Vec<Token> = Lexer::new("a b").collect();
        assert_eq!(tokens.len(), 3);
        assert!(tokens[2].is(TokenKind::Eof));
    }
}
