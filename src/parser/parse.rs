//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct: the one-token lookahead cursor
//! over a [`Lexer`], the error type, and the top-level grammar entry points
//! (`def`, `extern`, and bare expressions).
//!
//! # Parser Architecture
//!
//! - This module: Parser struct, cursor helpers, prototypes and definitions
//! - `expressions`: primary expressions and precedence climbing
//!
//! Parser methods are split across both files using `impl Parser` blocks.
//!
//! # Errors
//!
//! Every entry point returns `Result`. A failure leaves the cursor on the
//! offending token and never hands back a partially built node; skipping
//! past the bad input is the caller's job.

use crate::parser::ast::*;
use crate::parser::lexer::{Lexer, Token};
use crate::parser::precedence::PrecedenceTable;
use std::fmt;

/// Parser error type
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        ParseError {
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

/// Recursive descent parser with operator-precedence climbing
pub struct Parser<I: Iterator<Item = char>> {
    pub(crate) lexer: Lexer<I>,
    pub(crate) current: Token,
    pub(crate) precedence: PrecedenceTable,
}

impl<I: Iterator<Item = char>> Parser<I> {
    /// Create a parser with the default operator table. Reads the first token.
    pub fn new(chars: I) -> Self {
        Self::with_precedence(chars, PrecedenceTable::default())
    }

    /// Create a parser with a custom operator table. Reads the first token.
    pub fn with_precedence(chars: I, precedence: PrecedenceTable) -> Self {
        let mut lexer = Lexer::new(chars);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            precedence,
        }
    }

    /// The lookahead token
    pub fn current(&self) -> &Token {
        &self.current
    }

    /// Replace the lookahead with the next token from the lexer
    pub fn advance(&mut self) -> &Token {
        self.current = self.lexer.next_token();
        &self.current
    }

    /// Parse `prototype ::= id '(' id* ')'`
    pub fn parse_prototype(&mut self) -> Result<Prototype, ParseError> {
        let Token::Ident(name, location) = self.current.clone() else {
            return Err(self.error("Expected function name in prototype"));
        };
        self.advance();

        if !self.current.is_char('(') {
            return Err(self.error("Expected '(' in prototype"));
        }

        let mut params = Vec::new();
        while let Token::Ident(param, _) = self.advance() {
            params.push(param.clone());
        }

        if !self.current.is_char(')') {
            return Err(self.error("Expected ')' in prototype"));
        }
        self.advance(); // eat ')'

        Ok(Prototype::new(name, params, location))
    }

    /// Parse `definition ::= 'def' prototype expression`
    pub fn parse_definition(&mut self) -> Result<FunctionDef, ParseError> {
        self.advance(); // eat 'def'
        let proto = self.parse_prototype()?;
        let body = self.parse_expression()?;
        Ok(FunctionDef::new(proto, body))
    }

    /// Parse `external ::= 'extern' prototype`
    pub fn parse_extern(&mut self) -> Result<Prototype, ParseError> {
        self.advance(); // eat 'extern'
        self.parse_prototype()
    }

    /// Parse `toplevelexpr ::= expression`, wrapped in an anonymous function
    pub fn parse_top_level_expr(&mut self) -> Result<FunctionDef, ParseError> {
        let location = self.current.location();
        let body = self.parse_expression()?;
        Ok(FunctionDef::new(Prototype::anonymous(location), body))
    }

    // ===== Helper methods =====

    /// Build an error at the current token, naming what was found
    pub(crate) fn error(&self, message: &str) -> ParseError {
        ParseError::new(
            format!("{}, found {}", message, self.current),
            self.current.location(),
        )
    }

    pub(crate) fn expect_char(&mut self, c: char, message: &str) -> Result<(), ParseError> {
        if self.current.is_char(c) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::Chars;

    fn parser(source: &str) -> Parser<Chars<'_>> {
        Parser::new(source.chars())
    }

    #[test]
    fn test_parse_prototype() {
        let proto = parser("foo(a b c)").parse_prototype().unwrap();

        assert_eq!(proto.name, "foo");
        assert_eq!(proto.params, vec!["a", "b", "c"]);
        assert_eq!(proto.location, SourceLocation::new(1, 1));
    }

    #[test]
    fn test_prototype_allows_duplicate_params() {
        let proto = parser("f(x x)").parse_prototype().unwrap();
        assert_eq!(proto.params, vec!["x", "x"]);
    }

    #[test]
    fn test_prototype_errors() {
        let err = parser("(a)").parse_prototype().unwrap_err();
        assert!(err.message.starts_with("Expected function name in prototype"));

        let err = parser("foo a").parse_prototype().unwrap_err();
        assert!(err.message.starts_with("Expected '(' in prototype"));

        let err = parser("foo(a, b)").parse_prototype().unwrap_err();
        assert_eq!(err.message, "Expected ')' in prototype, found ','");
        assert_eq!(err.location, SourceLocation::new(1, 6));
    }

    #[test]
    fn test_parse_definition() {
        let mut p = parser("def add(a b) a+b");
        let def = p.parse_definition().unwrap();

        assert_eq!(def.proto.name, "add");
        assert_eq!(def.proto.params, vec!["a", "b"]);
        assert_eq!(def.body.to_string(), "(+ a b)");
        assert!(matches!(p.current(), Token::Eof(_)));
    }

    #[test]
    fn test_parse_extern() {
        let mut p = parser("extern sin(x);");
        let proto = p.parse_extern().unwrap();

        assert_eq!(proto.name, "sin");
        assert_eq!(proto.params, vec!["x"]);
        assert!(p.current().is_char(';'));
    }

    #[test]
    fn test_parse_top_level_expr() {
        let def = parser("4 + 5").parse_top_level_expr().unwrap();

        assert!(def.is_anonymous());
        assert!(def.proto.params.is_empty());
        assert_eq!(def.body.to_string(), "(+ 4 5)");
    }

    #[test]
    fn test_error_leaves_cursor_on_offending_token() {
        let mut p = parser("def 1(x) x");
        assert!(p.parse_definition().is_err());
        assert!(matches!(p.current(), Token::Number(n, _) if *n == 1.0));
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("Expected ')'", SourceLocation::new(3, 7));
        assert_eq!(err.to_string(), "Parse error at line 3, column 7: Expected ')'");
    }
}
