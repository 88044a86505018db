//! Lexer (tokenizer) for Kaleidoscope source
//!
//! Pulls characters lazily from any `char` iterator and produces one [`Token`]
//! per call to [`Lexer::next_token`]. Exactly one character of lookahead is
//! held between calls, so the lexer can sit directly on an interactive stream.
//!
//! The lexer never fails: characters it does not recognise come back as
//! [`Token::Char`] and the grammar decides what to do with them.

use super::ast::SourceLocation;
use std::fmt;

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can report
/// an accurate line and column without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// End of input; returned again on every call once reached
    Eof(SourceLocation),

    // Keywords
    Def(SourceLocation),
    Extern(SourceLocation),

    // Primary
    Ident(String, SourceLocation),
    Number(f64, SourceLocation),

    /// Any other single character: parentheses, commas, operators, ...
    Char(char, SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::Eof(loc)
            | Token::Def(loc)
            | Token::Extern(loc)
            | Token::Ident(_, loc)
            | Token::Number(_, loc)
            | Token::Char(_, loc) => *loc,
        }
    }

    /// True if this is the structural character `c`
    pub fn is_char(&self, c: char) -> bool {
        matches!(self, Token::Char(ch, _) if *ch == c)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof(_) => write!(f, "end of input"),
            Token::Def(_) => write!(f, "'def'"),
            Token::Extern(_) => write!(f, "'extern'"),
            Token::Ident(name, _) => write!(f, "identifier '{}'", name),
            Token::Number(value, _) => write!(f, "number {}", value),
            Token::Char(c, _) => {
                if c.is_ascii_graphic() || *c == ' ' {
                    write!(f, "'{}'", c)
                } else {
                    write!(f, "'{}'", c.escape_default())
                }
            }
        }
    }
}

/// Streaming lexer over a character source
pub struct Lexer<I: Iterator<Item = char>> {
    chars: I,
    /// Lookahead character; `None` once the source is exhausted
    last_char: Option<char>,
    /// Location of `last_char`
    location: SourceLocation,
}

impl<I: Iterator<Item = char>> Lexer<I> {
    /// Create a lexer over `chars`. Nothing is read until the first
    /// [`next_token`](Self::next_token) call.
    pub fn new(chars: I) -> Self {
        Self {
            chars,
            // Primed with a blank so the first call starts by reading.
            last_char: Some(' '),
            location: SourceLocation::new(1, 0),
        }
    }

    /// Get next token
    pub fn next_token(&mut self) -> Token {
        loop {
            while self.last_char.is_some_and(|c| c.is_ascii_whitespace()) {
                self.advance();
            }

            let loc = self.location;
            let Some(ch) = self.last_char else {
                return Token::Eof(loc);
            };

            if ch.is_ascii_alphabetic() {
                return self.identifier_or_keyword(loc);
            }

            if ch.is_ascii_digit() || ch == '.' {
                return self.number_literal(loc);
            }

            if ch == '#' {
                self.skip_comment();
                continue;
            }

            self.advance();
            return Token::Char(ch, loc);
        }
    }

    /// Parse identifier or keyword: `[a-zA-Z][a-zA-Z0-9]*`
    fn identifier_or_keyword(&mut self, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        while let Some(ch) = self.last_char.filter(char::is_ascii_alphanumeric) {
            ident.push(ch);
            self.advance();
        }

        match ident.as_str() {
            "def" => Token::Def(loc),
            "extern" => Token::Extern(loc),
            _ => Token::Ident(ident, loc),
        }
    }

    /// Parse numeric literal: `[0-9.]+`
    ///
    /// The run is not checked for a single decimal point. Like `strtod`, only
    /// the longest numeric prefix is converted, so `1.2.3` lexes as `1.2`.
    fn number_literal(&mut self, loc: SourceLocation) -> Token {
        let mut num_str = String::new();
        while let Some(ch) = self.last_char.filter(|c| c.is_ascii_digit() || *c == '.') {
            num_str.push(ch);
            self.advance();
        }

        let (value, consumed) = parse_float_prefix(&num_str);
        if consumed < num_str.len() {
            log::warn!(
                "numeric literal '{}' at {} truncated to {}",
                num_str,
                loc,
                value
            );
        }

        Token::Number(value, loc)
    }

    /// Skip a `#` comment through the end of the line
    fn skip_comment(&mut self) {
        loop {
            self.advance();
            match self.last_char {
                None | Some('\n') | Some('\r') => break,
                Some(_) => {}
            }
        }
    }

    /// Advance to next character
    fn advance(&mut self) {
        if self.last_char.is_none() {
            return;
        }

        if self.last_char == Some('\n') {
            self.location.line += 1;
            self.location.column = 1;
        } else {
            self.location.column += 1;
        }

        self.last_char = self.chars.next();
    }
}

impl<I: Iterator<Item = char>> Iterator for Lexer<I> {
    type Item = Token;

    /// Yields tokens up to, but not including, end of input.
    fn next(&mut self) -> Option<Token> {
        match self.next_token() {
            Token::Eof(_) => None,
            token => Some(token),
        }
    }
}

/// Convert the longest `digits [. digits]` prefix of a run of digits and
/// dots. Returns the value and the number of bytes used; a prefix with no
/// digits converts to `0.0`.
fn parse_float_prefix(run: &str) -> (f64, usize) {
    let bytes = run.as_bytes();
    let mut end = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    let int_digits = end;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = bytes[end + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        end += 1 + frac_digits;
    }

    if int_digits + frac_digits == 0 {
        return (0.0, 0);
    }

    let value = run[..end].parse::<f64>().unwrap_or(0.0);
    (value, end)
}
