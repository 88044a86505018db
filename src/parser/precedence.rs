//! Binary operator precedence table
//!
//! Maps single-character operators to a positive binding strength. A token
//! that is not in the table, or whose entry is not positive, is not a binary
//! operator at all: [`PrecedenceTable::token_precedence`] returns `-1` for it,
//! which ends precedence climbing.

use super::lexer::Token;
use crate::constants::DEFAULT_BINOP_PRECEDENCE;
use rustc_hash::FxHashMap;

/// Precedence value for tokens that are not binary operators
pub const NOT_AN_OPERATOR: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecedenceTable {
    entries: FxHashMap<char, i32>,
}

impl PrecedenceTable {
    /// Table with no operators
    pub fn empty() -> Self {
        PrecedenceTable {
            entries: FxHashMap::default(),
        }
    }

    /// Add or replace an operator. A non-positive precedence disables it.
    pub fn insert(&mut self, op: char, precedence: i32) -> &mut Self {
        self.entries.insert(op, precedence);
        self
    }

    /// Precedence of `op` if it is an active binary operator
    pub fn binary_precedence(&self, op: char) -> Option<i32> {
        self.entries.get(&op).copied().filter(|&prec| prec > 0)
    }

    /// Precedence of the current token, or [`NOT_AN_OPERATOR`]
    pub fn token_precedence(&self, token: &Token) -> i32 {
        match token {
            Token::Char(c, _) if c.is_ascii() => {
                self.binary_precedence(*c).unwrap_or(NOT_AN_OPERATOR)
            }
            _ => NOT_AN_OPERATOR,
        }
    }
}

impl Default for PrecedenceTable {
    fn default() -> Self {
        let mut table = PrecedenceTable::empty();
        for (op, prec) in DEFAULT_BINOP_PRECEDENCE {
            table.insert(op, prec);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::SourceLocation;

    fn ch(c: char) -> Token {
        Token::Char(c, SourceLocation::default())
    }

    #[test]
    fn test_default_ordering() {
        let table = PrecedenceTable::default();

        assert_eq!(table.token_precedence(&ch('<')), 10);
        assert_eq!(table.token_precedence(&ch('+')), 20);
        assert_eq!(table.token_precedence(&ch('-')), 30);
        assert_eq!(table.token_precedence(&ch('*')), 40);
    }

    #[test]
    fn test_non_operators() {
        let mut table = PrecedenceTable::default();
        table.insert('/', 0).insert('%', -5);

        assert_eq!(table.token_precedence(&ch(',')), NOT_AN_OPERATOR);
        assert_eq!(table.token_precedence(&ch('/')), NOT_AN_OPERATOR);
        assert_eq!(table.token_precedence(&ch('%')), NOT_AN_OPERATOR);
        assert_eq!(
            table.token_precedence(&Token::Ident("x".to_string(), SourceLocation::default())),
            NOT_AN_OPERATOR
        );
        assert_eq!(table.binary_precedence('/'), None);
    }
}
