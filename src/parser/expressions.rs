//! Expression parsing implementation
//!
//! Primary expressions are parsed by recursive descent; binary operators are
//! grouped by precedence climbing over the parser's [`PrecedenceTable`].
//!
//! # Grammar
//!
//! ```text
//! expression     ::= primary binoprhs
//! binoprhs       ::= (binop primary)*
//! primary        ::= identifierexpr | numberexpr | parenexpr
//! identifierexpr ::= identifier | identifier '(' (expression (',' expression)*)? ')'
//! numberexpr     ::= number
//! parenexpr      ::= '(' expression ')'
//! ```
//!
//! All parsing methods are implemented on the [`Parser`] struct.
//!
//! [`PrecedenceTable`]: crate::parser::precedence::PrecedenceTable

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl<I: Iterator<Item = char>> Parser<I> {
    /// Parse expression (top-level entry point)
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_primary()?;
        self.parse_bin_op_rhs(0, lhs)
    }

    /// Parse a primary expression, dispatching on the current token
    pub fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match &self.current {
            Token::Ident(..) => self.parse_identifier_expr(),
            Token::Number(..) => self.parse_number_expr(),
            Token::Char('(', _) => self.parse_paren_expr(),
            _ => Err(self.error("unknown token when expecting an expression")),
        }
    }

    /// Parse `numberexpr ::= number`
    pub fn parse_number_expr(&mut self) -> Result<Expr, ParseError> {
        let Token::Number(value, location) = self.current else {
            return Err(self.error("Expected number"));
        };
        self.advance();
        Ok(Expr::Number(value, location))
    }

    /// Parse `parenexpr ::= '(' expression ')'`
    pub fn parse_paren_expr(&mut self) -> Result<Expr, ParseError> {
        self.advance(); // eat '('
        let expr = self.parse_expression()?;
        self.expect_char(')', "Expected ')'")?;
        Ok(expr)
    }

    /// Parse a variable reference or a call
    pub fn parse_identifier_expr(&mut self) -> Result<Expr, ParseError> {
        let Token::Ident(name, location) = self.current.clone() else {
            return Err(self.error("Expected identifier"));
        };
        self.advance(); // eat identifier

        if !self.current.is_char('(') {
            return Ok(Expr::Variable(name, location));
        }

        self.advance(); // eat '('
        let mut args = Vec::new();
        if !self.current.is_char(')') {
            loop {
                args.push(self.parse_expression()?);

                if self.current.is_char(')') {
                    break;
                }
                if !self.current.is_char(',') {
                    return Err(self.error("Expected ')' or ',' in argument list"));
                }
                self.advance(); // eat ','
            }
        }
        self.advance(); // eat ')'

        Ok(Expr::Call {
            callee: name,
            args,
            location,
        })
    }

    /// Precedence climbing over `(binop primary)*`.
    ///
    /// Consumes operators binding at least as tightly as `min_precedence`
    /// and folds them onto `lhs`. Equal precedence associates left; a
    /// tighter operator after the right operand is resolved first by
    /// recursing at `precedence + 1`.
    pub fn parse_bin_op_rhs(&mut self, min_precedence: i32, mut lhs: Expr) -> Result<Expr, ParseError> {
        loop {
            let precedence = self.precedence.token_precedence(&self.current);
            if precedence < min_precedence {
                return Ok(lhs);
            }

            let Token::Char(op, location) = self.current else {
                return Ok(lhs);
            };
            self.advance(); // eat binop

            let mut rhs = self.parse_primary()?;

            let next_precedence = self.precedence.token_precedence(&self.current);
            if precedence < next_precedence {
                rhs = self.parse_bin_op_rhs(precedence + 1, rhs)?;
            }

            lhs = Expr::Binary {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                location,
            };
        }
    }
}
