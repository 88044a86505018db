//! Kaleidoscope source parser
//!
//! This module transforms a character stream into AST nodes:
//! - [`lexer`]: Tokenization (characters → tokens), one token at a time
//! - [`precedence`]: Binary operator precedence table
//! - [`parse`]: The [`Parser`](parse::Parser) cursor and top-level entry points
//! - `expressions`: Expression parsing with precedence climbing
//! - [`ast`]: AST node definitions
//! - [`reader`]: Lazy `char` source over buffered readers such as stdin
//!
//! # Language
//!
//! ```text
//! def name(a b) a*b+1      # function definition
//! extern sin(x)            # declaration
//! name(2, 3)               # top-level expression
//! ```
//!
//! Every value is a 64-bit float. There are no statements, no control flow
//! and no mutable variables.
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary
//! operators. The lexer is pulled lazily so only one token of lookahead is
//! ever buffered.

pub mod ast;
mod expressions;
pub mod lexer;
pub mod parse;
pub mod precedence;
pub mod reader;
