//! Code generation error types
//!
//! [`CodeGenError`] covers every way lowering an AST node can fail. Lowering
//! stops at the first error; nothing is retried.

use crate::parser::ast::SourceLocation;
use inkwell::builder::BuilderError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CodeGenError {
    /// Variable is not a parameter of the function being lowered
    UnknownVariable {
        name: String,
        location: SourceLocation,
    },

    /// Call to a function the module has never seen
    UnknownFunction {
        name: String,
        location: SourceLocation,
    },

    /// Call with the wrong number of arguments
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        got: usize,
        location: SourceLocation,
    },

    /// Operator with no lowering (including `<`)
    InvalidBinaryOperator { op: char, location: SourceLocation },

    /// Definition of a function that already has a body
    Redefinition {
        name: String,
        location: SourceLocation,
    },

    /// Prototype whose arity disagrees with a function that is already
    /// defined or already called
    PrototypeMismatch {
        name: String,
        expected: usize,
        got: usize,
        location: SourceLocation,
    },

    /// Emitted function was rejected by the LLVM verifier
    Verification { function: String },

    /// The LLVM builder refused an instruction
    Builder(String),
}

impl fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeGenError::UnknownVariable { name, location } => {
                write!(f, "Unknown variable name '{}' at line {}", name, location.line)
            }
            CodeGenError::UnknownFunction { name, location } => {
                write!(
                    f,
                    "Unknown function referenced '{}' at line {}",
                    name, location.line
                )
            }
            CodeGenError::ArgumentCountMismatch {
                function,
                expected,
                got,
                location,
            } => {
                write!(
                    f,
                    "Incorrect # arguments passed to '{}': expected {}, got {} at line {}",
                    function, expected, got, location.line
                )
            }
            CodeGenError::InvalidBinaryOperator { op, location } => {
                write!(f, "invalid binary operator '{}' at line {}", op, location.line)
            }
            CodeGenError::Redefinition { name, location } => {
                write!(
                    f,
                    "Function cannot be redefined: '{}' at line {}",
                    name, location.line
                )
            }
            CodeGenError::PrototypeMismatch {
                name,
                expected,
                got,
                location,
            } => {
                write!(
                    f,
                    "Function '{}' redeclared with a different # of arguments: expected {}, got {} at line {}",
                    name, expected, got, location.line
                )
            }
            CodeGenError::Verification { function } => {
                write!(f, "Verification failed for '{}'", function)
            }
            CodeGenError::Builder(message) => write!(f, "IR construction failed: {}", message),
        }
    }
}

impl std::error::Error for CodeGenError {}

impl From<BuilderError> for CodeGenError {
    fn from(err: BuilderError) -> Self {
        CodeGenError::Builder(err.to_string())
    }
}
