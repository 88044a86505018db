//! Code generation: AST → LLVM IR
//!
//! - [`lower`]: [`CodeGen`], which lowers expressions, prototypes and
//!   function definitions into an inkwell [`Module`](inkwell::module::Module)
//! - [`errors`]: [`CodeGenError`]
//!
//! # Scoping
//!
//! Functions do not nest. While a function body is lowered, the only names
//! in scope are that function's parameters; the table is rebuilt for every
//! function and never carries over.

pub mod errors;
pub mod lower;

pub use errors::CodeGenError;
pub use lower::CodeGen;
