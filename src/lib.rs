//! # Introduction
//!
//! kaleido is the front end of a compiler for Kaleidoscope, a toy language
//! whose only type is the 64-bit float. It reads top-level definitions,
//! `extern` declarations and bare expressions, and lowers each one into an
//! LLVM module (through inkwell) that is printed as it grows.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → CodeGen → LLVM Module → Snapshots → TUI
//! ```
//!
//! 1. [`parser`]: tokenises a character stream and builds an AST by
//!    operator-precedence climbing.
//! 2. [`codegen`]: lowers prototypes and functions with LLVM's IR builder,
//!    keeping a per-function table of parameter values. LLVM folds constants,
//!    verifies each function and prints the module.
//! 3. [`driver`]: the top-level loop that dispatches on the leading token,
//!    reports each unit and recovers from parse errors.
//! 4. [`snapshot`]: per-unit history with a memory limit and the captured
//!    [`snapshot::Transcript`], recorded only when asked for.
//! 5. [`ui`]: ratatui-based viewer for stepping through a session; not part
//!    of the stable library API.

pub mod codegen;
pub mod constants;
pub mod driver;
pub mod parser;
pub mod snapshot;
pub mod ui;
