//! Top-level read–dispatch loop
//!
//! The [`Driver`] looks at the current token, picks the matching parser entry
//! point, hands the result to [`CodeGen`], and reports what happened. A
//! driver built [`with_history`](Driver::with_history) also records each unit
//! in a [`Transcript`] and takes a [`Snapshot`] of the module after it, so a
//! session can be replayed in the viewer. An interactive session records
//! nothing.
//!
//! # Recovery
//!
//! A parse failure discards exactly one token and the loop carries on. This
//! can leave the rest of the line out of step with the grammar, but the
//! session itself never ends until end of input.

use crate::codegen::lower::print_function;
use crate::codegen::{CodeGen, CodeGenError};
use crate::constants::{MODULE_ID, PROMPT, SNAPSHOT_MEMORY_LIMIT};
use crate::parser::ast::SourceLocation;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::precedence::PrecedenceTable;
use crate::snapshot::{Snapshot, SnapshotManager, Transcript};
use inkwell::context::Context;
use inkwell::module::Module;
use std::fmt;
use std::io::{self, Write};

/// Which grammar entry point handled a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Definition,
    Extern,
    TopLevelExpression,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Definition => write!(f, "definition"),
            UnitKind::Extern => write!(f, "extern"),
            UnitKind::TopLevelExpression => write!(f, "top-level expression"),
        }
    }
}

/// What became of a unit
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// IR was emitted for the named function
    Lowered(String),
    ParseFailed(ParseError),
    CodeGenFailed(CodeGenError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Lowered(_))
    }
}

/// Result of processing one top-level unit
#[derive(Debug, Clone, PartialEq)]
pub struct UnitReport {
    pub kind: UnitKind,
    pub location: SourceLocation,
    pub outcome: Outcome,
    /// Output lines for this unit, in order
    pub lines: Vec<String>,
}

/// Transcript and module snapshots of a recorded session
struct History {
    transcript: Transcript,
    snapshots: SnapshotManager,
    /// Set once the snapshot budget is exhausted
    full: bool,
}

pub struct Driver<'ctx, I: Iterator<Item = char>> {
    parser: Parser<I>,
    codegen: CodeGen<'ctx>,
    history: Option<History>,
}

impl<'ctx, I: Iterator<Item = char>> Driver<'ctx, I> {
    pub fn new(context: &'ctx Context, chars: I) -> Self {
        Self::with_precedence(context, chars, PrecedenceTable::default())
    }

    pub fn with_precedence(context: &'ctx Context, chars: I, precedence: PrecedenceTable) -> Self {
        Driver {
            parser: Parser::with_precedence(chars, precedence),
            codegen: CodeGen::new(context, MODULE_ID),
            history: None,
        }
    }

    /// Record every unit from here on for later replay
    pub fn with_history(mut self) -> Self {
        self.history = Some(History {
            transcript: Transcript::new(),
            snapshots: SnapshotManager::new(SNAPSHOT_MEMORY_LIMIT),
            full: false,
        });
        self
    }

    pub fn module(&self) -> &Module<'ctx> {
        self.codegen.module()
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.history.as_ref().map(|h| &h.transcript)
    }

    pub fn snapshots(&self) -> Option<&SnapshotManager> {
        self.history.as_ref().map(|h| &h.snapshots)
    }

    /// Give up the recorded history, e.g. to hand it to the viewer.
    /// `None` unless the driver was built [`with_history`](Self::with_history).
    pub fn into_history(self) -> Option<(SnapshotManager, Transcript)> {
        self.history.map(|h| (h.snapshots, h.transcript))
    }

    /// Process the next top-level unit. Returns `None` at end of input.
    ///
    /// Top-level `;` separators are skipped.
    pub fn handle_next(&mut self) -> Option<UnitReport> {
        loop {
            let report = match self.parser.current() {
                Token::Eof(_) => return None,
                Token::Char(';', _) => {
                    self.parser.advance();
                    continue;
                }
                Token::Def(_) => self.handle_definition(),
                Token::Extern(_) => self.handle_extern(),
                _ => self.handle_top_level_expression(),
            };

            self.record(&report);
            return Some(report);
        }
    }

    /// Run to end of input, writing a prompt before each unit, the unit's
    /// output after it, and the whole module once input is exhausted.
    pub fn run<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        loop {
            write!(out, "{}", PROMPT)?;
            out.flush()?;

            let Some(report) = self.handle_next() else {
                break;
            };
            for line in &report.lines {
                writeln!(out, "{}", line)?;
            }
        }

        writeln!(out)?;
        write!(out, "{}", self.codegen.module_ir())?;
        out.flush()
    }

    fn handle_definition(&mut self) -> UnitReport {
        let location = self.parser.current().location();
        let def = match self.parser.parse_definition() {
            Ok(def) => def,
            Err(err) => return self.parse_failure(UnitKind::Definition, location, err),
        };
        log::debug!("parsed {}", def);

        match self.codegen.lower_function(&def) {
            Ok(function) => {
                let mut lines = vec!["Read function definition:".to_string()];
                lines.extend(print_function(function).lines().map(str::to_string));
                UnitReport {
                    kind: UnitKind::Definition,
                    location,
                    outcome: Outcome::Lowered(def.proto.name.clone()),
                    lines,
                }
            }
            Err(err) => codegen_failure(UnitKind::Definition, location, err),
        }
    }

    fn handle_extern(&mut self) -> UnitReport {
        let location = self.parser.current().location();
        let proto = match self.parser.parse_extern() {
            Ok(proto) => proto,
            Err(err) => return self.parse_failure(UnitKind::Extern, location, err),
        };
        log::debug!("parsed extern {}", proto);

        let function = match self.codegen.lower_prototype(&proto) {
            Ok(function) => function,
            Err(err) => return codegen_failure(UnitKind::Extern, location, err),
        };
        let mut lines = vec!["Read extern:".to_string()];
        lines.extend(print_function(function).lines().map(str::to_string));
        lines.push("Parsed an extern".to_string());

        UnitReport {
            kind: UnitKind::Extern,
            location,
            outcome: Outcome::Lowered(proto.name.clone()),
            lines,
        }
    }

    fn handle_top_level_expression(&mut self) -> UnitReport {
        let location = self.parser.current().location();
        let def = match self.parser.parse_top_level_expr() {
            Ok(def) => def,
            Err(err) => return self.parse_failure(UnitKind::TopLevelExpression, location, err),
        };
        log::debug!("parsed top-level expression {}", def.body);

        let function = match self.codegen.lower_function(&def) {
            Ok(function) => function,
            Err(err) => return codegen_failure(UnitKind::TopLevelExpression, location, err),
        };
        let mut lines = vec!["Read top-level expression:".to_string()];
        lines.extend(print_function(function).lines().map(str::to_string));

        // Anonymous functions are used once and must not accumulate.
        if !self.codegen.remove_function(function) {
            log::warn!("anonymous function at {} is still referenced", location);
        }

        UnitReport {
            kind: UnitKind::TopLevelExpression,
            location,
            outcome: Outcome::Lowered(def.proto.name.clone()),
            lines,
        }
    }

    /// Report a parse error and skip one token to resynchronise
    fn parse_failure(&mut self, kind: UnitKind, location: SourceLocation, err: ParseError) -> UnitReport {
        let skipped = self.parser.current().clone();
        self.parser.advance();
        log::debug!("skipped {} after parse error", skipped);

        UnitReport {
            kind,
            location,
            lines: vec![format!("Error: {}", err)],
            outcome: Outcome::ParseFailed(err),
        }
    }

    fn record(&mut self, report: &UnitReport) {
        let Some(history) = self.history.as_mut() else {
            return;
        };

        for line in &report.lines {
            history.transcript.print_line(line.clone(), report.location);
        }

        if history.full {
            return;
        }

        let snapshot = Snapshot {
            unit_index: history.snapshots.len(),
            kind: report.kind,
            location: report.location,
            succeeded: report.outcome.is_success(),
            summary: summarize(report),
            module_ir: self.codegen.module_ir(),
            transcript_len: history.transcript.lines.len(),
        };

        if let Err(message) = history.snapshots.push(snapshot) {
            log::warn!("{}; no further units will be recorded", message);
            history.full = true;
        }
    }
}

fn codegen_failure(kind: UnitKind, location: SourceLocation, err: CodeGenError) -> UnitReport {
    UnitReport {
        kind,
        location,
        lines: vec![format!("Error: {}", err)],
        outcome: Outcome::CodeGenFailed(err),
    }
}

/// One-line description of a unit for the viewer's status bar
fn summarize(report: &UnitReport) -> String {
    match &report.outcome {
        Outcome::Lowered(name) if name.is_empty() => format!("{} lowered", report.kind),
        Outcome::Lowered(name) => format!("{} '{}' lowered", report.kind, name),
        Outcome::ParseFailed(err) => err.to_string(),
        Outcome::CodeGenFailed(err) => err.to_string(),
    }
}
