// Snapshot management for stepping through a session

use crate::driver::UnitKind;
use crate::parser::ast::SourceLocation;

/// Captured driver output, one entry per line
#[derive(Debug, Clone)]
pub struct Transcript {
    pub lines: Vec<TranscriptLine>,
}

impl Transcript {
    pub fn new() -> Self {
        Transcript { lines: Vec::new() }
    }

    /// Append a full line attributed to the unit at `location`
    pub fn print_line(&mut self, text: String, location: SourceLocation) {
        self.lines.push(TranscriptLine { text, location });
    }

    /// The first `len` lines as plain strings
    pub fn get_output(&self, len: usize) -> Vec<String> {
        self.lines
            .iter()
            .take(len)
            .map(|line| line.text.clone())
            .collect()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

/// A line of output with the location of the unit that produced it
#[derive(Debug, Clone)]
pub struct TranscriptLine {
    pub text: String,
    pub location: SourceLocation,
}

/// State of the session after one top-level unit
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub unit_index: usize,
    pub kind: UnitKind,
    pub location: SourceLocation,
    pub succeeded: bool,
    pub summary: String,
    /// Printed module after the unit
    pub module_ir: String,
    /// Number of transcript lines produced so far
    pub transcript_len: usize,
}

impl Snapshot {
    /// Estimate the memory usage of this snapshot in bytes
    pub fn estimated_size(&self) -> usize {
        std::mem::size_of::<Snapshot>() + self.summary.len() + self.module_ir.len()
    }
}

/// Bounded history of snapshots
#[derive(Debug)]
pub struct SnapshotManager {
    snapshots: Vec<Snapshot>,
    max_memory: usize,
    current_memory: usize,
}

impl SnapshotManager {
    pub fn new(max_memory: usize) -> Self {
        SnapshotManager {
            snapshots: Vec::new(),
            max_memory,
            current_memory: 0,
        }
    }

    /// Add a snapshot to history
    pub fn push(&mut self, snapshot: Snapshot) -> Result<(), String> {
        let snapshot_size = snapshot.estimated_size();

        if self.current_memory + snapshot_size > self.max_memory {
            return Err(format!(
                "Snapshot memory limit exceeded: {} + {} > {}",
                self.current_memory, snapshot_size, self.max_memory
            ));
        }

        self.current_memory += snapshot_size;
        self.snapshots.push(snapshot);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }
}
