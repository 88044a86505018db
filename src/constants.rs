// Constants for the kaleido front end

/// Binary operators recognised by a default [`PrecedenceTable`], with their
/// binding strength. `*` binds tightest and `<` loosest.
///
/// [`PrecedenceTable`]: crate::parser::precedence::PrecedenceTable
pub const DEFAULT_BINOP_PRECEDENCE: [(char, i32); 4] = [('<', 10), ('+', 20), ('-', 30), ('*', 40)];

/// Identifier of the module every driver session lowers into
pub const MODULE_ID: &str = "my cool jit";

/// Prompt written before each top-level unit in interactive mode
pub const PROMPT: &str = "ready> ";

/// Memory budget for the per-unit snapshot history (64 MB)
pub const SNAPSHOT_MEMORY_LIMIT: usize = 64 * 1024 * 1024;
