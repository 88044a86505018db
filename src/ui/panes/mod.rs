//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Kaleidoscope source with the current unit's line marked
//! - [`module`]: The IR module as it stood after the current unit
//! - [`transcript`]: Driver output up to the current unit
//! - [`status`]: Status bar with keybindings and position in the history
//!
//! Each pane module exports a `render_*` function that draws from borrowed
//! state and updates only its own scroll offset.

pub mod module;
pub mod source;
pub mod status;
pub mod transcript;

pub use module::render_module_pane;
pub use source::{render_source_pane, SourceScrollState};
pub use status::render_status_bar;
pub use transcript::render_transcript_pane;
