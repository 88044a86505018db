//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The viewer replays a finished session one top-level unit at a time.
//!
//! - **[`app`]**: history position, keyboard event loop, pane focus, auto-play
//! - **[`panes`]**: stateless render functions for each visible pane
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! Construct an [`App`] from the history a [`Driver`] recorded and call
//! [`App::run`] to start the event loop.
//!
//! [`Driver`]: crate::driver::Driver
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
