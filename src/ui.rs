//! Ratatui front-end: a full-screen SQL console with a scrollback pane, a
//! diagnostics pane fed by the tracing pipeline, and a single input line.

mod app;
mod helpers;
mod terminal;

pub use app::Console;
pub use terminal::run_console;
