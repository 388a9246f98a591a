//! Core library surface for the aquarium shell: a small interactive front-end
//! over a SQLite file holding a single `fish` table.
//!
//! The connection manager in [`db`] is created lazily and shared by reference;
//! statements report failures through [`ExecuteError`] instead of silently
//! returning nothing.
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod repl;
pub mod shell;
pub mod ui;

/// Convenience re-exports for the persistence layer.
pub use db::{
    delete_database, fresh_start, initialize_database, seed, ConnectionManager, ManagerRegistry,
};

pub use config::Config;
pub use error::ExecuteError;
pub use models::{Fish, Row};
pub use repl::run_repl;
pub use shell::{Command, Outcome, Shell};
pub use ui::{run_console, Console};
