//! Command layer shared by the line-mode REPL and the terminal console.

use std::rc::Rc;

use anyhow::Result;

use crate::config::Config;
use crate::db::{fresh_start, ConnectionManager, ManagerRegistry};
use crate::error::ExecuteError;
use crate::models::Row;

/// Help text shown for `.help`.
pub const HELP: &str = "\
Type a SQL statement to run it against the fish table.
  .refresh   reconnect to the database file
  .reset     delete and reseed the database, then reconnect
  .help      show this message
  quit       leave the shell";

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Empty,
    Refresh,
    Reset,
    Help,
    Statement(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "quit" => Command::Quit,
            "" => Command::Empty,
            ".refresh" => Command::Refresh,
            ".reset" => Command::Reset,
            ".help" => Command::Help,
            statement => Command::Statement(statement.to_string()),
        }
    }
}

/// What a dispatched command produced, ready for a front-end to render.
#[derive(Debug)]
pub enum Outcome {
    Quit,
    Nothing,
    Rows(Vec<Row>),
    Failed(ExecuteError),
    Refreshed { connected: bool },
    Reset,
    Help,
}

/// Owns the configuration and the registry for one interactive session.
pub struct Shell {
    config: Config,
    registry: ManagerRegistry,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: ManagerRegistry::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared connection manager, created on first use.
    pub fn manager(&self) -> Rc<ConnectionManager> {
        self.registry.obtain(self.config.db_path())
    }

    /// Run a command. Statement failures come back as `Outcome::Failed`;
    /// only lifecycle failures from `.reset` are returned as errors.
    pub fn dispatch(&self, command: Command) -> Result<Outcome> {
        let outcome = match command {
            Command::Quit => Outcome::Quit,
            Command::Empty => Outcome::Nothing,
            Command::Help => Outcome::Help,
            Command::Refresh => {
                let manager = self.manager();
                manager.refresh(self.config.db_path());
                Outcome::Refreshed {
                    connected: manager.is_connected(),
                }
            }
            Command::Reset => {
                fresh_start(&self.config)?;
                self.manager().refresh(self.config.db_path());
                Outcome::Reset
            }
            Command::Statement(statement) => match self.manager().execute(&statement) {
                Ok(rows) => Outcome::Rows(rows),
                Err(err) => Outcome::Failed(err),
            },
        };
        Ok(outcome)
    }
}
