//! Persistence module split across logical submodules.

mod connection;
mod lifecycle;

pub use connection::{ConnectionManager, ManagerRegistry};
pub use lifecycle::{delete_database, fresh_start, initialize_database, seed};
