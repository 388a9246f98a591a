use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::info;

use crate::config::Config;
use crate::models::SEED_FISH;

/// Create the `fish` table and insert the seed rows inside one transaction.
/// Works on any connection, including the in-memory test fixture.
pub fn seed(conn: &Connection) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .context("failed to start seed transaction")?;

    tx.execute(
        "CREATE TABLE fish (name TEXT, species TEXT, tank_number INTEGER)",
        [],
    )
    .context("failed to create fish table")?;

    for (name, species, tank_number) in SEED_FISH {
        tx.execute(
            "INSERT INTO fish VALUES (?1, ?2, ?3)",
            params![name, species, tank_number],
        )
        .with_context(|| format!("failed to insert {name}"))?;
    }

    tx.commit().context("failed to commit seed data")
}

/// Create (or overwrite) the database at `path` with the two seed rows.
/// Unlike statement execution, every failure here is returned to the caller.
pub fn initialize_database(path: &Path) -> Result<()> {
    info!(path = %path.display(), "initializing database");
    delete_database(path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    seed(&conn)
}

/// Remove the database file. A file that is already gone is not an error.
pub fn delete_database(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "deleted database");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => {
            Err(err).with_context(|| format!("failed to delete {}", path.display()))
        }
    }
}

/// Delete then reinitialize the configured database, leaving the known
/// two-row baseline.
pub fn fresh_start(config: &Config) -> Result<()> {
    delete_database(config.db_path())?;
    initialize_database(config.db_path())
}
