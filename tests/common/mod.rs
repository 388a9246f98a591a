use std::path::PathBuf;

use aquarium_shell::{seed, ConnectionManager};
use rusqlite::Connection;
use tempfile::TempDir;

/// In-memory database holding the two seed fish. Dropped with the test.
pub fn memory_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    seed(&conn).unwrap();
    conn
}

/// Manager wrapped around [`memory_db`].
#[allow(dead_code)]
pub fn memory_manager() -> ConnectionManager {
    ConnectionManager::from_connection(memory_db())
}

/// Temporary directory plus the database path inside it. The file itself is
/// not created.
#[allow(dead_code)]
pub fn temp_db_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aquarium.db");
    (dir, path)
}
