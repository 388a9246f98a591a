use std::cell::{OnceCell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, OpenFlags};
use tracing::{debug, error, info, warn};

use crate::error::ExecuteError;
use crate::models::Row;

/// Lazily creates the one `ConnectionManager` an application uses and hands
/// out shared references to it. The application owns the registry and passes
/// it by reference instead of relying on hidden global state.
#[derive(Default)]
pub struct ManagerRegistry {
    manager: OnceCell<Rc<ConnectionManager>>,
}

impl ManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared manager, creating it for `path` on the first call.
    /// Later calls ignore their argument; use [`ConnectionManager::refresh`]
    /// to point the cursor somewhere else.
    pub fn obtain(&self, path: impl AsRef<Path>) -> Rc<ConnectionManager> {
        let path = path.as_ref();
        let manager = self
            .manager
            .get_or_init(|| Rc::new(ConnectionManager::open(path)));
        if manager.path() != path {
            debug!(
                requested = %path.display(),
                active = %manager.path().display(),
                "manager already created, ignoring requested path"
            );
        }
        Rc::clone(manager)
    }
}

/// Handle around a single SQLite file. The live session (the "cursor") is
/// optional: it stays unset until the file exists and a refresh picks it up.
pub struct ConnectionManager {
    state: RefCell<CursorState>,
}

struct CursorState {
    path: PathBuf,
    conn: Option<Connection>,
    /// Identity of the file the session was opened on. `None` for in-memory
    /// sessions, which have no file to vanish underneath them.
    identity: Option<FileIdentity>,
}

/// Enough metadata to tell a file apart from one later created at the same
/// path. An open SQLite session pins the old inode, so a recreated file never
/// shares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    dev: u64,
    ino: u64,
    created: Option<SystemTime>,
}

impl FileIdentity {
    fn of(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        let (dev, ino) = device_and_inode(&meta);
        Some(Self {
            dev,
            ino,
            created: meta.created().ok(),
        })
    }
}

#[cfg(unix)]
fn device_and_inode(meta: &fs::Metadata) -> (u64, u64) {
    use std::os::unix::fs::MetadataExt;
    (meta.dev(), meta.ino())
}

// Elsewhere the creation timestamp alone distinguishes a recreated file.
#[cfg(not(unix))]
fn device_and_inode(_meta: &fs::Metadata) -> (u64, u64) {
    (0, 0)
}

impl ConnectionManager {
    /// Build a manager for `path`, opening a session only if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (conn, identity) = open_existing(&path).unzip();
        Self {
            state: RefCell::new(CursorState {
                path,
                conn,
                identity,
            }),
        }
    }

    /// Wrap an already open connection, typically an in-memory fixture.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            state: RefCell::new(CursorState {
                path: PathBuf::from(":memory:"),
                conn: Some(conn),
                identity: None,
            }),
        }
    }

    /// Re-attempt the open for `path` and replace the shared cursor in place.
    /// Every holder of this manager observes the new cursor.
    pub fn refresh(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let (conn, identity) = open_existing(&path).unzip();
        let mut state = self.state.borrow_mut();
        state.path = path;
        state.conn = conn;
        state.identity = identity;
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().conn.is_some()
    }

    /// Path the cursor was last acquired for.
    pub fn path(&self) -> PathBuf {
        self.state.borrow().path.clone()
    }

    /// Run one SQL statement and collect every row it produces.
    ///
    /// A statement that succeeds without rows returns `Ok(vec![])`. When the
    /// backing file was removed or replaced after the cursor was acquired, the
    /// stale session is dropped and `StorageMissing` is reported; a later
    /// refresh is needed to reconnect.
    pub fn execute(&self, statement: &str) -> Result<Vec<Row>, ExecuteError> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;

        let stale = match state.identity {
            Some(identity) => FileIdentity::of(&state.path) != Some(identity),
            None => false,
        };
        if state.conn.is_some() && stale {
            state.conn = None;
            state.identity = None;
            warn!(
                path = %state.path.display(),
                "database file removed or replaced, dropping stale session"
            );
            return Err(ExecuteError::StorageMissing {
                path: state.path.clone(),
            });
        }

        let Some(conn) = state.conn.as_ref() else {
            warn!("no database connection");
            return Err(ExecuteError::NoConnection);
        };

        info!(statement, "executing");
        run_statement(conn, statement).map_err(|err| {
            error!(%err, "statement failed");
            ExecuteError::Statement(err)
        })
    }

    /// Degraded form of [`execute`](Self::execute): every failure becomes an
    /// empty result. Diagnostics are still logged.
    pub fn sql(&self, statement: &str) -> Vec<Row> {
        self.execute(statement).unwrap_or_default()
    }
}

/// Open `path` read-write without creating it. A missing or unreadable file
/// leaves the cursor unset.
fn open_existing(path: &Path) -> Option<(Connection, FileIdentity)> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "database not found, run the initializer first"
        );
        return None;
    }

    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = match Connection::open_with_flags(path, flags) {
        Ok(conn) => conn,
        Err(err) => {
            error!(path = %path.display(), %err, "failed to open database");
            return None;
        }
    };

    let Some(identity) = FileIdentity::of(path) else {
        warn!(path = %path.display(), "database vanished while opening");
        return None;
    };
    info!(path = %path.display(), "database found, cursor ready");
    Some((conn, identity))
}

fn run_statement(conn: &Connection, statement: &str) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = conn.prepare(statement)?;
    let columns = stmt.column_count();

    let rows = stmt
        .query_map([], |row| {
            (0..columns)
                .map(|idx| row.get::<_, Value>(idx))
                .collect::<rusqlite::Result<Vec<_>>>()
                .map(Row)
        })
        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>());

    match rows {
        // Text with no statement body (a lone `;` or comment) prepares to an
        // empty handle that SQLite refuses to step.
        Err(err) if columns == 0 && err.sqlite_error_code() == Some(ErrorCode::ApiMisuse) => {
            Ok(Vec::new())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;
    use crate::db::lifecycle::{initialize_database, seed};
    use crate::logging::{CaptureLayer, DiagnosticLog};

    fn seeded_manager() -> ConnectionManager {
        let conn = Connection::open_in_memory().unwrap();
        seed(&conn).unwrap();
        ConnectionManager::from_connection(conn)
    }

    #[test]
    fn zero_rows_is_not_an_error() {
        let manager = seeded_manager();
        let rows = manager
            .execute("SELECT * FROM fish WHERE tank_number = 99")
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn malformed_statement_is_reported() {
        let manager = seeded_manager();
        let err = manager.execute("SELEC nonsense").unwrap_err();
        assert!(matches!(err, ExecuteError::Statement(_)));
        assert!(manager.sql("SELEC nonsense").is_empty());
    }

    #[test]
    fn missing_table_is_reported() {
        let manager = seeded_manager();
        let err = manager.execute("SELECT * FROM sharks").unwrap_err();
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn writes_are_visible_to_later_reads() {
        let manager = seeded_manager();
        let inserted = manager
            .execute("INSERT INTO fish VALUES ('Dory', 'tang', 3)")
            .unwrap();
        assert!(inserted.is_empty());
        assert_eq!(manager.sql("SELECT * FROM fish").len(), 3);
    }

    #[test]
    fn missing_file_leaves_cursor_unset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let manager = ConnectionManager::open(&path);

        assert!(!manager.is_connected());
        assert!(!path.exists(), "opening must not create the file");
        assert!(matches!(
            manager.execute("SELECT 1"),
            Err(ExecuteError::NoConnection)
        ));
    }

    #[test]
    fn registry_ignores_later_paths() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ManagerRegistry::new();

        let first = registry.obtain(dir.path().join("a.db"));
        let second = registry.obtain(dir.path().join("b.db"));

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(second.path(), dir.path().join("a.db"));
    }

    #[test]
    fn statements_without_a_body_succeed_empty() {
        let manager = seeded_manager();
        assert!(manager.execute(";").unwrap().is_empty());
        assert!(manager.execute("-- just a comment").unwrap().is_empty());
    }

    #[test]
    fn every_path_logs_a_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aquarium.db");
        let log = DiagnosticLog::default();
        let subscriber = tracing_subscriber::registry().with(CaptureLayer::new(log.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let manager = ConnectionManager::open(&path);
            let _ = manager.execute("SELECT * FROM fish");

            initialize_database(&path).unwrap();
            manager.refresh(&path);
            let _ = manager.execute("SELECT * FROM fish");
            let _ = manager.execute("SELECT * FROM sharks");
        });

        let lines: Vec<String> = log.drain().into_iter().map(|d| d.text).collect();
        let logged = |needle: &str| lines.iter().any(|line| line.contains(needle));
        assert!(logged("database not found"), "{lines:?}");
        assert!(logged("no database connection"), "{lines:?}");
        assert!(logged("database found, cursor ready"), "{lines:?}");
        assert!(logged("executing statement=SELECT * FROM fish"), "{lines:?}");
        assert!(logged("statement failed"), "{lines:?}");
    }
}
