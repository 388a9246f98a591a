use std::path::PathBuf;

use thiserror::Error;

/// Why a statement produced no rows. A successful statement that matched
/// nothing is `Ok(vec![])`, never one of these.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("no database connection; initialize the database and refresh first")]
    NoConnection,
    #[error("database file {} was removed or replaced; refresh the connection", path.display())]
    StorageMissing { path: PathBuf },
    #[error(transparent)]
    Statement(#[from] rusqlite::Error),
}
