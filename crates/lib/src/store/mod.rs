use crate::errors::QuizError;
use std::fmt::{self, Debug};
use turso::{Connection, Database, Value};

mod schema;

pub use schema::ALL_TABLE_CREATION_SQL;

/// A provider for interacting with the local SQLite database using Turso.
///
/// The wrapped `Database` manages a connection pool. When cloned, the same
/// underlying database is shared, allowing concurrent access to the same file
/// or in-memory instance.
#[derive(Clone)]
pub struct Store {
    /// The Turso database instance. It's cloneable and thread-safe.
    pub db: Database,
}

impl Store {
    /// Creates a new `Store` from a file path or in-memory.
    ///
    /// # Arguments
    ///
    /// * `db_path`: The path to the SQLite database file. Use ":memory:" for a
    ///   unique, isolated in-memory database. To share an in-memory database
    ///   across callers (e.g., in tests), create one `Store` and `.clone()` it.
    pub async fn new(db_path: &str) -> Result<Self, QuizError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| QuizError::StorageConnection(e.to_string()))?;

        // WAL mode improves concurrency for file-based databases and is a
        // no-op for in-memory ones. Use `query` because the PRAGMA returns a row.
        let conn = db
            .connect()
            .map_err(|e| QuizError::StorageConnection(e.to_string()))?;
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| QuizError::StorageConnection(e.to_string()))?;

        Ok(Self { db })
    }

    /// Opens a new connection against the shared database.
    pub fn connect(&self) -> Result<Connection, QuizError> {
        self.db
            .connect()
            .map_err(|e| QuizError::StorageConnection(e.to_string()))
    }

    /// Ensures that all required application tables and indexes exist.
    /// This function is idempotent and safe to call on every application startup.
    pub async fn initialize_schema(&self) -> Result<(), QuizError> {
        let conn = self.connect()?;
        for statement in schema::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ()).await?;
        }
        Ok(())
    }

    /// A helper for tests to pre-populate data by executing multiple SQL statements.
    pub async fn initialize_with_data(&self, init_sql: &str) -> Result<(), QuizError> {
        let conn = self.connect()?;
        for statement in init_sql.split(';').filter(|s| !s.trim().is_empty()) {
            conn.execute(statement, ()).await?;
        }
        Ok(())
    }
}

impl Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl AsRef<Database> for Store {
    fn as_ref(&self) -> &Database {
        &self.db
    }
}

/// Returns the rowid assigned by the most recent INSERT on this connection.
pub(crate) async fn last_insert_rowid(conn: &Connection) -> Result<i64, QuizError> {
    let mut rows = conn.query("SELECT last_insert_rowid()", ()).await?;
    let row = rows
        .next()
        .await?
        .ok_or_else(|| QuizError::Storage("last_insert_rowid returned no row".to_string()))?;
    match row.get_value(0)? {
        Value::Integer(id) => Ok(id),
        other => Err(QuizError::Storage(format!(
            "unexpected rowid value: {other:?}"
        ))),
    }
}

/// Reads a TEXT column, treating NULL as an empty string.
pub(crate) fn text_at(row: &turso::Row, idx: usize) -> Result<String, QuizError> {
    match row.get_value(idx)? {
        Value::Text(s) => Ok(s),
        Value::Null => Ok(String::new()),
        other => Err(QuizError::Storage(format!(
            "expected TEXT at column {idx}, got {other:?}"
        ))),
    }
}

/// Reads a nullable TEXT column.
pub(crate) fn opt_text_at(row: &turso::Row, idx: usize) -> Result<Option<String>, QuizError> {
    match row.get_value(idx)? {
        Value::Text(s) => Ok(Some(s)),
        Value::Null => Ok(None),
        other => Err(QuizError::Storage(format!(
            "expected TEXT or NULL at column {idx}, got {other:?}"
        ))),
    }
}

/// Reads an INTEGER column, treating NULL as zero.
pub(crate) fn int_at(row: &turso::Row, idx: usize) -> Result<i64, QuizError> {
    match row.get_value(idx)? {
        Value::Integer(i) => Ok(i),
        Value::Null => Ok(0),
        other => Err(QuizError::Storage(format!(
            "expected INTEGER at column {idx}, got {other:?}"
        ))),
    }
}

/// Reads a nullable INTEGER column.
pub(crate) fn opt_int_at(row: &turso::Row, idx: usize) -> Result<Option<i64>, QuizError> {
    match row.get_value(idx)? {
        Value::Integer(i) => Ok(Some(i)),
        Value::Null => Ok(None),
        other => Err(QuizError::Storage(format!(
            "expected INTEGER or NULL at column {idx}, got {other:?}"
        ))),
    }
}

/// The timestamp format used across all tables, matching SQLite's `datetime('now')`.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The current UTC timestamp as stored in the database.
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}
