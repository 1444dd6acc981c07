//! CarApp Database Module
//! SQLite store handle with connection pooling

use crate::engine::config::DatabaseConfig;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Store failure. Every relational error carries the operation that raised it.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to get database connection: {0}")]
    PoolError(#[from] r2d2::Error),
    #[error("{operation} failed: {source}")]
    Operation {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Attaches an operation name to a raw SQLite error.
pub trait OperationContext<T> {
    fn context(self, operation: &'static str) -> Result<T, DatabaseError>;
}

impl<T> OperationContext<T> for rusqlite::Result<T> {
    fn context(self, operation: &'static str) -> Result<T, DatabaseError> {
        self.map_err(|source| DatabaseError::Operation { operation, source })
    }
}

#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    path: Option<PathBuf>,
    created: bool,
}

impl Database {
    /// Opens (or creates) the store file at `db_path`.
    pub fn open(db_path: &Path, options: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let created = !db_path.exists();
        if created {
            if let Some(parent) = db_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let busy_timeout = Duration::from_millis(options.busy_timeout_ms);
        let manager = SqliteConnectionManager::file(db_path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA foreign_keys=ON;")
        });
        let pool = Pool::builder()
            .max_size(options.pool_size.max(1))
            .connection_timeout(Duration::from_secs(5))
            .build(manager)?;

        let db = Self {
            pool,
            path: Some(db_path.to_path_buf()),
            created,
        };
        db.init_pragmas()?;

        if created {
            info!(path = %db_path.display(), "Created database file");
        } else {
            debug!(path = %db_path.display(), "Opened database file");
        }
        Ok(db)
    }

    /// A private in-memory store. Always reported as freshly created.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys=ON;"));
        let pool = Pool::builder().max_size(1).build(manager)?;
        let db = Self {
            pool,
            path: None,
            created: true,
        };
        db.init_pragmas()?;
        Ok(db)
    }

    fn init_pragmas(&self) -> Result<(), DatabaseError> {
        let conn = self.get_connection()?;
        // PRAGMA journal_mode returns the resulting mode, so it has to be queried
        let _: String = conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
            .context("enable WAL journal")?;
        Ok(())
    }

    pub fn get_connection(&self) -> Result<DbConnection, DatabaseError> {
        Ok(self.pool.get()?)
    }

    /// Whether the store file did not exist before this handle opened it.
    pub fn was_created(&self) -> bool {
        self.created
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn table_exists(&self, table_name: &str) -> Result<bool, DatabaseError> {
        let conn = self.get_connection()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?1",
                params![table_name],
                |row| row.get(0),
            )
            .context("check table")?;
        Ok(count > 0)
    }

    /// Copies the whole database to `backup_path`, replacing any previous copy.
    pub fn backup(&self, backup_path: &Path) -> Result<(), DatabaseError> {
        if backup_path.exists() {
            std::fs::remove_file(backup_path)?;
        }
        let conn = self.get_connection()?;
        conn.execute(
            "VACUUM INTO ?1",
            params![backup_path.to_string_lossy().to_string()],
        )
        .context("backup database")?;
        info!(path = %backup_path.display(), "Database backed up");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_reports_creation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("CarApp.db");
        let options = DatabaseConfig::default();

        let db = Database::open(&path, &options).unwrap();
        assert!(db.was_created());
        assert!(path.exists());
        drop(db);

        let db = Database::open(&path, &options).unwrap();
        assert!(!db.was_created());
        assert_eq!(db.path(), Some(path.as_path()));
    }

    #[test]
    fn test_foreign_keys_enabled_on_every_connection() {
        let dir = tempdir().unwrap();
        let options = DatabaseConfig {
            pool_size: 3,
            ..DatabaseConfig::default()
        };
        let db = Database::open(&dir.path().join("fk.db"), &options).unwrap();

        let a = db.get_connection().unwrap();
        let b = db.get_connection().unwrap();
        for conn in [&a, &b] {
            let enabled: i64 = conn
                .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
                .unwrap();
            assert_eq!(enabled, 1);
        }
    }

    #[test]
    fn test_operation_error_carries_context() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_connection().unwrap();
        let err = conn
            .execute("INSERT INTO Missing VALUES (1)", [])
            .context("insert missing")
            .unwrap_err();

        assert!(matches!(err, DatabaseError::Operation { operation: "insert missing", .. }));
        assert!(err.to_string().starts_with("insert missing failed"));
    }

    #[test]
    fn test_backup_replaces_previous_copy() {
        let dir = tempdir().unwrap();
        let db = Database::open(&dir.path().join("src.db"), &DatabaseConfig::default()).unwrap();
        db.get_connection()
            .unwrap()
            .execute_batch("CREATE TABLE T (x INTEGER); INSERT INTO T VALUES (7);")
            .unwrap();

        let backup_path = dir.path().join("src.db.bak");
        std::fs::write(&backup_path, "stale").unwrap();
        db.backup(&backup_path).unwrap();

        let copy = rusqlite::Connection::open(&backup_path).unwrap();
        let x: i64 = copy.query_row("SELECT x FROM T", [], |row| row.get(0)).unwrap();
        assert_eq!(x, 7);
    }
}
