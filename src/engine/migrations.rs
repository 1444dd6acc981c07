//! CarApp Migrations Module
//! Creates the base schema and applies numbered, forward-only migration scripts

use crate::engine::config::{Config, DatabaseConfig};
use crate::engine::database::{Database, DatabaseError, OperationContext};
use chrono::Utc;
use rusqlite::params;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Schema applied when the store file is first created.
pub const BASE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS FuelTypes (
    Id INTEGER PRIMARY KEY,
    Name TEXT NOT NULL,
    Price REAL NOT NULL DEFAULT 0 CHECK (Price >= 0)
);

CREATE TABLE IF NOT EXISTS Cars (
    Id INTEGER PRIMARY KEY,
    Brand TEXT NOT NULL,
    Model TEXT NOT NULL,
    Year INTEGER NOT NULL DEFAULT 0,
    GearType TEXT NOT NULL DEFAULT 'M' CHECK (GearType IN ('A', 'M')),
    FuelTypeId INTEGER REFERENCES FuelTypes(Id),
    FuelEfficiency REAL NOT NULL DEFAULT 0,
    Mileage INTEGER NOT NULL DEFAULT 0 CHECK (Mileage >= 0),
    Description TEXT NOT NULL DEFAULT ''
);
"#;

const TRACKING_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS MigrationVersion (
    Id INTEGER PRIMARY KEY,
    Version INTEGER NOT NULL
);
INSERT INTO MigrationVersion (Id, Version)
SELECT 1, 0
WHERE NOT EXISTS (SELECT 1 FROM MigrationVersion WHERE Id = 1);

CREATE TABLE IF NOT EXISTS _carapp_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    checksum TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed migration name: {0}")]
    MalformedName(String),
    #[error("Duplicate migration version {version}: {first} and {second}")]
    DuplicateVersion {
        version: u32,
        first: String,
        second: String,
    },
    #[error("Migration {name} failed: {source}")]
    ScriptFailed {
        name: String,
        #[source]
        source: rusqlite::Error,
    },
}

/// A numbered script found on disk.
#[derive(Debug, Clone)]
pub struct MigrationScript {
    pub version: u32,
    pub name: String,
    pub path: PathBuf,
    pub sql: String,
    pub checksum: String,
}

/// A journal entry for a script that has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedMigration {
    pub version: u32,
    pub name: String,
    pub checksum: String,
    pub applied_at: String,
}

#[derive(Debug)]
pub struct MigrationStatus {
    pub current_version: u32,
    pub applied: Vec<AppliedMigration>,
    pub pending: Vec<String>,
}

pub struct Migrator {
    migrations_dir: PathBuf,
    prefix: String,
    base_schema: Option<PathBuf>,
}

impl Migrator {
    pub fn new(migrations_dir: &Path, prefix: &str) -> Self {
        Self {
            migrations_dir: migrations_dir.to_path_buf(),
            prefix: prefix.to_string(),
            base_schema: None,
        }
    }

    pub fn from_config(project_dir: &Path, config: &Config) -> Self {
        Self {
            migrations_dir: config.migrations_dir(project_dir),
            prefix: config.migrations.prefix.clone(),
            base_schema: config.base_schema_path(project_dir),
        }
    }

    /// Read the base schema from a file instead of the built-in one.
    pub fn with_base_schema(mut self, path: &Path) -> Self {
        self.base_schema = Some(path.to_path_buf());
        self
    }

    /// Opens the store at `db_path`, creating it with the base schema if it
    /// does not exist yet, and makes sure the version record is present.
    pub fn ensure_initialized(
        &self,
        db_path: &Path,
        options: &DatabaseConfig,
    ) -> Result<Database, MigrationError> {
        let db = Database::open(db_path, options)?;
        self.initialize(&db)?;
        Ok(db)
    }

    /// Same as [`Migrator::ensure_initialized`] for an already opened handle.
    ///
    /// A store without a `MigrationVersion` table has never finished
    /// initializing, so it gets the base schema even if the file existed.
    /// The base schema and the version record commit together.
    pub fn initialize(&self, db: &Database) -> Result<(), MigrationError> {
        let initialized = db.table_exists("MigrationVersion")?;
        let mut conn = db.get_connection()?;

        if initialized {
            conn.execute_batch(TRACKING_SCHEMA)
                .context("create migration tracking")?;
            return Ok(());
        }

        let schema = match &self.base_schema {
            Some(path) => fs::read_to_string(path)?,
            None => BASE_SCHEMA.to_string(),
        };
        let tx = conn.transaction().context("begin base schema")?;
        tx.execute_batch(&schema)
            .map_err(|source| MigrationError::ScriptFailed {
                name: "base schema".to_string(),
                source,
            })?;
        tx.execute_batch(TRACKING_SCHEMA)
            .context("create migration tracking")?;
        tx.commit().context("commit base schema")?;
        info!(new_file = db.was_created(), "Base schema created");
        Ok(())
    }

    pub fn current_version(&self, db: &Database) -> Result<u32, MigrationError> {
        let conn = db.get_connection()?;
        let version = conn
            .query_row(
                "SELECT Version FROM MigrationVersion WHERE Id = 1",
                [],
                |row| row.get(0),
            )
            .context("read migration version")?;
        Ok(version)
    }

    /// Finds `<prefix>.<N>.sql` scripts, ordered by `N` numerically.
    pub fn discover(&self) -> Result<Vec<MigrationScript>, MigrationError> {
        if !self.migrations_dir.exists() {
            return Ok(Vec::new());
        }

        let mut scripts: BTreeMap<u32, MigrationScript> = BTreeMap::new();
        for entry in fs::read_dir(&self.migrations_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(version) = self.parse_version(&name)? else {
                continue;
            };

            if let Some(existing) = scripts.get(&version) {
                return Err(MigrationError::DuplicateVersion {
                    version,
                    first: existing.name.clone(),
                    second: name,
                });
            }

            let sql = fs::read_to_string(&path)?;
            let checksum = compute_checksum(&sql);
            scripts.insert(
                version,
                MigrationScript {
                    version,
                    name,
                    path,
                    sql,
                    checksum,
                },
            );
        }

        Ok(scripts.into_values().collect())
    }

    /// `Ok(None)` for files outside the naming scheme, an error for files
    /// inside it whose suffix is not a number.
    fn parse_version(&self, file_name: &str) -> Result<Option<u32>, MigrationError> {
        let Some(rest) = file_name
            .strip_prefix(self.prefix.as_str())
            .and_then(|r| r.strip_prefix('.'))
            .and_then(|r| r.strip_suffix(".sql"))
        else {
            return Ok(None);
        };

        let suffix = rest.rsplit('.').next().unwrap_or(rest);
        suffix
            .parse::<u32>()
            .map(Some)
            .map_err(|_| MigrationError::MalformedName(file_name.to_string()))
    }

    /// Applies every script newer than the recorded version, stopping at the
    /// first failure. Returns the scripts applied by this call.
    pub fn apply_pending(&self, db: &Database) -> Result<Vec<AppliedMigration>, MigrationError> {
        let current = self.current_version(db)?;
        let scripts = self.discover()?;
        let journal = self.applied(db)?;

        for script in scripts.iter().filter(|s| s.version <= current) {
            if let Some(entry) = journal.iter().find(|a| a.version == script.version) {
                if entry.checksum != script.checksum {
                    warn!(
                        migration = %script.name,
                        "Applied migration changed on disk since it ran"
                    );
                }
            }
        }

        let mut applied = Vec::new();
        for script in scripts.into_iter().filter(|s| s.version > current) {
            let entry = self.apply(db, &script)?;
            info!(version = entry.version, migration = %entry.name, "Applied migration");
            applied.push(entry);
        }

        if applied.is_empty() {
            debug!(version = current, "Schema is up to date");
        }
        Ok(applied)
    }

    fn apply(&self, db: &Database, script: &MigrationScript) -> Result<AppliedMigration, MigrationError> {
        let mut conn = db.get_connection()?;
        let tx = conn.transaction().context("begin migration")?;

        tx.execute_batch(&script.sql)
            .map_err(|source| MigrationError::ScriptFailed {
                name: script.name.clone(),
                source,
            })?;

        let entry = AppliedMigration {
            version: script.version,
            name: script.name.clone(),
            checksum: script.checksum.clone(),
            applied_at: Utc::now().to_rfc3339(),
        };
        tx.execute(
            "UPDATE MigrationVersion SET Version = ?1 WHERE Id = 1",
            params![entry.version],
        )
        .context("record migration version")?;
        tx.execute(
            "INSERT OR REPLACE INTO _carapp_migrations (version, name, checksum, applied_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.version, entry.name, entry.checksum, entry.applied_at],
        )
        .context("record migration")?;
        tx.commit().context("commit migration")?;

        Ok(entry)
    }

    pub fn applied(&self, db: &Database) -> Result<Vec<AppliedMigration>, MigrationError> {
        let conn = db.get_connection()?;
        let mut stmt = conn
            .prepare("SELECT version, name, checksum, applied_at FROM _carapp_migrations ORDER BY version")
            .context("list applied migrations")?;
        let applied = stmt
            .query_map([], |row| {
                Ok(AppliedMigration {
                    version: row.get(0)?,
                    name: row.get(1)?,
                    checksum: row.get(2)?,
                    applied_at: row.get(3)?,
                })
            })
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .context("list applied migrations")?;
        Ok(applied)
    }

    pub fn status(&self, db: &Database) -> Result<MigrationStatus, MigrationError> {
        let current_version = self.current_version(db)?;
        let applied = self.applied(db)?;
        let pending = self
            .discover()?
            .into_iter()
            .filter(|s| s.version > current_version)
            .map(|s| s.name)
            .collect();

        Ok(MigrationStatus {
            current_version,
            applied,
            pending,
        })
    }

    /// Writes an empty script numbered after the highest one on disk.
    pub fn create(&self, name: &str) -> Result<PathBuf, MigrationError> {
        fs::create_dir_all(&self.migrations_dir)?;

        let next = self
            .discover()?
            .last()
            .map(|s| s.version + 1)
            .unwrap_or(1);
        let filename = format!("{}.{}.sql", self.prefix, next);
        let path = self.migrations_dir.join(&filename);

        let template = format!(
            "-- Migration {}: {}\n-- Created: {}\n\n-- Write your SQL here\n",
            next,
            name,
            Utc::now().to_rfc3339()
        );

        fs::write(&path, template)?;
        Ok(path)
    }
}

fn compute_checksum(sql: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sql.as_bytes());
    let result = hasher.finalize();
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, result)
}
