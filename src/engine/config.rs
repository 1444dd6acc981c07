//! CarApp Configuration Module
//! Handles loading and validating carapp.config.json

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "carapp.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Invalid config format: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub migrations: MigrationsConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// How long SQLite waits on a locked file before giving up.
    #[serde(default)]
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationsConfig {
    #[serde(default = "default_migrations_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_migrations_prefix")]
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_schema: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
    #[serde(default = "default_file_version")]
    pub file_version: Option<u32>,
    #[serde(default)]
    pub backup_before_import: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("CarApp.db")
}

fn default_pool_size() -> u32 {
    4
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_migrations_prefix() -> String {
    "CreateDatabase".to_string()
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("CarAppData.json")
}

fn default_file_version() -> Option<u32> {
    Some(1)
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            pool_size: default_pool_size(),
            busy_timeout_ms: 0,
        }
    }
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: default_migrations_dir(),
            prefix: default_migrations_prefix(),
            base_schema: None,
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
            file_version: default_file_version(),
            backup_before_import: false,
        }
    }
}

impl Config {
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = project_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path));
        }
        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(project_dir: &Path) -> Result<Self, ConfigError> {
        match Self::load(project_dir) {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, project_dir: &Path) -> Result<(), ConfigError> {
        let config_path = project_dir.join(CONFIG_FILE_NAME);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn db_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.database.path)
    }

    pub fn migrations_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.migrations.dir)
    }

    pub fn snapshot_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.snapshot.path)
    }

    pub fn base_schema_path(&self, project_dir: &Path) -> Option<PathBuf> {
        self.migrations
            .base_schema
            .as_ref()
            .map(|p| project_dir.join(p))
    }

    /// Backup target used before a destructive import.
    pub fn backup_path(&self, project_dir: &Path) -> PathBuf {
        let mut name = self.db_path(project_dir).into_os_string();
        name.push(".bak");
        PathBuf::from(name)
    }
}
