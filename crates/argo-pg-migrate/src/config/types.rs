//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (SQLite).
    pub source: SourceConfig,

    /// Target database configuration (PostgreSQL).
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Source database (SQLite) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
}

/// Target database (PostgreSQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    pub password: String,

    /// SSL mode (default: "require").
    #[serde(default = "default_require")]
    pub ssl_mode: String,
}

// Manual Debug so the password never reaches logs.
impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Which bulk-load strategy moves the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStrategy {
    /// Parameterized multi-row INSERT, committed per batch.
    #[default]
    Insert,

    /// CSV staging files ingested via the COPY protocol, one transaction
    /// per table.
    Copy,
}

impl fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStrategy::Insert => f.write_str("insert"),
            LoadStrategy::Copy => f.write_str("copy"),
        }
    }
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MigrationConfig {
    /// Load strategy (default: insert).
    #[serde(default)]
    pub strategy: LoadStrategy,

    /// Rows per batch for argo_floats (default: 2000).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floats_batch_size: Option<usize>,

    /// Rows per batch for argo_profiles (default: 5000).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles_batch_size: Option<usize>,

    /// Path to a DDL file overriding the built-in destination schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_file: Option<PathBuf>,

    /// Directory for CSV staging files (default: current directory).
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Skip the post-load count reconciliation (default: false).
    #[serde(default)]
    pub skip_verify: bool,
}

impl MigrationConfig {
    pub fn get_floats_batch_size(&self) -> usize {
        self.floats_batch_size.unwrap_or(2_000)
    }

    pub fn get_profiles_batch_size(&self) -> usize {
        self.profiles_batch_size.unwrap_or(5_000)
    }
}

fn default_pg_port() -> u16 {
    5432
}

fn default_require() -> String {
    "require".to_string()
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from(".")
}
