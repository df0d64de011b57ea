//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Could not establish a connection to one of the stores.
    /// Fatal before any data motion.
    #[error("Cannot connect to {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    /// Source database (SQLite) query error
    #[error("Source database error: {0}")]
    Source(#[from] rusqlite::Error),

    /// Target database (PostgreSQL) query error
    #[error("Target database error: {0}")]
    Target(#[from] tokio_postgres::Error),

    /// DDL application failed; the provisioning transaction was rolled back.
    #[error("Schema provisioning failed: {message}")]
    Schema { message: String },

    /// A bulk-copy or batch-insert operation failed for a specific table.
    #[error("Load failed for table {table}{}: {message}", .batch.map(|b| format!(" (batch {})", b)).unwrap_or_default())]
    Load {
        table: String,
        batch: Option<usize>,
        message: String,
    },

    /// Source column introspection does not match the expected schema.
    #[error("Column mismatch for table {table}: expected [{expected}], got [{actual}]")]
    ColumnMismatch {
        table: String,
        expected: String,
        actual: String,
    },

    /// A post-run check failed: row counts disagree or a health probe
    /// came back unhealthy.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// IO error (staging files, schema file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV staging read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Connect error.
    pub fn connect(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Connect {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a Schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        MigrateError::Schema {
            message: message.into(),
        }
    }

    /// Create a Load error for a specific table and batch.
    pub fn load(table: impl Into<String>, batch: Option<usize>, message: impl Into<String>) -> Self {
        MigrateError::Load {
            table: table.into(),
            batch,
            message: message.into(),
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => 2,
            MigrateError::Connect { .. } => 3,
            MigrateError::Schema { .. } => 4,
            MigrateError::Load { .. } | MigrateError::ColumnMismatch { .. } => 5,
            MigrateError::Validation(_) => 6,
            _ => 1,
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
