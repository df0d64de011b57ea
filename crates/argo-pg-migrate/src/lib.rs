//! # argo-pg-migrate
//!
//! Batched, verified migration of ARGO float observation data from a local
//! SQLite archive to a hosted PostgreSQL instance.
//!
//! The library covers the full workflow:
//!
//! - **Schema provisioning** with drop-and-recreate semantics, so reruns
//!   are idempotent
//! - **Offset-paged batch reads** from the SQLite source
//! - **Two load strategies**: CSV staging streamed through PostgreSQL COPY,
//!   or multi-row parameterized INSERT batches
//! - **Count verification** between source and destination after every run
//!
//! ## Example
//!
//! ```rust,no_run
//! use argo_pg_migrate::{Config, Migrator};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> argo_pg_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let migrator = Migrator::connect(config).await?;
//!     let result = migrator.run().await?;
//!     println!("Loaded {} rows", result.rows_loaded);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod provision;
pub mod source;
pub mod stage;
pub mod target;
pub mod verify;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for convenient access
pub use catalog::MigrationTable;
pub use config::{Config, LoadStrategy, MigrationConfig, SourceConfig, TargetConfig};
pub use error::{MigrateError, Result};
pub use orchestrator::{HealthCheckResult, MigrationResult, Migrator, TableLoad};
pub use provision::SchemaDdl;
pub use source::{BatchReader, SqlValue, SqliteSource};
pub use target::PgTarget;
pub use verify::{TableCount, VerifyReport};
