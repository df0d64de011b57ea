//! Migration orchestrator - main workflow coordinator.
//!
//! `Migrator` is the session object for exactly one run: it owns the two
//! long-lived connections and walks the phases strictly sequentially
//! (provision, load in dependency order, verify). Both connections are
//! released on drop, on every exit path.

use crate::catalog::MigrationTable;
use crate::config::{Config, LoadStrategy};
use crate::error::{MigrateError, Result};
use crate::provision::SchemaDdl;
use crate::source::{BatchReader, SqliteSource};
use crate::stage;
use crate::target::PgTarget;
use crate::verify::{self, VerifyReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Migration orchestrator.
pub struct Migrator {
    config: Config,
    source: SqliteSource,
    target: PgTarget,
}

/// Rows loaded into one destination table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableLoad {
    pub table: String,
    pub rows: u64,
    pub seconds: f64,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status: "completed" or "completed_with_mismatch".
    pub status: String,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Load strategy used.
    pub strategy: String,

    /// Per-table load details, in load order.
    pub tables: Vec<TableLoad>,

    /// Total rows loaded.
    pub rows_loaded: u64,

    /// Count reconciliation report (None when verification was skipped).
    pub verify: Option<VerifyReport>,
}

impl MigrationResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Result of a connectivity health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub source_connected: bool,
    pub source_latency_ms: u64,
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    pub target_error: Option<String>,
    pub healthy: bool,
}

impl Migrator {
    /// Open both connections. Fails before any data motion if either side
    /// is unreachable.
    pub async fn connect(config: Config) -> Result<Self> {
        let source = SqliteSource::open(&config.source.path)?;
        let target = PgTarget::connect(&config.target).await?;
        Ok(Self {
            config,
            source,
            target,
        })
    }

    /// Run the full migration: provision, load both tables in dependency
    /// order, verify.
    pub async fn run(mut self) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let strategy = self.config.migration.strategy;

        info!("Starting migration run {} (strategy: {})", run_id, strategy);

        // Phase 1: provision. Always drop-and-recreate, so a rerun after a
        // partial failure can never duplicate rows.
        info!("Phase 1: Provisioning destination schema");
        let ddl = self.schema_ddl()?;
        self.target.apply_schema(&ddl).await?;

        // Phase 2: load, parent table first.
        info!("Phase 2: Loading tables");
        let mut tables = Vec::new();
        for table in MigrationTable::ALL {
            let table_start = Instant::now();
            self.source.check_columns(table)?;

            let rows = match strategy {
                LoadStrategy::Insert => self.load_table_insert(table).await?,
                LoadStrategy::Copy => {
                    let staging_dir = self.config.migration.staging_dir.clone();
                    let batch_size = self.batch_size(table);
                    let (path, staged) =
                        stage::export_table(&self.source, table, &staging_dir, batch_size)?;
                    debug!("{}: staged {} rows at {}", table, staged, path.display());
                    self.load_table_copy(table, &path).await?
                }
            };

            let seconds = table_start.elapsed().as_secs_f64();
            info!("{}: loaded {} rows in {:.1}s", table, rows, seconds);
            tables.push(TableLoad {
                table: table.name().to_string(),
                rows,
                seconds,
            });
        }

        // Phase 3: verify. A mismatch is reported, not raised; data
        // motion is already done.
        let verify_report = if self.config.migration.skip_verify {
            None
        } else {
            info!("Phase 3: Verifying row counts");
            Some(verify::verify(&self.source, &self.target, &MigrationTable::ALL).await?)
        };

        let completed_at = Utc::now();
        let duration_seconds = start.elapsed().as_secs_f64();
        let rows_loaded = tables.iter().map(|t| t.rows).sum();

        let status = match &verify_report {
            Some(report) if !report.all_match() => {
                warn!("Migration completed with count mismatches");
                "completed_with_mismatch"
            }
            _ => "completed",
        };

        info!(
            "Migration {}: {} rows in {:.1}s",
            status, rows_loaded, duration_seconds
        );

        Ok(MigrationResult {
            run_id,
            status: status.to_string(),
            started_at,
            completed_at,
            duration_seconds,
            strategy: strategy.to_string(),
            tables,
            rows_loaded,
            verify: verify_report,
        })
    }

    /// Provision and bulk-load previously staged CSV files, then verify.
    pub async fn import_csv(mut self) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        info!("Starting CSV import run {}", run_id);

        info!("Phase 1: Provisioning destination schema");
        let ddl = self.schema_ddl()?;
        self.target.apply_schema(&ddl).await?;

        info!("Phase 2: Bulk-loading staged files");
        let mut tables = Vec::new();
        for table in MigrationTable::ALL {
            let path = self.config.migration.staging_dir.join(table.csv_file_name());
            if !path.exists() {
                return Err(MigrateError::load(
                    table.name(),
                    None,
                    format!("staging file not found: {}", path.display()),
                ));
            }
            let table_start = Instant::now();
            let rows = self.load_table_copy(table, &path).await?;
            let seconds = table_start.elapsed().as_secs_f64();
            info!("{}: loaded {} rows in {:.1}s", table, rows, seconds);
            tables.push(TableLoad {
                table: table.name().to_string(),
                rows,
                seconds,
            });
        }

        let verify_report = if self.config.migration.skip_verify {
            None
        } else {
            info!("Phase 3: Verifying row counts");
            Some(verify::verify(&self.source, &self.target, &MigrationTable::ALL).await?)
        };

        let completed_at = Utc::now();
        let duration_seconds = start.elapsed().as_secs_f64();
        let rows_loaded = tables.iter().map(|t| t.rows).sum();
        let status = match &verify_report {
            Some(report) if !report.all_match() => "completed_with_mismatch",
            _ => "completed",
        };

        Ok(MigrationResult {
            run_id,
            status: status.to_string(),
            started_at,
            completed_at,
            duration_seconds,
            strategy: LoadStrategy::Copy.to_string(),
            tables,
            rows_loaded,
            verify: verify_report,
        })
    }

    /// Compare row counts between source and destination without moving
    /// any data.
    pub async fn validate(&self) -> Result<VerifyReport> {
        verify::verify(&self.source, &self.target, &MigrationTable::ALL).await
    }

    /// Probe both stores independently. Never fails; failures are carried
    /// in the result.
    pub async fn health_check(config: &Config) -> HealthCheckResult {
        let start = Instant::now();
        let (source_connected, source_error) =
            match SqliteSource::open(&config.source.path).and_then(|s| s.ping()) {
                Ok(()) => (true, None),
                Err(e) => (false, Some(e.to_string())),
            };
        let source_latency_ms = start.elapsed().as_millis() as u64;

        let start = Instant::now();
        let (target_connected, target_error) = match PgTarget::connect(&config.target).await {
            Ok(target) => match target.ping().await {
                Ok(()) => (true, None),
                Err(e) => (false, Some(e.to_string())),
            },
            Err(e) => (false, Some(e.to_string())),
        };
        let target_latency_ms = start.elapsed().as_millis() as u64;

        HealthCheckResult {
            source_connected,
            source_latency_ms,
            source_error,
            target_connected,
            target_latency_ms,
            target_error,
            healthy: source_connected && target_connected,
        }
    }

    /// Load one table with the batched-insert strategy.
    async fn load_table_insert(&self, table: MigrationTable) -> Result<u64> {
        let batch_size = self.batch_size(table);
        let mut reader =
            BatchReader::new(&self.source, table, table.insert_columns(), batch_size)?;
        let total = reader.total_rows();
        info!("{}: {} rows to load (batch size {})", table, total, batch_size);

        let mut rows_loaded: u64 = 0;
        let mut batch_index = 0;
        while let Some(batch) = reader.next_batch()? {
            batch_index += 1;
            rows_loaded += self.target.insert_batch(table, batch_index, &batch).await?;
            debug!(
                "{}: progress {}/{} (batch {})",
                table, rows_loaded, total, batch_index
            );
        }

        Ok(rows_loaded)
    }

    /// Load one table by streaming a staged CSV file through COPY.
    async fn load_table_copy(&mut self, table: MigrationTable, path: &Path) -> Result<u64> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        self.target.copy_csv(table, reader).await
    }

    /// Per-table batch size from config.
    fn batch_size(&self, table: MigrationTable) -> usize {
        match table {
            MigrationTable::Floats => self.config.migration.get_floats_batch_size(),
            MigrationTable::Profiles => self.config.migration.get_profiles_batch_size(),
        }
    }

    /// Destination DDL: the configured override file, or the built-in
    /// schema.
    fn schema_ddl(&self) -> Result<SchemaDdl> {
        match &self.config.migration.schema_file {
            Some(path) => SchemaDdl::from_file(path),
            None => Ok(SchemaDdl::builtin()),
        }
    }
}
