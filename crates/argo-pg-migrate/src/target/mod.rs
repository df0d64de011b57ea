//! PostgreSQL target database operations.
//!
//! One long-lived client for the run. The connection task is spawned at
//! connect time and aborted on drop, so the target is released on every
//! exit path.

use crate::catalog::{self, MigrationTable};
use crate::error::{MigrateError, Result};
use crate::provision::SchemaDdl;
use crate::source::SqlValue;
use bytes::BytesMut;
use futures::SinkExt;
use std::io::BufRead;
use tokio::task::JoinHandle;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, info, warn};

/// Flush the COPY buffer once it grows past this size.
const COPY_FLUSH_BYTES: usize = 1024 * 1024;

/// Handle on the destination PostgreSQL database.
pub struct PgTarget {
    client: Client,
    conn_task: JoinHandle<()>,
}

impl PgTarget {
    /// Connect to the destination and verify the connection with a probe
    /// query.
    pub async fn connect(config: &crate::config::TargetConfig) -> Result<Self> {
        let endpoint = format!("postgres ({}:{}/{})", config.host, config.port, config.database);

        let (client, connection) = tokio_postgres::connect(&config.connection_string(), NoTls)
            .await
            .map_err(|e| MigrateError::connect(&endpoint, e.to_string()))?;

        let conn_task = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("PostgreSQL connection error: {}", e);
            }
        });

        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| MigrateError::connect(&endpoint, e.to_string()))?;

        info!("Connected to PostgreSQL: {}:{}/{}", config.host, config.port, config.database);

        Ok(Self { client, conn_task })
    }

    /// Cheap liveness probe.
    pub async fn ping(&self) -> Result<()> {
        self.client.simple_query("SELECT 1").await?;
        Ok(())
    }

    /// Drop and recreate the destination schema inside one transaction.
    /// On failure the transaction rolls back and the destination keeps its
    /// pre-run state.
    pub async fn apply_schema(&mut self, ddl: &SchemaDdl) -> Result<()> {
        let tx = self
            .client
            .transaction()
            .await
            .map_err(|e| MigrateError::schema(e.to_string()))?;

        // Drop dependents first; CASCADE also removes the indexes.
        for table in MigrationTable::ALL.iter().rev() {
            let drop = format!("DROP TABLE IF EXISTS {} CASCADE", table.name());
            tx.batch_execute(&drop)
                .await
                .map_err(|e| MigrateError::schema(format!("{}: {}", drop, e)))?;
            debug!("Dropped table {}", table);
        }

        for stmt in ddl.statements() {
            tx.batch_execute(stmt)
                .await
                .map_err(|e| MigrateError::schema(format!("statement failed: {} ({})", e, stmt)))?;
        }

        tx.commit()
            .await
            .map_err(|e| MigrateError::schema(e.to_string()))?;

        info!("Provisioned destination schema ({} statements)", ddl.statements().len());
        Ok(())
    }

    /// Load one batch with a single multi-row parameterized INSERT.
    ///
    /// The statement is its own transaction: the batch commits wholly or
    /// not at all. Earlier batches stay committed if a later one fails.
    pub async fn insert_batch(
        &self,
        table: MigrationTable,
        batch_index: usize,
        rows: &[Vec<SqlValue>],
    ) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let cols = table.insert_columns();
        debug_assert!(rows.iter().all(|r| r.len() == cols.len()));

        let sql = build_insert_sql(table, rows.len());
        let params: Vec<Option<String>> = rows
            .iter()
            .flat_map(|row| row.iter().map(SqlValue::as_param))
            .collect();
        let param_refs: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect();

        let inserted = self
            .client
            .execute(&sql, &param_refs)
            .await
            .map_err(|e| MigrateError::load(table.name(), Some(batch_index), e.to_string()))?;

        Ok(inserted)
    }

    /// Ingest a whole CSV stream via the COPY protocol, in one
    /// transaction. The first line must be the column header; it is
    /// validated against the catalog and then skipped. Any failure,
    /// including truncated or malformed input, rolls the whole table load
    /// back.
    pub async fn copy_csv<R: BufRead>(&mut self, table: MigrationTable, mut reader: R) -> Result<u64> {
        let cols = table.columns();
        let col_list = cols.iter().map(|c| c.name).collect::<Vec<_>>().join(", ");

        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 {
            return Err(MigrateError::load(table.name(), None, "staging stream is empty"));
        }
        let header_cols: Vec<String> = header
            .trim_end_matches(['\r', '\n'])
            .split(',')
            .map(str::to_string)
            .collect();
        catalog::validate_columns(table, &header_cols)?;

        let copy_stmt = format!(
            "COPY {} ({}) FROM STDIN WITH (FORMAT csv)",
            table.name(),
            col_list
        );

        let tx = self.client.transaction().await?;
        let sink = tx
            .copy_in(&copy_stmt)
            .await
            .map_err(|e| MigrateError::load(table.name(), None, e.to_string()))?;
        futures::pin_mut!(sink);

        let mut buf = BytesMut::with_capacity(COPY_FLUSH_BYTES);
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            buf.extend_from_slice(line.as_bytes());
            if buf.len() >= COPY_FLUSH_BYTES {
                sink.send(buf.split().freeze())
                    .await
                    .map_err(|e| MigrateError::load(table.name(), None, format!("COPY send failed: {}", e)))?;
            }
        }
        if !buf.is_empty() {
            sink.send(buf.split().freeze())
                .await
                .map_err(|e| MigrateError::load(table.name(), None, format!("COPY send failed: {}", e)))?;
        }

        let copied = sink
            .finish()
            .await
            .map_err(|e| MigrateError::load(table.name(), None, e.to_string()))?;

        tx.commit().await?;
        Ok(copied)
    }

    /// Row count for verification.
    pub async fn row_count(&self, table: MigrationTable) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let row = self.client.query_one(&sql, &[]).await?;
        Ok(row.get(0))
    }
}

impl Drop for PgTarget {
    fn drop(&mut self) {
        self.conn_task.abort();
    }
}

/// Build a multi-row INSERT with one cast placeholder per column.
fn build_insert_sql(table: MigrationTable, n_rows: usize) -> String {
    let cols = table.insert_columns();
    let col_list = cols.iter().map(|c| c.name).collect::<Vec<_>>().join(", ");

    let mut value_rows = Vec::with_capacity(n_rows);
    let mut idx = 1;
    for _ in 0..n_rows {
        let placeholders: Vec<String> = cols
            .iter()
            .map(|c| {
                let p = format!("${}{}", idx, c.cast);
                idx += 1;
                p
            })
            .collect();
        value_rows.push(format!("({})", placeholders.join(", ")));
    }

    format!(
        "INSERT INTO {} ({}) VALUES {}",
        table.name(),
        col_list,
        value_rows.join(", ")
    )
}
