//! SQLite source database operations.
//!
//! The source is read-only for the duration of a run: one long-lived
//! connection, count-then-page reads, no writes.

use crate::catalog::{self, ColumnSpec, MigrationTable};
use crate::error::{MigrateError, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::{debug, info};

/// A single field value, mirroring SQLite's storage classes for the
/// columns this dataset uses. BLOBs do not occur in the ARGO schema and
/// are rejected rather than coerced.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    /// Render as a CSV staging field. NULL becomes the empty field, which
    /// is what PostgreSQL's CSV COPY mode reads back as NULL.
    pub fn to_csv_field(&self) -> String {
        match self {
            SqlValue::Null => String::new(),
            SqlValue::Integer(v) => v.to_string(),
            SqlValue::Real(v) => v.to_string(),
            SqlValue::Text(s) => s.clone(),
        }
    }

    /// Render as a bind parameter. Everything travels as text and is cast
    /// server-side by the per-column cast from the catalog.
    pub fn as_param(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Integer(v) => Some(v.to_string()),
            SqlValue::Real(v) => Some(v.to_string()),
            SqlValue::Text(s) => Some(s.clone()),
        }
    }
}

/// Read-only handle on the source SQLite database.
#[derive(Debug)]
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    /// Open the source database. Fails fast if the file is missing or if
    /// either ARGO table is absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| MigrateError::connect(format!("sqlite ({})", path.display()), e.to_string()))?;

        let source = Self { conn };

        let tables = source.list_tables()?;
        for table in MigrationTable::ALL {
            if !tables.iter().any(|t| t == table.name()) {
                return Err(MigrateError::connect(
                    format!("sqlite ({})", path.display()),
                    format!("required table {} not found", table),
                ));
            }
        }

        info!("Connected to SQLite: {}", path.display());
        Ok(source)
    }

    /// List user tables in the source database.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let mut rows = stmt.query([])?;
        let mut tables = Vec::new();
        while let Some(row) = rows.next()? {
            tables.push(row.get::<_, String>(0)?);
        }
        Ok(tables)
    }

    /// Authoritative row count, read once per table per run.
    pub fn row_count(&self, table: MigrationTable) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let count = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    /// Introspect the column names of a source table, in declared order.
    pub fn table_columns(&self, table: MigrationTable) -> Result<Vec<String>> {
        let sql = format!("PRAGMA table_info({})", table.name());
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            columns.push(row.get::<_, String>(1)?);
        }
        Ok(columns)
    }

    /// Fetch one page of rows in the given column order.
    pub fn fetch_page(
        &self,
        table: MigrationTable,
        columns: &[ColumnSpec],
        offset: i64,
        limit: usize,
    ) -> Result<Vec<Vec<SqlValue>>> {
        let col_list = columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ");
        // ORDER BY makes the offset pages provably disjoint and complete;
        // without it SQLite is free to return rows in any order per query.
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid LIMIT ?1 OFFSET ?2",
            col_list,
            table.name()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params![limit as i64, offset])?;

        let mut out = Vec::with_capacity(limit.min(4096));
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                let value = match row.get_ref(idx)? {
                    ValueRef::Null => SqlValue::Null,
                    ValueRef::Integer(v) => SqlValue::Integer(v),
                    ValueRef::Real(v) => SqlValue::Real(v),
                    ValueRef::Text(bytes) => SqlValue::Text(
                        std::str::from_utf8(bytes)
                            .map_err(|e| {
                                MigrateError::load(table.name(), None, format!("invalid UTF-8: {}", e))
                            })?
                            .to_string(),
                    ),
                    ValueRef::Blob(_) => {
                        return Err(MigrateError::load(
                            table.name(),
                            None,
                            format!("unexpected BLOB in column {}", columns[idx].name),
                        ))
                    }
                };
                values.push(value);
            }
            out.push(values);
        }

        Ok(out)
    }

    /// Validate introspected columns against the catalog before building
    /// any statement from them.
    pub fn check_columns(&self, table: MigrationTable) -> Result<()> {
        let actual = self.table_columns(table)?;
        catalog::validate_columns(table, &actual)
    }

    /// Cheap liveness probe.
    pub fn ping(&self) -> Result<()> {
        self.conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

/// Offset-cursor pager over one source table.
///
/// The total row count is captured once at construction. Pages are
/// disjoint (`offset` advances by the batch size), the final page may be
/// short, and an empty page ends the sequence even if the offset has not
/// reached the captured total (the count can drift under a long read).
pub struct BatchReader<'a> {
    source: &'a SqliteSource,
    table: MigrationTable,
    columns: &'static [ColumnSpec],
    batch_size: usize,
    total_rows: i64,
    offset: i64,
    done: bool,
}

impl<'a> BatchReader<'a> {
    pub fn new(
        source: &'a SqliteSource,
        table: MigrationTable,
        columns: &'static [ColumnSpec],
        batch_size: usize,
    ) -> Result<Self> {
        debug_assert!(batch_size >= 1);
        let total_rows = source.row_count(table)?;
        debug!("{}: {} rows, batch size {}", table, total_rows, batch_size);
        Ok(Self {
            source,
            table,
            columns,
            batch_size,
            total_rows,
            offset: 0,
            done: false,
        })
    }

    /// Row count captured at construction.
    pub fn total_rows(&self) -> i64 {
        self.total_rows
    }

    /// Current read offset.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Next page, or `None` when the table is exhausted.
    pub fn next_batch(&mut self) -> Result<Option<Vec<Vec<SqlValue>>>> {
        if self.done || self.offset >= self.total_rows {
            return Ok(None);
        }

        let rows = self
            .source
            .fetch_page(self.table, self.columns, self.offset, self.batch_size)?;

        if rows.is_empty() {
            self.done = true;
            return Ok(None);
        }

        self.offset += self.batch_size as i64;
        Ok(Some(rows))
    }
}
