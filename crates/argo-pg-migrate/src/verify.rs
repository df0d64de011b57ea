//! Post-load reconciliation: authoritative row counts, both sides.
//!
//! Cardinality only, by design. A mismatch is reported, never repaired.

use crate::catalog::MigrationTable;
use crate::error::Result;
use crate::source::SqliteSource;
use crate::target::PgTarget;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Per-table count comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCount {
    pub table: String,
    pub source_rows: i64,
    pub target_rows: i64,
    pub matched: bool,
}

impl TableCount {
    pub fn new(table: impl Into<String>, source_rows: i64, target_rows: i64) -> Self {
        Self {
            table: table.into(),
            source_rows,
            target_rows,
            matched: source_rows == target_rows,
        }
    }
}

/// Full reconciliation report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyReport {
    pub tables: Vec<TableCount>,
}

impl VerifyReport {
    /// True when every table's counts agree.
    pub fn all_match(&self) -> bool {
        self.tables.iter().all(|t| t.matched)
    }
}

/// Compare row counts for the given tables.
pub async fn verify(
    source: &SqliteSource,
    target: &PgTarget,
    tables: &[MigrationTable],
) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();

    for &table in tables {
        let source_rows = source.row_count(table)?;
        let target_rows = target.row_count(table).await?;
        let entry = TableCount::new(table.name(), source_rows, target_rows);

        if entry.matched {
            info!("{}: {} rows (match)", table, source_rows);
        } else {
            warn!(
                "{}: source={} target={} (MISMATCH)",
                table, source_rows, target_rows
            );
        }

        report.tables.push(entry);
    }

    Ok(report)
}
