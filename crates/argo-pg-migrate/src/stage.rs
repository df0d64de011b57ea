//! CSV staging for the bulk-copy strategy.
//!
//! Format: first line is the comma-separated column names, then one record
//! per row in destination column order, UTF-8, empty field for NULL.

use crate::catalog::MigrationTable;
use crate::config::MigrationConfig;
use crate::error::{MigrateError, Result};
use crate::source::{BatchReader, SqliteSource};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Export both tables to the configured staging directory, in dependency
/// order, with per-table batch sizes. Source-only: no destination
/// connection is involved.
pub fn export_all(
    source: &SqliteSource,
    config: &MigrationConfig,
) -> Result<Vec<(MigrationTable, PathBuf, u64)>> {
    let mut out = Vec::new();
    for table in MigrationTable::ALL {
        source.check_columns(table)?;
        let batch_size = match table {
            MigrationTable::Floats => config.get_floats_batch_size(),
            MigrationTable::Profiles => config.get_profiles_batch_size(),
        };
        let (path, rows) = export_table(source, table, &config.staging_dir, batch_size)?;
        out.push((table, path, rows));
    }
    Ok(out)
}

/// Export one table to `<staging_dir>/<table>.csv`, paging through the
/// source. Returns the file path and the number of data rows written.
pub fn export_table(
    source: &SqliteSource,
    table: MigrationTable,
    staging_dir: &Path,
    batch_size: usize,
) -> Result<(PathBuf, u64)> {
    let path = staging_dir.join(table.csv_file_name());
    let mut writer = csv::Writer::from_path(&path)?;

    let columns = table.columns();
    writer.write_record(columns.iter().map(|c| c.name))?;

    let mut reader = BatchReader::new(source, table, columns, batch_size)?;
    info!("{}: exporting {} rows to {}", table, reader.total_rows(), path.display());

    let mut rows_written: u64 = 0;
    while let Some(batch) = reader.next_batch()? {
        for row in &batch {
            writer.write_record(row.iter().map(|v| v.to_csv_field()))?;
        }
        rows_written += batch.len() as u64;
        debug!("{}: staged {} rows", table, rows_written);
    }

    writer
        .flush()
        .map_err(|e| MigrateError::load(table.name(), None, format!("flush failed: {}", e)))?;

    info!("{}: exported {} rows", table, rows_written);
    Ok((path, rows_written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::fixture;
    use tempfile::TempDir;

    #[test]
    fn test_export_writes_header_and_rows() {
        let (_db_dir, source) = fixture(5);
        let out = TempDir::new().unwrap();

        let (path, rows) =
            export_table(&source, MigrationTable::Floats, out.path(), 2).unwrap();
        assert_eq!(rows, 3);
        assert!(path.ends_with("argo_floats.csv"));

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "float_id,first_timestamp,last_timestamp,last_latitude,last_longitude,total_profiles"
        );
        assert_eq!(
            lines.next().unwrap(),
            "5904470,2010-01-01,2023-06-01,12.5,68.3,120"
        );
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn test_export_null_becomes_empty_field() {
        let (_db_dir, source) = fixture(1);
        let out = TempDir::new().unwrap();

        let (path, rows) =
            export_table(&source, MigrationTable::Profiles, out.path(), 10).unwrap();
        assert_eq!(rows, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        let data_line = content.lines().nth(1).unwrap();
        // id,float_id,timestamp,lat,lon,depth,temp,salinity,pressure
        let fields: Vec<&str> = data_line.split(',').collect();
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[7], "", "NULL salinity must stage as empty field");
        assert_eq!(fields[8], "5.2");
    }

    #[test]
    fn test_export_all_stages_both_tables() {
        let (_db_dir, source) = fixture(5);
        let out = TempDir::new().unwrap();
        let config = MigrationConfig {
            staging_dir: out.path().to_path_buf(),
            ..MigrationConfig::default()
        };

        let staged = export_all(&source, &config).unwrap();
        assert_eq!(staged.len(), 2);
        assert_eq!(staged[0].0, MigrationTable::Floats);
        assert_eq!(staged[0].2, 3);
        assert_eq!(staged[1].0, MigrationTable::Profiles);
        assert_eq!(staged[1].2, 5);
        assert!(out.path().join("argo_floats.csv").exists());
        assert!(out.path().join("argo_profiles.csv").exists());
    }

    #[test]
    fn test_export_to_missing_dir_is_csv_error() {
        let (_db_dir, source) = fixture(1);
        let err = export_table(
            &source,
            MigrationTable::Floats,
            Path::new("/nonexistent/staging/dir"),
            10,
        )
        .unwrap_err();
        assert!(matches!(err, MigrateError::Csv(_)));
    }

    #[test]
    fn test_export_row_count_matches_source() {
        let (_db_dir, source) = fixture(17);
        let out = TempDir::new().unwrap();
        let (path, rows) =
            export_table(&source, MigrationTable::Profiles, out.path(), 4).unwrap();
        assert_eq!(rows, 17);
        // header + 17 data lines
        assert_eq!(std::fs::read_to_string(path).unwrap().lines().count(), 18);
    }
}
