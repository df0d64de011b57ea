//! Shared test fixtures.

use crate::source::SqliteSource;
use rusqlite::Connection;
use std::path::Path;
use tempfile::TempDir;

/// Create the ARGO source schema and seed data in a SQLite file.
///
/// Three floats; `n_profiles` profile rows with float ids cycling over
/// them. Every profile row has a NULL salinity so null handling is always
/// exercised.
pub(crate) fn seed_source_db(path: &Path, n_profiles: usize) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE argo_floats (
             float_id TEXT PRIMARY KEY,
             first_timestamp TEXT,
             last_timestamp TEXT,
             last_latitude REAL,
             last_longitude REAL,
             total_profiles INTEGER
         );
         CREATE TABLE argo_profiles (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             float_id TEXT,
             timestamp TEXT,
             latitude REAL,
             longitude REAL,
             depth REAL,
             temperature REAL,
             salinity REAL,
             pressure REAL
         );",
    )
    .unwrap();

    for f in 0..3 {
        conn.execute(
            "INSERT INTO argo_floats VALUES (?1, '2010-01-01', '2023-06-01', 12.5, 68.3, ?2)",
            rusqlite::params![format!("590447{}", f), 120 + f],
        )
        .unwrap();
    }
    for i in 0..n_profiles {
        conn.execute(
            "INSERT INTO argo_profiles
             (float_id, timestamp, latitude, longitude, depth, temperature, salinity, pressure)
             VALUES (?1, ?2, 12.5, 68.3, ?3, 28.1, NULL, 5.2)",
            rusqlite::params![
                format!("590447{}", i % 3),
                format!("2023-01-{:02}", (i % 28) + 1),
                i as f64,
            ],
        )
        .unwrap();
    }
}

/// Temp-backed source database with 3 floats and `n_profiles` profiles.
pub(crate) fn fixture(n_profiles: usize) -> (TempDir, SqliteSource) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("argo.db");
    seed_source_db(&path, n_profiles);
    let source = SqliteSource::open(&path).unwrap();
    (dir, source)
}
