//! Closed catalog of the tables this tool migrates.
//!
//! Table names are never accepted as free-form strings: every query is built
//! from this enum, and the source's introspected column set is validated
//! against the expected columns before any statement is generated.

use crate::error::{MigrateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A destination column: name plus the PostgreSQL cast applied to its
/// insert placeholder. All parameters travel as text and are cast
/// server-side, so a non-numeric value aimed at a float column fails the
/// load instead of being coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub cast: &'static str,
}

const FLOAT_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { name: "float_id", cast: "::text" },
    ColumnSpec { name: "first_timestamp", cast: "::text" },
    ColumnSpec { name: "last_timestamp", cast: "::text" },
    ColumnSpec { name: "last_latitude", cast: "::double precision" },
    ColumnSpec { name: "last_longitude", cast: "::double precision" },
    ColumnSpec { name: "total_profiles", cast: "::integer" },
];

const PROFILE_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { name: "id", cast: "::bigint" },
    ColumnSpec { name: "float_id", cast: "::text" },
    ColumnSpec { name: "timestamp", cast: "::text" },
    ColumnSpec { name: "latitude", cast: "::double precision" },
    ColumnSpec { name: "longitude", cast: "::double precision" },
    ColumnSpec { name: "depth", cast: "::double precision" },
    ColumnSpec { name: "temperature", cast: "::double precision" },
    ColumnSpec { name: "salinity", cast: "::double precision" },
    ColumnSpec { name: "pressure", cast: "::double precision" },
];

/// The two tables of the ARGO dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationTable {
    Floats,
    Profiles,
}

impl MigrationTable {
    /// All tables in load dependency order: `argo_floats` rows are
    /// referenced by `argo_profiles.float_id`, so floats load first.
    pub const ALL: [MigrationTable; 2] = [MigrationTable::Floats, MigrationTable::Profiles];

    /// Table name, identical on both sides.
    pub fn name(&self) -> &'static str {
        match self {
            MigrationTable::Floats => "argo_floats",
            MigrationTable::Profiles => "argo_profiles",
        }
    }

    /// Full column set in source/destination order (includes the synthetic
    /// `id` on profiles).
    pub fn columns(&self) -> &'static [ColumnSpec] {
        match self {
            MigrationTable::Floats => FLOAT_COLUMNS,
            MigrationTable::Profiles => PROFILE_COLUMNS,
        }
    }

    /// Columns used by the batched-insert strategy. The profiles `id` is
    /// BIGSERIAL on the destination and gets assigned on insert, so it is
    /// excluded here; the CSV bulk path carries it verbatim instead.
    pub fn insert_columns(&self) -> &'static [ColumnSpec] {
        match self {
            MigrationTable::Floats => FLOAT_COLUMNS,
            MigrationTable::Profiles => &PROFILE_COLUMNS[1..],
        }
    }

    /// Staging file name for the CSV strategy.
    pub fn csv_file_name(&self) -> String {
        format!("{}.csv", self.name())
    }

    /// Resolve a known table by name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "argo_floats" => Some(MigrationTable::Floats),
            "argo_profiles" => Some(MigrationTable::Profiles),
            _ => None,
        }
    }
}

impl fmt::Display for MigrationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validate a runtime-introspected column set against the catalog.
///
/// Order matters: batches are positional tuples, so a reordered source
/// table would silently scramble fields if we only compared sets.
pub fn validate_columns(table: MigrationTable, actual: &[String]) -> Result<()> {
    let expected = table.columns();
    let matches = actual.len() == expected.len()
        && actual.iter().zip(expected).all(|(a, e)| a == e.name);

    if matches {
        Ok(())
    } else {
        Err(MigrateError::ColumnMismatch {
            table: table.name().to_string(),
            expected: expected
                .iter()
                .map(|c| c.name)
                .collect::<Vec<_>>()
                .join(", "),
            actual: actual.join(", "),
        })
    }
}
