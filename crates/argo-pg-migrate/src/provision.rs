//! Destination schema definition.
//!
//! The DDL is configuration, not generated: a built-in `argo_schema.sql`
//! ships with the crate and a `schema_file` config entry can override it.
//! This module only splits the blob into executable statements; the
//! transactional apply lives on [`crate::target::PgTarget`].

use crate::error::{MigrateError, Result};
use std::path::Path;

/// Built-in destination DDL (two tables, five indexes).
const BUILTIN_DDL: &str = include_str!("../schema/argo_schema.sql");

/// A parsed set of DDL statements, applied in order.
#[derive(Debug, Clone)]
pub struct SchemaDdl {
    statements: Vec<String>,
}

impl SchemaDdl {
    /// The built-in ARGO schema.
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_DDL)
    }

    /// Load an override DDL file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let sql = std::fs::read_to_string(path.as_ref())?;
        let ddl = Self::parse(&sql);
        if ddl.statements.is_empty() {
            return Err(MigrateError::schema(format!(
                "schema file {} contains no statements",
                path.as_ref().display()
            )));
        }
        Ok(ddl)
    }

    /// Split a DDL blob into statements on semicolons, honoring single
    /// quotes and stripping `--` line comments.
    pub fn parse(sql: &str) -> Self {
        let mut statements = Vec::new();
        let mut current = String::new();
        let mut in_string = false;
        let mut chars = sql.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\'' => {
                    in_string = !in_string;
                    current.push(c);
                }
                '-' if !in_string && chars.peek() == Some(&'-') => {
                    // Line comment: consume to end of line.
                    for c in chars.by_ref() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                ';' if !in_string => {
                    let stmt = current.trim();
                    if !stmt.is_empty() {
                        statements.push(stmt.to_string());
                    }
                    current.clear();
                }
                _ => current.push(c),
            }
        }
        let tail = current.trim();
        if !tail.is_empty() {
            statements.push(tail.to_string());
        }

        Self { statements }
    }

    /// The statements, in execution order.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_two_tables_and_five_indexes() {
        let ddl = SchemaDdl::builtin();
        let creates_tables = ddl
            .statements()
            .iter()
            .filter(|s| s.starts_with("CREATE TABLE"))
            .count();
        let creates_indexes = ddl
            .statements()
            .iter()
            .filter(|s| s.starts_with("CREATE INDEX"))
            .count();
        assert_eq!(creates_tables, 2);
        assert_eq!(creates_indexes, 5);
        assert_eq!(ddl.statements().len(), 7);
    }

    #[test]
    fn test_builtin_creates_floats_before_profiles() {
        let ddl = SchemaDdl::builtin();
        let floats = ddl
            .statements()
            .iter()
            .position(|s| s.contains("argo_floats"))
            .unwrap();
        let profiles = ddl
            .statements()
            .iter()
            .position(|s| s.contains("argo_profiles"))
            .unwrap();
        assert!(floats < profiles);
    }

    #[test]
    fn test_parse_strips_comments() {
        let ddl = SchemaDdl::parse("-- a comment\nCREATE TABLE t (x INTEGER); -- trailing\n");
        assert_eq!(ddl.statements(), ["CREATE TABLE t (x INTEGER)"]);
    }

    #[test]
    fn test_parse_ignores_semicolons_in_strings() {
        let ddl = SchemaDdl::parse("INSERT INTO t VALUES ('a;b'); SELECT 1");
        assert_eq!(ddl.statements().len(), 2);
        assert_eq!(ddl.statements()[0], "INSERT INTO t VALUES ('a;b')");
    }

    #[test]
    fn test_parse_handles_missing_trailing_semicolon() {
        let ddl = SchemaDdl::parse("CREATE TABLE a (x INTEGER);\nCREATE TABLE b (y INTEGER)");
        assert_eq!(ddl.statements().len(), 2);
    }
}
