//! Configuration validation.

use super::Config;
use crate::catalog::MigrationTable;
use crate::error::{MigrateError, Result};

/// PostgreSQL caps prepared statements at 65535 bind parameters.
const MAX_BIND_PARAMS: usize = u16::MAX as usize;

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.path.as_os_str().is_empty() {
        return Err(MigrateError::Config("source.path is required".into()));
    }

    // Target validation
    if config.target.host.is_empty() {
        return Err(MigrateError::Config("target.host is required".into()));
    }
    if config.target.database.is_empty() {
        return Err(MigrateError::Config("target.database is required".into()));
    }
    if config.target.user.is_empty() {
        return Err(MigrateError::Config("target.user is required".into()));
    }

    // Migration config validation
    if let Some(0) = config.migration.floats_batch_size {
        return Err(MigrateError::Config(
            "migration.floats_batch_size must be at least 1".into(),
        ));
    }
    if let Some(0) = config.migration.profiles_batch_size {
        return Err(MigrateError::Config(
            "migration.profiles_batch_size must be at least 1".into(),
        ));
    }

    // A batch must fit in one parameterized statement.
    for (table, batch_size) in [
        (MigrationTable::Floats, config.migration.get_floats_batch_size()),
        (MigrationTable::Profiles, config.migration.get_profiles_batch_size()),
    ] {
        let max_rows = MAX_BIND_PARAMS / table.insert_columns().len();
        if batch_size > max_rows {
            return Err(MigrateError::Config(format!(
                "batch size {} for {} exceeds the maximum of {} rows per statement",
                batch_size, table, max_rows
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MigrationConfig, SourceConfig, TargetConfig};
    use std::path::PathBuf;

    fn valid_config() -> Config {
        Config {
            source: SourceConfig {
                path: PathBuf::from("argo_database.db"),
            },
            target: TargetConfig {
                host: "db.example.supabase.co".to_string(),
                port: 5432,
                database: "postgres".to_string(),
                user: "postgres".to_string(),
                password: "password".to_string(),
                ssl_mode: "require".to_string(),
            },
            migration: MigrationConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_source_path() {
        let mut config = valid_config();
        config.source.path = PathBuf::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_target_host() {
        let mut config = valid_config();
        config.target.host = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_batch_size() {
        let mut config = valid_config();
        config.migration.profiles_batch_size = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_batch_size_exceeding_param_limit() {
        let mut config = valid_config();
        // 9000 rows * 8 columns > 65535 parameters
        config.migration.profiles_batch_size = Some(9_000);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_target_config_debug_redacts_password() {
        let mut config = valid_config();
        config.target.password = "super_secret_password_123".to_string();
        let debug_output = format!("{:?}", config.target);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_password_123"),
            "Debug output should not contain actual password value"
        );
    }
}
