//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl TargetConfig {
    /// Build a connection string for tokio-postgres.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={} sslmode={}",
            self.host, self.port, self.database, self.user, self.password, self.ssl_mode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_YAML: &str = r#"
source:
  path: argo_database.db
target:
  host: db.example.supabase.co
  database: postgres
  user: postgres
  password: secret
"#;

    #[test]
    fn test_from_yaml_minimal() {
        let config = Config::from_yaml(MINIMAL_YAML).unwrap();
        assert_eq!(config.target.port, 5432);
        assert_eq!(config.target.ssl_mode, "require");
        assert_eq!(config.migration.get_floats_batch_size(), 2_000);
        assert_eq!(config.migration.get_profiles_batch_size(), 5_000);
        assert_eq!(config.migration.strategy, LoadStrategy::Insert);
    }

    #[test]
    fn test_from_yaml_copy_strategy() {
        let yaml = format!("{}\nmigration:\n  strategy: copy\n", MINIMAL_YAML);
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.migration.strategy, LoadStrategy::Copy);
    }

    #[test]
    fn test_from_yaml_rejects_unknown_strategy() {
        let yaml = format!("{}\nmigration:\n  strategy: teleport\n", MINIMAL_YAML);
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_connection_string() {
        let config = Config::from_yaml(MINIMAL_YAML).unwrap();
        let conn = config.target.connection_string();
        assert!(conn.contains("host=db.example.supabase.co"));
        assert!(conn.contains("sslmode=require"));
    }
}
