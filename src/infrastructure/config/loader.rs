use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_delegation_attempts: {0}. Must be at least 1")]
    InvalidMaxDelegationAttempts(u32),

    #[error("Invalid max_check_attempts: {0}. Must be at least 1")]
    InvalidMaxCheckAttempts(u32),

    #[error("Invalid backoff_factor: {0}. Must be at least 1.0")]
    InvalidBackoffFactor(f64),

    #[error(
        "Invalid check wait configuration: initial_check_wait_secs ({0}) must not exceed max_check_wait_secs ({1})"
    )]
    InvalidCheckWait(u64, u64),

    #[error("Invalid max_operations_per_cycle: {0}. Must be at least 1")]
    InvalidOperationCeiling(u32),

    #[error("Invalid executor_timeout_secs: {0}. Must be at least 1")]
    InvalidExecutorTimeout(u64),

    #[error("Invalid lock_retry_attempts: {0}. Must be at least 1")]
    InvalidLockRetries(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Data directory cannot be empty")]
    EmptyDataDir,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .steward/config.yaml (project config, created by init)
    /// 3. .steward/local.yaml (project local overrides, optional)
    /// 4. Environment variables (STEWARD_* prefix, highest priority)
    ///
    /// Configuration is always project-local (pwd/.steward/) so several
    /// orchestration sessions on one machine stay independent.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".steward/config.yaml"))
            .merge(Yaml::file(".steward/local.yaml"))
            .merge(Env::prefixed("STEWARD_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.data_dir.is_empty() {
            return Err(ConfigError::EmptyDataDir);
        }

        let orch = &config.orchestrator;
        if orch.max_delegation_attempts == 0 {
            return Err(ConfigError::InvalidMaxDelegationAttempts(
                orch.max_delegation_attempts,
            ));
        }
        if orch.max_check_attempts == 0 {
            return Err(ConfigError::InvalidMaxCheckAttempts(orch.max_check_attempts));
        }
        if orch.backoff_factor < 1.0 {
            return Err(ConfigError::InvalidBackoffFactor(orch.backoff_factor));
        }
        if orch.initial_check_wait_secs > orch.max_check_wait_secs {
            return Err(ConfigError::InvalidCheckWait(
                orch.initial_check_wait_secs,
                orch.max_check_wait_secs,
            ));
        }
        if orch.max_operations_per_cycle == 0 {
            return Err(ConfigError::InvalidOperationCeiling(
                orch.max_operations_per_cycle,
            ));
        }
        if orch.executor_timeout_secs == 0 {
            return Err(ConfigError::InvalidExecutorTimeout(
                orch.executor_timeout_secs,
            ));
        }

        if config.store.lock_retry_attempts == 0 {
            return Err(ConfigError::InvalidLockRetries(
                config.store.lock_retry_attempts,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.data_dir, ".steward");
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_validate_zero_delegation_attempts() {
        let mut config = Config::default();
        config.orchestrator.max_delegation_attempts = 0;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidMaxDelegationAttempts(0)
        ));
    }

    #[test]
    fn test_validate_backoff_factor_below_one() {
        let mut config = Config::default();
        config.orchestrator.backoff_factor = 0.5;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidBackoffFactor(_)
        ));
    }

    #[test]
    fn test_validate_initial_wait_above_cap() {
        let mut config = Config::default();
        config.orchestrator.initial_check_wait_secs = 3600;
        config.orchestrator.max_check_wait_secs = 1800;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidCheckWait(3600, 1800)
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();

        let result = ConfigLoader::validate(&config);
        match result.unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "verbose"),
            other => panic!("Expected InvalidLogLevel, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_validate_empty_data_dir() {
        let mut config = Config::default();
        config.data_dir = String::new();

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result.unwrap_err(), ConfigError::EmptyDataDir));
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "orchestrator:\n  max_check_attempts: 4\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(
            override_file,
            "orchestrator:\n  max_check_attempts: 8\nlogging:\n  level: debug"
        )
        .unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.orchestrator.max_check_attempts, 8, "Override should win");
        assert_eq!(
            config.logging.level, "debug",
            "Override should win for nested fields"
        );
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
        assert_eq!(
            config.orchestrator.max_delegation_attempts, 3,
            "Untouched fields keep defaults"
        );
    }
}
