use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid daily_cap: {0}. Must be positive")]
    InvalidDailyCap(u64),

    #[error("Invalid fatigue threshold: {0}. Must be positive")]
    InvalidThreshold(u64),

    #[error("Invalid warning_ratio: {0}. Must be between 0 and 1")]
    InvalidWarningRatio(f64),

    #[error("Invalid sleeping_floor_pct: {0}. Must be between 0 and 100")]
    InvalidSleepingFloor(f64),

    #[error("Invalid interval: {0} seconds. Must be at least 1")]
    InvalidInterval(u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .demodesk/config.yaml (project config)
    /// 3. .demodesk/local.yaml (local overrides, optional)
    /// 4. Environment variables (DEMODESK_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".demodesk/config.yaml"))
            .merge(Yaml::file(".demodesk/local.yaml"))
            .merge(Env::prefixed("DEMODESK_").split("__"))
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
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(ConfigError::InvalidLogLevel(other.to_string())),
        }
        match config.logging.format.as_str() {
            "json" | "pretty" => {}
            other => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        }

        if config.fatigue.daily_cap == 0 {
            return Err(ConfigError::InvalidDailyCap(config.fatigue.daily_cap));
        }
        for threshold in [
            config.fatigue.threshold_day,
            config.fatigue.threshold_week,
            config.fatigue.threshold_month,
        ] {
            if threshold == 0 {
                return Err(ConfigError::InvalidThreshold(threshold));
            }
        }
        if !(0.0..=1.0).contains(&config.fatigue.warning_ratio) {
            return Err(ConfigError::InvalidWarningRatio(config.fatigue.warning_ratio));
        }
        if !(0.0..=100.0).contains(&config.fatigue.sleeping_floor_pct) {
            return Err(ConfigError::InvalidSleepingFloor(config.fatigue.sleeping_floor_pct));
        }

        for interval in [
            config.sync.focus_cooldown_secs,
            config.sweep.interval_secs,
            config.quota.recheck_interval_secs,
        ] {
            if interval == 0 {
                return Err(ConfigError::InvalidInterval(interval));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        ConfigLoader::validate(&Config::default()).unwrap();
    }

    #[test]
    fn test_bad_log_level_is_rejected() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_zero_cap_is_rejected() {
        let mut config = Config::default();
        config.fatigue.daily_cap = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidDailyCap(0))
        ));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut config = Config::default();
        config.sweep.interval_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidInterval(0))
        ));
    }

    #[test]
    fn test_env_override() {
        temp_env::with_var("DEMODESK_FATIGUE__DAILY_CAP", Some("90"), || {
            let config = ConfigLoader::load().unwrap();
            assert_eq!(config.fatigue.daily_cap, 90);
        });
    }

    #[test]
    fn test_load_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "fatigue:\n  daily_cap: 45\nsync:\n  focus_cooldown_secs: 20\n",
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.fatigue.daily_cap, 45);
        assert_eq!(config.sync.focus_cooldown_secs, 20);
        // Untouched sections keep their defaults.
        assert_eq!(config.fatigue.threshold_week, 300);
    }
}
