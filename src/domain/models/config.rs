//! Library configuration.

use serde::{Deserialize, Serialize};

/// Main configuration structure for demodesk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Fatigue analytics configuration
    #[serde(default)]
    pub fatigue: FatigueConfig,

    /// Cache synchronization configuration
    #[serde(default)]
    pub sync: SyncConfig,

    /// Release sweep configuration
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Quota re-check configuration
    #[serde(default)]
    pub quota: QuotaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            fatigue: FatigueConfig::default(),
            sync: SyncConfig::default(),
            sweep: SweepConfig::default(),
            quota: QuotaConfig::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".demodesk/demodesk.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Also log to stdout when a log directory is configured
    #[serde(default = "default_true")]
    pub enable_stdout: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            enable_stdout: default_true(),
        }
    }
}

/// Fatigue analytics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FatigueConfig {
    /// Daily listen cap; one binge session cannot skew the relative
    /// metric past this. Week/month caps scale it by 7x/30x.
    #[serde(default = "default_daily_cap")]
    pub daily_cap: u64,

    /// Raw-listen fatigue threshold, trailing day
    #[serde(default = "default_threshold_day")]
    pub threshold_day: u64,

    /// Raw-listen fatigue threshold, trailing week
    #[serde(default = "default_threshold_week")]
    pub threshold_week: u64,

    /// Raw-listen fatigue threshold, trailing month
    #[serde(default = "default_threshold_month")]
    pub threshold_month: u64,

    /// Relative percentage below which a staffed-up window reads as sleeping
    #[serde(default = "default_sleeping_floor_pct")]
    pub sleeping_floor_pct: f64,

    /// Fraction of the threshold at which a window reads as warning
    #[serde(default = "default_warning_ratio")]
    pub warning_ratio: f64,

    /// Per-staff load report cache TTL, seconds
    #[serde(default = "default_load_cache_ttl_secs")]
    pub load_cache_ttl_secs: u64,

    /// Per-organization health report cache TTL, seconds
    #[serde(default = "default_health_cache_ttl_secs")]
    pub health_cache_ttl_secs: u64,
}

const fn default_daily_cap() -> u64 {
    60
}

const fn default_threshold_day() -> u64 {
    60
}

const fn default_threshold_week() -> u64 {
    300
}

const fn default_threshold_month() -> u64 {
    900
}

const fn default_sleeping_floor_pct() -> f64 {
    80.0
}

const fn default_warning_ratio() -> f64 {
    0.9
}

const fn default_load_cache_ttl_secs() -> u64 {
    30
}

const fn default_health_cache_ttl_secs() -> u64 {
    60
}

impl FatigueConfig {
    pub fn threshold(&self, window: crate::domain::models::report::LoadWindow) -> u64 {
        use crate::domain::models::report::LoadWindow;
        match window {
            LoadWindow::Day => self.threshold_day,
            LoadWindow::Week => self.threshold_week,
            LoadWindow::Month => self.threshold_month,
        }
    }
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            daily_cap: default_daily_cap(),
            threshold_day: default_threshold_day(),
            threshold_week: default_threshold_week(),
            threshold_month: default_threshold_month(),
            sleeping_floor_pct: default_sleeping_floor_pct(),
            warning_ratio: default_warning_ratio(),
            load_cache_ttl_secs: default_load_cache_ttl_secs(),
            health_cache_ttl_secs: default_health_cache_ttl_secs(),
        }
    }
}

/// Cache synchronization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncConfig {
    /// Minimum seconds between focus-triggered reloads
    #[serde(default = "default_focus_cooldown_secs")]
    pub focus_cooldown_secs: u64,

    /// Total budget for silent retries of a failed scoped reload, seconds
    #[serde(default = "default_read_retry_max_elapsed_secs")]
    pub read_retry_max_elapsed_secs: u64,

    /// Change-feed channel capacity
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,
}

const fn default_focus_cooldown_secs() -> u64 {
    10
}

const fn default_read_retry_max_elapsed_secs() -> u64 {
    5
}

const fn default_feed_capacity() -> usize {
    256
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            focus_cooldown_secs: default_focus_cooldown_secs(),
            read_retry_max_elapsed_secs: default_read_retry_max_elapsed_secs(),
            feed_capacity: default_feed_capacity(),
        }
    }
}

/// Release sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SweepConfig {
    /// Seconds between release-sweep heartbeats
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,
}

const fn default_sweep_interval_secs() -> u64 {
    3600
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Quota re-check configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QuotaConfig {
    /// Seconds between background usage-snapshot refreshes
    #[serde(default = "default_recheck_interval_secs")]
    pub recheck_interval_secs: u64,
}

const fn default_recheck_interval_secs() -> u64 {
    300
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            recheck_interval_secs: default_recheck_interval_secs(),
        }
    }
}
