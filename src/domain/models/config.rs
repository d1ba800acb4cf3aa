//! Runtime configuration model.

use serde::{Deserialize, Serialize};

/// Main configuration structure for Weathervane.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Persistence backend: "memory" or "sqlite".
    #[serde(default = "default_store")]
    pub store: String,

    /// Database configuration (sqlite backend only).
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

fn default_store() -> String {
    "sqlite".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: default_store(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to the `SQLite` database file.
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".weathervane/weathervane.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json, pretty.
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for daily-rotated log files. Stderr only when
    /// absent.
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Seconds between scheduler passes in `weathervane run`.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Timeout for a single source or target agent call, in seconds.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Collapse identical source fetches (same owner, agent and
    /// parameters) into one call per tick.
    #[serde(default = "default_group_fetches")]
    pub group_fetches: bool,
}

const fn default_tick_interval_secs() -> u64 {
    60
}

const fn default_call_timeout_secs() -> u64 {
    30
}

const fn default_group_fetches() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            call_timeout_secs: default_call_timeout_secs(),
            group_fetches: default_group_fetches(),
        }
    }
}
