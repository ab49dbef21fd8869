//! Configuration model for the orchestrator.
//!
//! All sections deserialize with serde defaults so a partial YAML file
//! or a handful of environment variables is enough to run.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for Steward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Directory holding the registry document, lock file and backups
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// State machine and polling limits
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Durable store locking behavior
    #[serde(default)]
    pub store: StoreConfig,

    /// External executor invocation
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_data_dir() -> String {
    ".steward".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            orchestrator: OrchestratorConfig::default(),
            store: StoreConfig::default(),
            executor: ExecutorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Limits and timing for the task state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OrchestratorConfig {
    /// Delegation attempts before a task is force-escalated
    #[serde(default = "default_max_delegation_attempts")]
    pub max_delegation_attempts: u32,

    /// Seconds to wait before the first response check
    #[serde(default = "default_initial_check_wait_secs")]
    pub initial_check_wait_secs: u64,

    /// Multiplier applied to the wait after each unproductive check
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Ceiling on the computed wait between checks, in seconds
    #[serde(default = "default_max_check_wait_secs")]
    pub max_check_wait_secs: u64,

    /// Unproductive checks before a task is force-escalated
    #[serde(default = "default_max_check_attempts")]
    pub max_check_attempts: u32,

    /// Consecutive identical operations tolerated before the loop guard trips
    #[serde(default = "default_max_operations_per_cycle")]
    pub max_operations_per_cycle: u32,

    /// Timeout for a single executor call, in seconds
    #[serde(default = "default_executor_timeout_secs")]
    pub executor_timeout_secs: u64,

    /// Safety margin subtracted from a task's ETA when suspending polls
    #[serde(default = "default_eta_safety_buffer_secs")]
    pub eta_safety_buffer_secs: u64,

    /// Maximum agent silence before ETA-based suspension is disallowed
    #[serde(default = "default_progress_silence_threshold_secs")]
    pub progress_silence_threshold_secs: u64,
}

const fn default_max_delegation_attempts() -> u32 {
    3
}

const fn default_initial_check_wait_secs() -> u64 {
    30
}

const fn default_backoff_factor() -> f64 {
    2.0
}

const fn default_max_check_wait_secs() -> u64 {
    1800
}

const fn default_max_check_attempts() -> u32 {
    10
}

const fn default_max_operations_per_cycle() -> u32 {
    5
}

const fn default_executor_timeout_secs() -> u64 {
    30
}

const fn default_eta_safety_buffer_secs() -> u64 {
    120
}

const fn default_progress_silence_threshold_secs() -> u64 {
    600
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_delegation_attempts: default_max_delegation_attempts(),
            initial_check_wait_secs: default_initial_check_wait_secs(),
            backoff_factor: default_backoff_factor(),
            max_check_wait_secs: default_max_check_wait_secs(),
            max_check_attempts: default_max_check_attempts(),
            max_operations_per_cycle: default_max_operations_per_cycle(),
            executor_timeout_secs: default_executor_timeout_secs(),
            eta_safety_buffer_secs: default_eta_safety_buffer_secs(),
            progress_silence_threshold_secs: default_progress_silence_threshold_secs(),
        }
    }
}

impl OrchestratorConfig {
    pub fn executor_timeout(&self) -> Duration {
        Duration::from_secs(self.executor_timeout_secs)
    }
}

/// Store lock acquisition behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreConfig {
    /// Lock acquisition attempts before reporting the store busy
    #[serde(default = "default_lock_retry_attempts")]
    pub lock_retry_attempts: u32,

    /// Initial backoff between lock attempts, in milliseconds
    #[serde(default = "default_lock_retry_initial_ms")]
    pub lock_retry_initial_ms: u64,

    /// Age after which a lock file is considered abandoned, in seconds
    #[serde(default = "default_lock_stale_secs")]
    pub lock_stale_secs: u64,
}

const fn default_lock_retry_attempts() -> u32 {
    3
}

const fn default_lock_retry_initial_ms() -> u64 {
    50
}

const fn default_lock_stale_secs() -> u64 {
    300
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_retry_attempts: default_lock_retry_attempts(),
            lock_retry_initial_ms: default_lock_retry_initial_ms(),
            lock_stale_secs: default_lock_stale_secs(),
        }
    }
}

/// External executor invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExecutorConfig {
    /// Command used to reach the executor; None disables the CLI's
    /// delegate/check commands
    #[serde(default)]
    pub command: Option<String>,

    /// Extra arguments prepended before the subcommand
    #[serde(default)]
    pub args: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rotated file logs; None logs to stderr only
    #[serde(default)]
    pub directory: Option<String>,
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
            directory: None,
        }
    }
}
