//! Pool configuration.
//!
//! Loaded from an explicit path, ./taskpool.yml, or
//! ~/.config/taskpool/taskpool.yml, falling back to defaults.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::PoolError;

/// Worker threads used when nothing else is configured.
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// How long an idle worker sleeps before re-checking the queue on its own.
pub const DEFAULT_IDLE_WAIT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PoolConfig {
    /// Number of worker threads. Zero is accepted but nothing will ever run.
    pub worker_threads: usize,

    /// Thread name prefix; workers are named `<prefix>-<index>`.
    pub thread_name: String,

    /// Heartbeat for idle workers, in milliseconds.
    pub idle_wait_ms: u64,

    /// Worker stack size in KiB; platform default when unset.
    pub stack_size_kb: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
            thread_name: "taskpool-worker".to_string(),
            idle_wait_ms: DEFAULT_IDLE_WAIT_MS,
            stack_size_kb: None,
        }
    }
}

impl PoolConfig {
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait_ms = idle_wait.as_millis() as u64;
        self
    }

    pub fn with_stack_size_kb(mut self, kb: usize) -> Self {
        self.stack_size_kb = Some(kb);
        self
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }

    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. taskpool.yml in current directory
    /// 3. ~/.config/taskpool/taskpool.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // Explicit path takes precedence
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try project config
        let project_config = PathBuf::from(format!("{}.yml", project_name));
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", project_config.display(), e);
                }
            }
        }

        // Try user config
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate().context("Invalid config file")?;
        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if self.idle_wait_ms == 0 {
            return Err(PoolError::Config("idle-wait-ms must be > 0".to_string()));
        }
        if self.thread_name.is_empty() {
            return Err(PoolError::Config("thread-name must not be empty".to_string()));
        }
        if self.stack_size_kb == Some(0) {
            return Err(PoolError::Config("stack-size-kb must be > 0".to_string()));
        }
        Ok(())
    }
}
