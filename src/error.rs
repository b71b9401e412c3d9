//! Error types for taskpool
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Errors raised by the pool itself (construction and submission).
#[derive(Debug, Error)]
pub enum PoolError {
    /// A worker thread could not be created
    #[error("Failed to spawn worker {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    /// Periodic tasks need a non-zero period
    #[error("Invalid period: periodic tasks require a period of at least 1ms")]
    InvalidPeriod,

    /// The pool has begun shutting down and accepts no new work
    #[error("Pool is shut down")]
    ShutDown,

    /// Invalid configuration value
    #[error("Invalid config: {0}")]
    Config(String),
}

/// Why a task's result handle did not yield a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The payload panicked; the message is the panic payload when it was a string
    #[error("Task panicked: {0}")]
    Panicked(String),

    /// Submitted after shutdown began; never enqueued
    #[error("Task rejected: pool is shut down")]
    Rejected,

    /// Still pending when the pool shut down; never ran
    #[error("Task discarded at shutdown")]
    Discarded,
}

/// Result type alias for taskpool operations
pub type Result<T> = std::result::Result<T, PoolError>;
