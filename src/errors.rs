// src/errors.rs

//! Crate-wide error types.
//!
//! - [`AgentError`] is propagated with `?` (config loading, script files, IO).
//! - [`ExecError`] is *collected* into an `ExecutionResult`; a single command
//!   execution can produce several of them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Orchestration directory does not exist: {0}")]
    MissingOrchestrationDir(String),

    #[error("Failed to create script file {path}: {reason}")]
    ScriptFile { path: String, reason: String },

    #[error("Failed to open output file {path}: {reason}")]
    OutputFile { path: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Why a guard force-killed the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    Canceled,
    TimedOut,
}

impl std::fmt::Display for StopCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopCause::Canceled => write!(f, "execution canceled"),
            StopCause::TimedOut => write!(f, "execution timed out"),
        }
    }
}

/// Errors recorded while executing a single command.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to start process '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid execution timeout: {0} seconds (must be > 0)")]
    InvalidTimeout(i64),

    #[error("waiting for process failed: {0}")]
    Wait(#[source] std::io::Error),

    #[error("failed to kill process after {cause}: {source}")]
    Kill {
        cause: StopCause,
        #[source]
        source: std::io::Error,
    },

    #[error("process was terminated: {0}")]
    Terminated(StopCause),

    #[error("copying {stream} failed: {source}")]
    Io {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl ExecError {
    /// Whether the caller may reasonably retry or continue after this error.
    ///
    /// Failures to start the process are not recoverable for this execution;
    /// everything that happens once the child is running is.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ExecError::Spawn { .. } | ExecError::InvalidTimeout(_) => false,
            ExecError::Wait(_)
            | ExecError::Kill { .. }
            | ExecError::Terminated(_)
            | ExecError::Io { .. } => true,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AgentError>;
