// src/exec/command.rs

//! Inputs and outputs of a single command execution.

use std::fmt;
use std::path::PathBuf;

use tokio::io::AsyncWrite;

use crate::errors::ExecError;

/// Exit code reported for a command that ran to completion successfully.
pub const SUCCESS_EXIT_CODE: i32 = 0;

/// Generic failure exit code (spawn failure, wait failure without status).
pub const ERROR_EXIT_CODE: i32 = 1;

/// Exit code reported when a cancel or timeout guard killed the process.
///
/// 128 + SIGKILL(9), so it reads the same as a shell's report of a killed
/// child.
pub const STOPPED_PREEMPTIVELY_EXIT_CODE: i32 = 137;

/// Byte-stream destination for one of the child's output streams.
pub type OutputSink = Box<dyn AsyncWrite + Send + Unpin>;

/// What to run, where, and for how long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name or path.
    pub program: String,
    pub args: Vec<String>,
    /// Must already exist; never created by the executor.
    pub working_dir: PathBuf,
    /// Hard execution deadline. Must be > 0.
    pub timeout_seconds: i64,
    /// Extra environment variables for the child, on top of the inherited
    /// environment.
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            timeout_seconds: 3600,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn timeout_seconds(mut self, secs: i64) -> Self {
        self.timeout_seconds = secs;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// The two independent output destinations of an execution.
pub struct OutputSinks {
    pub stdout: OutputSink,
    pub stderr: OutputSink,
}

impl OutputSinks {
    pub fn new(stdout: OutputSink, stderr: OutputSink) -> Self {
        Self { stdout, stderr }
    }

    /// Discard both streams.
    pub fn discard() -> Self {
        Self::new(Box::new(tokio::io::sink()), Box::new(tokio::io::sink()))
    }

    /// Pass both streams through to this process's stdout / stderr.
    pub fn inherit() -> Self {
        Self::new(Box::new(tokio::io::stdout()), Box::new(tokio::io::stderr()))
    }
}

impl fmt::Debug for OutputSinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSinks").finish_non_exhaustive()
    }
}

/// Normalized result of one execution.
///
/// `exit_code` and `errors` are independent: a nonzero exit code with no
/// errors is an ordinary command failure, and a kill error can sit next to a
/// zero exit code.
#[derive(Debug)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub errors: Vec<ExecError>,
}

impl ExecutionResult {
    pub fn new(exit_code: i32, errors: Vec<ExecError>) -> Self {
        Self { exit_code, errors }
    }

    /// Short-circuit result for failures that happen before the child runs.
    pub fn failed(error: ExecError) -> Self {
        Self::new(ERROR_EXIT_CODE, vec![error])
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == SUCCESS_EXIT_CODE && self.errors.is_empty()
    }

    pub fn stopped_preemptively(&self) -> bool {
        self.exit_code == STOPPED_PREEMPTIVELY_EXIT_CODE
    }
}
