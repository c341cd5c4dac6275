// src/shell.rs

//! Script-file based command runner.
//!
//! Writes the command lines to a script inside the orchestration directory,
//! appends the child's output to `stdout` / `stderr` files next to it, and
//! hands the actual execution to [`ProcessRunner`].

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cancel::CancelSignal;
use crate::env::{InstanceInfo, child_env};
use crate::errors::{AgentError, ExecError, Result};
use crate::exec::{CommandSpec, ExecutionResult, OutputSinks, ProcessRunner};
use crate::fs::FileSystem;

/// File name of captured standard output inside the orchestration directory.
pub const STDOUT_FILE_NAME: &str = "stdout";

/// File name of captured standard error inside the orchestration directory.
pub const STDERR_FILE_NAME: &str = "stderr";

/// Write `commands`, joined by newlines, to `path`.
///
/// The filesystem error is returned as-is; callers must not ignore it, or
/// they end up executing a stale or missing script.
pub fn create_script_file(fs: &dyn FileSystem, path: &Path, commands: &[String]) -> Result<()> {
    let contents = commands.join("\n");
    fs.write(path, contents.as_bytes())
        .map_err(|e| AgentError::ScriptFile {
            path: path.display().to_string(),
            reason: format!("{e:#}"),
        })?;
    debug!(path = %path.display(), lines = commands.len(), "script file written");
    Ok(())
}

/// How scripts are interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSettings {
    /// Interpreter executable.
    pub program: String,
    /// Arguments placed before the script path.
    pub args: Vec<String>,
    /// File name of the script inside the orchestration directory.
    pub script_name: String,
}

impl Default for ShellSettings {
    fn default() -> Self {
        if cfg!(windows) {
            Self {
                program: "powershell".to_string(),
                args: [
                    "-NoProfile",
                    "-NonInteractive",
                    "-ExecutionPolicy",
                    "Bypass",
                    "-File",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
                script_name: "_script.ps1".to_string(),
            }
        } else {
            Self {
                program: "sh".to_string(),
                args: Vec::new(),
                script_name: "_script.sh".to_string(),
            }
        }
    }
}

/// One shell execution request.
#[derive(Debug, Clone)]
pub struct ShellRequest {
    pub commands: Vec<String>,
    pub working_dir: PathBuf,
    /// Must already exist. Output files are appended to across runs.
    pub orchestration_dir: PathBuf,
    pub timeout_seconds: i64,
}

/// Result of a shell execution, with file-backed output.
pub struct ShellOutput {
    pub result: ExecutionResult,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
    /// Reader over the full captured stdout file.
    pub stdout: Box<dyn Read + Send>,
    /// Reader over the full captured stderr file.
    pub stderr: Box<dyn Read + Send>,
}

impl std::fmt::Debug for ShellOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellOutput")
            .field("result", &self.result)
            .field("stdout_path", &self.stdout_path)
            .field("stderr_path", &self.stderr_path)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    fs: Arc<dyn FileSystem>,
    runner: ProcessRunner,
    instance: Arc<dyn InstanceInfo>,
    settings: ShellSettings,
}

impl ShellCommandRunner {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        runner: ProcessRunner,
        instance: Arc<dyn InstanceInfo>,
        settings: ShellSettings,
    ) -> Self {
        Self {
            fs,
            runner,
            instance,
            settings,
        }
    }

    /// Path the script for `orchestration_dir` is written to.
    pub fn script_path(&self, orchestration_dir: &Path) -> PathBuf {
        orchestration_dir.join(&self.settings.script_name)
    }

    /// Write the script, run it, and return the classified result.
    ///
    /// Errors before the child is started (missing orchestration directory,
    /// script or output files that cannot be created) are returned as `Err`;
    /// everything after that is inside the `ExecutionResult`.
    pub async fn run(
        &self,
        request: &ShellRequest,
        cancel: Arc<dyn CancelSignal>,
    ) -> Result<ShellOutput> {
        let orch = &request.orchestration_dir;
        if !self.fs.is_dir(orch) {
            return Err(AgentError::MissingOrchestrationDir(
                orch.display().to_string(),
            ));
        }

        let script_path = self.script_path(orch);
        create_script_file(self.fs.as_ref(), &script_path, &request.commands)?;

        let stdout_path = orch.join(STDOUT_FILE_NAME);
        let stderr_path = orch.join(STDERR_FILE_NAME);
        let sinks = OutputSinks::new(
            self.open_output(&stdout_path)?,
            self.open_output(&stderr_path)?,
        );

        let mut spec = CommandSpec::new(&self.settings.program, &request.working_dir)
            .args(self.settings.args.iter().cloned())
            .arg(script_path.display().to_string())
            .timeout_seconds(request.timeout_seconds);
        spec.env.extend(child_env(self.instance.as_ref()));

        info!(
            script = %script_path.display(),
            orchestration_dir = %orch.display(),
            "running shell script"
        );
        let mut result = self.runner.execute(&spec, sinks, cancel).await;

        let stdout = self.open_captured(&stdout_path, "stdout", &mut result);
        let stderr = self.open_captured(&stderr_path, "stderr", &mut result);

        Ok(ShellOutput {
            result,
            stdout_path,
            stderr_path,
            stdout,
            stderr,
        })
    }

    fn open_output(&self, path: &Path) -> Result<crate::exec::OutputSink> {
        self.fs
            .open_append(path)
            .map_err(|e| AgentError::OutputFile {
                path: path.display().to_string(),
                reason: format!("{e:#}"),
            })
    }

    fn open_captured(
        &self,
        path: &Path,
        stream: &'static str,
        result: &mut ExecutionResult,
    ) -> Box<dyn Read + Send> {
        match self.fs.open_read(path) {
            Ok(reader) => reader,
            Err(e) => {
                result.errors.push(ExecError::Io {
                    stream,
                    source: io::Error::other(format!("{e:#}")),
                });
                Box::new(io::empty())
            }
        }
    }
}
