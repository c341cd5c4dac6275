// src/lib.rs

pub mod cancel;
pub mod cli;
pub mod config;
pub mod env;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cancel::{CancelFlag, CancelSignal};
use crate::cli::{CliArgs, Commands, RunArgs};
use crate::config::{AgentConfig, default_config_path, load_or_default};
use crate::env::child_env;
use crate::exec::{CommandSpec, ExecutionResult, OutputSinks, ProcessRunner};
use crate::fs::RealFileSystem;
use crate::shell::{ShellCommandRunner, ShellRequest};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the cancel flag and the signal handlers that flip it
/// - direct or script-based execution
///
/// Returns the normalized exit code of the command.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = args.config.clone().or_else(|| {
        let default = default_config_path();
        default.exists().then_some(default)
    });
    let cfg = load_or_default(config_path.as_deref())?;
    debug!(?config_path, ?cfg, "configuration loaded");

    let flag = Arc::new(CancelFlag::new());
    install_signal_handlers(Arc::clone(&flag));
    let cancel: Arc<dyn CancelSignal> = flag;

    let Commands::Run(run_args) = args.command;
    let result = if run_args.shell {
        run_shell(&cfg, &run_args, cancel).await?
    } else {
        run_direct(&cfg, &run_args, cancel).await?
    };

    for err in &result.errors {
        warn!(error = %err, recoverable = err.is_recoverable(), "execution error");
    }
    Ok(result.exit_code)
}

/// Ctrl-C cancels the running command; SIGTERM (POSIX) only requests
/// shutdown and lets it finish.
fn install_signal_handlers(flag: Arc<CancelFlag>) {
    {
        let flag = Arc::clone(&flag);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; canceling");
            flag.cancel();
        });
    }

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                eprintln!("failed to listen for SIGTERM: {e}");
                return;
            }
        };
        if term.recv().await.is_some() {
            info!("SIGTERM received; shutting down after the current command");
            flag.shutdown();
        }
    });
}

async fn run_direct(
    cfg: &AgentConfig,
    args: &RunArgs,
    cancel: Arc<dyn CancelSignal>,
) -> Result<ExecutionResult> {
    let (program, rest) = args
        .command
        .split_first()
        .context("no command given")?;

    let mut spec = CommandSpec::new(program, &args.working_dir)
        .args(rest.iter().cloned())
        .timeout_seconds(args.timeout.unwrap_or(cfg.default_timeout_seconds));
    spec.env.extend(child_env(&cfg.instance));

    let runner = ProcessRunner::new();
    Ok(runner.execute(&spec, OutputSinks::inherit(), cancel).await)
}

async fn run_shell(
    cfg: &AgentConfig,
    args: &RunArgs,
    cancel: Arc<dyn CancelSignal>,
) -> Result<ExecutionResult> {
    let orchestration_dir: PathBuf = args
        .orchestration_dir
        .clone()
        .unwrap_or_else(|| cfg.orchestration_dir.clone());
    std::fs::create_dir_all(&orchestration_dir)
        .with_context(|| format!("creating orchestration dir {:?}", orchestration_dir))?;

    let runner = ShellCommandRunner::new(
        Arc::new(RealFileSystem),
        ProcessRunner::new(),
        Arc::new(cfg.instance.clone()),
        cfg.shell.clone(),
    );

    let request = ShellRequest {
        commands: vec![args.command.join(" ")],
        working_dir: args.working_dir.clone(),
        orchestration_dir,
        timeout_seconds: args.timeout.unwrap_or(cfg.default_timeout_seconds),
    };

    let mut output = runner.run(&request, cancel).await?;
    info!(
        stdout = %output.stdout_path.display(),
        stderr = %output.stderr_path.display(),
        "output captured"
    );

    std::io::copy(&mut output.stdout, &mut std::io::stdout()).context("printing stdout")?;
    std::io::copy(&mut output.stderr, &mut std::io::stderr()).context("printing stderr")?;

    Ok(output.result)
}
