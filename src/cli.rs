// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `plugin-exec`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "plugin-exec",
    version,
    about = "Run commands under a timeout and a cooperative cancel signal.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `plugin-exec.toml` in the current working directory, if it
    /// exists; built-in defaults otherwise.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PLUGIN_EXEC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Execute a command. Ctrl-C cancels it; SIGTERM lets it finish.
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Working directory of the child. Must exist.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub working_dir: PathBuf,

    /// Directory for the script and captured output (`--shell` only).
    ///
    /// Defaults to `[executor].orchestration_dir` from the config.
    #[arg(long, value_name = "DIR")]
    pub orchestration_dir: Option<PathBuf>,

    /// Execution timeout in seconds.
    ///
    /// Defaults to `[executor].default_timeout_seconds` from the config.
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub timeout: Option<i64>,

    /// Write the command to a script and run it through the configured shell,
    /// capturing output to files.
    #[arg(long)]
    pub shell: bool,

    /// The command and its arguments.
    #[arg(
        value_name = "COMMAND",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_trailing_command() {
        let args = CliArgs::try_parse_from([
            "plugin-exec",
            "run",
            "--timeout",
            "5",
            "--",
            "ls",
            "-la",
        ])
        .unwrap();

        let Commands::Run(run) = args.command;
        assert_eq!(run.timeout, Some(5));
        assert!(!run.shell);
        assert_eq!(run.command, vec!["ls".to_string(), "-la".to_string()]);
    }

    #[test]
    fn run_requires_a_command() {
        assert!(CliArgs::try_parse_from(["plugin-exec", "run"]).is_err());
    }
}
