// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::env::StaticInstanceInfo;
use crate::shell::ShellSettings;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [executor]
/// default_timeout_seconds = 3600
/// orchestration_dir = "/var/lib/plugin-exec/orchestration"
///
/// [shell]
/// program = "sh"
/// script_name = "_script.sh"
///
/// [instance]
/// instance_id = "i-0123456789abcdef0"
/// region = "us-east-1"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAgentConfig {
    #[serde(default)]
    pub executor: ExecutorSection,

    #[serde(default)]
    pub shell: ShellSection,

    #[serde(default)]
    pub instance: InstanceSection,
}

/// `[executor]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorSection {
    /// Timeout used when the command line does not give one.
    #[serde(default = "default_timeout_seconds")]
    pub default_timeout_seconds: i64,

    /// Directory receiving scripts and captured output.
    #[serde(default = "default_orchestration_dir")]
    pub orchestration_dir: PathBuf,
}

fn default_timeout_seconds() -> i64 {
    3600
}

fn default_orchestration_dir() -> PathBuf {
    std::env::temp_dir().join("plugin-exec")
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            default_timeout_seconds: default_timeout_seconds(),
            orchestration_dir: default_orchestration_dir(),
        }
    }
}

/// `[shell]` section. Missing keys fall back to the platform default shell.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ShellSection {
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    pub script_name: Option<String>,
}

/// `[instance]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct InstanceSection {
    pub instance_id: Option<String>,
    pub region: Option<String>,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawAgentConfig>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub default_timeout_seconds: i64,
    pub orchestration_dir: PathBuf,
    pub shell: ShellSettings,
    pub instance: StaticInstanceInfo,
}

impl AgentConfig {
    pub(crate) fn new_unchecked(raw: RawAgentConfig) -> Self {
        let defaults = ShellSettings::default();
        let shell = ShellSettings {
            program: raw.shell.program.unwrap_or(defaults.program),
            args: raw.shell.args.unwrap_or(defaults.args),
            script_name: raw.shell.script_name.unwrap_or(defaults.script_name),
        };

        Self {
            default_timeout_seconds: raw.executor.default_timeout_seconds,
            orchestration_dir: raw.executor.orchestration_dir,
            shell,
            instance: StaticInstanceInfo::new(raw.instance.instance_id, raw.instance.region),
        }
    }
}
