#![allow(dead_code)]

use std::path::{Path, PathBuf};

use plugin_exec::exec::CommandSpec;

/// Builder for `CommandSpec` to simplify test setup.
///
/// Defaults to a generous timeout and the current directory.
pub struct CommandSpecBuilder {
    spec: CommandSpec,
}

impl CommandSpecBuilder {
    pub fn new(program: &str) -> Self {
        Self {
            spec: CommandSpec::new(program, PathBuf::from(".")).timeout_seconds(3600),
        }
    }

    /// `sh -c <script>`.
    pub fn sh(script: &str) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.spec.args.push(arg.to_string());
        self
    }

    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.spec.working_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn timeout_seconds(mut self, secs: i64) -> Self {
        self.spec.timeout_seconds = secs;
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.spec.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> CommandSpec {
        self.spec
    }
}
