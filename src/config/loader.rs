// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{AgentConfig, RawAgentConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawAgentConfig`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for the
/// checked version.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawAgentConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawAgentConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<AgentConfig> {
    let raw_config = load_from_path(&path)?;
    let config = AgentConfig::try_from(raw_config)?;
    Ok(config)
}

/// Load `path` if given, otherwise use the built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<AgentConfig> {
    match path {
        Some(path) => load_and_validate(path),
        None => AgentConfig::try_from(RawAgentConfig::default()),
    }
}

/// Default config location, honoured by the CLI when it exists.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("plugin-exec.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_all_sections() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[executor]
default_timeout_seconds = 30
orchestration_dir = "/tmp/orch"

[shell]
program = "bash"
args = ["-e"]
script_name = "run.sh"

[instance]
instance_id = "i-0abc"
region = "us-east-1"
"#
        )
        .unwrap();

        let cfg = load_and_validate(file.path()).unwrap();
        assert_eq!(cfg.default_timeout_seconds, 30);
        assert_eq!(cfg.orchestration_dir, PathBuf::from("/tmp/orch"));
        assert_eq!(cfg.shell.program, "bash");
        assert_eq!(cfg.shell.args, vec!["-e".to_string()]);
        assert_eq!(cfg.shell.script_name, "run.sh");
        assert_eq!(cfg.instance.instance_id.as_deref(), Some("i-0abc"));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        let cfg = load_and_validate(file.path()).unwrap();
        assert_eq!(cfg.default_timeout_seconds, 3600);
        assert!(cfg.instance.region.is_none());
    }

    #[test]
    fn invalid_toml_is_a_toml_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[executor\n").unwrap();
        assert!(matches!(
            load_and_validate(file.path()),
            Err(crate::errors::AgentError::TomlError(_))
        ));
    }
}
