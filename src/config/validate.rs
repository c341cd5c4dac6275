// src/config/validate.rs

use crate::config::model::{AgentConfig, RawAgentConfig};
use crate::errors::{AgentError, Result};

impl TryFrom<RawAgentConfig> for AgentConfig {
    type Error = AgentError;

    fn try_from(raw: RawAgentConfig) -> std::result::Result<Self, Self::Error> {
        let config = AgentConfig::new_unchecked(raw);
        validate_config(&config)?;
        Ok(config)
    }
}

/// Check the invariants the executor relies on.
pub fn validate_config(cfg: &AgentConfig) -> Result<()> {
    validate_timeout(cfg)?;
    validate_shell(cfg)?;
    Ok(())
}

fn validate_timeout(cfg: &AgentConfig) -> Result<()> {
    if cfg.default_timeout_seconds <= 0 {
        return Err(AgentError::ConfigError(format!(
            "[executor].default_timeout_seconds must be >= 1 (got {})",
            cfg.default_timeout_seconds
        )));
    }
    Ok(())
}

fn validate_shell(cfg: &AgentConfig) -> Result<()> {
    if cfg.shell.program.trim().is_empty() {
        return Err(AgentError::ConfigError(
            "[shell].program must not be empty".to_string(),
        ));
    }

    let name = &cfg.shell.script_name;
    if name.is_empty() || name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(AgentError::ConfigError(format!(
            "[shell].script_name must be a plain file name (got '{}')",
            name
        )));
    }

    Ok(())
}
