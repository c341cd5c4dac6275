// src/env.rs

//! Host identity passed to child processes as environment variables.
//!
//! The capability is injected into [`crate::shell::ShellCommandRunner`]; there
//! is no process-wide instance to swap out.

use std::fmt::Debug;

use anyhow::{anyhow, Result};
use tracing::warn;

/// Environment variable carrying the managed instance id.
pub const INSTANCE_ID_ENV: &str = "AWS_SSM_INSTANCE_ID";

/// Environment variable carrying the region name.
pub const REGION_ENV: &str = "AWS_SSM_REGION_NAME";

/// Source of host identity.
pub trait InstanceInfo: Send + Sync + Debug {
    fn instance_id(&self) -> Result<String>;
    fn region(&self) -> Result<String>;
}

/// Identity known up front (from config, or fixed in tests).
#[derive(Debug, Clone, Default)]
pub struct StaticInstanceInfo {
    pub instance_id: Option<String>,
    pub region: Option<String>,
}

impl StaticInstanceInfo {
    pub fn new(instance_id: Option<String>, region: Option<String>) -> Self {
        Self {
            instance_id,
            region,
        }
    }
}

impl InstanceInfo for StaticInstanceInfo {
    fn instance_id(&self) -> Result<String> {
        self.instance_id
            .clone()
            .ok_or_else(|| anyhow!("instance id is not configured"))
    }

    fn region(&self) -> Result<String> {
        self.region
            .clone()
            .ok_or_else(|| anyhow!("region is not configured"))
    }
}

/// Environment variables to add to a child, skipping values that cannot be
/// resolved.
pub fn child_env(info: &dyn InstanceInfo) -> Vec<(String, String)> {
    let mut env = Vec::new();

    match info.instance_id() {
        Ok(id) => env.push((INSTANCE_ID_ENV.to_string(), id)),
        Err(e) => warn!(error = %e, "not setting {INSTANCE_ID_ENV}"),
    }
    match info.region() {
        Ok(region) => env.push((REGION_ENV.to_string(), region)),
        Err(e) => warn!(error = %e, "not setting {REGION_ENV}"),
    }

    env
}
