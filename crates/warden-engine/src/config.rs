use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::{EngineError, Result};

// Enforcer configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // Backing file for the policy store.
    pub policy_path: PathBuf,
}

const DEFAULT_POLICY_PATH: &str = "warden-policies.csv";

#[derive(Debug, Deserialize)]
struct EngineConfigOverride {
    policy_path: Option<PathBuf>,
}

impl EngineConfig {
    pub fn new(policy_path: impl Into<PathBuf>) -> Self {
        Self {
            policy_path: policy_path.into(),
        }
    }

    pub fn from_env() -> Self {
        let policy_path = std::env::var("WARDEN_POLICY_PATH")
            .unwrap_or_else(|_| DEFAULT_POLICY_PATH.to_string());
        Self::new(policy_path)
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env();
        if let Ok(path) = std::env::var("WARDEN_CONFIG") {
            let contents = fs::read_to_string(&path)
                .map_err(|err| EngineError::Config(format!("read WARDEN_CONFIG {path}: {err}")))?;
            let override_cfg: EngineConfigOverride = serde_yaml::from_str(&contents)
                .map_err(|err| EngineError::Config(format!("parse engine config yaml: {err}")))?;
            if let Some(value) = override_cfg.policy_path {
                config.policy_path = value;
            }
        }
        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POLICY_PATH)
    }
}
