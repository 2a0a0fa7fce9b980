//! Service configuration loaded from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crease_fabric::FabricConfig;

use crate::error::{ServiceError, ServiceResult};

/// Service tuning, loaded from TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Capacity of each subscriber's event channel.
    pub event_channel_capacity: usize,
    /// Recent events kept for subscribers that join late.
    pub event_history: usize,
    /// Only the match umpire may score when set.
    pub require_umpire: bool,
    /// Upper bound on matches held by the in-memory store.
    pub max_matches: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: 256,
            event_history: 512,
            require_umpire: true,
            max_matches: 1024,
        }
    }
}

impl ServiceConfig {
    pub fn from_toml_str(text: &str) -> ServiceResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ServiceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> ServiceResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> ServiceResult<()> {
        if self.event_channel_capacity == 0 {
            return Err(ServiceError::Config(
                "event_channel_capacity must be positive".into(),
            ));
        }
        if self.max_matches == 0 {
            return Err(ServiceError::Config("max_matches must be positive".into()));
        }
        Ok(())
    }

    pub fn fabric_config(&self) -> FabricConfig {
        FabricConfig {
            channel_capacity: self.event_channel_capacity,
            history_capacity: self.event_history,
        }
    }
}
