//! Preset configurations

use super::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Circuit verification and tracing on
    Debug,

    /// No verification, no tracing
    Release,
}

impl Preset {
    pub fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::Release
    }
}
