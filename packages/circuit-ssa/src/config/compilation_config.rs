//! Compilation configuration
//!
//! Read-only settings an `Environment` is created with: target architecture,
//! tracing/profiling flags and construction limits.

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Target architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetTriple {
    #[serde(rename = "x86_64-unknown-linux-gnu")]
    Amd64,
    #[serde(rename = "aarch64-unknown-linux-gnu")]
    AArch64,
    #[serde(rename = "arm-unknown-linux-gnueabi")]
    Arm32,
}

impl TargetTriple {
    pub fn from_str(s: &str) -> ConfigResult<Self> {
        match s {
            "x86_64-unknown-linux-gnu" => Ok(Self::Amd64),
            "aarch64-unknown-linux-gnu" => Ok(Self::AArch64),
            "arm-unknown-linux-gnueabi" => Ok(Self::Arm32),
            other => Err(ConfigError::UnsupportedTriple(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "x86_64-unknown-linux-gnu",
            Self::AArch64 => "aarch64-unknown-linux-gnu",
            Self::Arm32 => "arm-unknown-linux-gnueabi",
        }
    }
}

impl Default for TargetTriple {
    fn default() -> Self {
        Self::Amd64
    }
}

/// Compilation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilationConfig {
    /// Target architecture
    pub triple: TargetTriple,

    /// Emit per-variable resolution traces
    pub trace_circuit: bool,

    /// Collect construction statistics
    pub profiling: bool,

    /// Verify the circuit when an environment finishes
    pub verify_circuit: bool,

    /// Maximum nesting of sub-CFG regions (1..=1024)
    pub max_sub_cfg_depth: usize,
}

impl CompilationConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Debug => Self {
                triple: TargetTriple::default(),
                trace_circuit: true,
                profiling: true,
                verify_circuit: true,
                max_sub_cfg_depth: 64,
            },
            Preset::Release => Self {
                triple: TargetTriple::default(),
                trace_circuit: false,
                profiling: false,
                verify_circuit: false,
                max_sub_cfg_depth: 64,
            },
        }
    }

    pub fn with_triple(mut self, triple: TargetTriple) -> Self {
        self.triple = triple;
        self
    }

    pub fn is_32bit(&self) -> bool {
        self.triple == TargetTriple::Arm32
    }

    pub fn is_64bit(&self) -> bool {
        !self.is_32bit()
    }

    pub fn is_aarch64(&self) -> bool {
        self.triple == TargetTriple::AArch64
    }

    pub fn is_amd64(&self) -> bool {
        self.triple == TargetTriple::Amd64
    }

    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl Default for CompilationConfig {
    fn default() -> Self {
        Self::from_preset(Preset::default())
    }
}

impl Validatable for CompilationConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_sub_cfg_depth == 0 || self.max_sub_cfg_depth > 1024 {
            return Err(ConfigError::range_with_hint(
                "max_sub_cfg_depth",
                self.max_sub_cfg_depth,
                1,
                1024,
                "Nested helper regions rarely exceed a handful of levels; 64 is the default.",
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "CompilationConfig"
    }
}
