//! Compilation configuration
//!
//! # Examples
//!
//! ```rust,ignore
//! use circuit_ssa::config::{CompilationConfig, Preset, TargetTriple};
//!
//! // Preset
//! let config = CompilationConfig::from_preset(Preset::Debug);
//!
//! // Preset + target override
//! let config = CompilationConfig::default().with_triple(TargetTriple::AArch64);
//!
//! // YAML
//! let config = CompilationConfig::from_yaml("compiler.yaml")?;
//! ```

pub mod compilation_config;
pub mod error;
pub mod preset;
pub mod validation;

pub use compilation_config::{CompilationConfig, TargetTriple};
pub use error::{ConfigError, ConfigResult};
pub use preset::Preset;
pub use validation::{Validatable, ValidatableCollection};
