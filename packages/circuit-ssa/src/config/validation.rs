//! Configuration validation

use super::error::ConfigResult;

/// Trait for validatable configuration objects
pub trait Validatable {
    /// Returns `Ok(())` if valid, `Err(ConfigError)` with details if invalid.
    fn validate(&self) -> ConfigResult<()>;

    /// Configuration name for error messages
    fn config_name(&self) -> &'static str {
        "Config"
    }
}

/// Extension trait for validating collections of configs
pub trait ValidatableCollection {
    fn validate_all(&self) -> ConfigResult<()>;
}

impl<T: Validatable> ValidatableCollection for Vec<T> {
    fn validate_all(&self) -> ConfigResult<()> {
        for config in self {
            config.validate()?;
        }
        Ok(())
    }
}

impl<T: Validatable> ValidatableCollection for Option<T> {
    fn validate_all(&self) -> ConfigResult<()> {
        match self {
            Some(config) => config.validate(),
            None => Ok(()),
        }
    }
}
