//! Validation of the simulation section.

use super::{ConfigResult, Validate};
use crate::error::config::ConfigError;
use crate::simulation::{SimulationConfig, MAX_WAYS};

impl Validate for SimulationConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.ways == 0 || self.ways > MAX_WAYS {
            return Err(ConfigError::ValueOutOfRange {
                key: "simulation.ways".to_string(),
                message: format!("must be between 1 and {MAX_WAYS}, got {}", self.ways),
            });
        }
        Ok(())
    }
}
