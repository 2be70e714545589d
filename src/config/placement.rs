//! Validation of the placement graph section.

use super::{ConfigResult, Validate};
use crate::data_structures::placement_graph::PlacementGraphConfig;
use crate::error::config::ConfigError;

impl Validate for PlacementGraphConfig {
    fn validate(&self) -> ConfigResult<()> {
        PlacementGraphConfig::validate(self)
            .map_err(|e| ConfigError::ValidationError(format!("placement: {e}")))
    }
}
