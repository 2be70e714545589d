//! Configuration module for the placement engine.
//!
//! Settings are layered: built-in defaults, then an optional file (TOML, YAML,
//! JSON), then environment variables. The merged result is validated before
//! it is handed out.

use std::path::{Path, PathBuf};

use crate::data_structures::placement_graph::PlacementGraphConfig;
use crate::error::config::ConfigError;
use crate::simulation::SimulationConfig;
use config::{Config, ConfigError as ExternalConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

mod placement;
mod simulation;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Default configuration location
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "EM_PLACEMENT";

/// A trait for types that can be validated.
pub trait Validate {
    /// Validates that the configuration is correct.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the configuration is valid
    /// * `Err(ConfigError)` if the configuration is invalid
    fn validate(&self) -> ConfigResult<()>;
}

/// Main configuration of the placement engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Geometry and search limits of the placement graph
    pub placement: PlacementGraphConfig,

    /// Parameters of the load simulation
    pub simulation: SimulationConfig,

    /// Log configuration
    pub log: LogConfig,
}

impl Validate for EngineConfig {
    fn validate(&self) -> ConfigResult<()> {
        Validate::validate(&self.placement)?;
        self.simulation.validate()?;
        self.log.validate()?;
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Whether to log in JSON format
    pub json: bool,

    /// Whether to include source code locations in logs
    pub source_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            source_location: true,
        }
    }
}

impl Validate for LogConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::ValidationError(format!(
                "Invalid log level: {}",
                self.level
            ))),
        }
    }
}

/// Configuration loader for the placement engine.
#[derive(Debug)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Optional path to the configuration file
    /// * `env_prefix` - Prefix for environment variables that override configuration values
    pub fn new<P: AsRef<Path>>(config_path: Option<P>, env_prefix: &str) -> Self {
        Self {
            config_path: config_path.map(|p| p.as_ref().to_path_buf()),
            env_prefix: env_prefix.to_string(),
        }
    }

    /// Creates a loader for `explicit`, or for `fallback` when no path was
    /// given and that file exists. Without either, only defaults and the
    /// environment are used.
    pub fn resolve<P: AsRef<Path>>(explicit: Option<P>, fallback: &Path, env_prefix: &str) -> Self {
        match explicit {
            Some(path) => Self::new(Some(path), env_prefix),
            None if fallback.exists() => Self::new(Some(fallback), env_prefix),
            None => {
                tracing::warn!(
                    "Default configuration file not found at: {}",
                    fallback.display()
                );
                Self::new(None::<&Path>, env_prefix)
            }
        }
    }

    /// File this loader reads, if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Loads the configuration from defaults, file and environment variables.
    ///
    /// # Returns
    ///
    /// * `Ok(EngineConfig)` if the configuration was loaded and validated
    /// * `Err(ConfigError)` if there was an error loading the configuration
    pub fn load(&self) -> ConfigResult<EngineConfig> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&EngineConfig::default())
                .map_err(|e| ConfigError::ParseError(e.to_string()))?,
        );

        if let Some(path) = &self.config_path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }

            let format = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => FileFormat::Toml,
                Some("json") => FileFormat::Json,
                Some("yaml" | "yml") => FileFormat::Yaml,
                _ => {
                    return Err(ConfigError::ParseError(format!(
                        "Unsupported file extension for: {path:?}"
                    )))
                }
            };
            builder = builder.add_source(File::from(path.as_path()).format(format));
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(|e| match e {
            ExternalConfigError::NotFound(path) => ConfigError::FileNotFound(PathBuf::from(path)),
            other => ConfigError::ParseError(other.to_string()),
        })?;

        let engine_config: EngineConfig = config
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        engine_config.validate()?;
        Ok(engine_config)
    }
}

impl Default for ConfigLoader {
    /// Loader without a file, reading overrides from `EM_PLACEMENT__*`.
    fn default() -> Self {
        Self::new(None::<&Path>, ENV_PREFIX)
    }
}
