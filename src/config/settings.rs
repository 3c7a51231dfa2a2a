use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use super::BrokerConfig;
use crate::{logging::LoggingConfig, ConfigError};

/// Префикс переменных окружения: `COURIER_BROKER__DEFAULT_CAPACITY=8`.
pub const ENV_PREFIX: &str = "COURIER";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub broker: BrokerConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Значения по умолчанию + переменные окружения.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(None)
    }

    /// Как [`load`](Self::load), но сначала читает файл (toml/yaml/json по
    /// расширению). Переменные окружения имеют приоритет над файлом.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::build(Some(path.as_ref()))
    }

    fn build(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&Settings::default()).map_err(load_error)?;

        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let cfg = builder
            // Переменные окружения с префиксом COURIER_
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(load_error)?;

        let settings: Settings = cfg.try_deserialize().map_err(load_error)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.broker.validate()?;
        self.logging.validate()
    }
}

fn load_error(err: config::ConfigError) -> ConfigError {
    ConfigError::Load {
        reason: err.to_string(),
    }
}
