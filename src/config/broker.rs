use serde::{Deserialize, Serialize};

use crate::{pubsub::QueueCapacity, ConfigError};

/// Ёмкость очереди подписчика по умолчанию.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Настройки брокера.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Ёмкость очереди новых подписчиков.
    pub default_capacity: usize,
    /// Неограниченные очереди вместо drop-политики; `default_capacity`
    /// тогда игнорируется.
    pub unbounded: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_QUEUE_CAPACITY,
            unbounded: false,
        }
    }
}

impl BrokerConfig {
    pub fn queue_capacity(&self) -> QueueCapacity {
        if self.unbounded {
            QueueCapacity::Unbounded
        } else {
            QueueCapacity::Bounded(self.default_capacity)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.unbounded && self.default_capacity == 0 {
            return Err(ConfigError::invalid(
                "broker.default_capacity",
                "bounded queue capacity must be at least 1",
            ));
        }
        Ok(())
    }
}
