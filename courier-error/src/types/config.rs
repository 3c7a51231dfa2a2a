use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки загрузки и валидации конфигурации.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Источник конфигурации не удалось прочитать или десериализовать.
    #[error("failed to load configuration: {reason}")]
    Load { reason: String },

    /// Значение поля недопустимо.
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn status_code(&self) -> StatusCode {
        StatusCode::InvalidConfig
    }
}
