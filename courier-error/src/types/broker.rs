use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки операций брокера (subscribe / unsubscribe).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// Брокер остановлен, новые подписки не принимаются.
    #[error("broker is closed")]
    Closed,

    /// Подписка с таким идентификатором не зарегистрирована
    /// (например, повторная отписка).
    #[error("subscription {id} not found")]
    NotFound { id: u64 },

    /// Идентификатор уже занят. Нарушение инварианта выдачи id.
    #[error("duplicate subscription id {id}")]
    DuplicateId { id: u64 },
}

/// Ошибка при ожидании сообщения.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecvError {
    #[error("subscription is closed")]
    Closed,

    #[error("operation exceeded the specified timeout")]
    Timeout,
}

/// Ошибка при неблокирующем получении сообщения.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryRecvError {
    #[error("no messages available")]
    Empty,

    #[error("subscription is closed")]
    Closed,
}

impl ErrorExt for BrokerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Closed => StatusCode::BrokerClosed,
            Self::NotFound { .. } => StatusCode::NotFound,
            Self::DuplicateId { .. } => StatusCode::DuplicateId,
        }
    }
}

impl ErrorExt for RecvError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Closed => StatusCode::ChannelClosed,
            Self::Timeout => StatusCode::Timeout,
        }
    }
}

impl ErrorExt for TryRecvError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Empty => StatusCode::Empty,
            Self::Closed => StatusCode::ChannelClosed,
        }
    }
}

// === Преобразования ===

/// Конвертация из tokio::sync::mpsc::error::TryRecvError
#[cfg(feature = "tokio")]
impl From<tokio::sync::mpsc::error::TryRecvError> for TryRecvError {
    fn from(err: tokio::sync::mpsc::error::TryRecvError) -> Self {
        match err {
            tokio::sync::mpsc::error::TryRecvError::Empty => TryRecvError::Empty,
            tokio::sync::mpsc::error::TryRecvError::Disconnected => TryRecvError::Closed,
        }
    }
}

#[cfg(feature = "tokio")]
impl From<tokio::time::error::Elapsed> for RecvError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        RecvError::Timeout
    }
}
