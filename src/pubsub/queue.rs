use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Ёмкость очереди доставки одного подписчика.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueCapacity {
    /// Не более `n` недочитанных сообщений; при переполнении новое сообщение
    /// отбрасывается и учитывается в счётчике `dropped`.
    Bounded(usize),
    /// Без ограничения. Память растёт вместе с отставанием подписчика.
    Unbounded,
}

impl QueueCapacity {
    /// Предел очереди, `None` для неограниченной.
    pub fn limit(&self) -> Option<usize> {
        match self {
            Self::Bounded(n) => Some(*n),
            Self::Unbounded => None,
        }
    }

    pub fn is_bounded(&self) -> bool {
        matches!(self, Self::Bounded(_))
    }

    /// Ёмкость, которую реально получит очередь.
    ///
    /// `Bounded(0)` становится `Bounded(1)`: `tokio::sync::mpsc` не
    /// поддерживает rendezvous-каналы.
    pub fn effective(self) -> Self {
        match self {
            Self::Bounded(n) => Self::Bounded(n.max(1)),
            Self::Unbounded => Self::Unbounded,
        }
    }
}

impl Default for QueueCapacity {
    fn default() -> Self {
        Self::Bounded(crate::config::DEFAULT_QUEUE_CAPACITY)
    }
}

impl fmt::Display for QueueCapacity {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Bounded(n) => write!(f, "bounded({n})"),
            Self::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Результат неблокирующей отправки в очередь.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SendOutcome {
    Sent,
    Full,
    Disconnected,
}

/// Отправляющая сторона очереди подписчика.
pub(crate) enum QueueSender<T> {
    Bounded(mpsc::Sender<T>),
    Unbounded(mpsc::UnboundedSender<T>),
}

/// Принимающая сторона очереди подписчика.
pub(crate) enum QueueReceiver<T> {
    Bounded(mpsc::Receiver<T>),
    Unbounded(mpsc::UnboundedReceiver<T>),
}

/// Создаёт FIFO-очередь ёмкости [`QueueCapacity::effective`].
pub(crate) fn queue<T>(capacity: QueueCapacity) -> (QueueSender<T>, QueueReceiver<T>) {
    match capacity.effective() {
        QueueCapacity::Bounded(n) => {
            let (tx, rx) = mpsc::channel(n);
            (QueueSender::Bounded(tx), QueueReceiver::Bounded(rx))
        }
        QueueCapacity::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (QueueSender::Unbounded(tx), QueueReceiver::Unbounded(rx))
        }
    }
}

impl<T> QueueSender<T> {
    /// Никогда не блокируется и не паникует.
    #[inline]
    pub(crate) fn try_send(
        &self,
        msg: T,
    ) -> SendOutcome {
        match self {
            Self::Bounded(tx) => match tx.try_send(msg) {
                Ok(()) => SendOutcome::Sent,
                Err(mpsc::error::TrySendError::Full(_)) => SendOutcome::Full,
                Err(mpsc::error::TrySendError::Closed(_)) => SendOutcome::Disconnected,
            },
            Self::Unbounded(tx) => match tx.send(msg) {
                Ok(()) => SendOutcome::Sent,
                Err(_) => SendOutcome::Disconnected,
            },
        }
    }
}

impl<T> QueueReceiver<T> {
    pub(crate) async fn recv(&mut self) -> Option<T> {
        match self {
            Self::Bounded(rx) => rx.recv().await,
            Self::Unbounded(rx) => rx.recv().await,
        }
    }

    pub(crate) fn try_recv(&mut self) -> Result<T, mpsc::error::TryRecvError> {
        match self {
            Self::Bounded(rx) => rx.try_recv(),
            Self::Unbounded(rx) => rx.try_recv(),
        }
    }

    /// Паникует, если вызвана внутри асинхронного контекста tokio.
    pub(crate) fn blocking_recv(&mut self) -> Option<T> {
        match self {
            Self::Bounded(rx) => rx.blocking_recv(),
            Self::Unbounded(rx) => rx.blocking_recv(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Bounded(rx) => rx.len(),
            Self::Unbounded(rx) => rx.len(),
        }
    }
}
