use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tracing::trace;

use super::{
    broker::BrokerInner,
    queue::{QueueReceiver, QueueSender, SendOutcome},
    QueueCapacity,
};
use crate::{BrokerError, RecvError, TryRecvError};

/// Идентификатор подписки. Выдаётся брокером монотонно, начиная с 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Итог одной попытки доставки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Сообщение поставлено в очередь.
    Delivered,
    /// Очередь переполнена, сообщение отброшено и учтено в `dropped`.
    Dropped,
    /// Подписка закрыта, сообщение молча отброшено.
    Closed,
}

/// Брокерная сторона подписки.
///
/// Отправитель хранится под собственным мьютексом подписки: `None`
/// означает состояние `Closed`. Доставка и закрытие берут один и тот же
/// мьютекс, поэтому отправка никогда не пересекается с закрытием очереди.
/// Переход `Active -> Closed` односторонний.
pub struct Subscription<T> {
    id: SubscriptionId,
    capacity: QueueCapacity,
    sender: Mutex<Option<QueueSender<T>>>,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl<T> Subscription<T> {
    pub(crate) fn new(
        id: SubscriptionId,
        capacity: QueueCapacity,
        sender: QueueSender<T>,
    ) -> Self {
        Self {
            id,
            capacity,
            sender: Mutex::new(Some(sender)),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn capacity(&self) -> QueueCapacity {
        self.capacity
    }

    /// Неблокирующая доставка с проверкой живости.
    ///
    /// Никогда не ждёт читателя. Переполнение увеличивает `dropped`,
    /// отправка в закрытую подписку ничего не считает.
    pub fn deliver(
        &self,
        msg: T,
    ) -> DeliveryOutcome {
        let guard = self.sender.lock();
        let Some(tx) = guard.as_ref() else {
            return DeliveryOutcome::Closed;
        };

        match tx.try_send(msg) {
            SendOutcome::Sent => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                DeliveryOutcome::Delivered
            }
            SendOutcome::Full => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(subscription_id = %self.id, dropped = total, "queue full, message dropped");
                DeliveryOutcome::Dropped
            }
            SendOutcome::Disconnected => DeliveryOutcome::Closed,
        }
    }

    /// Закрывает очередь: освобождает отправителя, после чего приёмник,
    /// дочитав буфер, получит `Closed`.
    ///
    /// Возвращает `true` только для вызова, который действительно закрыл
    /// подписку.
    pub fn close(&self) -> bool {
        self.sender.lock().take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Количество сообщений, поставленных в очередь.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Количество сообщений, отброшенных из-за переполнения очереди.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("capacity", &self.capacity)
            .field("closed", &self.is_closed())
            .field("delivered", &self.delivered())
            .field("dropped", &self.dropped())
            .finish()
    }
}

/// Потребительская сторона подписки.
///
/// Предоставляет async интерфейс получения сообщений, блокирующий вариант
/// для обычных потоков и счётчики доставки.
///
/// Отписка происходит автоматически при `Drop`, если брокер ещё жив.
pub struct SubscriptionHandle<T> {
    shared: Arc<Subscription<T>>,
    receiver: QueueReceiver<T>,
    broker: Weak<BrokerInner<T>>,
}

impl<T> SubscriptionHandle<T> {
    pub(crate) fn new(
        shared: Arc<Subscription<T>>,
        receiver: QueueReceiver<T>,
        broker: Weak<BrokerInner<T>>,
    ) -> Self {
        Self {
            shared,
            receiver,
            broker,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.shared.id()
    }

    /// Асинхронно ожидает следующее сообщение.
    ///
    /// # Возвращает
    /// - `Ok(T)` при успешном получении сообщения
    /// - `Err(RecvError::Closed)` если подписка закрыта и буфер пуст
    pub async fn recv(&mut self) -> Result<T, RecvError> {
        self.receiver.recv().await.ok_or(RecvError::Closed)
    }

    /// Пытается получить сообщение без ожидания.
    ///
    /// # Возвращает
    /// - `Ok(T)` если сообщение доступно немедленно
    /// - `Err(TryRecvError::Empty)` если нет доступных сообщений
    /// - `Err(TryRecvError::Closed)` если подписка закрыта и буфер пуст
    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        self.receiver.try_recv().map_err(Into::into)
    }

    /// Как [`recv`](Self::recv), но не дольше `timeout`.
    ///
    /// Истечение срока даёт `Err(RecvError::Timeout)`, подписка при этом
    /// остаётся активной.
    pub async fn recv_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<T, RecvError> {
        tokio::time::timeout(timeout, self.recv()).await?
    }

    /// Блокирующее ожидание для потоков вне рантайма tokio.
    ///
    /// # Panics
    /// При вызове внутри асинхронного контекста.
    pub fn blocking_recv(&mut self) -> Result<T, RecvError> {
        self.receiver.blocking_recv().ok_or(RecvError::Closed)
    }

    /// Явно отписаться. Аналогично `drop(self)`, но возвращает результат.
    pub fn unsubscribe(self) -> Result<(), BrokerError> {
        match self.broker.upgrade() {
            Some(broker) => broker.unsubscribe(self.id()),
            None => Err(BrokerError::NotFound {
                id: self.id().as_u64(),
            }),
        }
    }

    /// Подписка закрыта брокером (буфер при этом может быть не пуст).
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn capacity(&self) -> QueueCapacity {
        self.shared.capacity()
    }

    pub fn delivered(&self) -> u64 {
        self.shared.delivered()
    }

    /// Сообщения, потерянные из-за переполнения очереди.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped()
    }

    /// Количество сообщений в очереди на получение.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> fmt::Debug for SubscriptionHandle<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("subscription", &self.shared)
            .field("queued", &self.len())
            .finish()
    }
}

impl<T> Drop for SubscriptionHandle<T> {
    fn drop(&mut self) {
        if self.shared.is_closed() {
            return;
        }
        if let Some(broker) = self.broker.upgrade() {
            // NotFound здесь означает гонку с shutdown, это штатно
            let _ = broker.unsubscribe(self.shared.id());
        }
    }
}
