use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde::Serialize;
use tracing::{debug, error, info, trace};

use super::{
    queue::queue, DeliveryOutcome, QueueCapacity, Registry, Subscription, SubscriptionHandle,
    SubscriptionId,
};
use crate::{config::BrokerConfig, BrokerError, ConfigError, ErrorExt};

/// Итог одного вызова [`Broker::publish`].
///
/// Носит информационный характер: публикация никогда не завершается ошибкой.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// Подписчики, получившие сообщение в очередь.
    pub delivered: usize,
    /// Подписчики с переполненной очередью.
    pub dropped: usize,
    /// Подписчики, закрытые между снимком и доставкой.
    pub closed: usize,
}

impl PublishReport {
    fn record(
        &mut self,
        outcome: DeliveryOutcome,
    ) {
        match outcome {
            DeliveryOutcome::Delivered => self.delivered += 1,
            DeliveryOutcome::Dropped => self.dropped += 1,
            DeliveryOutcome::Closed => self.closed += 1,
        }
    }

    /// Размер снимка, по которому шла рассылка.
    pub fn attempted(&self) -> usize {
        self.delivered + self.dropped + self.closed
    }
}

/// Счётчики брокера.
#[derive(Debug, Default)]
struct BrokerMetrics {
    publish_count: AtomicU64,
    delivered_count: AtomicU64,
    dropped_count: AtomicU64,
    subscribe_count: AtomicU64,
    unsubscribe_count: AtomicU64,
}

/// Снимок счётчиков брокера.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BrokerStats {
    /// Общее количество вызовов `publish`.
    pub publish_count: u64,
    /// Сумма успешных постановок в очереди по всем подписчикам.
    pub delivered_count: u64,
    /// Сообщения, отброшенные из-за переполнения.
    pub dropped_count: u64,
    pub subscribe_count: u64,
    /// Подписки, закрытые отпиской или остановкой брокера.
    pub unsubscribe_count: u64,
}

pub(crate) struct BrokerInner<T> {
    registry: Registry<T>,
    default_capacity: QueueCapacity,
    next_id: AtomicU64,
    metrics: BrokerMetrics,
}

impl<T> BrokerInner<T> {
    pub(crate) fn unsubscribe(
        &self,
        id: SubscriptionId,
    ) -> Result<(), BrokerError> {
        // сначала убрать из реестра, затем закрыть очередь
        match self.registry.remove(id) {
            Ok(sub) => {
                sub.close();
                self.metrics.unsubscribe_count.fetch_add(1, Ordering::Relaxed);
                debug!(
                    subscription_id = %id,
                    delivered = sub.delivered(),
                    dropped = sub.dropped(),
                    "unsubscribed"
                );
                Ok(())
            }
            Err(err) => {
                debug!(subscription_id = %id, "unsubscribe of unknown subscription");
                Err(err)
            }
        }
    }

    fn shutdown(&self) {
        let Some(drained) = self.registry.close() else {
            return;
        };
        let closed = drained.iter().filter(|sub| sub.close()).count();
        self.metrics
            .unsubscribe_count
            .fetch_add(closed as u64, Ordering::Relaxed);
        info!(
            closed_subscriptions = closed,
            publish_count = self.metrics.publish_count.load(Ordering::Relaxed),
            dropped_count = self.metrics.dropped_count.load(Ordering::Relaxed),
            "broker shut down"
        );
    }
}

impl<T> Drop for BrokerInner<T> {
    fn drop(&mut self) {
        // без этого приёмники живых подписок ждали бы вечно
        self.shutdown();
    }
}

/// Внутрипроцессный pub/sub брокер.
///
/// Поддерживает:
/// - Произвольное число подписчиков, меняющееся во время работы
/// - Неблокирующую публикацию с политикой drop-newest для полных очередей
/// - Ограниченные и неограниченные очереди на подписчика
/// - Идемпотентную остановку
///
/// Клонирование дешёвое: все клоны разделяют один реестр.
pub struct Broker<T> {
    inner: Arc<BrokerInner<T>>,
}

impl<T> Clone for Broker<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Broker<T>
where
    T: Clone + Send + 'static,
{
    /// Брокер с ограниченными очередями ёмкости по умолчанию.
    pub fn new() -> Self {
        Self::with_capacity(QueueCapacity::default())
    }

    /// Брокер с заданной ёмкостью очереди новых подписчиков.
    pub fn with_capacity(default_capacity: QueueCapacity) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                registry: Registry::new(),
                default_capacity,
                next_id: AtomicU64::new(1),
                metrics: BrokerMetrics::default(),
            }),
        }
    }

    /// Брокер из проверенной конфигурации.
    pub fn from_config(config: &BrokerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_capacity(config.queue_capacity()))
    }

    /// Подписка с ёмкостью очереди по умолчанию.
    pub fn subscribe(&self) -> Result<SubscriptionHandle<T>, BrokerError> {
        self.subscribe_with(self.inner.default_capacity)
    }

    /// Подписка с собственной ёмкостью очереди.
    ///
    /// После [`shutdown`](Self::shutdown) возвращает `BrokerError::Closed`.
    /// `Bounded(0)` становится `Bounded(1)`, см. [`QueueCapacity::effective`].
    pub fn subscribe_with(
        &self,
        capacity: QueueCapacity,
    ) -> Result<SubscriptionHandle<T>, BrokerError> {
        let capacity = capacity.effective();
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = queue(capacity);
        let sub = Arc::new(Subscription::new(id, capacity, tx));

        if let Err(err) = self.inner.registry.add(Arc::clone(&sub)) {
            if err.status_code().is_critical() {
                error!(subscription_id = %id, error = %err, "subscribe failed");
            } else {
                debug!(error = %err, "subscribe rejected");
            }
            debug_assert!(
                !matches!(err, BrokerError::DuplicateId { .. }),
                "duplicate subscription id {id}"
            );
            return Err(err);
        }

        self.inner
            .metrics
            .subscribe_count
            .fetch_add(1, Ordering::Relaxed);
        debug!(subscription_id = %id, %capacity, "subscribed");

        Ok(SubscriptionHandle::new(
            sub,
            rx,
            Arc::downgrade(&self.inner),
        ))
    }

    /// Рассылает сообщение всем подписчикам из снимка реестра.
    ///
    /// Никогда не ждёт подписчиков и никогда не завершается ошибкой.
    /// Для каждого подписчика сохраняется порядок сообщений одного
    /// издателя.
    pub fn publish(
        &self,
        message: T,
    ) -> PublishReport {
        let metrics = &self.inner.metrics;
        metrics.publish_count.fetch_add(1, Ordering::Relaxed);

        let targets = self.inner.registry.snapshot();
        let mut report = PublishReport::default();

        let Some((last, rest)) = targets.split_last() else {
            trace!("publish without subscribers");
            return report;
        };
        for sub in rest {
            report.record(sub.deliver(message.clone()));
        }
        report.record(last.deliver(message));

        metrics
            .delivered_count
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        if report.dropped > 0 {
            metrics
                .dropped_count
                .fetch_add(report.dropped as u64, Ordering::Relaxed);
        }
        trace!(
            delivered = report.delivered,
            dropped = report.dropped,
            closed = report.closed,
            "published"
        );
        report
    }
}

impl<T> Broker<T> {
    /// Удаляет подписку из реестра и закрывает её очередь.
    ///
    /// Повторный вызов возвращает `BrokerError::NotFound`, состояние брокера
    /// при этом не меняется.
    pub fn unsubscribe(
        &self,
        id: SubscriptionId,
    ) -> Result<(), BrokerError> {
        self.inner.unsubscribe(id)
    }

    /// Отклоняет новые подписки и закрывает все оставшиеся. Идемпотентна.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.registry.is_closed()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn default_capacity(&self) -> QueueCapacity {
        self.inner.default_capacity
    }

    pub fn stats(&self) -> BrokerStats {
        let m = &self.inner.metrics;
        BrokerStats {
            publish_count: m.publish_count.load(Ordering::Relaxed),
            delivered_count: m.delivered_count.load(Ordering::Relaxed),
            dropped_count: m.dropped_count.load(Ordering::Relaxed),
            subscribe_count: m.subscribe_count.load(Ordering::Relaxed),
            unsubscribe_count: m.unsubscribe_count.load(Ordering::Relaxed),
        }
    }
}

impl<T> Default for Broker<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use tokio::time::timeout;

    use super::*;
    use crate::{RecvError, TryRecvError};

    /// Helper: создаёт брокер и сразу подписывается, возвращая (broker, handle)
    fn setup_one() -> (Broker<Bytes>, SubscriptionHandle<Bytes>) {
        let broker = Broker::with_capacity(QueueCapacity::Bounded(5));
        let sub = broker.subscribe().unwrap();
        (broker, sub)
    }

    /// Проверяет, что сообщение доставляется подписчику,
    /// и что счётчики публикации обновлены правильно.
    #[tokio::test]
    async fn test_publish_and_receive() {
        let (broker, mut sub) = setup_one();
        let report = broker.publish(Bytes::from_static(b"x"));
        assert_eq!(report.delivered, 1);

        let msg = timeout(Duration::from_millis(50), sub.recv())
            .await
            .expect("timed out")
            .expect("no message");
        assert_eq!(msg, Bytes::from_static(b"x"));

        let stats = broker.stats();
        assert_eq!(stats.publish_count, 1);
        assert_eq!(stats.delivered_count, 1);
        assert_eq!(stats.dropped_count, 0);
    }

    /// Проверяет, что публикация без подписчиков ничего не делает.
    #[test]
    fn test_publish_without_subscribers() {
        let broker = Broker::<u32>::new();
        let report = broker.publish(1);
        assert_eq!(report.attempted(), 0);
        assert_eq!(broker.stats().publish_count, 1);
    }

    /// Проверяет, что все подписчики получают сообщение.
    #[tokio::test]
    async fn test_multiple_subscribers_receive() {
        let broker = Broker::<&'static str>::new();
        let subs: Vec<_> = (0..3).map(|_| broker.subscribe().unwrap()).collect();

        assert_eq!(broker.publish("d").delivered, 3);
        for mut sub in subs {
            let msg = timeout(Duration::from_millis(50), sub.recv())
                .await
                .expect("timed out")
                .expect("no msg");
            assert_eq!(msg, "d");
        }
    }

    #[test]
    fn test_ids_are_unique_and_monotonic() {
        let broker = Broker::<u8>::new();
        let a = broker.subscribe().unwrap();
        let b = broker.subscribe().unwrap();
        assert!(a.id() < b.id());
        assert_eq!(a.id().as_u64(), 1);
    }

    #[test]
    fn test_double_unsubscribe_is_not_found() {
        let broker = Broker::<u8>::new();
        let sub = broker.subscribe().unwrap();
        let id = sub.id();

        assert_eq!(broker.unsubscribe(id), Ok(()));
        assert_eq!(
            broker.unsubscribe(id),
            Err(BrokerError::NotFound { id: id.as_u64() })
        );
        assert!(sub.is_closed());
        assert_eq!(broker.stats().unsubscribe_count, 1);

        // брокер продолжает работать
        let mut other = broker.subscribe().unwrap();
        broker.publish(9);
        assert_eq!(other.try_recv(), Ok(9));
    }

    /// Проверяет, что после отписки сообщения не приходят, а приёмник
    /// сообщает о закрытии.
    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let (broker, mut sub) = setup_one();
        broker.unsubscribe(sub.id()).unwrap();

        let report = broker.publish(Bytes::from_static(b"nope"));
        assert_eq!(report.attempted(), 0);
        assert_eq!(sub.recv().await, Err(RecvError::Closed));
    }

    /// Проверяет политику drop-newest: первое сообщение остаётся в очереди.
    #[test]
    fn test_full_queue_drops_newest() {
        let broker = Broker::<&'static str>::new();
        let mut slow = broker.subscribe_with(QueueCapacity::Bounded(1)).unwrap();
        let mut fast = broker.subscribe_with(QueueCapacity::Unbounded).unwrap();

        broker.publish("x");
        let report = broker.publish("y");
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, 1);

        assert_eq!(slow.dropped(), 1);
        assert_eq!(slow.try_recv(), Ok("x"));
        assert_eq!(slow.try_recv(), Err(TryRecvError::Empty));

        assert_eq!(fast.try_recv(), Ok("x"));
        assert_eq!(fast.try_recv(), Ok("y"));
        assert_eq!(fast.dropped(), 0);
        assert_eq!(broker.stats().dropped_count, 1);
    }

    /// Проверяет, что подписка с нулевой ёмкостью сообщает ту ёмкость,
    /// с которой работает её очередь.
    #[test]
    fn test_zero_capacity_reports_effective_capacity() {
        let broker = Broker::<u8>::new();
        let sub = broker.subscribe_with(QueueCapacity::Bounded(0)).unwrap();
        assert_eq!(sub.capacity(), QueueCapacity::Bounded(1));

        broker.publish(1);
        broker.publish(2);
        assert_eq!(sub.len(), 1);
        assert_eq!(sub.dropped(), 1);
        assert_eq!(sub.capacity().limit(), Some(sub.len()));
    }

    #[test]
    fn test_shutdown_closes_everything_and_is_idempotent() {
        let broker = Broker::<u8>::new();
        let mut a = broker.subscribe().unwrap();
        let b = broker.subscribe().unwrap();
        broker.publish(1);

        broker.shutdown();
        broker.shutdown();

        assert!(broker.is_closed());
        assert_eq!(broker.subscriber_count(), 0);
        assert!(a.is_closed() && b.is_closed());
        assert_eq!(a.try_recv(), Ok(1));
        assert_eq!(a.try_recv(), Err(TryRecvError::Closed));
        assert_eq!(broker.stats().unsubscribe_count, 2);

        assert_eq!(broker.subscribe().unwrap_err(), BrokerError::Closed);
        assert_eq!(broker.publish(2).attempted(), 0);
    }

    /// Проверяет, что дроп handle отписывает его от брокера.
    #[test]
    fn test_handle_drop_unsubscribes() {
        let broker = Broker::<u8>::new();
        let sub = broker.subscribe().unwrap();
        let id = sub.id();
        assert_eq!(broker.subscriber_count(), 1);

        drop(sub);
        assert_eq!(broker.subscriber_count(), 0);
        assert!(broker.unsubscribe(id).is_err());
    }

    #[test]
    fn test_handle_explicit_unsubscribe() {
        let broker = Broker::<u8>::new();
        let sub = broker.subscribe().unwrap();
        assert_eq!(sub.unsubscribe(), Ok(()));
        assert_eq!(broker.subscriber_count(), 0);
        assert_eq!(broker.stats().unsubscribe_count, 1);
    }

    /// Проверяет, что дроп последнего клона брокера закрывает подписки.
    #[tokio::test]
    async fn test_dropping_broker_closes_subscriptions() {
        let broker = Broker::<u8>::new();
        let mut sub = broker.subscribe().unwrap();
        drop(broker);

        let res = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("receiver must not hang");
        assert_eq!(res, Err(RecvError::Closed));
    }

    #[test]
    fn test_from_config_rejects_zero_capacity() {
        let config = BrokerConfig {
            default_capacity: 0,
            unbounded: false,
        };
        assert!(Broker::<u8>::from_config(&config).is_err());

        let config = BrokerConfig {
            default_capacity: 0,
            unbounded: true,
        };
        let broker = Broker::<u8>::from_config(&config).unwrap();
        assert_eq!(broker.default_capacity(), QueueCapacity::Unbounded);
    }
}
