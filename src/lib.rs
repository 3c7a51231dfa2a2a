//! Внутрипроцессный pub/sub брокер с явной политикой backpressure.
//!
//! Издатель никогда не ждёт подписчиков: переполненная очередь
//! отбрасывает новое сообщение и увеличивает счётчик `dropped` этого
//! подписчика, остальные подписчики не затрагиваются.

/// Configuration loading: file, environment, defaults.
pub mod config;
/// Flexible logging (formatting, filters, sinks).
pub mod logging;
/// Pub/Sub: Broker, Registry, Subscription.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// config
pub use config::{BrokerConfig, Settings, DEFAULT_QUEUE_CAPACITY};
/// Error types shared with `courier-error`.
pub use courier_error::{
    BrokerError, ConfigError, CourierResult, ErrorExt, GenericError, RecvError, ResultExt,
    StackError, StatusCode, TryRecvError,
};
/// logging
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingHandle};
/// Pub/Sub
pub use pubsub::{
    Broker, BrokerStats, DeliveryOutcome, PublishReport, QueueCapacity, Registry, Subscription,
    SubscriptionHandle, SubscriptionId,
};
