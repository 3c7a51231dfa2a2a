//! Подсистема Publish–Subscribe (pub/sub).
//!
//! Этот модуль реализует внутрипроцессный брокер с динамическим набором
//! подписчиков:
//!
//! - `broker`: подписка, отписка, рассылка и остановка.
//! - `registry`: потокобезопасный реестр активных подписок со снимками.
//! - `subscription`: брокерная и потребительская стороны подписки.
//! - `queue` (приватный): обёртка над каналами `tokio::sync::mpsc`.
//!
//! Публичный API переэкспортирует:
//! - `broker::*`
//! - `registry::*`
//! - `subscription::*`
//! - `queue::QueueCapacity`

pub mod broker;
mod queue;
pub mod registry;
pub mod subscription;

pub use broker::*;
pub use queue::QueueCapacity;
pub use registry::*;
pub use subscription::*;
