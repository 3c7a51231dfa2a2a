use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

use super::{Subscription, SubscriptionId};
use crate::BrokerError;

struct RegistryState<T> {
    entries: AHashMap<SubscriptionId, Arc<Subscription<T>>>,
    closed: bool,
}

/// Потокобезопасный реестр активных подписок.
///
/// Все изменения и снимки сериализуются одним мьютексом, который держится
/// только на время операции с картой и никогда во время доставки. Флаг
/// `closed` живёт под тем же мьютексом, поэтому `add` не может проскочить
/// мимо [`close`](Self::close).
pub struct Registry<T> {
    state: Mutex<RegistryState<T>>,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                entries: AHashMap::new(),
                closed: false,
            }),
        }
    }

    /// Регистрирует подписку.
    ///
    /// # Ошибки
    /// - `BrokerError::Closed` после [`close`](Self::close)
    /// - `BrokerError::DuplicateId` если идентификатор уже занят
    pub fn add(
        &self,
        sub: Arc<Subscription<T>>,
    ) -> Result<(), BrokerError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(BrokerError::Closed);
        }
        let id = sub.id();
        if state.entries.contains_key(&id) {
            return Err(BrokerError::DuplicateId { id: id.as_u64() });
        }
        state.entries.insert(id, sub);
        Ok(())
    }

    /// Удаляет подписку и возвращает её. Подписку не закрывает.
    pub fn remove(
        &self,
        id: SubscriptionId,
    ) -> Result<Arc<Subscription<T>>, BrokerError> {
        self.state
            .lock()
            .entries
            .remove(&id)
            .ok_or(BrokerError::NotFound { id: id.as_u64() })
    }

    /// Копия текущего набора подписок. Итерация по снимку идёт без
    /// блокировки реестра.
    pub fn snapshot(&self) -> Vec<Arc<Subscription<T>>> {
        self.state.lock().entries.values().cloned().collect()
    }

    /// Атомарно помечает реестр закрытым и забирает все подписки.
    ///
    /// Повторный вызов возвращает `None`.
    pub fn close(&self) -> Option<Vec<Arc<Subscription<T>>>> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }
        state.closed = true;
        Some(state.entries.drain().map(|(_, sub)| sub).collect())
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn contains(
        &self,
        id: SubscriptionId,
    ) -> bool {
        self.state.lock().entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
